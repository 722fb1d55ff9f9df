//! Control flow: calls, jumps, returns and context switches.

use crate::error::{VmError, VmResult};
use crate::execution_context::ExecutionContext;
use crate::host::VmHost;
use crate::interpreter::Interpreter;
use crate::jump_table::JumpTable;
use crate::op_code::Opcode;
use crate::value::Value;
use crate::vm_state::ExecutionState;
use log::debug;
use std::sync::Arc;

/// Registers the control flow handlers.
pub(crate) fn register_handlers<H: VmHost>(jump_table: &mut JumpTable<H>) {
    jump_table.register(Opcode::CALL, call);
    jump_table.register(Opcode::EXTCALL, extcall);
    jump_table.register(Opcode::JMP, jmp);
    jump_table.register(Opcode::JMPIF, jmp_if);
    jump_table.register(Opcode::JMPNOT, jmp_not);
    jump_table.register(Opcode::RET, ret);
    jump_table.register(Opcode::THROW, throw);
    jump_table.register(Opcode::CTX, ctx);
    jump_table.register(Opcode::SWITCH, switch);
    jump_table.register(Opcode::DEBUG, debug_hook);
}

/// CALL count, offset: new frame in the same context.
fn call<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    let count = interpreter.read_u8()?;
    let offset = interpreter.read_u16()?;

    let target = interpreter.check_target(i64::from(offset))?;
    let max = interpreter.vm().settings().max_register_count;
    if count < 1 || usize::from(count) > max {
        return Err(VmError::invalid_operation(format!(
            "invalid register count {count} (max {max})"
        )));
    }

    let resume = interpreter.position();
    let this = Arc::clone(interpreter.this());
    interpreter
        .vm_mut()
        .push_frame(this, resume, usize::from(count))?;
    interpreter.jump_to(target)
}

/// EXTCALL src: the register holds the interop method name.
fn extcall<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    let src = interpreter.read_register()?;
    let method = interpreter.register(src)?.as_string()?;

    interpreter.sync_pointer();
    let state = interpreter.vm_mut().execute_interop(&method)?;
    if !state.is_running() {
        return Err(VmError::InteropFailure { method, state });
    }
    Ok(())
}

fn jmp<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    let offset = interpreter.read_i16()?;

    let target = interpreter.check_target(i64::from(offset))?;
    interpreter.jump_to(target)
}

fn jmp_if<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    conditional_jump(interpreter, false)
}

fn jmp_not<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    conditional_jump(interpreter, true)
}

/// The target is validated even when the branch is not taken.
fn conditional_jump<H: VmHost>(interpreter: &mut Interpreter<'_, H>, negate: bool) -> VmResult<()> {
    let src = interpreter.read_register()?;
    let condition = interpreter.register(src)?.as_bool()? != negate;
    let offset = interpreter.read_i16()?;

    let target = interpreter.check_target(i64::from(offset))?;
    if condition {
        interpreter.jump_to(target)?;
    }
    Ok(())
}

/// RET: unwinds a CALL frame of this context, otherwise halts the activation.
fn ret<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    let depth = interpreter.vm().frames().len();
    if depth > 1 && depth > interpreter.base_depth() {
        let caller = interpreter.vm().peek_frame()?.context().name() == interpreter.this().name();
        if caller {
            let resume = interpreter.vm_mut().pop_frame()?;
            return interpreter.jump_to(resume as usize);
        }
    }

    interpreter.set_state(ExecutionState::Halt);
    Ok(())
}

fn throw<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    let src = interpreter.read_register()?;
    let message = interpreter.register(src)?.as_string()?;

    Err(VmError::ScriptThrow(message))
}

/// CTX src, dst: resolves a context by name.
fn ctx<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    let src = interpreter.read_register()?;
    let dst = interpreter.read_register()?;

    let name = interpreter.register(src)?.as_string()?;
    let context = interpreter
        .vm_mut()
        .find_context(&name)
        .ok_or(VmError::ContextNotFound(name))?;
    interpreter.set_register(dst, Value::from_interop(context))
}

/// SWITCH src: runs another context to completion on a fresh frame.
fn switch<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    let src = interpreter.read_register()?;
    let context = interpreter.register(src)?.as_interop::<ExecutionContext>()?;

    interpreter.sync_pointer();
    let resume = interpreter.position();
    debug!("{} switching to {}", interpreter.this().name(), context.name());
    let state = interpreter
        .vm_mut()
        .switch_context(Arc::clone(&context), resume)?;

    if state.is_halt() {
        interpreter.vm_mut().pop_frame()?;
        return Ok(());
    }

    let reason = context
        .error()
        .unwrap_or_else(|| format!("execution state {state}"));
    Err(VmError::SwitchFailed {
        context: context.name().to_string(),
        reason,
    })
}

/// DEBUG: hands the current frame to the host.
fn debug_hook<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    interpreter.sync_pointer();
    let offset = interpreter.position();
    match interpreter.vm_mut().on_debug(offset)? {
        ExecutionState::Running => Ok(()),
        ExecutionState::Fault => Err(VmError::invalid_operation("debugger requested a fault")),
        state => {
            interpreter.set_state(state);
            Ok(())
        }
    }
}
