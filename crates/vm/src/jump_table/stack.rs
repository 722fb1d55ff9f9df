//! Register and stack operations.

use crate::error::{VmError, VmResult};
use crate::host::VmHost;
use crate::interpreter::Interpreter;
use crate::jump_table::JumpTable;
use crate::op_code::Opcode;
use crate::value::Value;

/// Registers the register and stack operation handlers.
pub(crate) fn register_handlers<H: VmHost>(jump_table: &mut JumpTable<H>) {
    jump_table.register(Opcode::NOP, nop);
    jump_table.register(Opcode::MOVE, move_register);
    jump_table.register(Opcode::COPY, copy);
    jump_table.register(Opcode::PUSH, push);
    jump_table.register(Opcode::POP, pop);
    jump_table.register(Opcode::SWAP, swap);
    jump_table.register(Opcode::LOAD, load);
    jump_table.register(Opcode::CAST, cast);
    jump_table.register(Opcode::CLEAR, clear);
}

fn nop<H: VmHost>(_interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    Ok(())
}

/// MOVE src, dst: the source register is left empty.
fn move_register<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    let src = interpreter.read_register()?;
    let dst = interpreter.read_register()?;

    let frame = interpreter.frame_mut()?;
    frame.register(dst)?;
    let value = frame.take_register(src)?;
    frame.set_register(dst, value)
}

/// COPY src, dst: deep copy.
fn copy<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    let src = interpreter.read_register()?;
    let dst = interpreter.read_register()?;

    let value = interpreter.register(src)?.clone();
    interpreter.set_register(dst, value)
}

/// PUSH src: pushes a copy of the register onto the shared stack.
fn push<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    let src = interpreter.read_register()?;

    let value = interpreter.register(src)?.clone();
    interpreter.vm_mut().stack_mut().push(value);
    Ok(())
}

/// POP dst
fn pop<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    let dst = interpreter.read_register()?;

    let (frame, stack) = interpreter.vm_mut().frame_and_stack_mut()?;
    if stack.is_empty() {
        return Err(VmError::StackUnderflow);
    }
    frame.register(dst)?;
    let value = stack.pop()?;
    frame.set_register(dst, value)
}

fn swap<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    let a = interpreter.read_register()?;
    let b = interpreter.read_register()?;

    interpreter.frame_mut()?.swap_registers(a, b)
}

/// LOAD dst, type, var length, bytes
fn load<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    let dst = interpreter.read_register()?;
    let vm_type = interpreter.read_type()?;
    let len = interpreter.read_length()?;
    let bytes = interpreter.read_bytes(len)?;

    let value = Value::from_bytes_typed(bytes, vm_type)?;
    interpreter.set_register(dst, value)
}

/// CAST src, dst, type
fn cast<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    let src = interpreter.read_register()?;
    let dst = interpreter.read_register()?;
    let vm_type = interpreter.read_type()?;

    let value = interpreter.register(src)?.cast_to(vm_type)?;
    interpreter.set_register(dst, value)
}

fn clear<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    let dst = interpreter.read_register()?;

    interpreter.set_register(dst, Value::None)
}
