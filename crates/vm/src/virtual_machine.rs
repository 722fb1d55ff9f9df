//! Virtual machine module for the Phantasma virtual machine.
//!
//! The VM owns the frame stack, the shared value stack, the active-address
//! stack and the context registry, and drives context switches. Contexts do
//! the actual work; the VM only hands them a frame and takes it back.

use crate::address::Address;
use crate::disassembler::Disassembler;
use crate::error::{VmError, VmResult};
use crate::evaluation_stack::EvaluationStack;
use crate::execution_context::{ContextRef, ExecutionContext};
use crate::execution_frame::ExecutionFrame;
use crate::host::{InteropScope, VmHost};
use crate::jump_table::JumpTable;
use crate::op_code::Opcode;
use crate::script_context::ScriptContext;
use crate::value::Value;
use crate::vm_state::ExecutionState;
use log::{debug, error};
use phantasma_config::{VmSettings, ENTRY_CONTEXT_NAME};
use std::collections::HashMap;
use std::mem;
use std::sync::Arc;

/// Runs one top-level script on behalf of a host.
///
/// A VM is created per invocation and discarded afterwards.
pub struct VirtualMachine<H: VmHost> {
    host: H,
    settings: VmSettings,
    stack: EvaluationStack,
    frames: Vec<ExecutionFrame>,
    active_addresses: Vec<Address>,
    contexts: HashMap<String, ContextRef>,
    entry_context: ContextRef,
    entry_address: Address,
    current_context: ContextRef,
    previous_context: ContextRef,
    switch_depth: usize,
    jump_table: JumpTable<H>,
}

impl<H: VmHost> VirtualMachine<H> {
    /// Creates a VM for `script` starting at offset 0 with default settings.
    pub fn new(script: impl Into<Vec<u8>>, host: H) -> Self {
        Self::build(script.into(), 0, None, host, VmSettings::default())
    }

    /// Creates a VM with an explicit entry offset, entry context name and
    /// settings. The settings are validated first.
    pub fn with_settings(
        script: impl Into<Vec<u8>>,
        offset: u32,
        context_name: Option<&str>,
        host: H,
        settings: VmSettings,
    ) -> VmResult<Self> {
        settings.validate()?;
        Ok(Self::build(
            script.into(),
            offset,
            context_name,
            host,
            settings,
        ))
    }

    fn build(
        script: Vec<u8>,
        offset: u32,
        context_name: Option<&str>,
        host: H,
        settings: VmSettings,
    ) -> Self {
        let entry_address = Address::from_hash(&script);
        let name = context_name.unwrap_or(ENTRY_CONTEXT_NAME);
        let entry_context: ContextRef = Arc::new(ExecutionContext::Script(
            ScriptContext::with_address(name, entry_address, script, offset),
        ));

        let mut contexts = HashMap::new();
        contexts.insert(ENTRY_CONTEXT_NAME.to_string(), Arc::clone(&entry_context));

        Self {
            host,
            settings,
            stack: EvaluationStack::new(),
            frames: Vec::new(),
            active_addresses: vec![entry_address],
            contexts,
            current_context: Arc::clone(&entry_context),
            previous_context: Arc::clone(&entry_context),
            entry_context,
            entry_address,
            switch_depth: 0,
            jump_table: JumpTable::new(),
        }
    }

    /// Runs the entry context to completion.
    ///
    /// Script failures come back as `Ok(ExecutionState::Fault)` with the
    /// message in [`error`](Self::error); `Err` means the invocation itself
    /// must be abandoned.
    pub fn execute(&mut self) -> VmResult<ExecutionState> {
        let entry = Arc::clone(&self.entry_context);
        self.switch_context(entry, 0)
    }

    /// Transfers control to `context` on a fresh frame and runs it until it
    /// leaves `Running`.
    ///
    /// The frame stays on the stack; the caller pops it once it resumes.
    pub fn switch_context(
        &mut self,
        context: ContextRef,
        instruction_pointer: u32,
    ) -> VmResult<ExecutionState> {
        if self.switch_depth >= self.settings.max_switch_depth {
            return Err(VmError::invalid_operation(format!(
                "context switch depth limit {} reached",
                self.settings.max_switch_depth
            )));
        }

        let base_depth = self.frames.len();
        self.push_frame(
            Arc::clone(&context),
            instruction_pointer,
            self.settings.default_register_count,
        )?;

        let saved_previous = mem::replace(
            &mut self.previous_context,
            mem::replace(&mut self.current_context, Arc::clone(&context)),
        );

        let address = context.address();
        self.active_addresses.push(address);
        self.switch_depth += 1;
        debug!(
            "switch to context {} ({}) depth {}",
            context.name(),
            address,
            self.switch_depth
        );

        let result = context.execute(self);

        self.switch_depth -= 1;
        self.previous_context = saved_previous;
        let state = result?;

        // Frames the child left behind, such as CALLs cut short by a halting
        // DEBUG, are dropped so only the switch frame remains on top.
        if state.is_halt() && self.frames.len() > base_depth + 1 {
            debug!(
                "dropping {} frames left by context {}",
                self.frames.len() - base_depth - 1,
                context.name()
            );
            self.frames.truncate(base_depth + 1);
            self.current_context = Arc::clone(&context);
        }

        self.leave_context(address)?;
        debug!("context {} finished with {}", context.name(), state);
        Ok(state)
    }

    /// Pops the active-address stack, which must yield the address pushed
    /// by the matching switch.
    pub(crate) fn leave_context(&mut self, expected: Address) -> VmResult<()> {
        match self.active_addresses.pop() {
            Some(found) if found == expected => Ok(()),
            found => {
                let found = found.map_or_else(|| "nothing".to_string(), |a| a.to_string());
                error!("active address stack out of balance: expected {expected}, found {found}");
                Err(VmError::SwitchProtocolViolation {
                    expected: expected.to_string(),
                    found,
                })
            }
        }
    }

    /// Pushes a frame with `register_count` empty registers.
    pub fn push_frame(
        &mut self,
        context: ContextRef,
        offset: u32,
        register_count: usize,
    ) -> VmResult<()> {
        if self.frames.len() >= self.settings.max_frame_depth {
            return Err(VmError::invalid_operation(format!(
                "frame depth limit {} reached",
                self.settings.max_frame_depth
            )));
        }

        self.frames
            .push(ExecutionFrame::new(context, offset, register_count));
        Ok(())
    }

    /// Pops the current frame and returns its resume offset. The frame
    /// below becomes current together with its context.
    pub fn pop_frame(&mut self) -> VmResult<u32> {
        if self.frames.len() < 2 {
            error!("attempted to pop the last frame");
            return Err(VmError::FrameUnderflow(
                "cannot pop the last frame".to_string(),
            ));
        }

        let frame = self
            .frames
            .pop()
            .ok_or_else(|| VmError::FrameUnderflow("frame stack is empty".to_string()))?;
        if let Some(top) = self.frames.last() {
            self.current_context = Arc::clone(top.context());
        }
        Ok(frame.offset())
    }

    /// The frame right below the current one.
    pub fn peek_frame(&self) -> VmResult<&ExecutionFrame> {
        let len = self.frames.len();
        if len < 2 {
            return Err(VmError::FrameUnderflow(
                "no frame below the current one".to_string(),
            ));
        }
        Ok(&self.frames[len - 2])
    }

    pub fn current_frame(&self) -> Option<&ExecutionFrame> {
        self.frames.last()
    }

    pub fn current_frame_mut(&mut self) -> Option<&mut ExecutionFrame> {
        self.frames.last_mut()
    }

    /// All frames, innermost last.
    pub fn frames(&self) -> &[ExecutionFrame] {
        &self.frames
    }

    pub(crate) fn frame_and_stack_mut(
        &mut self,
    ) -> VmResult<(&mut ExecutionFrame, &mut EvaluationStack)> {
        let frame = self
            .frames
            .last_mut()
            .ok_or_else(|| VmError::FrameUnderflow("no active frame".to_string()))?;
        Ok((frame, &mut self.stack))
    }

    /// Looks a context up by name, asking the host on a miss.
    pub fn find_context(&mut self, name: &str) -> Option<ContextRef> {
        if let Some(context) = self.contexts.get(name) {
            return Some(Arc::clone(context));
        }

        let context: ContextRef = Arc::new(self.host.load_context(name)?);
        debug!("loaded context {} as {}", name, context.address());
        self.contexts.insert(name.to_string(), Arc::clone(&context));
        Some(context)
    }

    /// Makes a context resolvable by its name without going through the host.
    pub fn register_context(&mut self, context: ExecutionContext) -> ContextRef {
        let context = Arc::new(context);
        self.contexts
            .insert(context.name().to_string(), Arc::clone(&context));
        context
    }

    pub fn stack(&self) -> &EvaluationStack {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut EvaluationStack {
        &mut self.stack
    }

    /// Top of the value stack, the conventional result of a script.
    pub fn result(&self) -> Option<&Value> {
        self.stack.peek(0).ok()
    }

    pub fn entry_address(&self) -> Address {
        self.entry_address
    }

    pub fn entry_context(&self) -> &ContextRef {
        &self.entry_context
    }

    pub fn current_context(&self) -> &ContextRef {
        &self.current_context
    }

    pub fn previous_context(&self) -> &ContextRef {
        &self.previous_context
    }

    pub fn active_addresses(&self) -> &[Address] {
        &self.active_addresses
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn settings(&self) -> &VmSettings {
        &self.settings
    }

    /// Last state of the entry context.
    pub fn state(&self) -> ExecutionState {
        self.entry_context
            .as_script()
            .map_or(ExecutionState::Running, ScriptContext::state)
    }

    /// Fault message of the entry context, if it faulted.
    pub fn error(&self) -> Option<String> {
        self.entry_context.error()
    }

    /// Renders the VM state for a fault dump.
    pub fn dump(&self) -> Vec<String> {
        let mut lines = Vec::new();

        if let Some(context) = self.current_context.as_script() {
            lines.push(header("CURRENT OFFSET"));
            lines.push(context.instruction_pointer().to_string());
            lines.push(String::new());
        }

        lines.push(header("STACK"));
        lines.extend(self.stack.iter().map(ToString::to_string));
        lines.push(String::new());

        lines.push(header("FRAMES"));
        let active = self.frames.len().saturating_sub(1);
        for (i, frame) in self.frames.iter().enumerate() {
            if i > 0 {
                lines.push(String::new());
            }
            lines.push(format!("Active = {}", i == active));
            lines.push(format!("Context = {}", frame.context().name()));
            lines.push(format!("Entry Offset = {}", frame.offset()));
            lines.push("Registers:".to_string());
            for (index, register) in frame.registers().iter().enumerate() {
                if !register.is_empty() {
                    lines.push(format!("\tR{index} = {register}"));
                }
            }
        }
        lines.push(String::new());

        lines.push(header("DISASM"));
        if let Some(context) = self.entry_context.as_script() {
            let disassembler = Disassembler::new(context.script());
            lines.extend(disassembler.instructions().iter().map(ToString::to_string));
            if let Some(err) = disassembler.error() {
                lines.push(format!("<{err}>"));
            }
        }
        lines.push(String::new());

        self.host.dump_data(&mut lines);
        lines
    }

    pub(crate) fn jump_table(&self) -> &JumpTable<H> {
        &self.jump_table
    }

    pub(crate) fn validate_opcode(&self, opcode: Opcode) -> ExecutionState {
        self.host.validate_opcode(opcode)
    }

    pub(crate) fn execute_interop(&mut self, method: &str) -> VmResult<ExecutionState> {
        debug!("extcall {} from {}", method, self.current_context.name());
        let Self {
            host,
            stack,
            current_context,
            entry_address,
            active_addresses,
            ..
        } = self;
        let mut scope = InteropScope::new(
            stack,
            &*current_context,
            *entry_address,
            active_addresses.as_slice(),
        );
        host.execute_interop(method, &mut scope)
            .map_err(|err| escalate(method, err))
    }

    pub(crate) fn on_debug(&mut self, offset: u32) -> VmResult<ExecutionState> {
        let Self { host, frames, .. } = self;
        let frame = frames
            .last()
            .ok_or_else(|| VmError::FrameUnderflow("no active frame".to_string()))?;
        host.on_debug(offset, frame)
            .map_err(|err| escalate("on_debug", err))
    }
}

/// Errors raised by the host are never script faults.
fn escalate(hook: &str, err: VmError) -> VmError {
    if err.is_fatal() {
        err
    } else {
        error!("host hook {hook} failed: {err}");
        VmError::Host(format!("{hook}: {err}"))
    }
}

fn header(title: &str) -> String {
    format!("*********{title}*********")
}
