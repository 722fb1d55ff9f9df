//! One activation of a script context.
//!
//! The interpreter owns the decode cursor of the activation and borrows the
//! VM for the duration of the run. Opcode handlers in [`crate::jump_table`]
//! receive it mutably and read their own operands through it.

use crate::error::{VmError, VmResult};
use crate::execution_context::ContextRef;
use crate::execution_frame::ExecutionFrame;
use crate::host::VmHost;
use crate::op_code::Opcode;
use crate::script_context::{ScriptContext, ScriptRuntime};
use crate::value::Value;
use crate::virtual_machine::VirtualMachine;
use crate::vm_state::ExecutionState;
use crate::vm_type::VMType;
use log::{error, trace, warn};
use phantasma_io::MemoryReader;

pub(crate) struct Interpreter<'a, H: VmHost> {
    vm: &'a mut VirtualMachine<H>,
    context: &'a ScriptContext,
    this: ContextRef,
    reader: MemoryReader<'a>,
    state: ExecutionState,
    error: Option<String>,
    opcode: u8,
    base_depth: usize,
}

impl<'a, H: VmHost> Interpreter<'a, H> {
    pub(crate) fn new(
        vm: &'a mut VirtualMachine<H>,
        context: &'a ScriptContext,
        this: ContextRef,
    ) -> Self {
        let base_depth = vm.frames().len();
        Self {
            vm,
            context,
            this,
            reader: MemoryReader::new(context.script()),
            state: ExecutionState::Running,
            error: None,
            opcode: Opcode::NOP.as_u8(),
            base_depth,
        }
    }

    /// Steps until the activation leaves `Running`.
    ///
    /// Script errors end in `Ok(Fault)`; fatal errors are returned as `Err`.
    pub(crate) fn run(&mut self) -> VmResult<ExecutionState> {
        if let Err(err) = self.reader.seek(self.context.entry_offset() as usize) {
            self.fault(err.into());
        }
        self.publish();

        while self.state.is_running() {
            if let Err(err) = self.step() {
                if err.is_fatal() {
                    error!(
                        "fatal error in context {} @ {}: {}",
                        self.context.name(),
                        self.position(),
                        err
                    );
                    self.publish();
                    return Err(err);
                }
                self.fault(err);
            }
        }

        self.publish();
        Ok(self.state)
    }

    fn step(&mut self) -> VmResult<()> {
        let byte = self.reader.read_u8()?;
        self.opcode = byte;
        let opcode = Opcode::try_from(byte).map_err(|_| VmError::UnknownOpcode(byte))?;

        if !self.vm.validate_opcode(opcode).is_running() {
            return Err(VmError::DisallowedOpcode(opcode));
        }

        trace!(
            "{} {:03}: {}",
            self.context.name(),
            self.reader.position() - 1,
            opcode
        );

        let handler = self.vm.jump_table().get(opcode);
        match handler {
            Some(handler) => handler(self),
            None => Err(VmError::UnknownOpcode(byte)),
        }
    }

    fn opcode_name(&self) -> String {
        match Opcode::try_from(self.opcode) {
            Ok(opcode) => opcode.to_string(),
            Err(_) => format!("0x{:02X}", self.opcode),
        }
    }

    fn fault(&mut self, err: VmError) {
        self.fault_with(err.to_string());
    }

    /// Moves the activation to `Fault` without unwinding the current handler.
    pub(crate) fn fault_with(&mut self, reason: impl std::fmt::Display) {
        let message = format!(
            "Script execution failed: {} @ {} : {}",
            reason,
            self.opcode_name(),
            self.position()
        );
        warn!("{}", message);
        self.state = ExecutionState::Fault;
        self.error = Some(message);
    }

    fn publish(&self) {
        self.context.publish(ScriptRuntime {
            instruction_pointer: self.position(),
            state: self.state,
            error: self.error.clone(),
        });
    }

    /// Makes the cursor visible to the host before control leaves the loop.
    pub(crate) fn sync_pointer(&self) {
        self.context.publish_pointer(self.position());
    }

    pub(crate) fn position(&self) -> u32 {
        self.reader.position() as u32
    }

    pub(crate) fn script_len(&self) -> usize {
        self.context.script().len()
    }

    pub(crate) fn jump_to(&mut self, offset: usize) -> VmResult<()> {
        self.reader.seek(offset)?;
        Ok(())
    }

    /// Checks a jump target against the script bounds.
    pub(crate) fn check_target(&self, offset: i64) -> VmResult<usize> {
        if offset < 0 || offset as usize >= self.script_len() {
            return Err(VmError::OutOfScriptRange {
                offset,
                length: self.script_len(),
            });
        }
        Ok(offset as usize)
    }

    pub(crate) fn opcode(&self) -> Opcode {
        Opcode::try_from(self.opcode).unwrap_or(Opcode::NOP)
    }

    pub(crate) fn set_state(&mut self, state: ExecutionState) {
        self.state = state;
    }

    /// Frame depth at which this activation started.
    pub(crate) fn base_depth(&self) -> usize {
        self.base_depth
    }

    pub(crate) fn this(&self) -> &ContextRef {
        &self.this
    }

    pub(crate) fn vm(&self) -> &VirtualMachine<H> {
        &*self.vm
    }

    pub(crate) fn vm_mut(&mut self) -> &mut VirtualMachine<H> {
        &mut *self.vm
    }

    pub(crate) fn read_u8(&mut self) -> VmResult<u8> {
        Ok(self.reader.read_u8()?)
    }

    #[inline]
    pub(crate) fn read_register(&mut self) -> VmResult<u8> {
        self.read_u8()
    }

    pub(crate) fn read_u16(&mut self) -> VmResult<u16> {
        Ok(self.reader.read_u16()?)
    }

    pub(crate) fn read_i16(&mut self) -> VmResult<i16> {
        Ok(self.reader.read_i16()?)
    }

    /// Reads a variable-length operand bounded by the configured limit.
    pub(crate) fn read_length(&mut self) -> VmResult<usize> {
        let max = self.vm.settings().max_operand_length;
        Ok(self.reader.read_var_int(max)? as usize)
    }

    pub(crate) fn read_bytes(&mut self, count: usize) -> VmResult<&'a [u8]> {
        Ok(self.reader.read_bytes(count)?)
    }

    pub(crate) fn read_type(&mut self) -> VmResult<VMType> {
        let tag = self.read_u8()?;
        VMType::try_from(tag).map_err(|_| VmError::type_mismatch(format!("unknown type tag {tag}")))
    }

    pub(crate) fn frame(&self) -> VmResult<&ExecutionFrame> {
        self.vm
            .current_frame()
            .ok_or_else(|| VmError::FrameUnderflow("no active frame".to_string()))
    }

    pub(crate) fn frame_mut(&mut self) -> VmResult<&mut ExecutionFrame> {
        self.vm
            .current_frame_mut()
            .ok_or_else(|| VmError::FrameUnderflow("no active frame".to_string()))
    }

    pub(crate) fn register(&self, index: u8) -> VmResult<&Value> {
        self.frame()?.register(index)
    }

    pub(crate) fn set_register(&mut self, index: u8, value: Value) -> VmResult<()> {
        self.frame_mut()?.set_register(index, value)
    }
}
