//! Jump table module for the Phantasma virtual machine.
//!
//! Maps every opcode byte to the handler that decodes its operands and
//! executes it against the current frame.

pub mod bitwise;
pub mod compound;
pub mod control;
pub mod numeric;
pub mod splice;
pub mod stack;

use crate::error::VmResult;
use crate::host::VmHost;
use crate::interpreter::Interpreter;
use crate::op_code::Opcode;

/// A handler for a VM instruction.
pub(crate) type InstructionHandler<H> = fn(&mut Interpreter<'_, H>) -> VmResult<()>;

/// Represents a jump table for the VM.
pub(crate) struct JumpTable<H: VmHost> {
    /// One slot per possible opcode byte.
    handlers: [Option<InstructionHandler<H>>; 256],
}

impl<H: VmHost> JumpTable<H> {
    pub fn new() -> Self {
        let mut jump_table = Self {
            handlers: [None; 256],
        };

        stack::register_handlers(&mut jump_table);
        control::register_handlers(&mut jump_table);
        splice::register_handlers(&mut jump_table);
        bitwise::register_handlers(&mut jump_table);
        numeric::register_handlers(&mut jump_table);
        compound::register_handlers(&mut jump_table);

        jump_table
    }

    /// Registers a handler for an opcode.
    pub fn register(&mut self, opcode: Opcode, handler: InstructionHandler<H>) {
        self.handlers[opcode.as_u8() as usize] = Some(handler);
    }

    /// Gets the handler for an opcode.
    pub fn get(&self, opcode: Opcode) -> Option<InstructionHandler<H>> {
        self.handlers[opcode.as_u8() as usize]
    }
}

impl<H: VmHost> Default for JumpTable<H> {
    fn default() -> Self {
        Self::new()
    }
}
