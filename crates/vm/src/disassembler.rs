//! Whole-script disassembly for fault dumps and tooling.

use crate::error::VmError;
use crate::instruction::Instruction;
use phantasma_config::MAX_OPERAND_LENGTH;
use phantasma_io::MemoryReader;

/// Decodes a script front to back.
///
/// Decoding stops at the first malformed instruction; everything before it
/// is kept and the error is available through [`Disassembler::error`].
#[derive(Debug, Clone)]
pub struct Disassembler {
    instructions: Vec<Instruction>,
    error: Option<VmError>,
}

impl Disassembler {
    pub fn new(script: &[u8]) -> Self {
        Self::with_max_length(script, MAX_OPERAND_LENGTH)
    }

    pub fn with_max_length(script: &[u8], max_length: u64) -> Self {
        let mut reader = MemoryReader::new(script);
        let mut instructions = Vec::new();
        let mut error = None;

        while reader.remaining() > 0 {
            match Instruction::parse(&mut reader, max_length) {
                Ok(instruction) => instructions.push(instruction),
                Err(err) => {
                    error = Some(err);
                    break;
                }
            }
        }

        Self {
            instructions,
            error,
        }
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn error(&self) -> Option<&VmError> {
        self.error.as_ref()
    }

    pub fn into_instructions(self) -> Vec<Instruction> {
        self.instructions
    }
}
