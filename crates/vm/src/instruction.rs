//! Instruction module for the Phantasma virtual machine.
//!
//! Execution decodes operands inline; this type exists for disassembly and
//! diagnostics only.

use crate::error::{VmError, VmResult};
use crate::op_code::{OperandLayout, Opcode};
use crate::vm_type::VMType;
use num_bigint::BigInt;
use phantasma_io::MemoryReader;
use std::fmt;

/// A decoded operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Register(u8),
    Number(i64),
    Type(VMType),
    /// `LOAD` payload with the type it is loaded as.
    Data(VMType, Vec<u8>),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(index) => write!(f, "r{index}"),
            Operand::Number(value) => write!(f, "{value}"),
            Operand::Type(vm_type) => write!(f, "{vm_type}"),
            Operand::Data(VMType::String, bytes) => {
                write!(f, "\"{}\"", String::from_utf8_lossy(bytes))
            }
            Operand::Data(VMType::Number, bytes) => {
                write!(f, "{}", BigInt::from_signed_bytes_le(bytes))
            }
            Operand::Data(_, bytes) => write!(f, "0x{}", hex::encode(bytes)),
        }
    }
}

/// An opcode at an offset together with its operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub offset: u32,
    pub opcode: Opcode,
    pub args: Vec<Operand>,
}

impl Instruction {
    /// Decodes the instruction at the reader's position.
    pub fn parse(reader: &mut MemoryReader<'_>, max_length: u64) -> VmResult<Self> {
        let offset = reader.position() as u32;
        let byte = reader.read_u8()?;
        let opcode = Opcode::try_from(byte).map_err(|_| VmError::UnknownOpcode(byte))?;

        let mut args = Vec::with_capacity(opcode.layout().register_count() + 2);
        let register = |reader: &mut MemoryReader<'_>| -> VmResult<Operand> {
            Ok(Operand::Register(reader.read_u8()?))
        };

        match opcode.layout() {
            OperandLayout::None => {}
            OperandLayout::Reg => args.push(register(reader)?),
            OperandLayout::RegReg => {
                args.push(register(reader)?);
                args.push(register(reader)?);
            }
            OperandLayout::RegRegReg => {
                args.push(register(reader)?);
                args.push(register(reader)?);
                args.push(register(reader)?);
            }
            OperandLayout::Call => {
                args.push(Operand::Number(i64::from(reader.read_u8()?)));
                args.push(Operand::Number(i64::from(reader.read_u16()?)));
            }
            OperandLayout::Jump => {
                args.push(Operand::Number(i64::from(reader.read_i16()?)));
            }
            OperandLayout::ConditionalJump => {
                args.push(register(reader)?);
                args.push(Operand::Number(i64::from(reader.read_i16()?)));
            }
            OperandLayout::Load => {
                args.push(register(reader)?);
                let vm_type = read_type(reader)?;
                let bytes = reader.read_var_bytes(max_length)?;
                args.push(Operand::Data(vm_type, bytes.to_vec()));
            }
            OperandLayout::Cast => {
                args.push(register(reader)?);
                args.push(register(reader)?);
                args.push(Operand::Type(read_type(reader)?));
            }
            OperandLayout::Slice => {
                args.push(register(reader)?);
                args.push(register(reader)?);
                args.push(Operand::Number(reader.read_var_int(max_length)? as i64));
            }
            OperandLayout::Range => {
                args.push(register(reader)?);
                args.push(register(reader)?);
                args.push(Operand::Number(reader.read_var_int(max_length)? as i64));
                args.push(Operand::Number(reader.read_var_int(max_length)? as i64));
            }
        }

        Ok(Self {
            offset,
            opcode,
            args,
        })
    }
}

fn read_type(reader: &mut MemoryReader<'_>) -> VmResult<VMType> {
    let tag = reader.read_u8()?;
    VMType::try_from(tag).map_err(|_| VmError::type_mismatch(format!("unknown type tag {tag}")))
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}: {}", self.offset, self.opcode)?;
        for (i, arg) in self.args.iter().enumerate() {
            let separator = if i == 0 { " " } else { ", " };
            write!(f, "{separator}{arg}")?;
        }
        Ok(())
    }
}
