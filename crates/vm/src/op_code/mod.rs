//! Opcode table of the Phantasma virtual machine.

mod operand_layout;

pub use operand_layout::OperandLayout;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum::{Display, EnumCount, EnumIter, EnumString};

/// Instruction set. The discriminant is the byte emitted into scripts.
#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    TryFromPrimitive,
    IntoPrimitive,
    Display,
    EnumIter,
    EnumString,
    EnumCount,
)]
#[repr(u8)]
pub enum Opcode {
    NOP = 0,

    // register
    MOVE = 1,
    COPY = 2,
    PUSH = 3,
    POP = 4,
    SWAP = 5,

    // flow
    CALL = 6,
    EXTCALL = 7,
    JMP = 8,
    JMPIF = 9,
    JMPNOT = 10,
    RET = 11,
    THROW = 12,

    // data
    LOAD = 13,
    CAST = 14,
    CAT = 15,
    RANGE = 16,
    LEFT = 17,
    RIGHT = 18,
    SIZE = 19,
    COUNT = 20,

    // logical
    NOT = 21,
    AND = 22,
    OR = 23,
    XOR = 24,
    EQUAL = 25,
    LT = 26,
    GT = 27,
    LTE = 28,
    GTE = 29,

    // numeric
    INC = 30,
    DEC = 31,
    SIGN = 32,
    NEGATE = 33,
    ABS = 34,
    ADD = 35,
    SUB = 36,
    MUL = 37,
    DIV = 38,
    MOD = 39,
    SHL = 40,
    SHR = 41,
    MIN = 42,
    MAX = 43,
    POW = 44,

    // context
    CTX = 45,
    SWITCH = 46,

    // struct
    PUT = 47,
    GET = 48,
    CLEAR = 49,
    UNPACK = 50,
    PACK = 51,

    DEBUG = 52,
}

impl Opcode {
    #[inline]
    pub fn as_u8(self) -> u8 {
        self.into()
    }

    pub fn is_valid(byte: u8) -> bool {
        Opcode::try_from(byte).is_ok()
    }

    /// Shape of the operands that follow the opcode byte.
    pub fn layout(self) -> OperandLayout {
        use Opcode::*;
        match self {
            NOP | RET | DEBUG => OperandLayout::None,
            PUSH | POP | EXTCALL | THROW | INC | DEC | SWITCH | CLEAR => OperandLayout::Reg,
            MOVE | COPY | SWAP | SIZE | COUNT | NOT | SIGN | NEGATE | ABS | CTX | UNPACK
            | PACK => OperandLayout::RegReg,
            CAT | AND | OR | XOR | EQUAL | LT | GT | LTE | GTE | ADD | SUB | MUL | DIV | MOD
            | SHL | SHR | MIN | MAX | POW | PUT | GET => OperandLayout::RegRegReg,
            CALL => OperandLayout::Call,
            JMP => OperandLayout::Jump,
            JMPIF | JMPNOT => OperandLayout::ConditionalJump,
            LOAD => OperandLayout::Load,
            CAST => OperandLayout::Cast,
            LEFT | RIGHT => OperandLayout::Slice,
            RANGE => OperandLayout::Range,
        }
    }
}
