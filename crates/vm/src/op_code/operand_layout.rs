/// Operand shape of an opcode.
///
/// Registers are single bytes, `var` values use the variable-length integer
/// encoding bounded by the configured operand limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandLayout {
    /// No operands.
    None,
    /// `reg`
    Reg,
    /// `src, dst`
    RegReg,
    /// `a, b, dst`
    RegRegReg,
    /// `count:u8, offset:u16`
    Call,
    /// `offset:i16`
    Jump,
    /// `src, offset:i16`
    ConditionalJump,
    /// `dst, type:u8, var length, bytes`
    Load,
    /// `src, dst, type:u8`
    Cast,
    /// `src, dst, var length`
    Slice,
    /// `src, dst, var index, var length`
    Range,
}

impl OperandLayout {
    /// Number of register operands.
    pub fn register_count(self) -> usize {
        match self {
            OperandLayout::None | OperandLayout::Call | OperandLayout::Jump => 0,
            OperandLayout::Reg | OperandLayout::ConditionalJump | OperandLayout::Load => 1,
            OperandLayout::RegReg
            | OperandLayout::Cast
            | OperandLayout::Slice
            | OperandLayout::Range => 2,
            OperandLayout::RegRegReg => 3,
        }
    }
}
