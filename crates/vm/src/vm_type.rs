use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum::Display;

/// Type tag of a [`Value`](crate::Value).
///
/// The numeric tags are part of the bytecode: `LOAD` and `CAST` carry them as
/// operands and `PACK` writes them in front of every serialized value.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, TryFromPrimitive, IntoPrimitive, Display,
)]
#[repr(u8)]
pub enum VMType {
    None = 0,
    Struct = 1,
    Bytes = 2,
    Number = 3,
    String = 4,
    Timestamp = 5,
    Bool = 6,
    Enum = 7,
    Object = 8,
}
