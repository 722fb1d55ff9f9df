//! Phantasma.IO
//!
//! Binary primitives shared by the script decoder, the disassembler, the
//! script builder and value serialization. All multi-byte integers are
//! little-endian and variable-length integers use the `0xFD`/`0xFE`/`0xFF`
//! prefix scheme of the transport encoding.

mod binary_writer;
mod error;
mod memory_reader;

pub use binary_writer::BinaryWriter;
pub use error::{IoError, IoResult};
pub use memory_reader::MemoryReader;
