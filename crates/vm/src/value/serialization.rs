//! Binary form of values used by `PACK`, `UNPACK` and struct payloads.
//!
//! Every value starts with its [`VMType`] tag followed by a type specific
//! payload. Objects have no binary form.

use super::{StructMap, Value};
use crate::error::{VmError, VmResult};
use crate::vm_type::VMType;
use num_bigint::BigInt;
use phantasma_io::{BinaryWriter, IoError, MemoryReader};

/// Deepest struct nesting accepted in either direction.
pub const MAX_STRUCT_DEPTH: usize = 64;

fn malformed(err: IoError) -> VmError {
    VmError::serialization(err.to_string())
}

impl Value {
    pub fn serialize(&self) -> VmResult<Vec<u8>> {
        let mut writer = BinaryWriter::new();
        self.write_to(&mut writer, 0)?;
        Ok(writer.into_inner())
    }

    /// Decodes exactly one value; trailing bytes are an error.
    pub fn deserialize(bytes: &[u8]) -> VmResult<Value> {
        let mut reader = MemoryReader::new(bytes);
        let value = Self::read_from(&mut reader, 0)?;
        if reader.remaining() != 0 {
            return Err(VmError::serialization(format!(
                "{} trailing bytes after value",
                reader.remaining()
            )));
        }
        Ok(value)
    }

    fn write_to(&self, writer: &mut BinaryWriter, depth: usize) -> VmResult<()> {
        if depth > MAX_STRUCT_DEPTH {
            return Err(VmError::serialization("struct nesting too deep"));
        }

        writer.write_u8(self.vm_type().into());
        match self {
            Value::None => {}
            Value::Struct(children) => {
                writer.write_var_int(children.len() as u64);
                for (key, value) in children {
                    key.write_to(writer, depth + 1)?;
                    value.write_to(writer, depth + 1)?;
                }
            }
            Value::Bytes(bytes) => {
                writer.write_var_bytes(bytes);
            }
            Value::Number(n) => {
                writer.write_var_bytes(&n.to_signed_bytes_le());
            }
            Value::String(s) => {
                writer.write_var_string(s);
            }
            Value::Timestamp(t) => {
                writer.write_u32(*t);
            }
            Value::Bool(b) => {
                writer.write_u8(u8::from(*b));
            }
            Value::Enum(e) => {
                writer.write_var_int(u64::from(*e));
            }
            Value::Object(object) => {
                return Err(VmError::serialization(format!(
                    "cannot serialize interop object {}",
                    object.interface_type()
                )));
            }
        }
        Ok(())
    }

    fn read_from(reader: &mut MemoryReader<'_>, depth: usize) -> VmResult<Value> {
        if depth > MAX_STRUCT_DEPTH {
            return Err(VmError::serialization("struct nesting too deep"));
        }

        let tag = reader.read_u8().map_err(malformed)?;
        let vm_type = VMType::try_from(tag)
            .map_err(|_| VmError::serialization(format!("unknown type tag {tag}")))?;
        // no length can exceed what is left of the input
        let limit = reader.remaining() as u64;

        let value = match vm_type {
            VMType::None => Value::None,
            VMType::Struct => {
                let count = reader.read_var_int(limit).map_err(malformed)?;
                let mut children = StructMap::with_capacity(count as usize);
                for _ in 0..count {
                    let key = Self::read_from(reader, depth + 1)?;
                    let value = Self::read_from(reader, depth + 1)?;
                    children.insert(key, value);
                }
                Value::Struct(children)
            }
            VMType::Bytes => Value::Bytes(reader.read_var_bytes(limit).map_err(malformed)?.to_vec()),
            VMType::Number => {
                let bytes = reader.read_var_bytes(limit).map_err(malformed)?;
                Value::Number(BigInt::from_signed_bytes_le(bytes))
            }
            VMType::String => Value::String(reader.read_var_string(limit).map_err(malformed)?),
            VMType::Timestamp => Value::Timestamp(reader.read_u32().map_err(malformed)?),
            VMType::Bool => Value::Bool(reader.read_u8().map_err(malformed)? != 0),
            VMType::Enum => {
                let raw = reader.read_var_int(u64::from(u32::MAX)).map_err(malformed)?;
                Value::Enum(raw as u32)
            }
            VMType::Object => {
                return Err(VmError::serialization("interop objects cannot be deserialized"))
            }
        };
        Ok(value)
    }
}
