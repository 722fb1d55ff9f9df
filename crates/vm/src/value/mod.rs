//! The tagged value held by registers and the shared stack.

mod interop;
mod serialization;

pub use interop::InteropInterface;
pub use serialization::MAX_STRUCT_DEPTH;

use crate::error::{VmError, VmResult};
use crate::vm_type::VMType;
use indexmap::IndexMap;
use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Ordered key/value children of a struct value.
pub type StructMap = IndexMap<Value, Value>;

/// A register or stack slot.
///
/// Values own their children, so `clone` is the deep copy used by `COPY` and
/// `PUSH`. The only shared payload is `Object`, whose handle is immutable.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    None,
    Struct(StructMap),
    Bytes(Vec<u8>),
    Number(BigInt),
    String(String),
    Timestamp(u32),
    Bool(bool),
    Enum(u32),
    Object(Arc<dyn InteropInterface>),
}

impl Value {
    pub fn vm_type(&self) -> VMType {
        match self {
            Value::None => VMType::None,
            Value::Struct(_) => VMType::Struct,
            Value::Bytes(_) => VMType::Bytes,
            Value::Number(_) => VMType::Number,
            Value::String(_) => VMType::String,
            Value::Timestamp(_) => VMType::Timestamp,
            Value::Bool(_) => VMType::Bool,
            Value::Enum(_) => VMType::Enum,
            Value::Object(_) => VMType::Object,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn from_interop<T: InteropInterface>(object: Arc<T>) -> Self {
        Value::Object(object)
    }

    pub fn as_bool(&self) -> VmResult<bool> {
        match self {
            Value::None => Ok(false),
            Value::Bool(b) => Ok(*b),
            Value::Number(n) => Ok(!n.is_zero()),
            Value::Enum(e) => Ok(*e != 0),
            Value::Bytes(bytes) => Ok(bytes.iter().any(|b| *b != 0)),
            Value::String(s) => {
                if s.eq_ignore_ascii_case("true") {
                    Ok(true)
                } else if s.eq_ignore_ascii_case("false") {
                    Ok(false)
                } else {
                    Err(VmError::type_mismatch(format!(
                        "string '{s}' is not a boolean"
                    )))
                }
            }
            other => Err(VmError::cannot_convert(other.vm_type(), "Bool")),
        }
    }

    pub fn as_number(&self) -> VmResult<BigInt> {
        match self {
            Value::Number(n) => Ok(n.clone()),
            Value::Bool(b) => Ok(BigInt::from(u8::from(*b))),
            Value::Enum(e) | Value::Timestamp(e) => Ok(BigInt::from(*e)),
            Value::Bytes(bytes) => Ok(BigInt::from_signed_bytes_le(bytes)),
            Value::String(s) => parse_decimal(s)
                .ok_or_else(|| VmError::type_mismatch(format!("string '{s}' is not a number"))),
            other => Err(VmError::cannot_convert(other.vm_type(), "Number")),
        }
    }

    pub fn as_string(&self) -> VmResult<String> {
        match self {
            Value::None => Ok(String::new()),
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Enum(e) | Value::Timestamp(e) => Ok(e.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Bytes(bytes) => String::from_utf8(bytes.clone())
                .map_err(|_| VmError::type_mismatch("bytes are not valid UTF-8")),
            other => Err(VmError::cannot_convert(other.vm_type(), "String")),
        }
    }

    /// Canonical byte projection used by the splice opcodes.
    pub fn as_byte_array(&self) -> VmResult<Vec<u8>> {
        match self {
            Value::None => Ok(Vec::new()),
            Value::Bytes(bytes) => Ok(bytes.clone()),
            Value::String(s) => Ok(s.as_bytes().to_vec()),
            Value::Number(n) => Ok(n.to_signed_bytes_le()),
            Value::Bool(b) => Ok(vec![u8::from(*b)]),
            Value::Enum(e) | Value::Timestamp(e) => Ok(e.to_le_bytes().to_vec()),
            Value::Struct(_) => self.serialize(),
            Value::Object(_) => Err(VmError::cannot_convert(VMType::Object, "Bytes")),
        }
    }

    /// Downcasts an `Object` value to the host type it carries.
    pub fn as_interop<T: InteropInterface>(&self) -> VmResult<Arc<T>> {
        match self {
            Value::Object(object) => {
                let found = object.interface_type().to_string();
                Arc::clone(object)
                    .into_any()
                    .downcast::<T>()
                    .map_err(|_| VmError::type_mismatch(format!("unexpected interop object {found}")))
            }
            other => Err(VmError::cannot_convert(other.vm_type(), "Object")),
        }
    }

    /// Builds a value of `vm_type` from raw bytes, as `LOAD` does.
    pub fn from_bytes_typed(bytes: &[u8], vm_type: VMType) -> VmResult<Value> {
        match vm_type {
            VMType::None => Ok(Value::None),
            VMType::Bytes => Ok(Value::Bytes(bytes.to_vec())),
            VMType::Number => Ok(Value::Number(BigInt::from_signed_bytes_le(bytes))),
            VMType::String => String::from_utf8(bytes.to_vec())
                .map(Value::String)
                .map_err(|_| VmError::type_mismatch("string payload is not valid UTF-8")),
            VMType::Bool => match bytes {
                [b] => Ok(Value::Bool(*b != 0)),
                _ => Err(VmError::type_mismatch(format!(
                    "bool payload must be 1 byte, got {}",
                    bytes.len()
                ))),
            },
            VMType::Timestamp => Self::read_u32_payload(bytes).map(Value::Timestamp),
            VMType::Enum => Self::read_u32_payload(bytes).map(Value::Enum),
            VMType::Struct => match Value::deserialize(bytes)? {
                value @ Value::Struct(_) => Ok(value),
                other => Err(VmError::cannot_convert(other.vm_type(), "Struct")),
            },
            VMType::Object => Err(VmError::type_mismatch("objects cannot be loaded from bytes")),
        }
    }

    fn read_u32_payload(bytes: &[u8]) -> VmResult<u32> {
        if bytes.len() > 4 {
            return Err(VmError::type_mismatch(format!(
                "32-bit payload too long: {} bytes",
                bytes.len()
            )));
        }
        let mut buf = [0u8; 4];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(u32::from_le_bytes(buf))
    }

    /// Explicit conversion used by `CAST`.
    pub fn cast_to(&self, target: VMType) -> VmResult<Value> {
        if self.vm_type() == target {
            return Ok(self.clone());
        }

        match target {
            VMType::None => Ok(Value::None),
            VMType::Bool => self.as_bool().map(Value::Bool),
            VMType::Number => self.as_number().map(Value::Number),
            VMType::String => self.as_string().map(Value::String),
            VMType::Bytes => self.as_byte_array().map(Value::Bytes),
            VMType::Timestamp | VMType::Enum => {
                let number = self.as_number()?;
                let raw = number.to_u32().ok_or_else(|| {
                    VmError::type_mismatch(format!("{number} does not fit {target}"))
                })?;
                Ok(if target == VMType::Timestamp {
                    Value::Timestamp(raw)
                } else {
                    Value::Enum(raw)
                })
            }
            VMType::Struct => match self {
                Value::Bytes(bytes) => Value::from_bytes_typed(bytes, VMType::Struct),
                other => Err(VmError::cannot_convert(other.vm_type(), "Struct")),
            },
            VMType::Object => Err(VmError::cannot_convert(self.vm_type(), "Object")),
        }
    }

    pub fn children(&self) -> Option<&StructMap> {
        match self {
            Value::Struct(children) => Some(children),
            _ => None,
        }
    }

    /// Looks up a struct field. A missing field reads as `None`.
    pub fn get_key(&self, key: &Value) -> VmResult<Value> {
        if key.is_empty() {
            return Err(VmError::type_mismatch("invalid key type"));
        }
        match self {
            Value::Struct(children) => Ok(children.get(key).cloned().unwrap_or_default()),
            other => Err(VmError::cannot_convert(other.vm_type(), "Struct")),
        }
    }

    /// Number of struct levels in this value; scalars are 0.
    pub fn depth(&self) -> usize {
        match self {
            Value::Struct(children) => {
                1 + children
                    .iter()
                    .map(|(key, value)| key.depth().max(value.depth()))
                    .max()
                    .unwrap_or(0)
            }
            _ => 0,
        }
    }

    /// Sets a struct field. An empty value becomes an empty struct first.
    ///
    /// The resulting struct may not nest deeper than [`MAX_STRUCT_DEPTH`].
    pub fn set_key(&mut self, key: Value, value: Value) -> VmResult<()> {
        if key.is_empty() {
            return Err(VmError::type_mismatch("invalid key type"));
        }
        let depth = 1 + key.depth().max(value.depth());
        if depth > MAX_STRUCT_DEPTH {
            return Err(VmError::invalid_operation(format!(
                "struct nesting of {depth} exceeds {MAX_STRUCT_DEPTH} levels"
            )));
        }
        if self.is_empty() {
            *self = Value::Struct(StructMap::new());
        }
        match self {
            Value::Struct(children) => {
                children.insert(key, value);
                Ok(())
            }
            other => Err(VmError::cannot_convert(other.vm_type(), "Struct")),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Struct(a), Value::Struct(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
            }
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => {
                Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
            }
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        u8::from(self.vm_type()).hash(state);
        match self {
            Value::None => {}
            Value::Struct(children) => {
                children.len().hash(state);
                for (key, value) in children {
                    key.hash(state);
                    value.hash(state);
                }
            }
            Value::Bytes(bytes) => bytes.hash(state),
            Value::Number(n) => n.hash(state),
            Value::String(s) => s.hash(state),
            Value::Timestamp(v) | Value::Enum(v) => v.hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Object(object) => (Arc::as_ptr(object) as *const () as usize).hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Struct(children) => {
                f.write_str("Struct: {")?;
                for (i, (key, value)) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key} => {value}")?;
                }
                f.write_str("}")
            }
            Value::Bytes(bytes) => write!(f, "Bytes: 0x{}", hex::encode(bytes)),
            Value::Number(n) => write!(f, "Number: {n}"),
            Value::String(s) => write!(f, "String: \"{s}\""),
            Value::Timestamp(t) => write!(f, "Timestamp: {t}"),
            Value::Bool(b) => write!(f, "Bool: {b}"),
            Value::Enum(e) => write!(f, "Enum: {e}"),
            Value::Object(object) => write!(f, "Object: {}", object.interface_type()),
        }
    }
}

/// Optional `-` followed by ASCII digits, nothing else.
fn parse_decimal(s: &str) -> Option<BigInt> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<BigInt>().ok()
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(BigInt::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}
