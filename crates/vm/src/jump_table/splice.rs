//! Byte slicing and measurement.

use crate::error::{VmError, VmResult};
use crate::host::VmHost;
use crate::interpreter::Interpreter;
use crate::jump_table::JumpTable;
use crate::op_code::Opcode;
use crate::value::Value;
use num_bigint::BigInt;

/// Registers the splice handlers.
pub(crate) fn register_handlers<H: VmHost>(jump_table: &mut JumpTable<H>) {
    jump_table.register(Opcode::CAT, cat);
    jump_table.register(Opcode::RANGE, range);
    jump_table.register(Opcode::LEFT, left);
    jump_table.register(Opcode::RIGHT, right);
    jump_table.register(Opcode::SIZE, size);
    jump_table.register(Opcode::COUNT, count);
}

/// CAT a, b, dst
fn cat<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    let a = interpreter.read_register()?;
    let b = interpreter.read_register()?;
    let dst = interpreter.read_register()?;

    let result = concat(interpreter.register(a)?, interpreter.register(b)?)?;
    interpreter.set_register(dst, result)
}

fn concat(a: &Value, b: &Value) -> VmResult<Value> {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ok(Value::None),
        (true, false) => return Ok(b.clone()),
        (false, true) => return Ok(a.clone()),
        (false, false) => {}
    }

    if a.vm_type() != b.vm_type() {
        return Err(VmError::type_mismatch(format!(
            "invalid cast during concat opcode: {} and {}",
            a.vm_type(),
            b.vm_type()
        )));
    }

    let mut bytes = a.as_byte_array()?;
    bytes.extend_from_slice(&b.as_byte_array()?);
    Value::from_bytes_typed(&bytes, a.vm_type())
}

/// RANGE src, dst, index, length: the length is clamped to the source.
fn range<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    let src = interpreter.read_register()?;
    let dst = interpreter.read_register()?;
    let index = interpreter.read_length()?;
    let mut len = interpreter.read_length()?;

    let source = interpreter.register(src)?;
    let bytes = source.as_byte_array()?;
    if len > bytes.len() {
        return Err(VmError::invalid_operation(format!(
            "invalid length {len} for {} bytes",
            bytes.len()
        )));
    }

    if index.saturating_add(len) > bytes.len() {
        len = bytes.len().saturating_sub(index);
        if len == 0 {
            return Err(VmError::invalid_operation(format!(
                "empty range at index {index}"
            )));
        }
    }

    let result = Value::from_bytes_typed(&bytes[index..index + len], source.vm_type())?;
    interpreter.set_register(dst, result)
}

fn left<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    edge(interpreter, false)
}

fn right<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    edge(interpreter, true)
}

/// LEFT/RIGHT src, dst, length: always produce bytes.
fn edge<H: VmHost>(interpreter: &mut Interpreter<'_, H>, from_end: bool) -> VmResult<()> {
    let src = interpreter.read_register()?;
    let dst = interpreter.read_register()?;
    let len = interpreter.read_length()?;

    let bytes = interpreter.register(src)?.as_byte_array()?;
    if len > bytes.len() {
        return Err(VmError::invalid_operation(format!(
            "invalid length {len} for {} bytes",
            bytes.len()
        )));
    }

    let slice = if from_end {
        &bytes[bytes.len() - len..]
    } else {
        &bytes[..len]
    };
    interpreter.set_register(dst, Value::Bytes(slice.to_vec()))
}

/// SIZE src, dst
fn size<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    let src = interpreter.read_register()?;
    let dst = interpreter.read_register()?;

    let size = match interpreter.register(src)? {
        Value::String(s) => s.chars().count(),
        Value::Timestamp(_) | Value::Number(_) | Value::Enum(_) | Value::Bool(_) => 1,
        Value::None => 0,
        other => other.as_byte_array()?.len(),
    };
    interpreter.set_register(dst, Value::Number(BigInt::from(size)))
}

/// COUNT src, dst
fn count<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    let src = interpreter.read_register()?;
    let dst = interpreter.read_register()?;

    let count = match interpreter.register(src)? {
        Value::Struct(children) => children.len(),
        Value::None => 0,
        _ => 1,
    };
    interpreter.set_register(dst, Value::Number(BigInt::from(count)))
}
