//! Boolean logic, bitwise operations and equality.

use crate::error::{VmError, VmResult};
use crate::host::VmHost;
use crate::interpreter::Interpreter;
use crate::jump_table::JumpTable;
use crate::op_code::Opcode;
use crate::value::Value;
use num_bigint::BigInt;
use num_traits::ToPrimitive;

/// Registers the bitwise and equality handlers.
pub(crate) fn register_handlers<H: VmHost>(jump_table: &mut JumpTable<H>) {
    jump_table.register(Opcode::NOT, not);
    jump_table.register(Opcode::AND, and);
    jump_table.register(Opcode::OR, or);
    jump_table.register(Opcode::XOR, xor);
    jump_table.register(Opcode::EQUAL, equal);
}

fn not<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    let src = interpreter.read_register()?;
    let dst = interpreter.read_register()?;

    let value = !interpreter.register(src)?.as_bool()?;
    interpreter.set_register(dst, Value::Bool(value))
}

fn and<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    logical(interpreter, Opcode::AND)
}

fn or<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    logical(interpreter, Opcode::OR)
}

fn xor<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    logical(interpreter, Opcode::XOR)
}

fn apply<T>(opcode: Opcode, a: T, b: T) -> T
where
    T: std::ops::BitAnd<Output = T> + std::ops::BitOr<Output = T> + std::ops::BitXor<Output = T>,
{
    match opcode {
        Opcode::AND => a & b,
        Opcode::OR => a | b,
        _ => a ^ b,
    }
}

/// AND/OR/XOR a, b, dst.
///
/// Enums only support AND; OR and XOR on enums fault the context without
/// raising an error, and `dst` still receives the AND result.
fn logical<H: VmHost>(interpreter: &mut Interpreter<'_, H>, opcode: Opcode) -> VmResult<()> {
    let a = interpreter.read_register()?;
    let b = interpreter.read_register()?;
    let dst = interpreter.read_register()?;

    let left = interpreter.register(a)?.clone();
    let right = interpreter.register(b)?.clone();

    let result = match (&left, &right) {
        (Value::Bool(x), Value::Bool(y)) => Value::Bool(apply(opcode, *x, *y)),
        (Value::Enum(x), Value::Enum(y)) => {
            let value = Value::Bool((*x & *y) != 0);
            if opcode != Opcode::AND {
                interpreter.fault_with(format!("{opcode} is not supported for enums"));
            }
            value
        }
        (Value::Number(x), Value::Number(y)) => {
            let x = to_i64(x)?;
            let y = to_i64(y)?;
            Value::Number(BigInt::from(apply(opcode, x, y)))
        }
        (Value::Bool(_), other) | (Value::Enum(_), other) | (Value::Number(_), other) => {
            return Err(VmError::type_mismatch(format!(
                "logical op expected {} operand, got {}",
                left.vm_type(),
                other.vm_type()
            )));
        }
        (other, _) => {
            return Err(VmError::type_mismatch(format!(
                "logical op unsupported for type {}",
                other.vm_type()
            )));
        }
    };

    interpreter.set_register(dst, result)
}

fn to_i64(number: &BigInt) -> VmResult<i64> {
    if number.bits() > 64 {
        return Err(VmError::type_mismatch(format!(
            "{number} is wider than 64 bits"
        )));
    }
    number
        .to_i64()
        .ok_or_else(|| VmError::type_mismatch(format!("{number} does not fit a 64-bit integer")))
}

fn equal<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    let a = interpreter.read_register()?;
    let b = interpreter.read_register()?;
    let dst = interpreter.read_register()?;

    let result = interpreter.register(a)? == interpreter.register(b)?;
    interpreter.set_register(dst, Value::Bool(result))
}
