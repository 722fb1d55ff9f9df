//! Arithmetic and comparison on arbitrary-precision numbers.

use crate::error::{VmError, VmResult};
use crate::host::VmHost;
use crate::interpreter::Interpreter;
use crate::jump_table::JumpTable;
use crate::op_code::Opcode;
use crate::value::Value;
use num_bigint::{BigInt, Sign};
use num_traits::{One, Pow, Signed, ToPrimitive, Zero};

/// Registers the numeric handlers.
pub(crate) fn register_handlers<H: VmHost>(jump_table: &mut JumpTable<H>) {
    jump_table.register(Opcode::LT, compare);
    jump_table.register(Opcode::GT, compare);
    jump_table.register(Opcode::LTE, compare);
    jump_table.register(Opcode::GTE, compare);

    jump_table.register(Opcode::INC, inc);
    jump_table.register(Opcode::DEC, dec);

    jump_table.register(Opcode::SIGN, unary);
    jump_table.register(Opcode::NEGATE, unary);
    jump_table.register(Opcode::ABS, unary);

    jump_table.register(Opcode::ADD, binary);
    jump_table.register(Opcode::SUB, binary);
    jump_table.register(Opcode::MUL, binary);
    jump_table.register(Opcode::DIV, binary);
    jump_table.register(Opcode::MOD, binary);
    jump_table.register(Opcode::SHL, binary);
    jump_table.register(Opcode::SHR, binary);
    jump_table.register(Opcode::MIN, binary);
    jump_table.register(Opcode::MAX, binary);
    jump_table.register(Opcode::POW, binary);
}

/// LT/GT/LTE/GTE a, b, dst
fn compare<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    let a = interpreter.read_register()?;
    let b = interpreter.read_register()?;
    let dst = interpreter.read_register()?;

    let x = interpreter.register(a)?.as_number()?;
    let y = interpreter.register(b)?.as_number()?;
    let result = match interpreter.opcode() {
        Opcode::LT => x < y,
        Opcode::GT => x > y,
        Opcode::LTE => x <= y,
        _ => x >= y,
    };
    interpreter.set_register(dst, Value::Bool(result))
}

fn inc<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    step(interpreter, BigInt::one())
}

fn dec<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    step(interpreter, -BigInt::one())
}

/// INC/DEC reg: updates the register in place.
fn step<H: VmHost>(interpreter: &mut Interpreter<'_, H>, delta: BigInt) -> VmResult<()> {
    let reg = interpreter.read_register()?;

    let value = interpreter.register(reg)?.as_number()? + delta;
    interpreter.set_register(reg, Value::Number(value))
}

/// SIGN/NEGATE/ABS src, dst
fn unary<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    let src = interpreter.read_register()?;
    let dst = interpreter.read_register()?;

    let source = interpreter.register(src)?;
    let result = match interpreter.opcode() {
        Opcode::SIGN => match source.as_number()?.sign() {
            Sign::Minus => -BigInt::one(),
            Sign::NoSign => BigInt::zero(),
            Sign::Plus => BigInt::one(),
        },
        Opcode::NEGATE => match source {
            Value::Number(_) | Value::String(_) | Value::Timestamp(_) | Value::Bytes(_) => {
                -source.as_number()?
            }
            other => {
                return Err(VmError::type_mismatch(format!(
                    "cannot negate {}",
                    other.vm_type()
                )))
            }
        },
        _ => source.as_number()?.abs(),
    };
    interpreter.set_register(dst, Value::Number(result))
}

/// Binary numeric ops a, b, dst. `ADD` on strings concatenates.
fn binary<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    let a = interpreter.read_register()?;
    let b = interpreter.read_register()?;
    let dst = interpreter.read_register()?;

    let opcode = interpreter.opcode();
    let left = interpreter.register(a)?;
    let right = interpreter.register(b)?;

    let result = if opcode == Opcode::ADD {
        if let Value::String(prefix) = left {
            match right {
                Value::String(suffix) => Value::String(format!("{prefix}{suffix}")),
                other => {
                    return Err(VmError::type_mismatch(format!(
                        "invalid string as right operand: {}",
                        other.vm_type()
                    )))
                }
            }
        } else {
            Value::Number(arithmetic(opcode, left.as_number()?, right.as_number()?)?)
        }
    } else {
        Value::Number(arithmetic(opcode, left.as_number()?, right.as_number()?)?)
    };

    interpreter.set_register(dst, result)
}

pub(crate) fn arithmetic(opcode: Opcode, a: BigInt, b: BigInt) -> VmResult<BigInt> {
    let result = match opcode {
        Opcode::ADD => a + b,
        Opcode::SUB => a - b,
        Opcode::MUL => a * b,
        Opcode::DIV => {
            if b.is_zero() {
                return Err(VmError::invalid_operation("division by zero"));
            }
            a / b
        }
        Opcode::MOD => {
            if b.is_zero() {
                return Err(VmError::invalid_operation("division by zero"));
            }
            a % b
        }
        Opcode::SHL => shift(a, native_int(&b)?),
        Opcode::SHR => shift(a, native_int(&b)?.saturating_neg()),
        Opcode::MIN => a.min(b),
        Opcode::MAX => a.max(b),
        Opcode::POW => {
            let exponent = native_int(&b)?;
            if exponent < 0 {
                return Err(VmError::invalid_operation(format!(
                    "negative exponent {exponent}"
                )));
            }
            Pow::pow(a, exponent.unsigned_abs())
        }
        other => {
            return Err(VmError::invalid_operation(format!(
                "{other} is not an arithmetic opcode"
            )))
        }
    };
    Ok(result)
}

/// Left shift by `count` bits; a negative count shifts right.
fn shift(value: BigInt, count: i32) -> BigInt {
    if count >= 0 {
        value << count.unsigned_abs()
    } else {
        value >> count.unsigned_abs()
    }
}

fn native_int(value: &BigInt) -> VmResult<i32> {
    value
        .to_i32()
        .ok_or_else(|| VmError::type_mismatch(format!("{value} does not fit a 32-bit integer")))
}
