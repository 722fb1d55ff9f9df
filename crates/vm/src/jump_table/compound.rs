//! Struct field access and value packing.

use crate::error::VmResult;
use crate::host::VmHost;
use crate::interpreter::Interpreter;
use crate::jump_table::JumpTable;
use crate::op_code::Opcode;
use crate::value::Value;

/// Registers the compound value handlers.
pub(crate) fn register_handlers<H: VmHost>(jump_table: &mut JumpTable<H>) {
    jump_table.register(Opcode::PUT, put);
    jump_table.register(Opcode::GET, get);
    jump_table.register(Opcode::UNPACK, unpack);
    jump_table.register(Opcode::PACK, pack);
}

/// PUT src, dst, key: `dst[key] = src`.
fn put<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    let src = interpreter.read_register()?;
    let dst = interpreter.read_register()?;
    let key = interpreter.read_register()?;

    let key = interpreter.register(key)?.clone();
    let value = interpreter.register(src)?.clone();
    interpreter.frame_mut()?.register_mut(dst)?.set_key(key, value)
}

/// GET src, dst, key: `dst = src[key]`.
fn get<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    let src = interpreter.read_register()?;
    let dst = interpreter.read_register()?;
    let key = interpreter.read_register()?;

    let value = interpreter
        .register(src)?
        .get_key(interpreter.register(key)?)?;
    interpreter.set_register(dst, value)
}

fn unpack<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    let src = interpreter.read_register()?;
    let dst = interpreter.read_register()?;

    let bytes = interpreter.register(src)?.as_byte_array()?;
    interpreter.set_register(dst, Value::deserialize(&bytes)?)
}

fn pack<H: VmHost>(interpreter: &mut Interpreter<'_, H>) -> VmResult<()> {
    let src = interpreter.read_register()?;
    let dst = interpreter.read_register()?;

    let bytes = interpreter.register(src)?.serialize()?;
    interpreter.set_register(dst, Value::Bytes(bytes))
}
