//! Script builder module for the Phantasma virtual machine.
//!
//! This module provides a way to programmatically construct scripts for the VM.

use crate::error::{VmError, VmResult};
use crate::op_code::{OperandLayout, Opcode};
use crate::value::Value;
use crate::vm_type::VMType;
use phantasma_io::BinaryWriter;
use std::collections::HashMap;

/// Width of a forward reference waiting for its label.
#[derive(Debug, Clone, Copy)]
enum Patch {
    /// `JMP`/`JMPIF`/`JMPNOT` target.
    Signed,
    /// `CALL` target.
    Unsigned,
}

#[derive(Debug, Clone)]
struct PendingLabel {
    position: usize,
    label: String,
    patch: Patch,
}

/// Helps construct VM scripts programmatically.
///
/// Emit methods chain; the first encoding error is kept and reported by
/// [`to_script`](Self::to_script).
#[derive(Debug, Clone, Default)]
pub struct ScriptBuilder {
    writer: BinaryWriter,
    labels: HashMap<String, usize>,
    pending: Vec<PendingLabel>,
    error: Option<VmError>,
}

impl ScriptBuilder {
    /// Creates a new script builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset the next emitted byte will have.
    pub fn position(&self) -> usize {
        self.writer.len()
    }

    fn fail(&mut self, err: VmError) -> &mut Self {
        if self.error.is_none() {
            self.error = Some(err);
        }
        self
    }

    fn expect_layout(&mut self, opcode: Opcode, layout: OperandLayout) -> bool {
        if opcode.layout() == layout {
            return true;
        }
        self.fail(VmError::invalid_operation(format!(
            "{opcode} does not take {layout:?} operands"
        )));
        false
    }

    /// Emits an opcode without operands.
    pub fn emit(&mut self, opcode: Opcode) -> &mut Self {
        self.writer.write_u8(opcode.as_u8());
        self
    }

    /// Emits raw bytes.
    pub fn emit_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.writer.write_bytes(bytes);
        self
    }

    /// Emits a single-register opcode such as `INC`, `DEC` or `CLEAR`.
    pub fn emit_register(&mut self, opcode: Opcode, reg: u8) -> &mut Self {
        if self.expect_layout(opcode, OperandLayout::Reg) {
            self.emit(opcode).writer.write_u8(reg);
        }
        self
    }

    pub fn emit_move(&mut self, src: u8, dst: u8) -> &mut Self {
        self.emit_unary(Opcode::MOVE, src, dst)
    }

    pub fn emit_copy(&mut self, src: u8, dst: u8) -> &mut Self {
        self.emit_unary(Opcode::COPY, src, dst)
    }

    pub fn emit_push(&mut self, reg: u8) -> &mut Self {
        self.emit_register(Opcode::PUSH, reg)
    }

    pub fn emit_pop(&mut self, reg: u8) -> &mut Self {
        self.emit_register(Opcode::POP, reg)
    }

    pub fn emit_swap(&mut self, a: u8, b: u8) -> &mut Self {
        self.emit_unary(Opcode::SWAP, a, b)
    }

    /// Emits a `LOAD` of `value` into `reg`.
    pub fn emit_load(&mut self, reg: u8, value: &Value) -> &mut Self {
        let bytes = match value {
            Value::Object(_) => Err(VmError::type_mismatch("objects cannot be loaded from bytes")),
            other => other.as_byte_array(),
        };
        match bytes {
            Ok(bytes) => self.emit_load_bytes(reg, value.vm_type(), &bytes),
            Err(err) => self.fail(err),
        }
    }

    pub fn emit_load_bytes(&mut self, reg: u8, vm_type: VMType, bytes: &[u8]) -> &mut Self {
        self.emit(Opcode::LOAD)
            .writer
            .write_u8(reg)
            .write_u8(vm_type.into())
            .write_var_bytes(bytes);
        self
    }

    pub fn emit_cast(&mut self, src: u8, dst: u8, vm_type: VMType) -> &mut Self {
        self.emit(Opcode::CAST)
            .writer
            .write_u8(src)
            .write_u8(dst)
            .write_u8(vm_type.into());
        self
    }

    /// Emits a three-register opcode: `a, b, dst`.
    pub fn emit_binary(&mut self, opcode: Opcode, a: u8, b: u8, dst: u8) -> &mut Self {
        if self.expect_layout(opcode, OperandLayout::RegRegReg) {
            self.emit(opcode)
                .writer
                .write_u8(a)
                .write_u8(b)
                .write_u8(dst);
        }
        self
    }

    /// Emits a two-register opcode: `src, dst`.
    pub fn emit_unary(&mut self, opcode: Opcode, src: u8, dst: u8) -> &mut Self {
        if self.expect_layout(opcode, OperandLayout::RegReg) {
            self.emit(opcode).writer.write_u8(src).write_u8(dst);
        }
        self
    }

    /// Loads `method` into `reg` and calls it through the host.
    pub fn emit_extcall(&mut self, method: &str, reg: u8) -> &mut Self {
        self.emit_load(reg, &Value::from(method))
            .emit_register(Opcode::EXTCALL, reg)
    }

    pub fn emit_throw(&mut self, reg: u8) -> &mut Self {
        self.emit_register(Opcode::THROW, reg)
    }

    /// Marks the current position as `label`.
    pub fn emit_label(&mut self, label: &str) -> &mut Self {
        let position = self.position();
        if self.labels.insert(label.to_string(), position).is_some() {
            return self.fail(VmError::invalid_operation(format!(
                "label '{label}' defined twice"
            )));
        }
        self
    }

    fn reference(&mut self, label: &str, patch: Patch) {
        self.pending.push(PendingLabel {
            position: self.position(),
            label: label.to_string(),
            patch,
        });
        match patch {
            Patch::Signed => self.writer.write_i16(0),
            Patch::Unsigned => self.writer.write_u16(0),
        };
    }

    /// Emits `JMP label`, or `JMPIF`/`JMPNOT reg, label`. `reg` is ignored
    /// for `JMP`.
    pub fn emit_jump(&mut self, opcode: Opcode, reg: u8, label: &str) -> &mut Self {
        match opcode {
            Opcode::JMP => {
                self.emit(opcode);
            }
            Opcode::JMPIF | Opcode::JMPNOT => {
                self.emit(opcode).writer.write_u8(reg);
            }
            other => {
                return self.fail(VmError::invalid_operation(format!(
                    "{other} is not a jump"
                )))
            }
        }
        self.reference(label, Patch::Signed);
        self
    }

    /// Emits `CALL regs, label`.
    pub fn emit_call(&mut self, label: &str, regs: u8) -> &mut Self {
        self.emit(Opcode::CALL).writer.write_u8(regs);
        self.reference(label, Patch::Unsigned);
        self
    }

    pub fn emit_range(&mut self, src: u8, dst: u8, index: u64, length: u64) -> &mut Self {
        self.emit(Opcode::RANGE)
            .writer
            .write_u8(src)
            .write_u8(dst)
            .write_var_int(index)
            .write_var_int(length);
        self
    }

    pub fn emit_left(&mut self, src: u8, dst: u8, length: u64) -> &mut Self {
        self.emit_slice(Opcode::LEFT, src, dst, length)
    }

    pub fn emit_right(&mut self, src: u8, dst: u8, length: u64) -> &mut Self {
        self.emit_slice(Opcode::RIGHT, src, dst, length)
    }

    fn emit_slice(&mut self, opcode: Opcode, src: u8, dst: u8, length: u64) -> &mut Self {
        self.emit(opcode)
            .writer
            .write_u8(src)
            .write_u8(dst)
            .write_var_int(length);
        self
    }

    /// `dst[key] = src`
    pub fn emit_put(&mut self, src: u8, dst: u8, key: u8) -> &mut Self {
        self.emit_binary(Opcode::PUT, src, dst, key)
    }

    /// `dst = src[key]`
    pub fn emit_get(&mut self, src: u8, dst: u8, key: u8) -> &mut Self {
        self.emit_binary(Opcode::GET, src, dst, key)
    }

    /// Loads `name` into `reg` and resolves it to a context in place.
    pub fn emit_context(&mut self, name: &str, reg: u8) -> &mut Self {
        self.emit_load(reg, &Value::from(name))
            .emit_unary(Opcode::CTX, reg, reg)
    }

    pub fn emit_switch(&mut self, reg: u8) -> &mut Self {
        self.emit_register(Opcode::SWITCH, reg)
    }

    pub fn emit_ret(&mut self) -> &mut Self {
        self.emit(Opcode::RET)
    }

    pub fn emit_debug(&mut self) -> &mut Self {
        self.emit(Opcode::DEBUG)
    }

    /// Resolves labels and returns the finished script.
    pub fn to_script(&self) -> VmResult<Vec<u8>> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }

        let mut writer = self.writer.clone();
        for pending in &self.pending {
            let target = *self.labels.get(&pending.label).ok_or_else(|| {
                VmError::invalid_operation(format!("unknown label '{}'", pending.label))
            })?;

            let patched = match pending.patch {
                Patch::Signed => {
                    let offset = i16::try_from(target).map_err(|_| {
                        VmError::invalid_operation(format!(
                            "label '{}' at {target} is out of jump range",
                            pending.label
                        ))
                    })?;
                    writer.patch(pending.position, &offset.to_le_bytes())
                }
                Patch::Unsigned => {
                    let offset = u16::try_from(target).map_err(|_| {
                        VmError::invalid_operation(format!(
                            "label '{}' at {target} is out of call range",
                            pending.label
                        ))
                    })?;
                    writer.patch(pending.position, &offset.to_le_bytes())
                }
            };
            if !patched {
                return Err(VmError::invalid_operation(format!(
                    "cannot patch label '{}' at {}",
                    pending.label, pending.position
                )));
            }
        }

        Ok(writer.into_inner())
    }
}
