use crate::error::{VmError, VmResult};
use crate::execution_context::ContextRef;
use crate::value::Value;
use std::mem;

/// One activation record: a fixed register bank, the offset to resume the
/// caller at once this frame is popped, and the context it belongs to.
#[derive(Debug, Clone)]
pub struct ExecutionFrame {
    registers: Vec<Value>,
    offset: u32,
    context: ContextRef,
}

impl ExecutionFrame {
    pub fn new(context: ContextRef, offset: u32, register_count: usize) -> Self {
        Self {
            registers: vec![Value::None; register_count],
            offset,
            context,
        }
    }

    /// Resume offset of the caller.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn context(&self) -> &ContextRef {
        &self.context
    }

    pub fn registers(&self) -> &[Value] {
        &self.registers
    }

    pub fn register_count(&self) -> usize {
        self.registers.len()
    }

    fn check(&self, index: u8) -> VmResult<usize> {
        let idx = index as usize;
        if idx < self.registers.len() {
            Ok(idx)
        } else {
            Err(VmError::InvalidRegister {
                index,
                count: self.registers.len(),
            })
        }
    }

    pub fn register(&self, index: u8) -> VmResult<&Value> {
        let idx = self.check(index)?;
        Ok(&self.registers[idx])
    }

    pub fn register_mut(&mut self, index: u8) -> VmResult<&mut Value> {
        let idx = self.check(index)?;
        Ok(&mut self.registers[idx])
    }

    pub fn set_register(&mut self, index: u8, value: Value) -> VmResult<()> {
        *self.register_mut(index)? = value;
        Ok(())
    }

    /// Moves a value out, leaving `None` behind.
    pub fn take_register(&mut self, index: u8) -> VmResult<Value> {
        Ok(mem::take(self.register_mut(index)?))
    }

    pub fn swap_registers(&mut self, a: u8, b: u8) -> VmResult<()> {
        let a = self.check(a)?;
        let b = self.check(b)?;
        self.registers.swap(a, b);
        Ok(())
    }
}
