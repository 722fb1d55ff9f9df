//! Evaluation stack module for the Phantasma virtual machine.
//!
//! The stack is shared by every context of a VM; registers are private to
//! frames, the stack is how values cross frames and contexts.

use crate::error::{VmError, VmResult};
use crate::value::Value;

/// Represents the shared value stack of the VM.
#[derive(Debug, Clone, Default)]
pub struct EvaluationStack {
    stack: Vec<Value>,
}

impl EvaluationStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes an item onto the stack.
    pub fn push(&mut self, item: Value) {
        self.stack.push(item);
    }

    /// Pops an item from the stack.
    pub fn pop(&mut self) -> VmResult<Value> {
        self.stack.pop().ok_or(VmError::StackUnderflow)
    }

    /// Returns the item `n` positions below the top without removing it.
    pub fn peek(&self, n: usize) -> VmResult<&Value> {
        if n >= self.stack.len() {
            return Err(VmError::StackUnderflow);
        }
        Ok(&self.stack[self.stack.len() - 1 - n])
    }

    /// Returns the number of items on the stack.
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Returns true if the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Iterates from the top of the stack down.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.stack.iter().rev()
    }
}
