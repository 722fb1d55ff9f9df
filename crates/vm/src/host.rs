//! The seam between the VM and the system embedding it.

use crate::address::Address;
use crate::error::VmResult;
use crate::evaluation_stack::EvaluationStack;
use crate::execution_context::{ContextRef, ExecutionContext};
use crate::execution_frame::ExecutionFrame;
use crate::op_code::Opcode;
use crate::value::Value;
use crate::vm_state::ExecutionState;

/// Hooks supplied by the embedder.
///
/// `execute_interop` and `load_context` have no default: the VM core knows
/// nothing about tokens, storage or other contracts. Returning `Err` from a
/// hook aborts the whole invocation; a host that only wants to fail the
/// running script returns a non-`Running` state instead.
pub trait VmHost {
    /// Runs the interop method named by an `EXTCALL`.
    fn execute_interop(
        &mut self,
        method: &str,
        scope: &mut InteropScope<'_>,
    ) -> VmResult<ExecutionState>;

    /// Loads a context the VM has not seen yet. Called at most once per
    /// name that resolves; results are cached by the VM.
    fn load_context(&mut self, name: &str) -> Option<ExecutionContext>;

    /// Instruction set policy. Anything but `Running` rejects the opcode.
    fn validate_opcode(&self, _opcode: Opcode) -> ExecutionState {
        ExecutionState::Running
    }

    /// Breakpoint hook for the `DEBUG` opcode.
    fn on_debug(&mut self, _offset: u32, _frame: &ExecutionFrame) -> VmResult<ExecutionState> {
        Ok(ExecutionState::Running)
    }

    /// Extra lines appended to a fault dump.
    fn dump_data(&self, _lines: &mut Vec<String>) {}
}

/// What an interop method may touch while it runs.
pub struct InteropScope<'a> {
    stack: &'a mut EvaluationStack,
    context: &'a ContextRef,
    entry_address: Address,
    active_addresses: &'a [Address],
}

impl<'a> InteropScope<'a> {
    pub(crate) fn new(
        stack: &'a mut EvaluationStack,
        context: &'a ContextRef,
        entry_address: Address,
        active_addresses: &'a [Address],
    ) -> Self {
        Self {
            stack,
            context,
            entry_address,
            active_addresses,
        }
    }

    pub fn stack(&mut self) -> &mut EvaluationStack {
        self.stack
    }

    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    pub fn pop(&mut self) -> VmResult<Value> {
        self.stack.pop()
    }

    pub fn peek(&self, n: usize) -> VmResult<&Value> {
        self.stack.peek(n)
    }

    /// The context executing the `EXTCALL`.
    pub fn context(&self) -> &ContextRef {
        self.context
    }

    pub fn entry_address(&self) -> Address {
        self.entry_address
    }

    /// Addresses of every active switch, innermost last.
    pub fn active_addresses(&self) -> &[Address] {
        self.active_addresses
    }
}
