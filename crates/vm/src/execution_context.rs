//! Execution context module for the Phantasma virtual machine.
//!
//! A context is a named unit of executable logic. Script contexts interpret
//! bytecode; native contexts run host code behind [`NativeHandler`].

use crate::address::Address;
use crate::error::VmResult;
use crate::evaluation_stack::EvaluationStack;
use crate::execution_frame::ExecutionFrame;
use crate::host::VmHost;
use crate::script_context::ScriptContext;
use crate::value::InteropInterface;
use crate::virtual_machine::VirtualMachine;
use crate::vm_state::ExecutionState;
use log::warn;
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Shared handle to a context. Registers, frames and the registry all hold
/// contexts through this.
pub type ContextRef = Arc<ExecutionContext>;

/// Host code run by a native context.
pub trait NativeHandler: Send + Sync {
    fn execute(
        &self,
        frame: &mut ExecutionFrame,
        stack: &mut EvaluationStack,
    ) -> VmResult<ExecutionState>;
}

impl<F> NativeHandler for F
where
    F: Fn(&mut ExecutionFrame, &mut EvaluationStack) -> VmResult<ExecutionState> + Send + Sync,
{
    fn execute(
        &self,
        frame: &mut ExecutionFrame,
        stack: &mut EvaluationStack,
    ) -> VmResult<ExecutionState> {
        self(frame, stack)
    }
}

/// A context implemented by the host.
pub struct NativeContext {
    name: String,
    address: Address,
    handler: Box<dyn NativeHandler>,
    error: Mutex<Option<String>>,
}

impl NativeContext {
    pub fn new(name: impl Into<String>, handler: impl NativeHandler + 'static) -> Self {
        let name = name.into();
        Self {
            address: Address::from_name(&name),
            name,
            handler: Box::new(handler),
            error: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Message of the last failed run, if any.
    pub fn error(&self) -> Option<String> {
        self.error.lock().clone()
    }

    fn execute<H: VmHost>(&self, vm: &mut VirtualMachine<H>) -> VmResult<ExecutionState> {
        let (frame, stack) = vm.frame_and_stack_mut()?;
        match self.handler.execute(frame, stack) {
            Ok(state) => {
                *self.error.lock() = None;
                Ok(state)
            }
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                warn!("native context {} faulted: {}", self.name, err);
                *self.error.lock() = Some(err.to_string());
                Ok(ExecutionState::Fault)
            }
        }
    }
}

impl fmt::Debug for NativeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeContext")
            .field("name", &self.name)
            .field("address", &self.address)
            .finish()
    }
}

/// Closed set of context kinds.
#[derive(Debug)]
pub enum ExecutionContext {
    Script(ScriptContext),
    Native(NativeContext),
}

impl ExecutionContext {
    /// Creates a script context addressed by the hash of its name.
    pub fn script(name: impl Into<String>, script: impl Into<Vec<u8>>, offset: u32) -> Self {
        ExecutionContext::Script(ScriptContext::new(name, script, offset))
    }

    pub fn native(name: impl Into<String>, handler: impl NativeHandler + 'static) -> Self {
        ExecutionContext::Native(NativeContext::new(name, handler))
    }

    pub fn name(&self) -> &str {
        match self {
            ExecutionContext::Script(context) => context.name(),
            ExecutionContext::Native(context) => context.name(),
        }
    }

    pub fn address(&self) -> Address {
        match self {
            ExecutionContext::Script(context) => context.address(),
            ExecutionContext::Native(context) => context.address(),
        }
    }

    pub fn error(&self) -> Option<String> {
        match self {
            ExecutionContext::Script(context) => context.error(),
            ExecutionContext::Native(context) => context.error(),
        }
    }

    pub fn as_script(&self) -> Option<&ScriptContext> {
        match self {
            ExecutionContext::Script(context) => Some(context),
            ExecutionContext::Native(_) => None,
        }
    }

    /// Runs the context on the frame the VM pushed for it.
    pub(crate) fn execute<H: VmHost>(
        self: &Arc<Self>,
        vm: &mut VirtualMachine<H>,
    ) -> VmResult<ExecutionState> {
        match self.as_ref() {
            ExecutionContext::Script(context) => context.execute(self, vm),
            ExecutionContext::Native(context) => context.execute(vm),
        }
    }
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl InteropInterface for ExecutionContext {
    fn interface_type(&self) -> &str {
        "ExecutionContext"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
