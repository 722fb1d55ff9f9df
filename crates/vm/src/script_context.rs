//! Script context: a named bytecode buffer interpreted by the VM.

use crate::address::Address;
use crate::error::VmResult;
use crate::execution_context::ContextRef;
use crate::host::VmHost;
use crate::interpreter::Interpreter;
use crate::virtual_machine::VirtualMachine;
use crate::vm_state::ExecutionState;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Snapshot of the most recent activation, kept for diagnostics.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptRuntime {
    pub(crate) instruction_pointer: u32,
    pub(crate) state: ExecutionState,
    pub(crate) error: Option<String>,
}

/// A script addressed by name.
///
/// The context itself is immutable; every activation (the entry run or a
/// `SWITCH` into it) starts at `entry_offset` with its own cursor. The last
/// cursor, state and error are mirrored for dumps and for the host.
pub struct ScriptContext {
    name: String,
    address: Address,
    script: Arc<[u8]>,
    entry_offset: u32,
    runtime: Mutex<ScriptRuntime>,
}

impl ScriptContext {
    pub fn new(name: impl Into<String>, script: impl Into<Vec<u8>>, offset: u32) -> Self {
        let name = name.into();
        let address = Address::from_name(&name);
        Self::with_address(name, address, script, offset)
    }

    pub fn with_address(
        name: impl Into<String>,
        address: Address,
        script: impl Into<Vec<u8>>,
        offset: u32,
    ) -> Self {
        let script: Vec<u8> = script.into();
        Self {
            name: name.into(),
            address,
            script: Arc::from(script),
            entry_offset: offset,
            runtime: Mutex::new(ScriptRuntime {
                instruction_pointer: offset,
                ..ScriptRuntime::default()
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn script(&self) -> &[u8] {
        &self.script
    }

    pub fn entry_offset(&self) -> u32 {
        self.entry_offset
    }

    pub fn instruction_pointer(&self) -> u32 {
        self.runtime.lock().instruction_pointer
    }

    pub fn state(&self) -> ExecutionState {
        self.runtime.lock().state
    }

    pub fn error(&self) -> Option<String> {
        self.runtime.lock().error.clone()
    }

    pub(crate) fn publish(&self, runtime: ScriptRuntime) {
        *self.runtime.lock() = runtime;
    }

    pub(crate) fn publish_pointer(&self, instruction_pointer: u32) {
        self.runtime.lock().instruction_pointer = instruction_pointer;
    }

    pub(crate) fn execute<H: VmHost>(
        &self,
        this: &ContextRef,
        vm: &mut VirtualMachine<H>,
    ) -> VmResult<ExecutionState> {
        let mut interpreter = Interpreter::new(vm, self, Arc::clone(this));
        interpreter.run()
    }
}

impl fmt::Debug for ScriptContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptContext")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("script_len", &self.script.len())
            .field("entry_offset", &self.entry_offset)
            .finish()
    }
}
