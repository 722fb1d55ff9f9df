#![allow(dead_code)]

use phantasma_vm::{
    EvaluationStack, ExecutionContext, ExecutionFrame, ExecutionState, InteropScope, Opcode,
    Value, VirtualMachine, VmError, VmHost, VmResult,
};
use std::collections::HashMap;

pub type NativeFn = fn(&mut ExecutionFrame, &mut EvaluationStack) -> VmResult<ExecutionState>;

/// Host used by the integration tests.
#[derive(Default)]
pub struct TestHost {
    pub scripts: HashMap<String, Vec<u8>>,
    pub natives: HashMap<String, NativeFn>,
    pub disallowed: Vec<Opcode>,
    pub debug_state: Option<ExecutionState>,
    pub debug_offsets: Vec<u32>,
    pub interop_calls: Vec<String>,
    pub loads: Vec<String>,
}

impl TestHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(mut self, name: &str, script: Vec<u8>) -> Self {
        self.scripts.insert(name.to_string(), script);
        self
    }

    pub fn with_native(mut self, name: &str, handler: NativeFn) -> Self {
        self.natives.insert(name.to_string(), handler);
        self
    }
}

impl VmHost for TestHost {
    fn execute_interop(
        &mut self,
        method: &str,
        scope: &mut InteropScope<'_>,
    ) -> VmResult<ExecutionState> {
        self.interop_calls.push(method.to_string());
        match method {
            "Runtime.Push42" => {
                scope.push(Value::from(42i64));
                Ok(ExecutionState::Running)
            }
            "Runtime.Double" => {
                let value = scope.pop()?.as_number()?;
                scope.push(Value::Number(value * 2));
                Ok(ExecutionState::Running)
            }
            "Runtime.Context" => {
                let name = scope.context().name().to_string();
                scope.push(Value::from(name));
                Ok(ExecutionState::Running)
            }
            "Runtime.Broken" => Err(VmError::invalid_operation("storage offline")),
            _ => Ok(ExecutionState::Fault),
        }
    }

    fn load_context(&mut self, name: &str) -> Option<ExecutionContext> {
        self.loads.push(name.to_string());
        if let Some(script) = self.scripts.get(name) {
            return Some(ExecutionContext::script(name, script.clone(), 0));
        }
        self.natives
            .get(name)
            .map(|handler| ExecutionContext::native(name, *handler))
    }

    fn validate_opcode(&self, opcode: Opcode) -> ExecutionState {
        if self.disallowed.contains(&opcode) {
            ExecutionState::Fault
        } else {
            ExecutionState::Running
        }
    }

    fn on_debug(&mut self, offset: u32, _frame: &ExecutionFrame) -> VmResult<ExecutionState> {
        self.debug_offsets.push(offset);
        Ok(self.debug_state.unwrap_or(ExecutionState::Running))
    }

    fn dump_data(&self, lines: &mut Vec<String>) {
        lines.push(format!("interop calls: {}", self.interop_calls.len()));
    }
}

pub fn run(script: Vec<u8>) -> (VirtualMachine<TestHost>, ExecutionState) {
    run_with(script, TestHost::new())
}

pub fn run_with(script: Vec<u8>, host: TestHost) -> (VirtualMachine<TestHost>, ExecutionState) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut vm = VirtualMachine::new(script, host);
    let state = vm.execute().expect("no fatal error");
    (vm, state)
}

/// Register of the entry frame after the run.
pub fn register(vm: &VirtualMachine<TestHost>, index: u8) -> Value {
    vm.frames()[0].register(index).expect("register").clone()
}

/// Stack contents from the top down.
pub fn stack(vm: &VirtualMachine<TestHost>) -> Vec<Value> {
    vm.stack().iter().cloned().collect()
}

pub fn error(vm: &VirtualMachine<TestHost>) -> String {
    vm.error().unwrap_or_default()
}
