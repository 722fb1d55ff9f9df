mod common;

use common::{error, run_with, stack, TestHost};
use phantasma_vm::{
    EvaluationStack, ExecutionContext, ExecutionFrame, ExecutionState, Opcode, ScriptBuilder,
    Value, VirtualMachine, VmError, VmResult, VmSettings,
};

fn child_pushing(value: i64) -> Vec<u8> {
    ScriptBuilder::new()
        .emit_load(0, &Value::from(value))
        .emit_push(0)
        .emit_ret()
        .to_script()
        .unwrap()
}

fn switch_to(name: &str, times: usize) -> Vec<u8> {
    let mut builder = ScriptBuilder::new();
    for _ in 0..times {
        builder.emit_context(name, 0).emit_switch(0);
    }
    builder.emit_ret().to_script().unwrap()
}

fn add_native(_frame: &mut ExecutionFrame, stack: &mut EvaluationStack) -> VmResult<ExecutionState> {
    let a = stack.pop()?.as_number()?;
    let b = stack.pop()?.as_number()?;
    stack.push(Value::Number(a + b));
    Ok(ExecutionState::Halt)
}

fn stuck_native(_frame: &mut ExecutionFrame, _stack: &mut EvaluationStack) -> VmResult<ExecutionState> {
    Ok(ExecutionState::Break)
}

#[test]
fn test_switch_runs_child_and_resumes() {
    let host = TestHost::new().with_script("child", child_pushing(99));
    let script = ScriptBuilder::new()
        .emit_context("child", 0)
        .emit_switch(0)
        .emit_load(1, &Value::from("after"))
        .emit_push(1)
        .emit_ret()
        .to_script()
        .unwrap();

    let (vm, state) = run_with(script, host);
    assert_eq!(state, ExecutionState::Halt);
    assert_eq!(stack(&vm), vec![Value::from("after"), Value::from(99i64)]);
    assert_eq!(vm.frames().len(), 1);
    assert_eq!(vm.current_context().name(), "entry");
}

#[test]
fn test_switch_keeps_address_stack_balanced() {
    let inner = switch_to("leaf", 1);
    let host = TestHost::new()
        .with_script("middle", inner)
        .with_script("leaf", child_pushing(1));

    let (vm, state) = run_with(switch_to("middle", 2), host);
    assert_eq!(state, ExecutionState::Halt);
    assert_eq!(vm.active_addresses(), &[vm.entry_address()]);
    assert_eq!(vm.stack().len(), 2);
}

#[test]
fn test_loaded_contexts_are_cached() {
    let host = TestHost::new().with_script("child", child_pushing(5));

    let (vm, state) = run_with(switch_to("child", 3), host);
    assert_eq!(state, ExecutionState::Halt);
    assert_eq!(vm.stack().len(), 3);
    assert_eq!(vm.host().loads, vec!["child".to_string()]);
}

#[test]
fn test_child_fault_propagates() {
    let child = ScriptBuilder::new()
        .emit_load(0, &Value::from("inner failure"))
        .emit_throw(0)
        .to_script()
        .unwrap();
    let host = TestHost::new().with_script("child", child);

    let (vm, state) = run_with(switch_to("child", 1), host);
    assert_eq!(state, ExecutionState::Fault);
    let message = error(&vm);
    assert!(message.contains("switch into 'child' did not halt"));
    assert!(message.contains("inner failure"));
}

#[test]
fn test_unknown_context_faults() {
    let (vm, state) = run_with(switch_to("ghost", 1), TestHost::new());
    assert_eq!(state, ExecutionState::Fault);
    assert!(error(&vm).contains("could not find context with name 'ghost'"));
}

#[test]
fn test_switch_requires_context_object() {
    let script = ScriptBuilder::new()
        .emit_load(0, &Value::from("child"))
        .emit_switch(0)
        .emit_ret()
        .to_script()
        .unwrap();

    let (vm, state) = run_with(script, TestHost::new());
    assert_eq!(state, ExecutionState::Fault);
    assert!(error(&vm).contains("type mismatch"));
}

#[test]
fn test_native_context() {
    let host = TestHost::new().with_native("math", add_native);
    let script = ScriptBuilder::new()
        .emit_load(0, &Value::from(2i64))
        .emit_load(1, &Value::from(3i64))
        .emit_push(0)
        .emit_push(1)
        .emit_context("math", 2)
        .emit_switch(2)
        .emit_pop(3)
        .emit_ret()
        .to_script()
        .unwrap();

    let (vm, state) = run_with(script, host);
    assert_eq!(state, ExecutionState::Halt);
    assert_eq!(vm.frames()[0].register(3).unwrap(), &Value::from(5i64));
}

#[test]
fn test_native_error_faults_the_caller() {
    let host = TestHost::new().with_native("math", add_native);

    let (vm, state) = run_with(switch_to("math", 1), host);
    assert_eq!(state, ExecutionState::Fault);
    assert!(error(&vm).contains("stack is empty"));
}

#[test]
fn test_native_must_halt() {
    let host = TestHost::new().with_native("stuck", stuck_native);

    let (vm, state) = run_with(switch_to("stuck", 1), host);
    assert_eq!(state, ExecutionState::Fault);
    assert!(error(&vm).contains("execution state Break"));
}

#[test]
fn test_registered_context_needs_no_loader() {
    let mut vm = VirtualMachine::new(switch_to("local", 1), TestHost::new());
    vm.register_context(ExecutionContext::script("local", child_pushing(7), 0));

    assert_eq!(vm.execute().unwrap(), ExecutionState::Halt);
    assert_eq!(vm.result(), Some(&Value::from(7i64)));
    assert!(vm.host().loads.is_empty());
}

#[test]
fn test_recursive_switch_hits_depth_limit() {
    let host = TestHost::new().with_script("self", switch_to("self", 1));
    let settings = VmSettings {
        max_switch_depth: 8,
        ..VmSettings::default()
    };
    let mut vm = VirtualMachine::with_settings(switch_to("self", 1), 0, None, host, settings)
        .unwrap();

    assert_eq!(vm.execute().unwrap(), ExecutionState::Fault);
    assert!(error(&vm).contains("context switch depth limit 8 reached"));
    assert_eq!(vm.active_addresses(), &[vm.entry_address()]);
}

#[test]
fn test_extcall_reaches_host() {
    let script = ScriptBuilder::new()
        .emit_extcall("Runtime.Push42", 0)
        .emit_extcall("Runtime.Double", 0)
        .emit_ret()
        .to_script()
        .unwrap();

    let (vm, state) = run_with(script, TestHost::new());
    assert_eq!(state, ExecutionState::Halt);
    assert_eq!(vm.result(), Some(&Value::from(84i64)));
    assert_eq!(
        vm.host().interop_calls,
        vec!["Runtime.Push42".to_string(), "Runtime.Double".to_string()]
    );
}

#[test]
fn test_extcall_sees_current_context() {
    let child = ScriptBuilder::new()
        .emit_extcall("Runtime.Context", 0)
        .emit_ret()
        .to_script()
        .unwrap();
    let host = TestHost::new().with_script("child", child);

    let (vm, state) = run_with(switch_to("child", 1), host);
    assert_eq!(state, ExecutionState::Halt);
    assert_eq!(vm.result(), Some(&Value::from("child")));
}

#[test]
fn test_extcall_failure_faults() {
    let script = ScriptBuilder::new()
        .emit_extcall("Runtime.Missing", 0)
        .emit_ret()
        .to_script()
        .unwrap();

    let (vm, state) = run_with(script, TestHost::new());
    assert_eq!(state, ExecutionState::Fault);
    assert!(error(&vm).contains("VM extcall failed: Runtime.Missing"));
}

#[test]
fn test_host_error_is_fatal() {
    let script = ScriptBuilder::new()
        .emit_extcall("Runtime.Broken", 0)
        .emit_ret()
        .to_script()
        .unwrap();

    let mut vm = VirtualMachine::new(script, TestHost::new());
    let err = vm.execute().unwrap_err();
    assert!(matches!(err, VmError::Host(_)));
    assert!(err.is_fatal());
}

#[test]
fn test_host_error_inside_switch_is_fatal() {
    let child = ScriptBuilder::new()
        .emit_extcall("Runtime.Broken", 0)
        .emit_ret()
        .to_script()
        .unwrap();
    let host = TestHost::new().with_script("child", child);

    let mut vm = VirtualMachine::new(switch_to("child", 1), host);
    assert!(matches!(vm.execute(), Err(VmError::Host(_))));
}

#[test]
fn test_ret_in_called_frame_of_child() {
    let child = ScriptBuilder::new()
        .emit_call("helper", 2)
        .emit_ret()
        .emit_label("helper")
        .emit_load(0, &Value::from("helped"))
        .emit_push(0)
        .emit_ret()
        .to_script()
        .unwrap();
    let host = TestHost::new().with_script("child", child);

    let (vm, state) = run_with(switch_to("child", 1), host);
    assert_eq!(state, ExecutionState::Halt);
    assert_eq!(vm.result(), Some(&Value::from("helped")));
    assert_eq!(vm.frames().len(), 1);
}

#[test]
fn test_child_halting_inside_call_resumes_parent_once() {
    let child = ScriptBuilder::new()
        .emit_call("helper", 2)
        .emit_ret()
        .emit_label("helper")
        .emit_debug()
        .emit_ret()
        .to_script()
        .unwrap();
    let host = TestHost {
        debug_state: Some(ExecutionState::Halt),
        ..TestHost::new().with_script("child", child)
    };
    let script = ScriptBuilder::new()
        .emit_context("child", 0)
        .emit_switch(0)
        .emit_load(1, &Value::from("parent"))
        .emit_push(1)
        .emit_ret()
        .to_script()
        .unwrap();

    let (vm, state) = run_with(script, host);
    assert_eq!(state, ExecutionState::Halt);
    assert_eq!(stack(&vm), vec![Value::from("parent")]);
    assert_eq!(vm.frames().len(), 1);
    assert_eq!(vm.current_context().name(), "entry");
}

#[test]
fn test_opcode_policy_applies_to_children() {
    let host = TestHost {
        disallowed: vec![Opcode::PUSH],
        ..TestHost::new().with_script("child", child_pushing(1))
    };

    let (vm, state) = run_with(switch_to("child", 1), host);
    assert_eq!(state, ExecutionState::Fault);
    assert!(error(&vm).contains("opcode PUSH is not allowed"));
}
