mod common;

use common::{error, register, run, run_with, stack, TestHost};
use num_bigint::BigInt;
use phantasma_vm::{ExecutionState, Opcode, ScriptBuilder, VMType, Value};

#[test]
fn test_add_numbers_halts() {
    let script = ScriptBuilder::new()
        .emit_load(0, &Value::from(5i64))
        .emit_load(1, &Value::from(3i64))
        .emit_binary(Opcode::ADD, 0, 1, 2)
        .emit_ret()
        .to_script()
        .unwrap();

    let (vm, state) = run(script);
    assert_eq!(state, ExecutionState::Halt);
    assert_eq!(register(&vm, 2), Value::from(8i64));
    assert!(vm.error().is_none());
}

#[test]
fn test_pop_on_empty_stack_faults() {
    let script = ScriptBuilder::new().emit_pop(0).emit_ret().to_script().unwrap();

    let (vm, state) = run(script);
    assert_eq!(state, ExecutionState::Fault);
    assert!(error(&vm).contains("stack is empty"));
}

#[test]
fn test_call_out_of_range_faults() {
    let script = vec![Opcode::CALL.as_u8(), 2, 0x00, 0x01, Opcode::RET.as_u8()];

    let (vm, state) = run(script);
    assert_eq!(state, ExecutionState::Fault);
    assert!(error(&vm).contains("invalid jump offset"));
}

#[test]
fn test_throw_carries_message() {
    let script = ScriptBuilder::new()
        .emit_load(0, &Value::from("boom"))
        .emit_throw(0)
        .to_script()
        .unwrap();

    let (vm, state) = run(script);
    assert_eq!(state, ExecutionState::Fault);
    let message = error(&vm);
    assert!(message.contains("boom"));
    assert!(message.starts_with("Script execution failed: "));
    assert!(message.contains("@ THROW : "));
}

#[test]
fn test_call_frame_starts_with_empty_registers() {
    let script = ScriptBuilder::new()
        .emit_load(0, &Value::from("caller"))
        .emit_call("sub", 4)
        .emit_push(0)
        .emit_ret()
        .emit_label("sub")
        .emit_push(0)
        .emit_load(0, &Value::from("callee"))
        .emit_ret()
        .to_script()
        .unwrap();

    let (vm, state) = run(script);
    assert_eq!(state, ExecutionState::Halt);
    assert_eq!(stack(&vm), vec![Value::from("caller"), Value::None]);
    assert_eq!(vm.frames().len(), 1);
}

#[test]
fn test_call_register_count_is_bounded() {
    let script = ScriptBuilder::new()
        .emit_call("sub", 0)
        .emit_ret()
        .emit_label("sub")
        .emit_ret()
        .to_script()
        .unwrap();

    let (vm, state) = run(script);
    assert_eq!(state, ExecutionState::Fault);
    assert!(error(&vm).contains("invalid register count"));
}

#[test]
fn test_move_clears_source() {
    let script = ScriptBuilder::new()
        .emit_load(0, &Value::from(7i64))
        .emit_move(0, 1)
        .emit_ret()
        .to_script()
        .unwrap();

    let (vm, state) = run(script);
    assert_eq!(state, ExecutionState::Halt);
    assert_eq!(register(&vm, 0), Value::None);
    assert_eq!(register(&vm, 1), Value::from(7i64));
}

#[test]
fn test_copy_and_swap() {
    let script = ScriptBuilder::new()
        .emit_load(0, &Value::from("a"))
        .emit_load(1, &Value::from("b"))
        .emit_copy(0, 2)
        .emit_swap(0, 1)
        .emit_register(Opcode::CLEAR, 2)
        .emit_ret()
        .to_script()
        .unwrap();

    let (vm, state) = run(script);
    assert_eq!(state, ExecutionState::Halt);
    assert_eq!(register(&vm, 0), Value::from("b"));
    assert_eq!(register(&vm, 1), Value::from("a"));
    assert_eq!(register(&vm, 2), Value::None);
}

#[test]
fn test_stack_is_lifo() {
    let mut builder = ScriptBuilder::new();
    for i in 0..3u8 {
        builder.emit_load(i, &Value::from(i64::from(i)));
        builder.emit_push(i);
    }
    for i in 3..6u8 {
        builder.emit_pop(i);
    }
    let script = builder.emit_ret().to_script().unwrap();

    let (vm, state) = run(script);
    assert_eq!(state, ExecutionState::Halt);
    assert_eq!(register(&vm, 3), Value::from(2i64));
    assert_eq!(register(&vm, 4), Value::from(1i64));
    assert_eq!(register(&vm, 5), Value::from(0i64));
    assert!(vm.stack().is_empty());
}

#[test]
fn test_invalid_register_faults() {
    let script = ScriptBuilder::new().emit_push(40).emit_ret().to_script().unwrap();

    let (vm, state) = run(script);
    assert_eq!(state, ExecutionState::Fault);
    assert!(error(&vm).contains("invalid register r40"));
}

#[test]
fn test_truncated_operand_faults() {
    let (vm, state) = run(vec![Opcode::MOVE.as_u8(), 0]);
    assert_eq!(state, ExecutionState::Fault);
    assert!(error(&vm).contains("outside of script range"));
}

#[test]
fn test_running_off_the_end_faults() {
    let (_, state) = run(vec![Opcode::NOP.as_u8()]);
    assert_eq!(state, ExecutionState::Fault);
}

#[test]
fn test_unknown_opcode_faults() {
    let (vm, state) = run(vec![0xEE]);
    assert_eq!(state, ExecutionState::Fault);
    assert!(error(&vm).contains("unknown opcode 0xEE"));
}

#[test]
fn test_disallowed_opcode_faults() {
    let script = ScriptBuilder::new()
        .emit_load(0, &Value::from(2i64))
        .emit_binary(Opcode::POW, 0, 0, 1)
        .emit_ret()
        .to_script()
        .unwrap();
    let host = TestHost {
        disallowed: vec![Opcode::POW],
        ..TestHost::new()
    };

    let (vm, state) = run_with(script, host);
    assert_eq!(state, ExecutionState::Fault);
    assert!(error(&vm).contains("opcode POW is not allowed"));
}

#[test]
fn test_counting_loop() {
    let script = ScriptBuilder::new()
        .emit_load(0, &Value::from(3i64))
        .emit_load(1, &Value::from(0i64))
        .emit_load(2, &Value::from(0i64))
        .emit_label("loop")
        .emit_register(Opcode::DEC, 0)
        .emit_register(Opcode::INC, 1)
        .emit_binary(Opcode::GT, 0, 2, 3)
        .emit_jump(Opcode::JMPIF, 3, "loop")
        .emit_push(1)
        .emit_ret()
        .to_script()
        .unwrap();

    let (vm, state) = run(script);
    assert_eq!(state, ExecutionState::Halt);
    assert_eq!(vm.result(), Some(&Value::from(3i64)));
}

#[test]
fn test_jmpnot_skips() {
    let script = ScriptBuilder::new()
        .emit_load(0, &Value::Bool(false))
        .emit_jump(Opcode::JMPNOT, 0, "skip")
        .emit_load(1, &Value::from("not skipped"))
        .emit_label("skip")
        .emit_ret()
        .to_script()
        .unwrap();

    let (vm, state) = run(script);
    assert_eq!(state, ExecutionState::Halt);
    assert_eq!(register(&vm, 1), Value::None);
}

#[test]
fn test_jump_out_of_range_faults() {
    let forward = vec![Opcode::JMP.as_u8(), 100, 0, Opcode::RET.as_u8()];
    let (vm, state) = run(forward);
    assert_eq!(state, ExecutionState::Fault);
    assert!(error(&vm).contains("invalid jump offset"));

    let backward = vec![Opcode::JMP.as_u8(), 0xFF, 0xFF, Opcode::RET.as_u8()];
    let (vm, state) = run(backward);
    assert_eq!(state, ExecutionState::Fault);
    assert!(error(&vm).contains("invalid jump offset -1"));
}

#[test]
fn test_untaken_jump_is_still_checked() {
    let script = ScriptBuilder::new()
        .emit_load(0, &Value::Bool(false))
        .emit_raw(&[Opcode::JMPIF.as_u8(), 0, 0x00, 0x10])
        .emit_ret()
        .to_script()
        .unwrap();

    let (vm, state) = run(script);
    assert_eq!(state, ExecutionState::Fault);
    assert!(error(&vm).contains("invalid jump offset"));
}

#[test]
fn test_cast_and_load_types() {
    let script = ScriptBuilder::new()
        .emit_load(0, &Value::from("42"))
        .emit_cast(0, 1, VMType::Number)
        .emit_load_bytes(2, VMType::Timestamp, &[0x10, 0x00])
        .emit_cast(1, 3, VMType::String)
        .emit_ret()
        .to_script()
        .unwrap();

    let (vm, state) = run(script);
    assert_eq!(state, ExecutionState::Halt);
    assert_eq!(register(&vm, 1), Value::Number(BigInt::from(42)));
    assert_eq!(register(&vm, 2), Value::Timestamp(16));
    assert_eq!(register(&vm, 3), Value::from("42"));
}

#[test]
fn test_debug_can_break() {
    let script = ScriptBuilder::new()
        .emit(Opcode::NOP)
        .emit_debug()
        .emit_ret()
        .to_script()
        .unwrap();
    let host = TestHost {
        debug_state: Some(ExecutionState::Break),
        ..TestHost::new()
    };

    let (vm, state) = run_with(script, host);
    assert_eq!(state, ExecutionState::Break);
    assert_eq!(vm.host().debug_offsets, vec![2]);
}

#[test]
fn test_debug_is_a_no_op_by_default() {
    let script = ScriptBuilder::new().emit_debug().emit_ret().to_script().unwrap();

    let (vm, state) = run(script);
    assert_eq!(state, ExecutionState::Halt);
    assert_eq!(vm.host().debug_offsets, vec![1]);
}

#[test]
fn test_fault_dump() {
    let script = ScriptBuilder::new()
        .emit_load(0, &Value::from("boom"))
        .emit_throw(0)
        .to_script()
        .unwrap();

    let (vm, _) = run(script);
    let dump = vm.dump();
    assert!(dump.contains(&"*********STACK*********".to_string()));
    assert!(dump.contains(&"\tR0 = String: \"boom\"".to_string()));
    assert!(dump.contains(&"000: LOAD r0, \"boom\"".to_string()));
    assert_eq!(dump.last(), Some(&"interop calls: 0".to_string()));
}

#[test]
fn test_entry_offset_and_name() {
    let script = ScriptBuilder::new()
        .emit_load(0, &Value::from("skipped"))
        .emit_extcall("Runtime.Context", 1)
        .emit_ret()
        .to_script()
        .unwrap();
    // LOAD r0, "skipped" is 11 bytes long.
    let mut vm = phantasma_vm::VirtualMachine::with_settings(
        script,
        11,
        Some("main"),
        TestHost::new(),
        phantasma_vm::VmSettings::default(),
    )
    .unwrap();

    assert_eq!(vm.execute().unwrap(), ExecutionState::Halt);
    assert_eq!(vm.result(), Some(&Value::from("main")));
    assert_eq!(vm.frames()[0].register(0).unwrap(), &Value::None);
}

#[test]
fn test_disassemble_built_script() {
    let script = ScriptBuilder::new()
        .emit_load(0, &Value::from(5i64))
        .emit_load(1, &Value::from(3i64))
        .emit_binary(Opcode::ADD, 0, 1, 2)
        .emit_ret()
        .to_script()
        .unwrap();

    let disassembler = phantasma_vm::Disassembler::new(&script);
    let lines: Vec<String> = disassembler
        .instructions()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        lines,
        vec![
            "000: LOAD r0, 5",
            "005: LOAD r1, 3",
            "010: ADD r0, r1, r2",
            "014: RET",
        ]
    );
}
