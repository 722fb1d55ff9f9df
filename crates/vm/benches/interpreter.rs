//! Interpreter Benchmarks
//!
//! Measures dispatch of arithmetic loops, struct packing and context switches.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use phantasma_vm::{
    ExecutionContext, ExecutionState, InteropScope, Opcode, ScriptBuilder, StructMap, Value,
    VirtualMachine, VmHost, VmResult,
};
use std::collections::HashMap;

/// Host serving a fixed set of script contexts.
#[derive(Default)]
struct BenchHost {
    scripts: HashMap<String, Vec<u8>>,
}

impl VmHost for BenchHost {
    fn execute_interop(
        &mut self,
        _method: &str,
        _scope: &mut InteropScope<'_>,
    ) -> VmResult<ExecutionState> {
        Ok(ExecutionState::Fault)
    }

    fn load_context(&mut self, name: &str) -> Option<ExecutionContext> {
        self.scripts
            .get(name)
            .map(|script| ExecutionContext::script(name, script.clone(), 0))
    }
}

/// Counts `iterations` down to zero with a conditional backward jump.
fn create_loop_script(iterations: i64) -> Vec<u8> {
    ScriptBuilder::new()
        .emit_load(0, &Value::from(iterations))
        .emit_load(1, &Value::from(0i64))
        .emit_load(2, &Value::from(0i64))
        .emit_label("loop")
        .emit_register(Opcode::DEC, 0)
        .emit_binary(Opcode::ADD, 1, 0, 1)
        .emit_binary(Opcode::GT, 0, 2, 3)
        .emit_jump(Opcode::JMPIF, 3, "loop")
        .emit_push(1)
        .emit_ret()
        .to_script()
        .unwrap()
}

/// Packs and unpacks a struct with `fields` entries.
fn create_pack_script(fields: usize) -> Vec<u8> {
    let mut map = StructMap::new();
    for i in 0..fields {
        map.insert(Value::from(format!("field{i}")), Value::from(i as i64));
    }

    ScriptBuilder::new()
        .emit_load(0, &Value::Struct(map))
        .emit_unary(Opcode::PACK, 0, 1)
        .emit_unary(Opcode::UNPACK, 1, 2)
        .emit_push(2)
        .emit_ret()
        .to_script()
        .unwrap()
}

/// Switches into the `child` context `count` times.
fn create_switch_script(count: usize) -> Vec<u8> {
    let mut builder = ScriptBuilder::new();
    for _ in 0..count {
        builder.emit_context("child", 0).emit_switch(0);
    }
    builder.emit_ret().to_script().unwrap()
}

fn run(script: &[u8], host: BenchHost) -> ExecutionState {
    let mut vm = VirtualMachine::new(script.to_vec(), host);
    vm.execute().unwrap()
}

fn bench_arithmetic_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("arithmetic_loop");

    for iterations in [10i64, 100, 1000] {
        let script = create_loop_script(iterations);
        group.throughput(Throughput::Elements(iterations as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(iterations),
            &script,
            |b, script| b.iter(|| run(black_box(script), BenchHost::default())),
        );
    }

    group.finish();
}

fn bench_pack_unpack(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack_unpack");

    for fields in [4usize, 64, 256] {
        let script = create_pack_script(fields);
        group.bench_with_input(BenchmarkId::from_parameter(fields), &script, |b, script| {
            b.iter(|| run(black_box(script), BenchHost::default()))
        });
    }

    group.finish();
}

fn bench_context_switch(c: &mut Criterion) {
    let child = ScriptBuilder::new()
        .emit_load(0, &Value::from(1i64))
        .emit_push(0)
        .emit_ret()
        .to_script()
        .unwrap();

    let mut group = c.benchmark_group("context_switch");

    for count in [1usize, 16, 64] {
        let script = create_switch_script(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &script, |b, script| {
            b.iter(|| {
                let mut host = BenchHost::default();
                host.scripts.insert("child".to_string(), child.clone());
                run(black_box(script), host)
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_arithmetic_loop,
    bench_pack_unpack,
    bench_context_switch
);
criterion_main!(benches);
