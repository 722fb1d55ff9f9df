//! # Phantasma Virtual Machine
//!
//! A deterministic, register-based bytecode interpreter for smart-contract
//! scripts.
//!
//! Every validating node must reach the same result for the same script and
//! the same host state, so the interpreter has no hidden inputs: no clocks,
//! no randomness and no process-wide state. Everything a run touches lives in
//! one [`VirtualMachine`].
//!
//! ## Architecture
//!
//! - **Value**: the tagged union held by registers and the shared stack
//! - **ExecutionFrame**: a fixed register bank plus the caller's resume offset
//! - **ExecutionContext**: a named unit of dispatch, either a bytecode
//!   [`ScriptContext`] or a host-provided [`NativeContext`]
//! - **VirtualMachine**: frame stack, active-address stack, context registry
//!   and the context-switch protocol
//! - **VmHost**: the interop, context loading and opcode policy hooks
//! - **ScriptBuilder** / **Disassembler**: tooling over the same encoding
//!
//! ## Example
//!
//! ```rust
//! use phantasma_vm::{
//!     ExecutionContext, ExecutionState, InteropScope, Opcode, ScriptBuilder, Value,
//!     VirtualMachine, VmHost, VmResult,
//! };
//!
//! struct Host;
//!
//! impl VmHost for Host {
//!     fn execute_interop(&mut self, _method: &str, _scope: &mut InteropScope<'_>) -> VmResult<ExecutionState> {
//!         Ok(ExecutionState::Running)
//!     }
//!
//!     fn load_context(&mut self, _name: &str) -> Option<ExecutionContext> {
//!         None
//!     }
//! }
//!
//! let script = ScriptBuilder::new()
//!     .emit_load(0, &Value::from(5i64))
//!     .emit_load(1, &Value::from(3i64))
//!     .emit_binary(Opcode::ADD, 0, 1, 2)
//!     .emit_push(2)
//!     .emit_ret()
//!     .to_script()?;
//!
//! let mut vm = VirtualMachine::new(script, Host);
//! assert_eq!(vm.execute()?, ExecutionState::Halt);
//! assert_eq!(vm.result(), Some(&Value::from(8i64)));
//! # Ok::<(), phantasma_vm::VmError>(())
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

pub mod address;
pub mod disassembler;
pub mod error;
pub mod evaluation_stack;
pub mod execution_context;
pub mod execution_frame;
pub mod host;
pub mod instruction;
mod interpreter;
mod jump_table;
pub mod op_code;
pub mod script_builder;
pub mod script_context;
pub mod value;
pub mod virtual_machine;
pub mod vm_state;
pub mod vm_type;

pub use address::Address;
pub use disassembler::Disassembler;
pub use error::{VmError, VmResult};
pub use evaluation_stack::EvaluationStack;
pub use execution_context::{ContextRef, ExecutionContext, NativeContext, NativeHandler};
pub use execution_frame::ExecutionFrame;
pub use host::{InteropScope, VmHost};
pub use instruction::{Instruction, Operand};
pub use op_code::{OperandLayout, Opcode};
pub use script_builder::ScriptBuilder;
pub use script_context::ScriptContext;
pub use value::{InteropInterface, StructMap, Value};
pub use virtual_machine::VirtualMachine;
pub use vm_state::ExecutionState;
pub use vm_type::VMType;

pub use phantasma_config::VmSettings;
