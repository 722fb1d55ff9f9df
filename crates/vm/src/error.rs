//! Error types for the Phantasma virtual machine.
//!
//! Errors come in two tiers. Script-level errors turn the running context into
//! [`ExecutionState::Fault`](crate::ExecutionState::Fault) and are an expected
//! outcome for the host. Fatal errors mean the VM or its embedding broke an
//! invariant; they are returned as `Err` from
//! [`VirtualMachine::execute`](crate::VirtualMachine::execute) and are never
//! absorbed into a fault.

use crate::op_code::Opcode;
use crate::vm_state::ExecutionState;
use crate::vm_type::VMType;
use phantasma_config::ConfigError;
use phantasma_io::IoError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VmError {
    #[error("invalid register r{index} (frame has {count} registers)")]
    InvalidRegister { index: u8, count: usize },

    #[error("stack is empty")]
    StackUnderflow,

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("{0}")]
    InvalidOperation(String),

    #[error("invalid jump offset {offset} (script length {length})")]
    OutOfScriptRange { offset: i64, length: usize },

    #[error("malformed script: {0}")]
    MalformedScript(#[from] IoError),

    #[error("unknown opcode 0x{0:02X}")]
    UnknownOpcode(u8),

    #[error("opcode {0} is not allowed")]
    DisallowedOpcode(Opcode),

    #[error("VM extcall failed: {method} returned {state}")]
    InteropFailure {
        method: String,
        state: ExecutionState,
    },

    #[error("{0}")]
    ScriptThrow(String),

    #[error("could not find context with name '{0}'")]
    ContextNotFound(String),

    #[error("switch into '{context}' did not halt: {reason}")]
    SwitchFailed { context: String, reason: String },

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("VM implementation bug detected: address stack (expected {expected}, found {found})")]
    SwitchProtocolViolation { expected: String, found: String },

    #[error("not enough frames available: {0}")]
    FrameUnderflow(String),

    #[error("host failure: {0}")]
    Host(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type VmResult<T> = Result<T, VmError>;

impl VmError {
    /// True for errors that must abort the whole invocation.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            VmError::SwitchProtocolViolation { .. } | VmError::FrameUnderflow(_) | VmError::Host(_)
        )
    }

    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        VmError::InvalidOperation(msg.into())
    }

    pub fn type_mismatch(msg: impl Into<String>) -> Self {
        VmError::TypeMismatch(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        VmError::Serialization(msg.into())
    }

    /// Shorthand for a conversion that the value table does not allow.
    pub fn cannot_convert(from: VMType, to: &str) -> Self {
        VmError::TypeMismatch(format!("cannot convert {from} to {to}"))
    }
}
