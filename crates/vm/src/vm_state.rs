//! Execution state of a context.

use strum::Display;

/// Indicates the status of a running or finished context.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum ExecutionState {
    /// The context is still executing instructions.
    #[default]
    Running = 0,

    /// A debug hook asked the context to stop.
    Break = 1,

    /// The context stopped because of an error.
    Fault = 2,

    /// The context completed successfully.
    Halt = 3,
}

impl ExecutionState {
    #[inline]
    pub fn is_running(self) -> bool {
        self == ExecutionState::Running
    }

    #[inline]
    pub fn is_halt(self) -> bool {
        self == ExecutionState::Halt
    }

    #[inline]
    pub fn is_fault(self) -> bool {
        self == ExecutionState::Fault
    }

    #[inline]
    pub fn is_break(self) -> bool {
        self == ExecutionState::Break
    }
}
