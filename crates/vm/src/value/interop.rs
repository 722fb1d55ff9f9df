use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Opaque host object carried by [`Value::Object`](crate::Value::Object).
///
/// Execution contexts implement this so that `CTX` can hand a context
/// reference to `SWITCH` through a register.
pub trait InteropInterface: fmt::Debug + Send + Sync + 'static {
    /// Gets the type of the interop interface.
    fn interface_type(&self) -> &str;

    /// Allows downcasting to concrete types.
    fn as_any(&self) -> &dyn Any;

    /// Converts the shared handle for `Arc::downcast`.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}
