use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::BoxError;

/// Observes the two phase boundaries of a package activation.
///
/// Hooks run synchronously on the thread driving the activation;
/// `on_prepared` always precedes `on_switched`.
pub trait ActivationListener: Send + Sync {
    fn on_prepared(&self, ctx: &HostContext) -> Result<(), BoxError>;
    fn on_switched(&self, ctx: &HostContext) -> Result<(), BoxError>;
}

pub type ListenerCtor = fn() -> Arc<dyn ActivationListener>;

/// Opaque host value forwarded verbatim to listener hooks.
#[derive(Clone)]
pub struct HostContext {
    value: Arc<dyn Any + Send + Sync>,
}

impl HostContext {
    pub fn new(value: impl Any + Send + Sync) -> Self {
        Self {
            value: Arc::new(value),
        }
    }

    pub fn get<T: Any>(&self) -> Option<&T> {
        (*self.value).downcast_ref()
    }
}

impl Default for HostContext {
    fn default() -> Self {
        Self::new(())
    }
}

impl fmt::Debug for HostContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HostContext")
    }
}
