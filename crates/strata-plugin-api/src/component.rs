use std::any::Any;
use std::sync::Arc;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A live capability instance served through the host registry.
///
/// Instances are shared across threads once committed, so implementations
/// must carry their own interior synchronization if they mutate.
pub trait Component: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

/// Named services visible to a component constructor: the declarations of its
/// own wiring scope first, then the host root scope.
pub trait ServiceResolver {
    fn service(&self, name: &str) -> Option<Arc<dyn Component>>;
}

pub type ComponentCtor = fn(&dyn ServiceResolver) -> Result<Arc<dyn Component>, BoxError>;
