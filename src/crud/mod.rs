pub mod base;
pub mod registry;
pub mod types;

pub use registry::{CrudRegistry, EntityCruds};
pub use types::{BoxFuture, CrudKind, CrudRoute, CrudTarget, HookOverride};
