pub mod auth;
pub mod common;
pub mod crud;
pub mod custom;

pub use auth::auth_routes;
pub use common::common_routes;
pub use crud::crud_router;
pub use custom::custom_router;
