// handlers/public/mod.rs - endpoints reachable without a session

pub mod callback;
pub mod health;

pub use callback::auth_callback;
pub use health::{health, root};
