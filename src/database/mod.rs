pub mod manager;
pub mod models;
pub mod repository;
pub mod update;

pub use manager::{Database, DatabaseError};
pub use repository::{Repository, Table};
pub use update::UpdateBuilder;
