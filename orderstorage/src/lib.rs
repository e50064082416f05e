pub mod db;
pub mod error;
pub mod repository;
pub mod repository_pg;
pub mod retry;
pub mod schema;

pub use db::Db;
pub use error::StorageError;
pub use repository::{OrderHeader, OrderRepository};
pub use repository_pg::PgOrderStorage;
pub use retry::with_retry;
