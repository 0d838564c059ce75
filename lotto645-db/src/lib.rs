pub mod db;
pub mod error;
pub mod models;

pub use error::StoreError;
pub use rusqlite;
