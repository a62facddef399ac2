pub mod csv_store;
pub mod paths;
pub mod sqlite_loader;

pub use sqlite_loader::{LoadSummary, SqliteLoader};
