pub mod model;
pub mod repository;

pub use model::{FetchHistoryEntry, FetchHistoryRecord, FetchStatus, NewFetchHistoryEntry};
pub use repository::{HistoryRepository, PgHistoryRepository};
