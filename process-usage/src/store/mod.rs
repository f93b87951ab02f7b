//! Persistence of the current process set.

mod memory;
mod postgres;
mod schema;

pub use memory::MemoryProcessStore;
pub use postgres::{PgProcessStore, connect_to_process_db};

use crate::process_record::ProcessRecord;
use async_trait::async_trait;
use thiserror::Error;

/// Error type for store operations.
/// `Storage` carries internal detail meant for logs, never for callers.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{}", duplicate_key_message(.0))]
    DuplicateKey(Option<i32>),

    #[error("No process found with pid {0}.")]
    NotFound(i32),

    #[error("Storage error: {0}")]
    Storage(String),
}

fn duplicate_key_message(pid: &Option<i32>) -> String {
    match pid {
        Some(pid) => format!("The process inserted with pid {pid} already exists in the database."),
        None => String::from(
            "Some processes inserted share the same IDs with existing ones already registered in the database.",
        ),
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ProcessStore: Send + Sync {
    /// Fails with `DuplicateKey` when the pid is already stored.
    async fn insert_one(&self, record: &ProcessRecord) -> StoreResult<()>;

    /// Deletes every stored process, then inserts `records` as one unit.
    ///
    /// The two phases are not atomic together: if the insert fails the store
    /// is left empty, not restored. Concurrent readers may observe the empty
    /// set between the phases.
    async fn replace_all(&self, records: &[ProcessRecord]) -> StoreResult<()>;

    async fn get_one(&self, pid: i32) -> StoreResult<ProcessRecord>;

    /// Processes ordered by pid, skipping `skip` and returning at most `limit`.
    async fn list_all(&self, skip: u32, limit: u32) -> StoreResult<Vec<ProcessRecord>>;
}
