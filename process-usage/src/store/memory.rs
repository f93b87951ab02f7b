use super::{ProcessStore, StoreError, StoreResult};
use crate::process_record::{ProcessRecord, first_duplicate_id};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Process set held in memory, for tests and local runs without a database.
#[derive(Default)]
pub struct MemoryProcessStore {
    processes: RwLock<BTreeMap<i32, ProcessRecord>>,
}

impl MemoryProcessStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProcessStore for MemoryProcessStore {
    async fn insert_one(&self, record: &ProcessRecord) -> StoreResult<()> {
        let mut processes = self.processes.write().await;
        if processes.contains_key(&record.id) {
            return Err(StoreError::DuplicateKey(Some(record.id)));
        }
        processes.insert(record.id, record.clone());
        debug!("inserted pid={}", record.id);
        Ok(())
    }

    async fn replace_all(&self, records: &[ProcessRecord]) -> StoreResult<()> {
        // flush and insert are separate critical sections
        self.processes.write().await.clear();
        debug!("process set flushed");

        if let Some(pid) = first_duplicate_id(records) {
            warn!("batch rejected, pid={pid} appears more than once");
            return Err(StoreError::DuplicateKey(Some(pid)));
        }
        let mut processes = self.processes.write().await;
        if let Some(existing) = records.iter().find(|r| processes.contains_key(&r.id)) {
            return Err(StoreError::DuplicateKey(Some(existing.id)));
        }
        processes.extend(records.iter().map(|r| (r.id, r.clone())));
        debug!("inserted {} processes", records.len());
        Ok(())
    }

    async fn get_one(&self, pid: i32) -> StoreResult<ProcessRecord> {
        self.processes
            .read()
            .await
            .get(&pid)
            .cloned()
            .ok_or(StoreError::NotFound(pid))
    }

    async fn list_all(&self, skip: u32, limit: u32) -> StoreResult<Vec<ProcessRecord>> {
        Ok(self
            .processes
            .read()
            .await
            .values()
            .skip(skip as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}
