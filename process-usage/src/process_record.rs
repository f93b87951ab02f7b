use crate::process_time::{ParseError, ProcessTime};
use serde::{Deserialize, Serialize};

/// One resource usage sample, validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub id: i32,
    pub user: String,
    pub cpu: f64,
    pub memory: f64,
    pub command: String,
    pub time: ProcessTime,
}

/// Body of a create request, before the time field is parsed.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessInput {
    pub id: i32,
    pub user: String,
    pub cpu: f64,
    pub memory: f64,
    pub command: String,
    pub time: String,
}

impl ProcessInput {
    pub fn validate(self) -> Result<ProcessRecord, ParseError> {
        let time = ProcessTime::parse(&self.time).map_err(|e| e.with_pid(self.id))?;
        Ok(ProcessRecord {
            id: self.id,
            user: self.user,
            cpu: self.cpu,
            memory: self.memory,
            command: self.command,
            time,
        })
    }
}

impl From<ProcessRecord> for ProcessInput {
    fn from(record: ProcessRecord) -> Self {
        Self {
            id: record.id,
            user: record.user,
            cpu: record.cpu,
            memory: record.memory,
            command: record.command,
            time: record.time.to_string(),
        }
    }
}

/// Validates a whole batch, stopping at the first invalid record.
pub fn validate_batch(inputs: Vec<ProcessInput>) -> Result<Vec<ProcessRecord>, ParseError> {
    inputs.into_iter().map(ProcessInput::validate).collect()
}

/// First identifier appearing more than once in `records`.
pub fn first_duplicate_id(records: &[ProcessRecord]) -> Option<i32> {
    let mut seen = std::collections::HashSet::with_capacity(records.len());
    records.iter().map(|r| r.id).find(|id| !seen.insert(*id))
}
