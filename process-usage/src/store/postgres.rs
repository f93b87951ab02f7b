use super::schema::create_tables;
use super::{ProcessStore, StoreError, StoreResult};
use crate::process_record::{ProcessRecord, first_duplicate_id};
use crate::process_time::{ProcessTime, SECONDS_PER_DAY};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::types::PgInterval;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Connection, FromRow, Postgres, QueryBuilder};
use std::time::Duration;
use tracing::{debug, error, info};

// 6 bind parameters per row, postgres accepts at most 65535 per statement
const INSERT_CHUNK_SIZE: usize = 10_000;

const MICROS_PER_SECOND: i64 = 1_000_000;

#[derive(FromRow)]
struct ProcessRow {
    id: i32,
    user: String,
    cpu: f64,
    memory: f64,
    command: String,
    time: PgInterval,
}

impl TryFrom<ProcessRow> for ProcessRecord {
    type Error = StoreError;

    fn try_from(row: ProcessRow) -> StoreResult<Self> {
        Ok(ProcessRecord {
            time: interval_to_time(&row.time).map_err(|e| {
                error!("reading time of pid={}: {e}", row.id);
                e
            })?,
            id: row.id,
            user: row.user,
            cpu: row.cpu,
            memory: row.memory,
            command: row.command,
        })
    }
}

fn interval_to_time(interval: &PgInterval) -> StoreResult<ProcessTime> {
    if interval.months != 0 || interval.days < 0 || interval.microseconds < 0 {
        return Err(StoreError::Storage(format!(
            "interval out of range: {interval:?}"
        )));
    }
    let seconds = interval.days as u64 * SECONDS_PER_DAY
        + (interval.microseconds / MICROS_PER_SECOND) as u64;
    Ok(ProcessTime::from_seconds(seconds))
}

fn time_to_interval(time: ProcessTime) -> StoreResult<PgInterval> {
    let days = time.as_seconds() / SECONDS_PER_DAY;
    let rest = (time.as_seconds() % SECONDS_PER_DAY) as i64;
    let days = i32::try_from(days)
        .map_err(|_| StoreError::Storage(format!("duration too large for an interval: {time}")))?;
    Ok(PgInterval {
        months: 0,
        days,
        microseconds: rest * MICROS_PER_SECOND,
    })
}

fn map_sqlx_error(e: sqlx::Error, operation: &str, pid: Option<i32>) -> StoreError {
    if let sqlx::Error::Database(db_error) = &e {
        if db_error.is_unique_violation() {
            return StoreError::DuplicateKey(pid);
        }
    }
    error!("{operation}: {e}");
    StoreError::Storage(format!("{operation}: {e}"))
}

/// Process set stored in the `process_usage` table.
///
/// Each call acquires its own connection from the pool and returns it when the
/// call completes, whatever the outcome.
#[derive(Clone)]
pub struct PgProcessStore {
    pool: PgPool,
}

impl PgProcessStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Connects to the database and creates the process table if needed.
pub async fn connect_to_process_db(
    db_uri: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<PgPool> {
    info!("connecting to process usage database");
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(db_uri)
        .await
        .with_context(|| "Connecting to process usage database")?;
    create_tables(&pool)
        .await
        .with_context(|| "Bootstrapping process usage database")?;
    Ok(pool)
}

#[async_trait]
impl ProcessStore for PgProcessStore {
    async fn insert_one(&self, record: &ProcessRecord) -> StoreResult<()> {
        let interval = time_to_interval(record.time)?;
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error(e, "acquiring connection", None))?;
        sqlx::query(
            r#"INSERT INTO process_usage (id, "user", cpu, memory, command, time)
               VALUES ($1, $2, $3, $4, $5, $6);"#,
        )
        .bind(record.id)
        .bind(&record.user)
        .bind(record.cpu)
        .bind(record.memory)
        .bind(&record.command)
        .bind(interval)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error(e, "inserting into process_usage", Some(record.id)))?;
        debug!("inserted pid={}", record.id);
        Ok(())
    }

    async fn replace_all(&self, records: &[ProcessRecord]) -> StoreResult<()> {
        let intervals = records
            .iter()
            .map(|r| time_to_interval(r.time))
            .collect::<StoreResult<Vec<_>>>()?;
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error(e, "acquiring connection", None))?;

        let deleted = sqlx::query("DELETE FROM process_usage;")
            .execute(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error(e, "flushing process_usage", None))?;
        info!("process set flushed, {} rows deleted", deleted.rows_affected());
        if records.is_empty() {
            return Ok(());
        }

        // dropping the transaction on error rolls the whole batch back
        let mut tr = conn
            .begin()
            .await
            .map_err(|e| map_sqlx_error(e, "beginning batch transaction", None))?;
        let rows: Vec<_> = records.iter().zip(intervals).collect();
        for chunk in rows.chunks(INSERT_CHUNK_SIZE) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                r#"INSERT INTO process_usage (id, "user", cpu, memory, command, time) "#,
            );
            builder.push_values(chunk, |mut row, (record, interval)| {
                row.push_bind(record.id)
                    .push_bind(record.user.clone())
                    .push_bind(record.cpu)
                    .push_bind(record.memory)
                    .push_bind(record.command.clone())
                    .push_bind(interval.clone());
            });
            builder
                .build()
                .execute(&mut *tr)
                .await
                .map_err(|e| {
                    map_sqlx_error(e, "bulk inserting into process_usage", first_duplicate_id(records))
                })?;
        }
        tr.commit()
            .await
            .map_err(|e| map_sqlx_error(e, "committing batch", first_duplicate_id(records)))?;
        info!("inserted {} processes", records.len());
        Ok(())
    }

    async fn get_one(&self, pid: i32) -> StoreResult<ProcessRecord> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error(e, "acquiring connection", None))?;
        let row = sqlx::query_as::<_, ProcessRow>(
            r#"SELECT id, "user", cpu, memory, command, time
               FROM process_usage
               WHERE id = $1;"#,
        )
        .bind(pid)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error(e, "reading process_usage", None))?
        .ok_or(StoreError::NotFound(pid))?;
        row.try_into()
    }

    async fn list_all(&self, skip: u32, limit: u32) -> StoreResult<Vec<ProcessRecord>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error(e, "acquiring connection", None))?;
        let rows = sqlx::query_as::<_, ProcessRow>(
            r#"SELECT id, "user", cpu, memory, command, time
               FROM process_usage
               ORDER BY id
               OFFSET $1
               LIMIT $2;"#,
        )
        .bind(i64::from(skip))
        .bind(i64::from(limit))
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error(e, "listing process_usage", None))?;
        rows.into_iter().map(ProcessRecord::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_conversion() {
        let time = ProcessTime::parse("2-43:23:04").unwrap();
        let interval = time_to_interval(time).unwrap();
        assert_eq!(interval.months, 0);
        assert_eq!(interval.days, 3);
        assert_eq!(interval.microseconds, 69_784 * MICROS_PER_SECOND);
        assert_eq!(interval_to_time(&interval).unwrap(), time);
    }

    #[test]
    fn test_interval_with_unfolded_hours() {
        // postgres keeps `1 day 30:00:00` as is unless justified
        let interval = PgInterval {
            months: 0,
            days: 1,
            microseconds: 30 * 3600 * MICROS_PER_SECOND,
        };
        assert_eq!(interval_to_time(&interval).unwrap().to_string(), "2 days, 6:00:00");
    }

    #[test]
    fn test_negative_interval_rejected() {
        let interval = PgInterval {
            months: 0,
            days: 0,
            microseconds: -1,
        };
        assert!(matches!(
            interval_to_time(&interval),
            Err(StoreError::Storage(_))
        ));
    }
}
