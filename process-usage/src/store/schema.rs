use anyhow::{Context, Result};
use sqlx::{Executor, PgPool};
use tracing::info;

// time holds the elapsed cpu time, days and hours folded into microseconds
const PROCESS_USAGE_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS process_usage(
        id INTEGER PRIMARY KEY,
        "user" VARCHAR NOT NULL,
        cpu DOUBLE PRECISION NOT NULL,
        memory DOUBLE PRECISION NOT NULL,
        command VARCHAR NOT NULL,
        time INTERVAL NOT NULL
    );
    CREATE INDEX IF NOT EXISTS process_usage_user ON process_usage("user");
"#;

/// Creates the `process_usage` table and its index when they are missing.
pub async fn create_tables(pool: &PgPool) -> Result<()> {
    pool.execute(PROCESS_USAGE_DDL)
        .await
        .with_context(|| "Creating process_usage table and indices")?;
    info!("process_usage table ready");
    Ok(())
}
