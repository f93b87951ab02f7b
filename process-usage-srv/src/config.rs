//! Database connection settings

use anyhow::{Context, Result};
use url::Url;

/// Variables the connection string is assembled from when none is given.
pub const POSTGRES_VARIABLES: [&str; 4] =
    ["POSTGRES_USER", "POSTGRES_PASSWORD", "POSTGRES_HOST", "POSTGRES_DB"];

/// Builds a postgres url, percent-encoding the credentials.
/// `host` may carry a port (`db.local:5432`).
pub fn build_connection_string(user: &str, password: &str, host: &str, db: &str) -> Result<String> {
    let mut url = Url::parse(&format!("postgres://{host}"))
        .with_context(|| format!("invalid postgres host {host:?}"))?;
    url.set_username(user)
        .map_err(|_| anyhow::anyhow!("cannot set postgres user"))?;
    url.set_password(Some(password))
        .map_err(|_| anyhow::anyhow!("cannot set postgres password"))?;
    url.set_path(db);
    Ok(url.to_string())
}

/// Reads `POSTGRES_USER`, `POSTGRES_PASSWORD`, `POSTGRES_HOST` and `POSTGRES_DB`
/// through `lookup`, naming every missing one in the error.
pub fn connection_string_from_vars<F>(lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let values = POSTGRES_VARIABLES.map(|name| lookup(name));
    if let [Some(user), Some(password), Some(host), Some(db)] = &values {
        return build_connection_string(user, password, host, db);
    }
    let missing: Vec<&str> = POSTGRES_VARIABLES
        .iter()
        .zip(&values)
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| *name)
        .collect();
    anyhow::bail!(
        "no connection string given and missing environment variables: {}",
        missing.join(", ")
    )
}

pub fn connection_string_from_env() -> Result<String> {
    connection_string_from_vars(|name| std::env::var(name).ok())
}
