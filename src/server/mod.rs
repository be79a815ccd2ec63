//! Live server access
//! Author: kartik4091
//! Created: 2025-06-06
//!
//! The reconcilers only talk to a server through [`GucServer`], so the
//! PostgreSQL implementation here can be swapped for an in-memory one.

use async_trait::async_trait;
use sqlx::{Connection, Executor, PgConnection, Row};
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::utils::{normalize_value, text::is_valid_setting_name};

pub mod conninfo;

pub use conninfo::parse_conninfo;

/// First release with `ALTER SYSTEM`.
pub const MIN_ALTER_SYSTEM_VERSION: i32 = 90400;

const NON_DEFAULT_SETTINGS_QUERY: &str = "\
SELECT name,
       CASE WHEN vartype = 'string'
            THEN pg_catalog.quote_literal(pg_catalog.current_setting(name))
            ELSE pg_catalog.current_setting(name)
       END AS value,
       coalesce(sourcefile, '') AS sourcefile
  FROM pg_catalog.pg_settings
 WHERE source = 'configuration file'
   AND context <> 'internal'
   AND setting IS DISTINCT FROM boot_val
 ORDER BY name";

const CURRENT_VALUE_QUERY: &str = "\
SELECT pg_catalog.current_setting(name)
  FROM pg_catalog.pg_settings
 WHERE lower(name) = lower($1)";

/// A setting row reported by a server's settings catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSetting {
    pub name: String,
    pub value: String,
    pub sourcefile: String,
}

/// Operations the migration needs from a running server.
#[async_trait]
pub trait GucServer: Send {
    /// `server_version_num` of the server.
    async fn version_num(&mut self) -> Result<i32>;

    /// Settings changed from their boot value by the configuration file.
    async fn non_default_settings(&mut self) -> Result<Vec<ServerSetting>>;

    /// Current value of `name`, looked up case-insensitively.
    async fn current_value(&mut self, name: &str) -> Result<Option<String>>;

    /// Persists `name = value` with `ALTER SYSTEM`.
    async fn alter_system(&mut self, name: &str, value: &str) -> Result<()>;
}

/// [`GucServer`] backed by a single PostgreSQL connection.
pub struct PgServer {
    conn: PgConnection,
}

impl PgServer {
    pub async fn connect(conninfo: &str) -> Result<Self> {
        let options = parse_conninfo(conninfo)?;
        let conn = PgConnection::connect_with(&options).await?;
        Ok(Self { conn })
    }

    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }
}

#[async_trait]
impl GucServer for PgServer {
    async fn version_num(&mut self) -> Result<i32> {
        let version: String = sqlx::query_scalar("SELECT pg_catalog.current_setting('server_version_num')")
            .fetch_one(&mut self.conn)
            .await?;
        version
            .trim()
            .parse::<i32>()
            .map_err(|_| Error::ConfigError(format!("unexpected server_version_num: {}", version)))
    }

    async fn non_default_settings(&mut self) -> Result<Vec<ServerSetting>> {
        let rows = sqlx::query(NON_DEFAULT_SETTINGS_QUERY)
            .fetch_all(&mut self.conn)
            .await?;

        let mut settings = Vec::with_capacity(rows.len());
        for row in rows {
            settings.push(ServerSetting {
                name: row.try_get("name")?,
                value: row.try_get("value")?,
                sourcefile: row.try_get("sourcefile")?,
            });
        }
        Ok(settings)
    }

    async fn current_value(&mut self, name: &str) -> Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar(CURRENT_VALUE_QUERY)
            .bind(name)
            .fetch_optional(&mut self.conn)
            .await?;
        Ok(value)
    }

    #[instrument(skip(self))]
    async fn alter_system(&mut self, name: &str, value: &str) -> Result<()> {
        let statement = alter_system_statement(name, value)?;
        debug!("{}", statement);
        self.conn.execute(statement.as_str()).await?;
        Ok(())
    }
}

/// Renders an `ALTER SYSTEM SET` statement with quoted identifier and literal.
pub fn alter_system_statement(name: &str, value: &str) -> Result<String> {
    if !is_valid_setting_name(name) {
        return Err(Error::InvalidSettingName(name.to_string()));
    }

    let ident = name
        .split('.')
        .map(|part| format!("\"{}\"", part))
        .collect::<Vec<_>>()
        .join(".");

    Ok(format!("ALTER SYSTEM SET {} = {}", ident, quote_literal(&normalize_value(value))))
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alter_system_statement() {
        assert_eq!(
            alter_system_statement("work_mem", "64MB").unwrap(),
            "ALTER SYSTEM SET \"work_mem\" = '64MB'"
        );
        assert_eq!(
            alter_system_statement("auto_explain.log_min_duration", "'250ms'").unwrap(),
            "ALTER SYSTEM SET \"auto_explain\".\"log_min_duration\" = '250ms'"
        );
    }

    #[test]
    fn test_alter_system_escapes_quotes() {
        assert_eq!(
            alter_system_statement("archive_command", "'it''s'").unwrap(),
            "ALTER SYSTEM SET \"archive_command\" = 'it''s'"
        );
    }

    #[test]
    fn test_alter_system_rejects_bad_names() {
        assert!(matches!(
            alter_system_statement("work_mem; DROP TABLE x", "1"),
            Err(Error::InvalidSettingName(_))
        ));
    }
}
