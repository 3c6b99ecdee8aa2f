// ==========================================
// Sales Projection - Config manager
// ==========================================
// Load / query / override settings
// Storage: config_kv table (key-value + scope)
// ==========================================

use crate::config::import_config_trait::{ConfigResult, ImportConfigReader, ProjectionConfigReader};
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

// ==========================================
// Config keys
// ==========================================
pub mod config_keys {
    // import
    pub const IMPORT_MAX_DATA_ROWS: &str = "import.max_data_rows";

    // projection
    pub const PROJECTION_MIN_HISTORY_POINTS: &str = "projection.min_history_points";
}

pub mod config_defaults {
    pub const IMPORT_MAX_DATA_ROWS: usize = 1000;
    pub const PROJECTION_MIN_HISTORY_POINTS: usize = 2;
}

// ==========================================
// ConfigManager
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// # Arguments
    /// - db_path: database file path
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Share an existing connection.
    ///
    /// The shared PRAGMAs are applied again (idempotent).
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| format!("no se pudo obtener el bloqueo: {}", e))?;
            crate::db::configure_sqlite_connection(&guard)?;
        }
        Ok(Self { conn })
    }

    fn get_conn(&self) -> ConfigResult<MutexGuard<'_, Connection>> {
        Ok(self
            .conn
            .lock()
            .map_err(|e| format!("no se pudo obtener el bloqueo: {}", e))?)
    }

    /// Read a global value
    ///
    /// # Returns
    /// - Some(String): stored value
    /// - None: not configured
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Insert or overwrite a global value
    pub fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// All global values, ordered by key
    pub fn get_config_snapshot(&self) -> ConfigResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let snapshot = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(snapshot)
    }

    /// Parsed value, or `default` when missing, malformed or below `min`.
    /// Values above `max` are lowered to `max`.
    fn get_parsed_bounded<T>(&self, key: &str, default: T, min: T, max: T) -> ConfigResult<T>
    where
        T: FromStr + PartialOrd + Copy + std::fmt::Display,
    {
        let Some(raw) = self.get_global_config_value(key)? else {
            return Ok(default);
        };
        match raw.trim().parse::<T>() {
            Ok(value) if value > max => {
                warn!(key, value = %raw, max = %max, "config value above limit, using limit");
                Ok(max)
            }
            Ok(value) if value >= min => Ok(value),
            _ => {
                warn!(key, value = %raw, default = %default, "invalid config value, using default");
                Ok(default)
            }
        }
    }
}

#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_max_data_rows(&self) -> ConfigResult<usize> {
        // config may only tighten the file limit
        self.get_parsed_bounded(
            config_keys::IMPORT_MAX_DATA_ROWS,
            config_defaults::IMPORT_MAX_DATA_ROWS,
            1,
            config_defaults::IMPORT_MAX_DATA_ROWS,
        )
    }
}

#[async_trait]
impl ProjectionConfigReader for ConfigManager {
    async fn get_min_history_points(&self) -> ConfigResult<usize> {
        self.get_parsed_bounded(
            config_keys::PROJECTION_MIN_HISTORY_POINTS,
            config_defaults::PROJECTION_MIN_HISTORY_POINTS,
            2,
            usize::MAX,
        )
    }
}
