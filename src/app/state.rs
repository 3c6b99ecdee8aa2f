// ==========================================
// Sales Projection - Application state
// ==========================================
// Owns the shared connection and the long-lived API instances
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::api::{HistoryApi, ImportApi, ProjectionApi};
use crate::config::ConfigManager;
use crate::db::open_and_init;

/// Environment variable overriding the database location
pub const DB_PATH_ENV: &str = "SALES_PROJECTION_DB_PATH";

/// Application state
///
/// Build it once per process: the import API keeps the per-company
/// locks, so a fresh instance per request would not serialize imports.
pub struct AppState {
    pub db_path: String,
    pub import_api: Arc<ImportApi>,
    pub projection_api: Arc<ProjectionApi>,
    pub history_api: Arc<HistoryApi>,
    pub config: Arc<ConfigManager>,
}

impl AppState {
    /// Open (and create if needed) the database and build every API
    ///
    /// # Returns
    /// - Err(String): the database could not be opened or initialized
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("inicializando AppState, base de datos: {}", db_path);

        let conn = open_and_init(&db_path)
            .map_err(|e| format!("no se pudo abrir la base de datos {}: {}", db_path, e))?;
        let conn = Arc::new(Mutex::new(conn));

        let import_api = ImportApi::new(conn.clone()).map_err(|e| e.to_string())?;
        let projection_api = ProjectionApi::new(conn.clone()).map_err(|e| e.to_string())?;
        let history_api = HistoryApi::new(conn.clone());
        let config = ConfigManager::from_connection(conn)
            .map_err(|e| format!("no se pudo crear ConfigManager: {}", e))?;

        tracing::info!("AppState listo");

        Ok(Self {
            db_path,
            import_api: Arc::new(import_api),
            projection_api: Arc::new(projection_api),
            history_api: Arc::new(history_api),
            config: Arc::new(config),
        })
    }
}

/// Default database path
///
/// Order: `SALES_PROJECTION_DB_PATH`, then the user data directory,
/// then the working directory.
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./sales_projection.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("sales-projection");
        // best-effort: on failure the open below reports the real error
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("sales_projection.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_app_state_initializes_schema() {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap().to_string();

        let state = AppState::new(db_path.clone()).unwrap();
        assert_eq!(state.db_path, db_path);
        assert!(state.history_api.list_companies().unwrap().is_empty());

        state
            .config
            .set_config_value("import.max_data_rows", "500")
            .unwrap();
        let snapshot = state.config.get_config_snapshot().unwrap();
        assert_eq!(snapshot.get("import.max_data_rows").map(String::as_str), Some("500"));
    }

    #[test]
    fn test_app_state_reports_unopenable_path() {
        let dir = tempfile::tempdir().unwrap();
        let bad_path = dir.path().join("missing").join("nested").join("db.sqlite");

        let result = AppState::new(bad_path.to_string_lossy().to_string());
        assert!(result.is_err());
    }
}
