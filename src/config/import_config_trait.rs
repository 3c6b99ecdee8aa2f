// ==========================================
// Sales Projection - Config reader traits
// ==========================================
// Read-only views the importer and the projection engine depend on.
// No writes, no business logic.
// ==========================================

use async_trait::async_trait;
use std::error::Error;

pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// Implementor: ConfigManager (config_kv table)
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// Data rows allowed per file, header excluded
    ///
    /// # Default
    /// - 1000 (also the ceiling; larger values are ignored by the importer)
    async fn get_max_data_rows(&self) -> ConfigResult<usize>;
}

// ==========================================
// ProjectionConfigReader Trait
// ==========================================
#[async_trait]
pub trait ProjectionConfigReader: Send + Sync {
    /// Minimum history length before projecting (never below 2)
    ///
    /// # Default
    /// - 2
    async fn get_min_history_points(&self) -> ConfigResult<usize>;
}
