// ==========================================
// Sales Projection - Application layer
// ==========================================
// Wires one shared connection into every API instance
// ==========================================

pub mod state;

pub use state::{get_default_db_path, AppState};
