mod migrations;
mod models;
mod repository;
pub mod retention;

pub use models::*;
pub use repository::Database;

use crate::config::Config;
use crate::error::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Open the database, creating the parent directory and running migrations.
pub fn init(config: &Config) -> Result<Arc<Database>> {
    let db_path = &config.storage.db_path;

    if let Some(parent) = Path::new(db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    info!(path = %db_path, "Initializing database");

    let db = Database::new(db_path)?;
    db.migrate()?;

    Ok(Arc::new(db))
}
