use std::sync::Arc;

use crate::config::Config;
use crate::db::Database;

pub struct AppState {
    pub db: Database,
    pub config: Config,
}

impl AppState {
    pub fn new() -> Arc<Self> {
        let config = Config::load();

        let db = Database::open(&config.database_path).expect("Failed to open database");
        db.initialize().expect("Failed to initialize database");

        Arc::new(Self { db, config })
    }
}
