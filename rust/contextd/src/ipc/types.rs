use crate::store::SqliteStore;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Default)]
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub store: Option<SqliteStore>,
}

impl AppState {
    /// Opens (creating if needed) the workspace database and makes it current.
    pub fn open_workspace(&mut self, path: &Path) -> anyhow::Result<()> {
        let store = SqliteStore::open(path)?;
        self.workspace = Some(path.to_path_buf());
        self.store = Some(store);
        Ok(())
    }

    /// Drops the open handle so the database file can be replaced.
    pub fn close_store(&mut self) {
        self.store = None;
    }
}
