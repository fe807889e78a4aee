use serde::Deserialize;

use crate::store::RecordStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Session state. The record store is owned here and passed into every
/// operation; there is no process-wide singleton.
pub struct AppState {
    pub store: RecordStore,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            store: RecordStore::new(),
        }
    }
}
