use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed provenance tag written into every stored record
pub const CLIENT_TAG: &str = "SealDice";

/// The persisted unit: one uploaded log file with its metadata.
///
/// Immutable after creation. `updated_at` always equals `created_at` and
/// `note` is reserved for future use; both exist so the stored JSON keeps
/// its full shape for clients that already consume it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub client: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub name: String,
    pub data: String,
    pub note: String,
}

impl StoredRecord {
    /// Build a record from already-base64-encoded payload text and a
    /// display name. Both timestamps are set to the current time.
    pub fn new(data: String, name: String) -> Self {
        let now = Utc::now();
        Self {
            client: CLIENT_TAG.to_string(),
            created_at: now,
            updated_at: now,
            name,
            data,
            note: String::new(),
        }
    }
}
