use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshRecord {
    pub refreshed_at: String,
    pub subject_count: u32,
    pub source: String,
}
