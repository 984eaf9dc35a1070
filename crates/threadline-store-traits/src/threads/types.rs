//! Types for the threads module

use serde::{Deserialize, Serialize};

use crate::ThreadId;

/// One row of the thread table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadRecord {
    /// Thread id
    pub id: ThreadId,
    /// Date of the newest message, milliseconds since the Unix epoch
    pub date_ms: i64,
    /// Body of the newest message
    pub snippet: Option<String>,
    /// Whether every message is read; `None` when the store does not know
    pub read: Option<bool>,
}
