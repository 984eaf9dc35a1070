use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use threadline_store_traits::ThreadId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub thread_id: ThreadId,
    pub title: String,
    pub snippet: String,
    pub timestamp: DateTime<Utc>,
    /// 0 or 1; the store only keeps a per-thread read flag.
    pub unread_count: u32,
    /// Display names where the address resolved to a contact, raw addresses otherwise.
    pub participants: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Incoming,
    Outgoing,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub thread_id: ThreadId,
    pub address: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
    pub direction: Direction,
    pub read: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub display_name: String,
    /// Never empty.
    pub numbers: Vec<String>,
    pub photo_uri: Option<String>,
}

/// An alert currently shown for a thread. At most one per thread.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAlert {
    pub thread_id: ThreadId,
    pub address: String,
    pub body: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotStatus {
    /// No result yet for this scope.
    Loading,
    Fresh,
    /// The latest query failed; `items` are the last good result.
    Stale,
}

/// One published view of a sync engine. Cloning shares `items`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<S, T> {
    pub scope: S,
    pub rev: u64,
    pub status: SnapshotStatus,
    pub items: Arc<Vec<T>>,
}

impl<S, T> Snapshot<S, T> {
    pub fn empty(scope: S, status: SnapshotStatus) -> Self {
        Self {
            scope,
            rev: 0,
            status,
            items: Arc::new(Vec::new()),
        }
    }

    pub fn is_fresh(&self) -> bool {
        self.status == SnapshotStatus::Fresh
    }
}

pub type ConversationSnapshot = Snapshot<(), Conversation>;
pub type MessageSnapshot = Snapshot<Option<ThreadId>, Message>;
pub type ContactSnapshot = Snapshot<(), Contact>;

pub(crate) fn timestamp_from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or_default()
}
