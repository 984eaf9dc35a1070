//! Threads module
//!
//! A thread groups every SMS exchanged with one address. Thread rows are
//! derived from their messages: the date and snippet follow the newest
//! message, and the read flag is set only when every message is read.

pub mod types;

use crate::{StoreError, ThreadId};

use self::types::ThreadRecord;

/// Storage traits for the threads module
pub trait ThreadStorage {
    /// All threads holding at least one message, most recent activity first.
    fn threads(&self) -> Result<Vec<ThreadRecord>, StoreError>;

    /// Raw addresses of every message in the thread, in storage order.
    ///
    /// Addresses may repeat and may be empty; an unknown thread yields an
    /// empty list.
    fn thread_addresses(&self, thread_id: ThreadId) -> Result<Vec<String>, StoreError>;

    /// Returns the thread for `address`, creating it when none exists.
    ///
    /// Addresses are matched after [`crate::normalize_address`], so
    /// `"555-1234"` and `"5551234"` share a thread.
    fn thread_id_for_address(&self, address: &str) -> Result<ThreadId, StoreError>;
}
