//! SMS module
//!
//! Individual message records. Inserting a record files it under the thread
//! of its address (creating the thread when needed) and marks both the
//! messages and the threads resource as changed.

pub mod types;

use crate::{StoreError, ThreadId};

use self::types::{NewSms, SmsRecord};

/// Storage traits for the SMS module
pub trait SmsStorage {
    /// Messages of one thread, ascending by date (ties broken by id).
    ///
    /// An unknown or empty thread yields an empty list, not an error.
    fn messages_in_thread(&self, thread_id: ThreadId) -> Result<Vec<SmsRecord>, StoreError>;

    /// Appends a message and returns the stored record.
    fn insert_message(&self, message: NewSms) -> Result<SmsRecord, StoreError>;

    /// Marks every message of the thread read.
    ///
    /// Returns how many records changed; an already-read or unknown thread
    /// returns `Ok(0)`.
    fn mark_thread_read(&self, thread_id: ThreadId) -> Result<usize, StoreError>;
}
