//! Threadline storage - traits and record types for the external message store.
//!
//! The store is the authority for threads, SMS records and contacts. The sync
//! engine never caches what it reads from here; it re-queries whenever an
//! observer registered through [`MessageStore::register_observer`] reports that
//! a [`Resource`] changed.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

pub mod contacts;
pub mod error;
pub mod sms;
#[cfg(feature = "test-utils")]
pub mod test_utils;
pub mod threads;

pub use error::StoreError;

use self::contacts::ContactStorage;
use self::sms::SmsStorage;
use self::threads::ThreadStorage;

/// Stable identifier of a conversation thread, assigned by the store.
pub type ThreadId = i64;

/// Backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// Memory
    Memory,
    /// SQLite
    SQLite,
}

impl Backend {
    /// Check if it's a persistent backend
    ///
    /// All values different from [`Backend::Memory`] are considered persistent
    pub fn is_persistent(&self) -> bool {
        !matches!(self, Self::Memory)
    }
}

/// Logical resource a change notification is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    /// Thread rows (snippet, date, read flag).
    Threads,
    /// Individual SMS records.
    Messages,
    /// Contacts and their phone numbers.
    Contacts,
}

impl Resource {
    /// Every resource, in a fixed order.
    pub const ALL: [Resource; 3] = [Resource::Threads, Resource::Messages, Resource::Contacts];

    /// Get as `&str`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Threads => "threads",
            Self::Messages => "messages",
            Self::Contacts => "contacts",
        }
    }
}

/// Receives content-free "this resource changed" notifications.
///
/// Called after the mutation is visible to readers and outside any store lock,
/// so implementations may query the store from inside `on_change`.
pub trait StoreObserver: Send + Sync {
    /// A resource changed; what changed is unknown.
    fn on_change(&self, resource: Resource);
}

/// Observer registry shared by the backends.
#[derive(Default)]
pub struct ObserverSet {
    observers: RwLock<Vec<Arc<dyn StoreObserver>>>,
}

impl ObserverSet {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an observer. Registering the same observer twice delivers twice.
    pub fn register(&self, observer: Arc<dyn StoreObserver>) {
        self.observers.write().push(observer);
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.observers.read().len()
    }

    /// Returns true when nobody is listening.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Notifies every observer of every resource in `resources`.
    pub fn notify(&self, resources: &[Resource]) {
        // Snapshot the list so observers can register from inside a callback.
        let observers = self.observers.read().clone();
        for resource in resources {
            for observer in &observers {
                observer.on_change(*resource);
            }
        }
    }
}

impl std::fmt::Debug for ObserverSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverSet")
            .field("observers", &self.len())
            .finish()
    }
}

/// Storage provider for the message store.
///
/// Implementors must provide:
/// - Thread storage (thread rows derived from their messages, get-or-create by address)
/// - SMS storage (per-thread message lists, inserts, read marking)
/// - Contact storage (contacts, their numbers, display-name lookup)
/// - Change notification for every mutation
pub trait MessageStore: ThreadStorage + SmsStorage + ContactStorage + Send + Sync {
    /// Returns the backend type.
    fn backend(&self) -> Backend;

    /// Registers an observer that is told about every subsequent change.
    fn register_observer(&self, observer: Arc<dyn StoreObserver>);
}

/// Normalizes a phone number or other address for matching.
///
/// Phone numbers keep only their digits and `+`; anything without a digit
/// (e.g. an email gateway address) is trimmed and lowercased instead.
pub fn normalize_address(address: &str) -> String {
    let trimmed = address.trim();
    let dialable: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    if dialable.chars().any(|c| c.is_ascii_digit()) {
        dialable
    } else {
        trimmed.to_lowercase()
    }
}
