//! SQLite-based message store for threadline.
//!
//! Implements [`MessageStore`] on a single SQLite connection. The schema is
//! created and upgraded by embedded migrations when the store is opened.
//!
//! Thread rows only hold the address a thread belongs to; date, snippet and
//! read flag are derived from the `sms` table at query time, so they can
//! never disagree with the messages.
//!
//! ```rust,ignore
//! use threadline_sqlite_store::SqliteStore;
//!
//! let store = SqliteStore::open("/path/to/messages.sqlite")?;
//! let threads = store.threads()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::Connection;
use threadline_store_traits::{Backend, MessageStore, ObserverSet, Resource, StoreObserver};

mod contacts;
pub mod error;
mod migrations;
mod sms;
mod threads;

pub use self::error::Error;

/// A message store backed by SQLite.
pub struct SqliteStore {
    connection: Arc<Mutex<Connection>>,
    observers: ObserverSet,
}

impl SqliteStore {
    /// Opens (or creates) the database at `file_path` and applies pending
    /// migrations. `":memory:"` opens a private in-memory database.
    pub fn open<P>(file_path: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        let connection = Connection::open(file_path)?;
        Self::from_connection(connection)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self, Error> {
        let connection = Connection::open_in_memory()?;
        Self::from_connection(connection)
    }

    fn from_connection(mut connection: Connection) -> Result<Self, Error> {
        connection.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::run_migrations(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            observers: ObserverSet::new(),
        })
    }

    pub(crate) fn with_connection<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut Connection) -> T,
    {
        let mut conn = self.connection.lock();
        f(&mut conn)
    }

    /// Notifies observers. Must be called after the connection lock is released.
    pub(crate) fn notify(&self, resources: &[Resource]) {
        self.observers.notify(resources);
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("observers", &self.observers)
            .finish_non_exhaustive()
    }
}

impl MessageStore for SqliteStore {
    fn backend(&self) -> Backend {
        Backend::SQLite
    }

    fn register_observer(&self, observer: Arc<dyn StoreObserver>) {
        self.observers.register(observer);
    }
}
