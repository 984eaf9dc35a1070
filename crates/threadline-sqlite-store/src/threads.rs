//! Implementation of ThreadStorage for SQLite storage.

use rusqlite::{Connection, OptionalExtension, params};
use threadline_store_traits::threads::ThreadStorage;
use threadline_store_traits::threads::types::ThreadRecord;
use threadline_store_traits::{Resource, StoreError, ThreadId, normalize_address};

use crate::SqliteStore;
use crate::error::into_store_err;

/// Looks up the thread for `address`, inserting it when missing.
///
/// Returns the id and whether a row was created.
pub(crate) fn get_or_create_thread(
    conn: &Connection,
    address: &str,
) -> Result<(ThreadId, bool), rusqlite::Error> {
    let key = normalize_address(address);
    let existing: Option<ThreadId> = conn
        .query_row(
            "SELECT id FROM threads WHERE address_key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok((id, false));
    }
    conn.execute(
        "INSERT INTO threads (address_key, address) VALUES (?1, ?2)",
        params![key, address.trim()],
    )?;
    Ok((conn.last_insert_rowid(), true))
}

impl ThreadStorage for SqliteStore {
    fn threads(&self) -> Result<Vec<ThreadRecord>, StoreError> {
        self.with_connection(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT t.id,
                            newest.date,
                            newest.body,
                            (SELECT MIN(COALESCE(s.read, 1)) FROM sms s WHERE s.thread_id = t.id)
                     FROM threads t
                     JOIN sms newest ON newest.id = (
                         SELECT s.id FROM sms s
                         WHERE s.thread_id = t.id
                         ORDER BY s.date DESC, s.id DESC
                         LIMIT 1
                     )
                     ORDER BY newest.date DESC, t.id DESC",
                )
                .map_err(into_store_err)?;
            let rows = stmt
                .query_map([], |row| {
                    let read: Option<i64> = row.get(3)?;
                    Ok(ThreadRecord {
                        id: row.get(0)?,
                        date_ms: row.get(1)?,
                        snippet: row.get(2)?,
                        read: read.map(|r| r != 0),
                    })
                })
                .map_err(into_store_err)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(into_store_err)
        })
    }

    fn thread_addresses(&self, thread_id: ThreadId) -> Result<Vec<String>, StoreError> {
        self.with_connection(|conn| {
            let mut stmt = conn
                .prepare("SELECT COALESCE(address, '') FROM sms WHERE thread_id = ?1 ORDER BY id")
                .map_err(into_store_err)?;
            let rows = stmt
                .query_map(params![thread_id], |row| row.get::<_, String>(0))
                .map_err(into_store_err)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(into_store_err)
        })
    }

    fn thread_id_for_address(&self, address: &str) -> Result<ThreadId, StoreError> {
        if address.trim().is_empty() {
            return Err(StoreError::InvalidInput("empty address".to_string()));
        }
        let (id, created) = self
            .with_connection(|conn| get_or_create_thread(conn, address))
            .map_err(into_store_err)?;
        if created {
            self.notify(&[Resource::Threads]);
        }
        Ok(id)
    }
}
