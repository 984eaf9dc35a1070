//! Implementation of SmsStorage for SQLite storage.

use rusqlite::{Row, params};
use threadline_store_traits::sms::SmsStorage;
use threadline_store_traits::sms::types::{NewSms, SmsKind, SmsRecord};
use threadline_store_traits::{Resource, StoreError, ThreadId};

use crate::SqliteStore;
use crate::error::into_store_err;
use crate::threads::get_or_create_thread;

fn row_to_sms(row: &Row<'_>) -> rusqlite::Result<SmsRecord> {
    let code: i64 = row.get(5)?;
    let kind = SmsKind::from_code(code).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Integer, Box::new(e))
    })?;
    let read: Option<i64> = row.get(6)?;
    Ok(SmsRecord {
        id: row.get(0)?,
        thread_id: row.get(1)?,
        address: row.get(2)?,
        body: row.get(3)?,
        date_ms: row.get(4)?,
        kind,
        read: read.map(|r| r != 0),
    })
}

impl SmsStorage for SqliteStore {
    fn messages_in_thread(&self, thread_id: ThreadId) -> Result<Vec<SmsRecord>, StoreError> {
        self.with_connection(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, thread_id, address, body, date, type, read
                     FROM sms
                     WHERE thread_id = ?1
                     ORDER BY date ASC, id ASC",
                )
                .map_err(into_store_err)?;
            let rows = stmt
                .query_map(params![thread_id], row_to_sms)
                .map_err(into_store_err)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(into_store_err)
        })
    }

    fn insert_message(&self, message: NewSms) -> Result<SmsRecord, StoreError> {
        if message.address.trim().is_empty() {
            return Err(StoreError::InvalidInput("empty address".to_string()));
        }
        let record = self
            .with_connection(|conn| {
                let tx = conn.transaction()?;
                let (thread_id, _) = get_or_create_thread(&tx, &message.address)?;
                tx.execute(
                    "INSERT INTO sms (thread_id, address, body, date, type, read)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        thread_id,
                        &message.address,
                        &message.body,
                        message.date_ms,
                        message.kind.code(),
                        message.read as i64,
                    ],
                )?;
                let id = tx.last_insert_rowid();
                tx.commit()?;
                Ok::<_, rusqlite::Error>(SmsRecord {
                    id,
                    thread_id,
                    address: Some(message.address),
                    body: Some(message.body),
                    date_ms: message.date_ms,
                    kind: message.kind,
                    read: Some(message.read),
                })
            })
            .map_err(into_store_err)?;
        self.notify(&[Resource::Messages, Resource::Threads]);
        Ok(record)
    }

    fn mark_thread_read(&self, thread_id: ThreadId) -> Result<usize, StoreError> {
        let changed = self
            .with_connection(|conn| {
                conn.execute(
                    "UPDATE sms SET read = 1
                     WHERE thread_id = ?1 AND (read IS NULL OR read = 0)",
                    params![thread_id],
                )
            })
            .map_err(into_store_err)?;
        if changed > 0 {
            self.notify(&[Resource::Messages, Resource::Threads]);
        }
        Ok(changed)
    }
}
