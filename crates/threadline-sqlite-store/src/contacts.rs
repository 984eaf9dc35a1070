//! Implementation of ContactStorage for SQLite storage.

use rusqlite::{OptionalExtension, params};
use threadline_store_traits::contacts::ContactStorage;
use threadline_store_traits::contacts::types::ContactRecord;
use threadline_store_traits::{Resource, StoreError, normalize_address};

use crate::SqliteStore;
use crate::error::into_store_err;

impl ContactStorage for SqliteStore {
    fn contacts(&self) -> Result<Vec<ContactRecord>, StoreError> {
        self.with_connection(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, display_name, has_phone_number, photo_uri
                     FROM contacts
                     ORDER BY display_name COLLATE NOCASE ASC, id ASC",
                )
                .map_err(into_store_err)?;
            let rows = stmt
                .query_map([], |row| {
                    let has_phone_number: i64 = row.get(2)?;
                    Ok(ContactRecord {
                        id: row.get(0)?,
                        display_name: row.get(1)?,
                        has_phone_number: has_phone_number > 0,
                        photo_uri: row.get(3)?,
                    })
                })
                .map_err(into_store_err)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(into_store_err)
        })
    }

    fn contact_numbers(&self, contact_id: i64) -> Result<Vec<String>, StoreError> {
        self.with_connection(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT number FROM contact_numbers
                     WHERE contact_id = ?1
                     ORDER BY position ASC",
                )
                .map_err(into_store_err)?;
            let rows = stmt
                .query_map(params![contact_id], |row| row.get::<_, String>(0))
                .map_err(into_store_err)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(into_store_err)
        })
    }

    fn lookup_display_name(&self, address: &str) -> Result<Option<String>, StoreError> {
        let key = normalize_address(address);
        if key.is_empty() {
            return Ok(None);
        }
        self.with_connection(|conn| {
            conn.query_row(
                "SELECT c.display_name
                 FROM contact_numbers n
                 JOIN contacts c ON c.id = n.contact_id
                 WHERE n.number_key = ?1
                 ORDER BY c.id ASC, n.position ASC
                 LIMIT 1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(into_store_err)
        })
    }

    fn save_contact(&self, contact: ContactRecord, numbers: Vec<String>) -> Result<(), StoreError> {
        self.with_connection(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO contacts (id, display_name, has_phone_number, photo_uri)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                     display_name = excluded.display_name,
                     has_phone_number = excluded.has_phone_number,
                     photo_uri = excluded.photo_uri",
                params![
                    contact.id,
                    &contact.display_name,
                    contact.has_phone_number as i64,
                    &contact.photo_uri,
                ],
            )?;
            tx.execute(
                "DELETE FROM contact_numbers WHERE contact_id = ?1",
                params![contact.id],
            )?;
            for (position, number) in numbers.iter().enumerate() {
                tx.execute(
                    "INSERT INTO contact_numbers (contact_id, position, number, number_key)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![contact.id, position as i64, number, normalize_address(number)],
                )?;
            }
            tx.commit()
        })
        .map_err(into_store_err)?;
        self.notify(&[Resource::Contacts]);
        Ok(())
    }
}
