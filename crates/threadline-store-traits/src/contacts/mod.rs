//! Contacts module
//!
//! Address-book entries and their phone numbers. The `has_phone_number`
//! flag is maintained by whoever writes the contact and is not guaranteed
//! to agree with the number rows.

pub mod types;

use crate::StoreError;

use self::types::ContactRecord;

/// Storage traits for the contacts module
pub trait ContactStorage {
    /// All contacts, ordered by display name ignoring ASCII case.
    fn contacts(&self) -> Result<Vec<ContactRecord>, StoreError>;

    /// Phone numbers of one contact in insertion order; unknown ids yield
    /// an empty list.
    fn contact_numbers(&self, contact_id: i64) -> Result<Vec<String>, StoreError>;

    /// Display name of the first contact owning `address`, matched after
    /// [`crate::normalize_address`].
    fn lookup_display_name(&self, address: &str) -> Result<Option<String>, StoreError>;

    /// Inserts or replaces a contact together with its numbers.
    fn save_contact(&self, contact: ContactRecord, numbers: Vec<String>) -> Result<(), StoreError>;
}
