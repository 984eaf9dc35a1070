//! Types for the contacts module

use serde::{Deserialize, Serialize};

/// One address-book entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    /// Contact id
    pub id: i64,
    /// Name shown to the user
    pub display_name: String,
    /// Whether the address book claims this contact has a number
    pub has_phone_number: bool,
    /// Reference to the contact photo, if any
    pub photo_uri: Option<String>,
}
