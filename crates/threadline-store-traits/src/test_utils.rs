//! Builders shared by backend and engine tests.

use crate::contacts::types::ContactRecord;
use crate::sms::types::NewSms;

/// A contact that claims to have a phone number.
pub fn contact(id: i64, display_name: &str) -> ContactRecord {
    ContactRecord {
        id,
        display_name: display_name.to_string(),
        has_phone_number: true,
        photo_uri: None,
    }
}

/// A contact whose address book entry says it has no phone number.
pub fn contact_without_number(id: i64, display_name: &str) -> ContactRecord {
    ContactRecord {
        has_phone_number: false,
        ..contact(id, display_name)
    }
}

/// An unread incoming message.
pub fn incoming(address: &str, body: &str, date_ms: i64) -> NewSms {
    NewSms::received(address, body, date_ms)
}

/// A sent message.
pub fn outgoing(address: &str, body: &str, date_ms: i64) -> NewSms {
    NewSms::sent(address, body, date_ms)
}
