//! Types for the SMS module

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{StoreError, ThreadId};

/// Message box a record lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmsKind {
    /// Received
    Inbox,
    /// Sent
    Sent,
    /// Draft
    Draft,
    /// Waiting to be sent
    Outbox,
    /// Sending failed
    Failed,
    /// Queued for later sending
    Queued,
}

impl SmsKind {
    /// Numeric code used by the platform message store.
    pub fn code(&self) -> i64 {
        match self {
            Self::Inbox => 1,
            Self::Sent => 2,
            Self::Draft => 3,
            Self::Outbox => 4,
            Self::Failed => 5,
            Self::Queued => 6,
        }
    }

    /// Inverse of [`SmsKind::code`].
    pub fn from_code(code: i64) -> Result<Self, StoreError> {
        match code {
            1 => Ok(Self::Inbox),
            2 => Ok(Self::Sent),
            3 => Ok(Self::Draft),
            4 => Ok(Self::Outbox),
            5 => Ok(Self::Failed),
            6 => Ok(Self::Queued),
            _ => Err(StoreError::InvalidInput(format!("Invalid sms kind: {code}"))),
        }
    }

    /// Get as `&str`
    pub fn as_str(&self) -> &str {
        match self {
            Self::Inbox => "inbox",
            Self::Sent => "sent",
            Self::Draft => "draft",
            Self::Outbox => "outbox",
            Self::Failed => "failed",
            Self::Queued => "queued",
        }
    }
}

impl fmt::Display for SmsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SmsKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inbox" => Ok(Self::Inbox),
            "sent" => Ok(Self::Sent),
            "draft" => Ok(Self::Draft),
            "outbox" => Ok(Self::Outbox),
            "failed" => Ok(Self::Failed),
            "queued" => Ok(Self::Queued),
            _ => Err(StoreError::InvalidInput(format!("Invalid sms kind: {s}"))),
        }
    }
}

/// A stored message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsRecord {
    /// Record id, unique within the store
    pub id: i64,
    /// Owning thread
    pub thread_id: ThreadId,
    /// Raw sender (inbox) or recipient (everything else) address
    pub address: Option<String>,
    /// Text body
    pub body: Option<String>,
    /// Milliseconds since the Unix epoch
    pub date_ms: i64,
    /// Box the record lives in
    pub kind: SmsKind,
    /// Read flag; `None` when the store does not know
    pub read: Option<bool>,
}

/// A message to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSms {
    /// Sender or recipient address; decides the thread
    pub address: String,
    /// Text body
    pub body: String,
    /// Milliseconds since the Unix epoch
    pub date_ms: i64,
    /// Box to file the record in
    pub kind: SmsKind,
    /// Initial read flag
    pub read: bool,
}

impl NewSms {
    /// An outgoing message for the sent log. Sent messages are born read.
    pub fn sent(address: impl Into<String>, body: impl Into<String>, date_ms: i64) -> Self {
        Self {
            address: address.into(),
            body: body.into(),
            date_ms,
            kind: SmsKind::Sent,
            read: true,
        }
    }

    /// An unread incoming message.
    pub fn received(address: impl Into<String>, body: impl Into<String>, date_ms: i64) -> Self {
        Self {
            address: address.into(),
            body: body.into(),
            date_ms,
            kind: SmsKind::Inbox,
            read: false,
        }
    }
}
