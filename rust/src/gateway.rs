//! The only code that talks to the external message store.
//!
//! Store calls are synchronous and may block, so each one runs on the
//! blocking pool and is bounded by the configured query timeout. A call that
//! times out is reported as unavailable; the blocking call itself is left to
//! finish in the background.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use threadline_store_traits::contacts::types::ContactRecord;
use threadline_store_traits::contacts::ContactStorage;
use threadline_store_traits::sms::types::{NewSms, SmsKind, SmsRecord};
use threadline_store_traits::sms::SmsStorage;
use threadline_store_traits::threads::types::ThreadRecord;
use threadline_store_traits::threads::ThreadStorage;
use threadline_store_traits::{MessageStore, StoreError, StoreObserver, ThreadId};

use crate::error::{SyncError, TransmitError};
use crate::state::{timestamp_from_millis, Contact, Conversation, Direction, Message};

/// Platform capability that hands a message to the radio. Framing,
/// segmentation and delivery reports are the platform's business.
pub trait Transmitter: Send + Sync {
    fn transmit(&self, address: &str, body: &str) -> Result<(), TransmitError>;
}

/// Result of a send whose transmission succeeded.
#[derive(Clone, Debug, PartialEq)]
pub struct SendOutcome {
    /// The stored "sent" record, when the write went through.
    pub record: Option<Message>,
    /// Set when the message went out but could not be recorded.
    pub store_error: Option<SyncError>,
}

#[derive(Clone)]
pub struct StoreGateway {
    store: Arc<dyn MessageStore>,
    transmitter: Arc<dyn Transmitter>,
    query_timeout: Duration,
}

impl std::fmt::Debug for StoreGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreGateway")
            .field("backend", &self.store.backend())
            .field("query_timeout", &self.query_timeout)
            .finish_non_exhaustive()
    }
}

impl StoreGateway {
    pub fn new(
        store: Arc<dyn MessageStore>,
        transmitter: Arc<dyn Transmitter>,
        query_timeout: Duration,
    ) -> Self {
        Self {
            store,
            transmitter,
            query_timeout,
        }
    }

    pub fn register_observer(&self, observer: Arc<dyn StoreObserver>) {
        self.store.register_observer(observer);
    }

    async fn run<T, F>(&self, what: &'static str, f: F) -> Result<T, SyncError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn MessageStore) -> Result<T, StoreError> + Send + 'static,
    {
        let store = self.store.clone();
        let task = tokio::task::spawn_blocking(move || f(store.as_ref()));
        match tokio::time::timeout(self.query_timeout, task).await {
            Ok(Ok(result)) => result.map_err(SyncError::from),
            Ok(Err(join_err)) => {
                tracing::error!(%join_err, what, "store call panicked");
                Err(SyncError::StoreUnavailable(format!("{what}: {join_err}")))
            }
            Err(_) => {
                tracing::warn!(what, timeout_ms = self.query_timeout.as_millis() as u64, "store call timed out");
                Err(SyncError::StoreUnavailable(format!(
                    "{what} timed out after {:?}",
                    self.query_timeout
                )))
            }
        }
    }

    /// Conversations in store order (most recent first).
    pub async fn list_conversations(&self) -> Result<Vec<Conversation>, SyncError> {
        self.run("list_conversations", |store| {
            let threads = store.threads()?;
            let mut conversations = Vec::with_capacity(threads.len());
            for thread in threads {
                let addresses = store.thread_addresses(thread.id)?;
                let participants = participants(store, &addresses);
                conversations.push(conversation_from_record(thread, participants));
            }
            Ok(conversations)
        })
        .await
    }

    /// Messages of one thread, oldest first. Unknown threads are empty.
    pub async fn list_messages(&self, thread_id: ThreadId) -> Result<Vec<Message>, SyncError> {
        self.run("list_messages", move |store| {
            Ok(store
                .messages_in_thread(thread_id)?
                .into_iter()
                .map(message_from_record)
                .collect())
        })
        .await
    }

    pub async fn list_contacts(&self) -> Result<Vec<Contact>, SyncError> {
        self.run("list_contacts", |store| {
            let mut contacts = Vec::new();
            for record in store.contacts()? {
                if !record.has_phone_number {
                    continue;
                }
                let numbers = store.contact_numbers(record.id)?;
                if numbers.is_empty() {
                    continue;
                }
                contacts.push(contact_from_record(record, numbers));
            }
            contacts.sort_by_cached_key(|c| c.display_name.to_lowercase());
            Ok(contacts)
        })
        .await
    }

    /// Best effort: lookup failures read as "no contact".
    pub async fn resolve_display_name(&self, address: &str) -> Option<String> {
        let address = address.to_string();
        let result = self
            .run("resolve_display_name", move |store| {
                store.lookup_display_name(&address)
            })
            .await;
        match result {
            Ok(name) => name,
            Err(err) => {
                tracing::debug!(%err, "display name lookup failed");
                None
            }
        }
    }

    /// Transmits `body` to `address`, then records it as sent.
    ///
    /// Nothing is written when the transmission fails. A failed write after a
    /// successful transmission still returns `Ok`, with the error attached.
    pub async fn send(&self, address: &str, body: &str) -> Result<SendOutcome, SyncError> {
        let address = address.trim().to_string();
        if address.is_empty() {
            return Err(SyncError::TransmissionFailure("no recipient address".into()));
        }
        let body = body.to_string();

        let transmitter = self.transmitter.clone();
        let (to, text) = (address.clone(), body.clone());
        tokio::task::spawn_blocking(move || transmitter.transmit(&to, &text))
            .await
            .map_err(|e| SyncError::TransmissionFailure(e.to_string()))?
            .map_err(|e| SyncError::TransmissionFailure(e.to_string()))?;

        let date_ms = chrono::Utc::now().timestamp_millis();
        let stored = self
            .run("insert_sent", move |store| {
                store.insert_message(NewSms::sent(address, body, date_ms))
            })
            .await;
        match stored {
            Ok(record) => Ok(SendOutcome {
                record: Some(message_from_record(record)),
                store_error: None,
            }),
            Err(err) => {
                tracing::warn!(%err, "message transmitted but not recorded");
                Ok(SendOutcome {
                    record: None,
                    store_error: Some(err),
                })
            }
        }
    }

    /// Returns how many records flipped to read.
    pub async fn mark_thread_read(&self, thread_id: ThreadId) -> Result<usize, SyncError> {
        self.run("mark_thread_read", move |store| store.mark_thread_read(thread_id))
            .await
    }

    pub async fn thread_id_for_address(&self, address: &str) -> Result<ThreadId, SyncError> {
        let address = address.to_string();
        self.run("thread_id_for_address", move |store| {
            store.thread_id_for_address(&address)
        })
        .await
    }
}

fn participants(store: &dyn MessageStore, addresses: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out: Vec<String> = Vec::new();
    for address in addresses {
        let address = address.trim();
        if address.is_empty() || !seen.insert(address) {
            continue;
        }
        let name = match store.lookup_display_name(address) {
            Ok(Some(name)) => name,
            Ok(None) => address.to_string(),
            Err(err) => {
                tracing::debug!(%err, "display name lookup failed");
                address.to_string()
            }
        };
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

fn conversation_from_record(thread: ThreadRecord, participants: Vec<String>) -> Conversation {
    let snippet = thread.snippet.unwrap_or_default();
    let title = participants
        .first()
        .cloned()
        .unwrap_or_else(|| snippet.clone());
    Conversation {
        thread_id: thread.id,
        title,
        snippet,
        timestamp: timestamp_from_millis(thread.date_ms),
        unread_count: u32::from(thread.read == Some(false)),
        participants,
    }
}

fn message_from_record(record: SmsRecord) -> Message {
    Message {
        id: record.id,
        thread_id: record.thread_id,
        address: record.address.unwrap_or_default(),
        body: record.body.unwrap_or_default(),
        timestamp: timestamp_from_millis(record.date_ms),
        direction: if record.kind == SmsKind::Inbox {
            Direction::Incoming
        } else {
            Direction::Outgoing
        },
        read: record.read.unwrap_or(true),
    }
}

fn contact_from_record(record: ContactRecord, numbers: Vec<String>) -> Contact {
    Contact {
        id: record.id,
        display_name: record.display_name,
        numbers,
        photo_uri: record.photo_uri,
    }
}
