//! Memory-based message store for threadline.
//!
//! Implements [`MessageStore`] over plain maps guarded by a single
//! [`RwLock`]. Thread rows are not stored; they are derived from the SMS
//! records on every read, the same way the platform store derives them.
//!
//! Observers are notified after the write lock is released, so an observer
//! can query the store from inside its callback.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use threadline_store_traits::contacts::ContactStorage;
use threadline_store_traits::contacts::types::ContactRecord;
use threadline_store_traits::sms::SmsStorage;
use threadline_store_traits::sms::types::{NewSms, SmsRecord};
use threadline_store_traits::threads::ThreadStorage;
use threadline_store_traits::threads::types::ThreadRecord;
use threadline_store_traits::{
    Backend, MessageStore, ObserverSet, Resource, StoreError, StoreObserver, ThreadId,
    normalize_address,
};

#[derive(Debug, Default)]
struct Inner {
    next_thread_id: ThreadId,
    next_sms_id: i64,
    // normalized address -> thread
    threads_by_address: HashMap<String, ThreadId>,
    sms: BTreeMap<i64, SmsRecord>,
    contacts: BTreeMap<i64, (ContactRecord, Vec<String>)>,
}

impl Inner {
    fn thread_for(&mut self, address: &str) -> ThreadId {
        let key = normalize_address(address);
        if let Some(id) = self.threads_by_address.get(&key) {
            return *id;
        }
        self.next_thread_id += 1;
        let id = self.next_thread_id;
        self.threads_by_address.insert(key, id);
        id
    }
}

/// In-memory message store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    observers: ObserverSet,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of SMS records across all threads.
    pub fn message_count(&self) -> usize {
        self.inner.read().sms.len()
    }
}

impl ThreadStorage for MemoryStore {
    fn threads(&self) -> Result<Vec<ThreadRecord>, StoreError> {
        let inner = self.inner.read();
        let mut by_thread: BTreeMap<ThreadId, ThreadRecord> = BTreeMap::new();
        // BTreeMap iteration is ascending by id, so a later record with an
        // equal date still wins as the newest.
        for sms in inner.sms.values() {
            let read = sms.read.unwrap_or(true);
            let entry = by_thread.entry(sms.thread_id).or_insert_with(|| ThreadRecord {
                id: sms.thread_id,
                date_ms: sms.date_ms,
                snippet: sms.body.clone(),
                read: Some(true),
            });
            if sms.date_ms >= entry.date_ms {
                entry.date_ms = sms.date_ms;
                entry.snippet = sms.body.clone();
            }
            if !read {
                entry.read = Some(false);
            }
        }

        let mut threads: Vec<ThreadRecord> = by_thread.into_values().collect();
        threads.sort_by(|a, b| b.date_ms.cmp(&a.date_ms).then_with(|| b.id.cmp(&a.id)));
        Ok(threads)
    }

    fn thread_addresses(&self, thread_id: ThreadId) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.read();
        Ok(inner
            .sms
            .values()
            .filter(|sms| sms.thread_id == thread_id)
            .map(|sms| sms.address.clone().unwrap_or_default())
            .collect())
    }

    fn thread_id_for_address(&self, address: &str) -> Result<ThreadId, StoreError> {
        if address.trim().is_empty() {
            return Err(StoreError::InvalidInput("empty address".to_string()));
        }
        // Fast path: no write lock when the thread already exists.
        if let Some(id) = self
            .inner
            .read()
            .threads_by_address
            .get(&normalize_address(address))
        {
            return Ok(*id);
        }
        let id = self.inner.write().thread_for(address);
        self.observers.notify(&[Resource::Threads]);
        Ok(id)
    }
}

impl SmsStorage for MemoryStore {
    fn messages_in_thread(&self, thread_id: ThreadId) -> Result<Vec<SmsRecord>, StoreError> {
        let inner = self.inner.read();
        let mut messages: Vec<SmsRecord> = inner
            .sms
            .values()
            .filter(|sms| sms.thread_id == thread_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.date_ms.cmp(&b.date_ms).then_with(|| a.id.cmp(&b.id)));
        Ok(messages)
    }

    fn insert_message(&self, message: NewSms) -> Result<SmsRecord, StoreError> {
        if message.address.trim().is_empty() {
            return Err(StoreError::InvalidInput("empty address".to_string()));
        }
        let record = {
            let mut inner = self.inner.write();
            let thread_id = inner.thread_for(&message.address);
            inner.next_sms_id += 1;
            let record = SmsRecord {
                id: inner.next_sms_id,
                thread_id,
                address: Some(message.address),
                body: Some(message.body),
                date_ms: message.date_ms,
                kind: message.kind,
                read: Some(message.read),
            };
            inner.sms.insert(record.id, record.clone());
            record
        };
        self.observers
            .notify(&[Resource::Messages, Resource::Threads]);
        Ok(record)
    }

    fn mark_thread_read(&self, thread_id: ThreadId) -> Result<usize, StoreError> {
        let changed = {
            let mut inner = self.inner.write();
            let mut changed = 0;
            for sms in inner.sms.values_mut() {
                if sms.thread_id == thread_id && sms.read != Some(true) {
                    sms.read = Some(true);
                    changed += 1;
                }
            }
            changed
        };
        if changed > 0 {
            self.observers
                .notify(&[Resource::Messages, Resource::Threads]);
        }
        Ok(changed)
    }
}

impl ContactStorage for MemoryStore {
    fn contacts(&self) -> Result<Vec<ContactRecord>, StoreError> {
        let inner = self.inner.read();
        let mut contacts: Vec<ContactRecord> =
            inner.contacts.values().map(|(c, _)| c.clone()).collect();
        contacts.sort_by_cached_key(|c| c.display_name.to_ascii_lowercase());
        Ok(contacts)
    }

    fn contact_numbers(&self, contact_id: i64) -> Result<Vec<String>, StoreError> {
        Ok(self
            .inner
            .read()
            .contacts
            .get(&contact_id)
            .map(|(_, numbers)| numbers.clone())
            .unwrap_or_default())
    }

    fn lookup_display_name(&self, address: &str) -> Result<Option<String>, StoreError> {
        let key = normalize_address(address);
        if key.is_empty() {
            return Ok(None);
        }
        let inner = self.inner.read();
        Ok(inner
            .contacts
            .values()
            .find(|(_, numbers)| numbers.iter().any(|n| normalize_address(n) == key))
            .map(|(contact, _)| contact.display_name.clone()))
    }

    fn save_contact(&self, contact: ContactRecord, numbers: Vec<String>) -> Result<(), StoreError> {
        self.inner
            .write()
            .contacts
            .insert(contact.id, (contact, numbers));
        self.observers.notify(&[Resource::Contacts]);
        Ok(())
    }
}

impl MessageStore for MemoryStore {
    fn backend(&self) -> Backend {
        Backend::Memory
    }

    fn register_observer(&self, observer: Arc<dyn StoreObserver>) {
        self.observers.register(observer);
    }
}
