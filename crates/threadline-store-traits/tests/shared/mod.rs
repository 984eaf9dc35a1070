//! Shared store test functions, run against every backend.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use threadline_store_traits::contacts::types::ContactRecord;
use threadline_store_traits::sms::types::NewSms;
use threadline_store_traits::{Resource, StoreObserver};

pub mod contact_tests;
pub mod thread_tests;

/// Records every notification it receives.
#[derive(Default)]
pub struct RecordingObserver {
    seen: Mutex<Vec<Resource>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn take(&self) -> Vec<Resource> {
        std::mem::take(&mut *self.seen.lock().unwrap())
    }
}

impl StoreObserver for RecordingObserver {
    fn on_change(&self, resource: Resource) {
        self.seen.lock().unwrap().push(resource);
    }
}

pub fn create_test_contact(id: i64, name: &str, has_phone_number: bool) -> ContactRecord {
    ContactRecord {
        id,
        display_name: name.to_string(),
        has_phone_number,
        photo_uri: None,
    }
}

pub fn received(address: &str, body: &str, date_ms: i64) -> NewSms {
    NewSms::received(address, body, date_ms)
}

pub fn sent(address: &str, body: &str, date_ms: i64) -> NewSms {
    NewSms::sent(address, body, date_ms)
}
