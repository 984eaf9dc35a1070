#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use threadline_core::{
    AlertChannel, AlertSink, DefaultHandlerProbe, PendingAlert, Platform, StoreGateway, SyncError,
    TransmitError, Transmitter,
};
use threadline_memory_store::MemoryStore;
use threadline_store_traits::contacts::types::ContactRecord;
use threadline_store_traits::contacts::ContactStorage;
use threadline_store_traits::sms::types::{NewSms, SmsRecord};
use threadline_store_traits::sms::SmsStorage;
use threadline_store_traits::threads::types::ThreadRecord;
use threadline_store_traits::threads::ThreadStorage;
use threadline_store_traits::{
    Backend, MessageStore, StoreError, StoreObserver, ThreadId,
};
use tokio::sync::watch;

pub fn wait_until(what: &str, timeout: Duration, f: impl FnMut() -> bool) {
    wait_until_with_poll(what, timeout, Duration::from_millis(20), f);
}

pub fn wait_until_with_poll(
    what: &str,
    timeout: Duration,
    poll: Duration,
    mut f: impl FnMut() -> bool,
) {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if f() {
            return;
        }
        std::thread::sleep(poll);
    }
    panic!("{what}: condition not met within {timeout:?}");
}

/// Async counterpart of [`wait_until`] for watch channels.
pub async fn wait_for<T: Clone>(
    what: &str,
    rx: &mut watch::Receiver<T>,
    f: impl FnMut(&T) -> bool,
) -> T {
    match tokio::time::timeout(Duration::from_secs(5), rx.wait_for(f)).await {
        Ok(Ok(value)) => value.clone(),
        Ok(Err(_)) => panic!("{what}: channel closed"),
        Err(_) => panic!("{what}: condition not met within 5s"),
    }
}

pub async fn wait_async(what: &str, mut f: impl FnMut() -> bool) {
    let start = Instant::now();
    while start.elapsed() < Duration::from_secs(5) {
        if f() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("{what}: condition not met within 5s");
}

/// Ordered record of every platform call made by the client.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.0.lock().unwrap().iter().position(|e| e == entry)
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.position(entry).is_some()
    }
}

/// Blocks store calls until opened.
#[derive(Default)]
pub struct Gate {
    state: Mutex<GateState>,
    cv: Condvar,
}

#[derive(Default)]
struct GateState {
    open: bool,
    waiting: usize,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn wait(&self) {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut state = self.state.lock().unwrap();
        state.waiting += 1;
        while !state.open && Instant::now() < deadline {
            state = self
                .cv
                .wait_timeout(state, Duration::from_millis(50))
                .unwrap()
                .0;
        }
        state.waiting -= 1;
    }

    pub fn open(&self) {
        self.state.lock().unwrap().open = true;
        self.cv.notify_all();
    }

    /// Number of calls currently parked at the gate.
    pub fn waiting(&self) -> usize {
        self.state.lock().unwrap().waiting
    }
}

/// Store wrapper that can hold, fail or slow down calls, and logs writes.
pub struct TestStore {
    inner: Arc<dyn MessageStore>,
    log: CallLog,
    forward_observers: bool,
    thread_gates: Mutex<VecDeque<Arc<Gate>>>,
    message_gates: Mutex<HashMap<ThreadId, Arc<Gate>>>,
    fail_reads: AtomicBool,
    fail_inserts: AtomicBool,
    read_delay_ms: AtomicU64,
}

impl TestStore {
    pub fn new(inner: Arc<dyn MessageStore>, log: CallLog) -> Self {
        Self {
            inner,
            log,
            forward_observers: true,
            thread_gates: Mutex::new(VecDeque::new()),
            message_gates: Mutex::new(HashMap::new()),
            fail_reads: AtomicBool::new(false),
            fail_inserts: AtomicBool::new(false),
            read_delay_ms: AtomicU64::new(0),
        }
    }

    /// A store whose changes are never reported to observers.
    pub fn unobserved(inner: Arc<dyn MessageStore>, log: CallLog) -> Self {
        Self {
            forward_observers: false,
            ..Self::new(inner, log)
        }
    }

    /// The next `threads()` call reads its result, then parks at the gate.
    pub fn hold_next_threads_query(&self) -> Arc<Gate> {
        let gate = Gate::new();
        self.thread_gates.lock().unwrap().push_back(gate.clone());
        gate
    }

    /// Every `messages_in_thread(thread_id)` call parks at the gate.
    pub fn hold_messages(&self, thread_id: ThreadId) -> Arc<Gate> {
        let gate = Gate::new();
        self.message_gates
            .lock()
            .unwrap()
            .insert(thread_id, gate.clone());
        gate
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn set_read_delay(&self, delay: Duration) {
        self.read_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    fn before_read(&self) -> Result<(), StoreError> {
        let delay = self.read_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            std::thread::sleep(Duration::from_millis(delay));
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("provider closed".into()));
        }
        Ok(())
    }
}

impl ThreadStorage for TestStore {
    fn threads(&self) -> Result<Vec<ThreadRecord>, StoreError> {
        self.before_read()?;
        let result = self.inner.threads();
        let gate = self.thread_gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            gate.wait();
        }
        result
    }

    fn thread_addresses(&self, thread_id: ThreadId) -> Result<Vec<String>, StoreError> {
        self.before_read()?;
        self.inner.thread_addresses(thread_id)
    }

    fn thread_id_for_address(&self, address: &str) -> Result<ThreadId, StoreError> {
        self.inner.thread_id_for_address(address)
    }
}

impl SmsStorage for TestStore {
    fn messages_in_thread(&self, thread_id: ThreadId) -> Result<Vec<SmsRecord>, StoreError> {
        self.before_read()?;
        let result = self.inner.messages_in_thread(thread_id);
        let gate = self.message_gates.lock().unwrap().get(&thread_id).cloned();
        if let Some(gate) = gate {
            gate.wait();
        }
        result
    }

    fn insert_message(&self, message: NewSms) -> Result<SmsRecord, StoreError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Database("disk full".into()));
        }
        self.log
            .push(format!("insert:{}:{}", message.address, message.body));
        self.inner.insert_message(message)
    }

    fn mark_thread_read(&self, thread_id: ThreadId) -> Result<usize, StoreError> {
        self.log.push(format!("mark_read:{thread_id}"));
        self.inner.mark_thread_read(thread_id)
    }
}

impl ContactStorage for TestStore {
    fn contacts(&self) -> Result<Vec<ContactRecord>, StoreError> {
        self.before_read()?;
        self.inner.contacts()
    }

    fn contact_numbers(&self, contact_id: i64) -> Result<Vec<String>, StoreError> {
        self.inner.contact_numbers(contact_id)
    }

    fn lookup_display_name(&self, address: &str) -> Result<Option<String>, StoreError> {
        self.inner.lookup_display_name(address)
    }

    fn save_contact(&self, contact: ContactRecord, numbers: Vec<String>) -> Result<(), StoreError> {
        self.inner.save_contact(contact, numbers)
    }
}

impl MessageStore for TestStore {
    fn backend(&self) -> Backend {
        self.inner.backend()
    }

    fn register_observer(&self, observer: Arc<dyn StoreObserver>) {
        if self.forward_observers {
            self.inner.register_observer(observer);
        }
    }
}

pub struct RecordingTransmitter {
    log: CallLog,
    fail: AtomicBool,
}

impl RecordingTransmitter {
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl Transmitter for RecordingTransmitter {
    fn transmit(&self, address: &str, body: &str) -> Result<(), TransmitError> {
        if self.fail.load(Ordering::SeqCst) {
            self.log.push(format!("transmit_failed:{address}:{body}"));
            return Err(TransmitError::new("no service"));
        }
        self.log.push(format!("transmit:{address}:{body}"));
        Ok(())
    }
}

/// Alert surface that remembers what is visible.
pub struct RecordingAlertSink {
    log: CallLog,
    visible: Mutex<HashMap<ThreadId, PendingAlert>>,
}

impl RecordingAlertSink {
    pub fn visible(&self) -> Vec<PendingAlert> {
        let mut alerts: Vec<_> = self.visible.lock().unwrap().values().cloned().collect();
        alerts.sort_by_key(|a| a.thread_id);
        alerts
    }
}

impl AlertSink for RecordingAlertSink {
    fn ensure_channel(&self, channel: &AlertChannel) -> Result<(), SyncError> {
        self.log.push(format!("channel:{}", channel.id));
        Ok(())
    }

    fn show(&self, alert: &PendingAlert) -> Result<(), SyncError> {
        self.log.push(format!("show:{}", alert.thread_id));
        self.visible
            .lock()
            .unwrap()
            .insert(alert.thread_id, alert.clone());
        Ok(())
    }

    fn cancel(&self, thread_id: ThreadId) -> Result<(), SyncError> {
        self.log.push(format!("cancel:{thread_id}"));
        self.visible.lock().unwrap().remove(&thread_id);
        Ok(())
    }
}

pub struct StaticProbe(AtomicBool);

impl StaticProbe {
    pub fn set(&self, is_default: bool) {
        self.0.store(is_default, Ordering::SeqCst);
    }
}

impl DefaultHandlerProbe for StaticProbe {
    fn is_default_handler(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Fake platform around a store.
pub struct Harness {
    pub log: CallLog,
    pub store: Arc<TestStore>,
    pub transmitter: Arc<RecordingTransmitter>,
    pub sink: Arc<RecordingAlertSink>,
    pub probe: Arc<StaticProbe>,
}

impl Harness {
    pub fn memory() -> Self {
        Self::with_store(|log| TestStore::new(Arc::new(MemoryStore::new()), log))
    }

    pub fn with_store(make: impl FnOnce(CallLog) -> TestStore) -> Self {
        let log = CallLog::default();
        Self {
            store: Arc::new(make(log.clone())),
            transmitter: Arc::new(RecordingTransmitter {
                log: log.clone(),
                fail: AtomicBool::new(false),
            }),
            sink: Arc::new(RecordingAlertSink {
                log: log.clone(),
                visible: Mutex::new(HashMap::new()),
            }),
            probe: Arc::new(StaticProbe(AtomicBool::new(false))),
            log,
        }
    }

    pub fn platform(&self) -> Platform {
        Platform {
            store: self.store.clone(),
            transmitter: self.transmitter.clone(),
            alert_sink: self.sink.clone(),
            probe: self.probe.clone(),
        }
    }

    pub fn gateway(&self, query_timeout: Duration) -> StoreGateway {
        StoreGateway::new(self.store.clone(), self.transmitter.clone(), query_timeout)
    }
}
