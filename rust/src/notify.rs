//! Inbound message alerts and their inline-reply actions.
//!
//! Per thread an alert goes `NoAlert → Shown → (Replied | Canceled |
//! Superseded) → NoAlert`. A second inbound message for a thread replaces the
//! shown alert in place, so a thread never has more than one.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use threadline_store_traits::ThreadId;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::error::SyncError;
use crate::gateway::{SendOutcome, StoreGateway};
use crate::state::PendingAlert;

/// Platform notification channel alerts are posted to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertChannel {
    pub id: String,
    pub name: String,
}

/// Platform notification surface.
///
/// Calls are made while the dispatcher holds its alert lock; implementations
/// must not call back into the dispatcher.
pub trait AlertSink: Send + Sync {
    fn ensure_channel(&self, channel: &AlertChannel) -> Result<(), SyncError>;
    /// Shows `alert`, replacing whatever is shown for the same thread.
    fn show(&self, alert: &PendingAlert) -> Result<(), SyncError>;
    fn cancel(&self, thread_id: ThreadId) -> Result<(), SyncError>;
}

/// Platform keep-alive held while a reply runs in the background
/// (e.g. a broadcast receiver's pending result).
pub trait CompletionToken: Send {
    fn finish(self: Box<Self>);
}

impl<F> CompletionToken for F
where
    F: FnOnce() + Send,
{
    fn finish(self: Box<Self>) {
        (self)()
    }
}

/// Releases the token when dropped, whether the reply finished, failed or
/// panicked.
struct KeepAlive(Option<Box<dyn CompletionToken>>);

impl Drop for KeepAlive {
    fn drop(&mut self) {
        if let Some(token) = self.0.take() {
            token.finish();
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub originating_address: String,
    /// Segments of one multipart message, in order.
    pub body_parts: Vec<String>,
}

impl InboundMessage {
    pub fn new(originating_address: impl Into<String>, body_parts: Vec<String>) -> Self {
        Self {
            originating_address: originating_address.into(),
            body_parts,
        }
    }

    pub fn body(&self) -> Option<String> {
        if self.body_parts.is_empty() {
            return None;
        }
        Some(self.body_parts.join("\n"))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertTransition {
    Shown,
    /// An alert was already shown for the thread and got replaced.
    Superseded,
}

/// Extras bundle attached to a reply action.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplyPayload {
    extras: Map<String, Value>,
}

impl ReplyPayload {
    pub const THREAD_ID: &'static str = "thread_id";
    pub const ADDRESS: &'static str = "address";
    pub const REPLY_TEXT: &'static str = "reply_text";

    pub fn new(
        thread_id: ThreadId,
        address: impl Into<String>,
        reply_text: impl Into<String>,
    ) -> Self {
        let mut payload = Self::default();
        payload.insert(Self::THREAD_ID, thread_id);
        payload.insert(Self::ADDRESS, address.into());
        payload.insert(Self::REPLY_TEXT, reply_text.into());
        payload
    }

    pub fn from_extras(extras: Map<String, Value>) -> Self {
        Self { extras }
    }

    pub fn from_json(json: &str) -> Result<Self, SyncError> {
        match serde_json::from_str::<Value>(json) {
            Ok(Value::Object(extras)) => Ok(Self { extras }),
            Ok(_) => Err(SyncError::MalformedReply(
                "extras must be a JSON object".into(),
            )),
            Err(err) => Err(SyncError::MalformedReply(err.to_string())),
        }
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.extras.insert(key.to_string(), value.into());
    }

    /// Accepts a number or a numeric string.
    pub fn thread_id(&self) -> Option<ThreadId> {
        match self.extras.get(Self::THREAD_ID)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn address(&self) -> Option<&str> {
        self.extras.get(Self::ADDRESS)?.as_str()
    }

    pub fn reply_text(&self) -> Option<&str> {
        self.extras.get(Self::REPLY_TEXT)?.as_str()
    }

    pub fn to_json(&self) -> String {
        Value::Object(self.extras.clone()).to_string()
    }
}

/// What each step of a reply did. Steps never roll each other back.
#[derive(Clone, Debug, PartialEq)]
pub struct ReplyOutcome {
    pub thread_id: ThreadId,
    pub send: Result<(), SyncError>,
    pub mark_read: Result<(), SyncError>,
    /// `None` when the alert was kept because the send failed.
    pub cancel: Option<Result<(), SyncError>>,
}

impl ReplyOutcome {
    pub fn is_replied(&self) -> bool {
        self.send.is_ok() && matches!(self.cancel, Some(Ok(())))
    }
}

/// A reply running in the background.
#[derive(Debug)]
pub struct ReplyTask {
    handle: JoinHandle<ReplyOutcome>,
}

impl ReplyTask {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// `None` if the task panicked or was aborted.
    pub async fn outcome(self) -> Option<ReplyOutcome> {
        self.handle.await.ok()
    }
}

pub struct NotificationDispatcher {
    runtime: Handle,
    gateway: StoreGateway,
    sink: Arc<dyn AlertSink>,
    channel: AlertChannel,
    channel_ready: Mutex<bool>,
    alerts: Mutex<HashMap<ThreadId, PendingAlert>>,
}

impl NotificationDispatcher {
    pub fn new(
        runtime: Handle,
        gateway: StoreGateway,
        sink: Arc<dyn AlertSink>,
        channel: AlertChannel,
    ) -> Self {
        Self {
            runtime,
            gateway,
            sink,
            channel,
            channel_ready: Mutex::new(false),
            alerts: Mutex::new(HashMap::new()),
        }
    }

    fn ensure_channel(&self) -> Result<(), SyncError> {
        let mut ready = self.channel_ready.lock();
        if *ready {
            return Ok(());
        }
        self.sink.ensure_channel(&self.channel)?;
        *ready = true;
        tracing::info!(channel = %self.channel.id, "alert channel ready");
        Ok(())
    }

    /// Turns an inbound message into an alert for its thread.
    ///
    /// Events without body parts or without an address are ignored.
    pub async fn on_inbound_message(
        &self,
        message: InboundMessage,
    ) -> Result<Option<AlertTransition>, SyncError> {
        let Some(body) = message.body() else {
            tracing::debug!("inbound message without body parts");
            return Ok(None);
        };
        let address = message.originating_address.trim();
        if address.is_empty() {
            tracing::warn!("inbound message without originating address");
            return Ok(None);
        }
        let thread_id = self.gateway.thread_id_for_address(address).await?;
        let transition = self.show(PendingAlert {
            thread_id,
            address: address.to_string(),
            body,
        })?;
        Ok(Some(transition))
    }

    pub fn show(&self, alert: PendingAlert) -> Result<AlertTransition, SyncError> {
        self.ensure_channel()?;
        let mut alerts = self.alerts.lock();
        self.sink.show(&alert)?;
        let thread_id = alert.thread_id;
        let transition = match alerts.insert(thread_id, alert) {
            Some(_) => AlertTransition::Superseded,
            None => AlertTransition::Shown,
        };
        tracing::info!(thread_id, ?transition, "alert shown");
        Ok(transition)
    }

    /// Removes the thread's alert, whether or not one is shown.
    pub fn cancel(&self, thread_id: ThreadId) -> Result<(), SyncError> {
        let mut alerts = self.alerts.lock();
        let had_alert = alerts.remove(&thread_id).is_some();
        tracing::debug!(thread_id, had_alert, "alert canceled");
        self.sink.cancel(thread_id)
    }

    pub fn pending_alerts(&self) -> Vec<PendingAlert> {
        let mut alerts: Vec<PendingAlert> = self.alerts.lock().values().cloned().collect();
        alerts.sort_by_key(|a| a.thread_id);
        alerts
    }

    pub fn alert(&self, thread_id: ThreadId) -> Option<PendingAlert> {
        self.alerts.lock().get(&thread_id).cloned()
    }

    /// Validates a reply action. `None` unless the thread id is positive and
    /// both address and reply text are non-blank.
    pub fn handle_reply(&self, payload: &ReplyPayload) -> Option<(ThreadId, String)> {
        let thread_id = payload.thread_id().filter(|id| *id > 0)?;
        payload.address().filter(|a| !a.trim().is_empty())?;
        let text = payload.reply_text().filter(|t| !t.trim().is_empty())?;
        Some((thread_id, text.to_string()))
    }

    /// Runs send → mark read → cancel for a reply action and waits for it.
    pub async fn reply(&self, payload: &ReplyPayload) -> Result<ReplyOutcome, SyncError> {
        let (thread_id, text, address) = self.validated(payload)?;
        Ok(self.run_reply(thread_id, address, text).await)
    }

    /// Same as [`reply`](Self::reply) but in the background. `keepalive` is
    /// released exactly once when the sequence is over, or right away when
    /// the payload is rejected.
    pub fn dispatch_reply(
        self: &Arc<Self>,
        payload: ReplyPayload,
        keepalive: Box<dyn CompletionToken>,
    ) -> Option<ReplyTask> {
        self.dispatch_reply_then(payload, keepalive, |_| {})
    }

    /// [`dispatch_reply`](Self::dispatch_reply) with a hook that sees the
    /// outcome before `keepalive` is released.
    pub fn dispatch_reply_then<F>(
        self: &Arc<Self>,
        payload: ReplyPayload,
        keepalive: Box<dyn CompletionToken>,
        on_outcome: F,
    ) -> Option<ReplyTask>
    where
        F: FnOnce(&ReplyOutcome) + Send + 'static,
    {
        let keepalive = KeepAlive(Some(keepalive));
        let (thread_id, text, address) = match self.validated(&payload) {
            Ok(parts) => parts,
            Err(err) => {
                tracing::warn!(%err, "dropping reply action");
                return None;
            }
        };
        let this = Arc::clone(self);
        let handle = self.runtime.spawn(async move {
            let _keepalive = keepalive;
            let outcome = this.run_reply(thread_id, address, text).await;
            on_outcome(&outcome);
            outcome
        });
        Some(ReplyTask { handle })
    }

    fn validated(&self, payload: &ReplyPayload) -> Result<(ThreadId, String, String), SyncError> {
        let (thread_id, text) = self.handle_reply(payload).ok_or_else(|| {
            SyncError::MalformedReply(
                "need thread_id > 0, an address and non-blank reply_text".into(),
            )
        })?;
        let address = payload.address().unwrap_or_default().trim().to_string();
        Ok((thread_id, text, address))
    }

    async fn run_reply(&self, thread_id: ThreadId, address: String, text: String) -> ReplyOutcome {
        let send = match self.gateway.send(&address, &text).await {
            Ok(outcome) => {
                if let Some(err) = outcome.store_error {
                    tracing::warn!(thread_id, %err, "reply sent but not recorded");
                }
                Ok(())
            }
            Err(err) => {
                tracing::warn!(thread_id, %err, "reply send failed");
                Err(err)
            }
        };

        let mark_read = match self.gateway.mark_thread_read(thread_id).await {
            Ok(_) => Ok(()),
            Err(err) => {
                tracing::warn!(thread_id, %err, "mark read after reply failed");
                Err(err)
            }
        };

        // Keep the alert up when the reply did not go out.
        let cancel = if send.is_ok() {
            let result = self.cancel(thread_id);
            if let Err(err) = &result {
                tracing::warn!(thread_id, %err, "cancel after reply failed");
            }
            Some(result)
        } else {
            None
        };

        ReplyOutcome {
            thread_id,
            send,
            mark_read,
            cancel,
        }
    }

    /// Headless "respond via message" request. Dropped unless both address
    /// and text are non-blank.
    pub async fn respond_via_message(
        &self,
        address: &str,
        text: &str,
    ) -> Result<Option<SendOutcome>, SyncError> {
        if address.trim().is_empty() || text.trim().is_empty() {
            tracing::warn!("dropping respond-via-message request with blank address or text");
            return Ok(None);
        }
        self.gateway.send(address, text).await.map(Some)
    }
}
