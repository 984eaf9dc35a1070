//! User session: which thread is open, what is being typed, and whether the
//! app is the default messaging handler.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use threadline_store_traits::ThreadId;
use tokio::sync::watch;

use crate::error::SyncError;
use crate::gateway::{SendOutcome, StoreGateway};
use crate::sync::ThreadSelector;

/// Answers whether this app currently owns the platform's messaging role.
pub trait DefaultHandlerProbe: Send + Sync {
    fn is_default_handler(&self) -> bool;
}

/// Point-in-time copy of every session field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub selected_thread_id: Option<ThreadId>,
    pub pending_compose_address: Option<String>,
    pub draft_text: String,
    pub is_default_handler: bool,
    pub notice: Option<String>,
}

pub struct SessionState {
    gateway: StoreGateway,
    selector: ThreadSelector,
    probe: Arc<dyn DefaultHandlerProbe>,
    selected_thread: watch::Sender<Option<ThreadId>>,
    pending_compose_address: watch::Sender<Option<String>>,
    draft: watch::Sender<String>,
    is_default_handler: watch::Sender<bool>,
    notice: watch::Sender<Option<String>>,
}

impl SessionState {
    pub fn new(
        gateway: StoreGateway,
        selector: ThreadSelector,
        probe: Arc<dyn DefaultHandlerProbe>,
    ) -> Self {
        let is_default = probe.is_default_handler();
        Self {
            gateway,
            selector,
            probe,
            selected_thread: watch::Sender::new(None),
            pending_compose_address: watch::Sender::new(None),
            draft: watch::Sender::new(String::new()),
            is_default_handler: watch::Sender::new(is_default),
            notice: watch::Sender::new(None),
        }
    }

    /// Marks the thread read, then opens it.
    pub async fn select_thread(&self, thread_id: ThreadId) {
        if let Err(err) = self.gateway.mark_thread_read(thread_id).await {
            tracing::warn!(thread_id, %err, "mark read on select failed");
        }
        self.selected_thread.send_replace(Some(thread_id));
        self.selector.select(Some(thread_id));
    }

    /// Starts composing to `address`; no thread stays selected.
    pub fn open_conversation_for_address(&self, address: &str) {
        self.pending_compose_address
            .send_replace(Some(address.trim().to_string()));
        self.selected_thread.send_replace(None);
        self.selector.select(None);
    }

    pub fn clear_pending_address(&self) {
        self.pending_compose_address.send_replace(None);
    }

    pub fn update_draft(&self, text: &str) {
        self.draft.send_if_modified(|draft| {
            if draft == text {
                return false;
            }
            text.clone_into(draft);
            true
        });
    }

    /// Blank bodies are ignored (`Ok(None)`). The draft is cleared only
    /// after a successful send; a failure keeps it and sets `notice`.
    pub async fn send_message(
        &self,
        address: &str,
        body: &str,
    ) -> Result<Option<SendOutcome>, SyncError> {
        if body.trim().is_empty() {
            return Ok(None);
        }
        match self.gateway.send(address, body).await {
            Ok(outcome) => {
                self.draft.send_replace(String::new());
                Ok(Some(outcome))
            }
            Err(err) => {
                tracing::warn!(%err, "send failed");
                self.notice.send_replace(Some(format!("Message not sent: {err}")));
                Err(err)
            }
        }
    }

    pub fn refresh_default_status(&self) -> bool {
        let is_default = self.probe.is_default_handler();
        self.is_default_handler.send_if_modified(|current| {
            let changed = *current != is_default;
            *current = is_default;
            changed
        });
        is_default
    }

    pub fn set_notice(&self, notice: impl Into<String>) {
        self.notice.send_replace(Some(notice.into()));
    }

    pub fn clear_notice(&self) {
        self.notice.send_replace(None);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            selected_thread_id: *self.selected_thread.borrow(),
            pending_compose_address: self.pending_compose_address.borrow().clone(),
            draft_text: self.draft.borrow().clone(),
            is_default_handler: *self.is_default_handler.borrow(),
            notice: self.notice.borrow().clone(),
        }
    }

    pub fn selected_thread(&self) -> watch::Receiver<Option<ThreadId>> {
        self.selected_thread.subscribe()
    }

    pub fn pending_compose_address(&self) -> watch::Receiver<Option<String>> {
        self.pending_compose_address.subscribe()
    }

    pub fn draft(&self) -> watch::Receiver<String> {
        self.draft.subscribe()
    }

    pub fn is_default_handler(&self) -> watch::Receiver<bool> {
        self.is_default_handler.subscribe()
    }

    pub fn notice(&self) -> watch::Receiver<Option<String>> {
        self.notice.subscribe()
    }
}
