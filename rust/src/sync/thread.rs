use std::sync::Arc;

use threadline_store_traits::{Resource, ThreadId};
use tokio::runtime::Handle;
use tokio::sync::watch;

use super::{set_scope, SyncHandle};
use crate::gateway::StoreGateway;
use crate::signal::ChangeSignal;
use crate::state::{Message, MessageSnapshot};

/// Messages of the selected thread. Nothing is queried while no thread is
/// selected.
pub struct ThreadSync {
    handle: SyncHandle<Option<ThreadId>, Message>,
}

impl ThreadSync {
    pub fn start(runtime: &Handle, signal: &ChangeSignal, gateway: StoreGateway) -> Self {
        let handle = SyncHandle::spawn(
            runtime,
            "thread",
            signal.subscribe(Resource::Messages),
            None,
            gateway,
            |gateway, scope: Option<ThreadId>| async move {
                match scope {
                    Some(thread_id) => gateway.list_messages(thread_id).await,
                    None => Ok(Vec::new()),
                }
            },
        );
        Self { handle }
    }

    /// Switches the target thread. Results still in flight for the previous
    /// thread are dropped.
    pub fn select_thread(&self, thread_id: Option<ThreadId>) {
        self.handle.set_scope(thread_id);
    }

    pub fn selector(&self) -> ThreadSelector {
        ThreadSelector(self.handle.scope_sender())
    }

    pub fn subscribe(&self) -> watch::Receiver<MessageSnapshot> {
        self.handle.subscribe()
    }

    pub fn snapshot(&self) -> MessageSnapshot {
        self.handle.snapshot()
    }
}

/// Cloneable remote for [`ThreadSync::select_thread`].
#[derive(Clone)]
pub struct ThreadSelector(Arc<watch::Sender<Option<ThreadId>>>);

impl ThreadSelector {
    pub fn select(&self, thread_id: Option<ThreadId>) {
        set_scope(&self.0, thread_id);
    }
}

impl std::fmt::Debug for ThreadSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ThreadSelector")
            .field(&*self.0.borrow())
            .finish()
    }
}
