use std::collections::HashSet;

use threadline_store_traits::Resource;
use tokio::runtime::Handle;
use tokio::sync::watch;

use super::SyncHandle;
use crate::error::SyncError;
use crate::gateway::StoreGateway;
use crate::signal::ChangeSignal;
use crate::state::{Conversation, ConversationSnapshot};

/// Live conversation list, re-queried on every threads tick.
pub struct ConversationSync {
    handle: SyncHandle<(), Conversation>,
}

impl ConversationSync {
    pub fn start(runtime: &Handle, signal: &ChangeSignal, gateway: StoreGateway) -> Self {
        let handle = SyncHandle::spawn(
            runtime,
            "conversations",
            signal.subscribe(Resource::Threads),
            (),
            gateway,
            |gateway, ()| async move {
                let conversations = gateway.list_conversations().await?;
                Ok::<_, SyncError>(dedupe_by_thread(conversations))
            },
        );
        Self { handle }
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversationSnapshot> {
        self.handle.subscribe()
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        self.handle.snapshot()
    }
}

/// Keeps the first row per thread id without reordering.
fn dedupe_by_thread(conversations: Vec<Conversation>) -> Vec<Conversation> {
    let mut seen = HashSet::with_capacity(conversations.len());
    conversations
        .into_iter()
        .filter(|c| seen.insert(c.thread_id))
        .collect()
}
