use serde::{Deserialize, Serialize};
use threadline_store_traits::ThreadId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientAction {
    // Navigation
    SelectThread {
        thread_id: ThreadId,
    },
    OpenConversationForAddress {
        address: String,
    },
    ClearPendingAddress,

    // Compose
    UpdateDraft {
        text: String,
    },
    SendMessage {
        address: String,
        body: String,
    },

    // Alerts
    DismissAlert {
        thread_id: ThreadId,
    },

    // UI
    ClearNotice,

    // Lifecycle
    RefreshDefaultStatus,
}

impl ClientAction {
    /// Log-safe action tag (never includes message text or addresses).
    pub fn tag(&self) -> &'static str {
        match self {
            // Navigation
            ClientAction::SelectThread { .. } => "SelectThread",
            ClientAction::OpenConversationForAddress { .. } => "OpenConversationForAddress",
            ClientAction::ClearPendingAddress => "ClearPendingAddress",

            // Compose
            ClientAction::UpdateDraft { .. } => "UpdateDraft",
            ClientAction::SendMessage { .. } => "SendMessage",

            // Alerts
            ClientAction::DismissAlert { .. } => "DismissAlert",

            // UI
            ClientAction::ClearNotice => "ClearNotice",

            // Lifecycle
            ClientAction::RefreshDefaultStatus => "RefreshDefaultStatus",
        }
    }
}
