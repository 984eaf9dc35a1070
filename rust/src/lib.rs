//! threadline core: mirrors an external message store into live views and
//! turns inbound messages into actionable alerts.
//!
//! Everything is wired by [`MessagingClient::new`]; the individual pieces are
//! public so a host that already runs tokio can assemble them itself.

mod actions;
mod config;
mod error;
mod gateway;
mod logging;
mod notify;
mod session;
mod signal;
mod state;
mod sync;

use std::sync::Arc;

use threadline_store_traits::{MessageStore, Resource};
use tokio::runtime::{Handle, Runtime};
use tokio::sync::watch;

pub use actions::ClientAction;
pub use config::{default_config_json, load_client_config, ClientConfig};
pub use error::{SyncError, TransmitError};
pub use gateway::{SendOutcome, StoreGateway, Transmitter};
pub use logging::init_logging;
pub use notify::{
    AlertChannel, AlertSink, AlertTransition, CompletionToken, InboundMessage,
    NotificationDispatcher, ReplyOutcome, ReplyPayload, ReplyTask,
};
pub use session::{DefaultHandlerProbe, SessionSnapshot, SessionState};
pub use signal::{ChangeSignal, ChangeTicks, Tick};
pub use state::*;
pub use sync::{ContactSync, ConversationSync, SyncScope, ThreadSelector, ThreadSync};
pub use threadline_store_traits::ThreadId;

/// Platform capabilities the client is built from.
#[derive(Clone)]
pub struct Platform {
    pub store: Arc<dyn MessageStore>,
    pub transmitter: Arc<dyn Transmitter>,
    pub alert_sink: Arc<dyn AlertSink>,
    pub probe: Arc<dyn DefaultHandlerProbe>,
}

#[derive(Debug)]
enum ClientMsg {
    Action(ClientAction),
    InboundMessage(InboundMessage),
    RespondViaMessage { address: String, text: String },
}

pub struct MessagingClient {
    msg_tx: flume::Sender<ClientMsg>,
    signal: Arc<ChangeSignal>,
    conversations: ConversationSync,
    thread: ThreadSync,
    contacts: ContactSync,
    dispatcher: Arc<NotificationDispatcher>,
    session: Arc<SessionState>,
    // Declared last so the engines above are torn down before the runtime.
    runtime: Runtime,
}

impl MessagingClient {
    /// Loads `<data_dir>/threadline_config.json`, initializes logging and
    /// builds the client.
    pub fn new(data_dir: &str, platform: Platform) -> std::io::Result<Self> {
        let (config, problem) = config::read_client_config(data_dir);
        logging::init_logging(data_dir, config.log_filter.as_deref());
        if let Some(problem) = problem {
            problem.log();
        }
        tracing::info!(data_dir = %data_dir, backend = ?platform.store.backend(), "MessagingClient::new() starting");
        Self::with_config(config, platform)
    }

    pub fn with_config(config: ClientConfig, platform: Platform) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(config.worker_threads())
            .thread_name("threadline-worker")
            .enable_all()
            .build()?;
        let handle = runtime.handle().clone();

        let signal = Arc::new(ChangeSignal::new());
        let gateway = StoreGateway::new(
            platform.store.clone(),
            platform.transmitter,
            config.query_timeout(),
        );
        gateway.register_observer(signal.clone());

        let conversations = ConversationSync::start(&handle, &signal, gateway.clone());
        let thread = ThreadSync::start(&handle, &signal, gateway.clone());
        let contacts = ContactSync::start(&handle, &signal, gateway.clone());
        let dispatcher = Arc::new(NotificationDispatcher::new(
            handle.clone(),
            gateway.clone(),
            platform.alert_sink,
            config.alert_channel(),
        ));
        let session = Arc::new(SessionState::new(
            gateway,
            thread.selector(),
            platform.probe,
        ));

        // Messages are handled one at a time, in dispatch order.
        let (msg_tx, msg_rx) = flume::unbounded::<ClientMsg>();
        let session_for_loop = session.clone();
        let dispatcher_for_loop = dispatcher.clone();
        handle.spawn(async move {
            while let Ok(msg) = msg_rx.recv_async().await {
                handle_message(&session_for_loop, &dispatcher_for_loop, msg).await;
            }
        });

        Ok(Self {
            msg_tx,
            signal,
            conversations,
            thread,
            contacts,
            dispatcher,
            session,
            runtime,
        })
    }

    pub fn dispatch(&self, action: ClientAction) {
        // Contract: never block caller.
        tracing::debug!(action = action.tag(), "dispatch");
        let _ = self.msg_tx.send(ClientMsg::Action(action));
    }

    /// Raw change notification from a store that does not report through
    /// [`threadline_store_traits::StoreObserver`].
    pub fn on_store_changed(&self, resource: Resource) {
        self.signal.notify(resource);
    }

    pub fn on_message_received(&self, message: InboundMessage) {
        let _ = self.msg_tx.send(ClientMsg::InboundMessage(message));
    }

    /// Runs the reply in the background; `keepalive` is released when it is
    /// done. A failed send lands in the session notice first.
    pub fn on_reply_action(
        &self,
        payload: ReplyPayload,
        keepalive: Box<dyn CompletionToken>,
    ) -> Option<ReplyTask> {
        let session = self.session.clone();
        self.dispatcher
            .dispatch_reply_then(payload, keepalive, move |outcome| {
                if let Err(err) = &outcome.send {
                    session.set_notice(format!("Reply not sent: {err}"));
                }
            })
    }

    pub fn on_respond_via_message(&self, address: String, text: String) {
        let _ = self
            .msg_tx
            .send(ClientMsg::RespondViaMessage { address, text });
    }

    pub fn conversations(&self) -> watch::Receiver<ConversationSnapshot> {
        self.conversations.subscribe()
    }

    pub fn messages(&self) -> watch::Receiver<MessageSnapshot> {
        self.thread.subscribe()
    }

    pub fn contacts(&self) -> watch::Receiver<ContactSnapshot> {
        self.contacts.subscribe()
    }

    pub fn conversation_snapshot(&self) -> ConversationSnapshot {
        self.conversations.snapshot()
    }

    pub fn message_snapshot(&self) -> MessageSnapshot {
        self.thread.snapshot()
    }

    pub fn contact_snapshot(&self) -> ContactSnapshot {
        self.contacts.snapshot()
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    pub fn runtime_handle(&self) -> Handle {
        self.runtime.handle().clone()
    }
}

async fn handle_message(
    session: &SessionState,
    dispatcher: &NotificationDispatcher,
    msg: ClientMsg,
) {
    match msg {
        ClientMsg::Action(action) => handle_action(session, dispatcher, action).await,
        ClientMsg::InboundMessage(message) => {
            if let Err(err) = dispatcher.on_inbound_message(message).await {
                tracing::warn!(%err, "inbound message not alerted");
            }
        }
        ClientMsg::RespondViaMessage { address, text } => {
            if let Err(err) = dispatcher.respond_via_message(&address, &text).await {
                tracing::warn!(%err, "respond-via-message failed");
            }
        }
    }
}

async fn handle_action(
    session: &SessionState,
    dispatcher: &NotificationDispatcher,
    action: ClientAction,
) {
    match action {
        ClientAction::SelectThread { thread_id } => session.select_thread(thread_id).await,
        ClientAction::OpenConversationForAddress { address } => {
            session.open_conversation_for_address(&address)
        }
        ClientAction::ClearPendingAddress => session.clear_pending_address(),
        ClientAction::UpdateDraft { text } => session.update_draft(&text),
        ClientAction::SendMessage { address, body } => {
            // Failures already land in the session notice.
            let _ = session.send_message(&address, &body).await;
        }
        ClientAction::DismissAlert { thread_id } => {
            if let Err(err) = dispatcher.cancel(thread_id) {
                tracing::warn!(thread_id, %err, "dismiss alert failed");
                session.set_notice(format!("Could not dismiss alert: {err}"));
            }
        }
        ClientAction::ClearNotice => session.clear_notice(),
        ClientAction::RefreshDefaultStatus => {
            session.refresh_default_status();
        }
    }
}
