use threadline_store_traits::Resource;
use tokio::runtime::Handle;
use tokio::sync::watch;

use super::SyncHandle;
use crate::gateway::StoreGateway;
use crate::signal::ChangeSignal;
use crate::state::{Contact, ContactSnapshot};

/// Live contact list (contacts with at least one number).
pub struct ContactSync {
    handle: SyncHandle<(), Contact>,
}

impl ContactSync {
    pub fn start(runtime: &Handle, signal: &ChangeSignal, gateway: StoreGateway) -> Self {
        let handle = SyncHandle::spawn(
            runtime,
            "contacts",
            signal.subscribe(Resource::Contacts),
            (),
            gateway,
            |gateway, ()| async move { gateway.list_contacts().await },
        );
        Self { handle }
    }

    pub fn subscribe(&self) -> watch::Receiver<ContactSnapshot> {
        self.handle.subscribe()
    }

    pub fn snapshot(&self) -> ContactSnapshot {
        self.handle.snapshot()
    }
}
