//! Per-resource change ticks.
//!
//! Each resource has one `watch` channel holding a counter. Notifying bumps
//! the counter; a subscriber only ever sees the latest value, so a slow
//! consumer has at most one pending tick no matter how many notifications
//! arrived in between.

use threadline_store_traits::{Resource, StoreObserver};
use tokio::sync::watch;

/// A change notification. Carries no payload beyond the resource and a
/// sequence number that only ever grows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tick {
    pub resource: Resource,
    pub seq: u64,
}

#[derive(Debug)]
pub struct ChangeSignal {
    threads: watch::Sender<u64>,
    messages: watch::Sender<u64>,
    contacts: watch::Sender<u64>,
}

impl Default for ChangeSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeSignal {
    pub fn new() -> Self {
        Self {
            threads: watch::Sender::new(0),
            messages: watch::Sender::new(0),
            contacts: watch::Sender::new(0),
        }
    }

    fn channel(&self, resource: Resource) -> &watch::Sender<u64> {
        match resource {
            Resource::Threads => &self.threads,
            Resource::Messages => &self.messages,
            Resource::Contacts => &self.contacts,
        }
    }

    pub fn notify(&self, resource: Resource) {
        self.channel(resource).send_modify(|seq| *seq += 1);
        tracing::trace!(resource = resource.as_str(), "change notified");
    }

    /// Subscribes to `resource`. The first `next()` resolves immediately
    /// (bootstrap tick) even if nothing changed yet.
    pub fn subscribe(&self, resource: Resource) -> ChangeTicks {
        let mut rx = self.channel(resource).subscribe();
        rx.mark_changed();
        ChangeTicks { resource, rx }
    }

    pub fn subscriber_count(&self, resource: Resource) -> usize {
        self.channel(resource).receiver_count()
    }
}

impl StoreObserver for ChangeSignal {
    fn on_change(&self, resource: Resource) {
        self.notify(resource);
    }
}

/// Tick stream for one subscriber. Dropping it unsubscribes.
#[derive(Debug)]
pub struct ChangeTicks {
    resource: Resource,
    rx: watch::Receiver<u64>,
}

impl ChangeTicks {
    pub fn resource(&self) -> Resource {
        self.resource
    }

    /// Waits for the next tick. `None` once the signal itself is gone.
    pub async fn next(&mut self) -> Option<Tick> {
        self.rx.changed().await.ok()?;
        let seq = *self.rx.borrow_and_update();
        Some(Tick {
            resource: self.resource,
            seq,
        })
    }
}
