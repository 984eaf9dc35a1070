//! Tick-driven re-query engines.
//!
//! Every engine is one task that owns one published snapshot. Each tick (or
//! scope change) issues a query tagged with a fresh token; a finished query
//! is only applied if its token is still the latest issued one. Queries run
//! as their own tasks so a new tick never waits for an old query.

mod contacts;
mod conversations;
mod thread;

use std::future::Future;
use std::sync::Arc;

use threadline_store_traits::ThreadId;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub use contacts::ContactSync;
pub use conversations::ConversationSync;
pub use thread::{ThreadSelector, ThreadSync};

use crate::error::SyncError;
use crate::gateway::StoreGateway;
use crate::signal::ChangeTicks;
use crate::state::{Snapshot, SnapshotStatus};

/// What an engine is currently looking at.
pub trait SyncScope: Clone + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    /// Inactive scopes are never queried; their snapshot is empty.
    fn is_active(&self) -> bool;
}

impl SyncScope for () {
    fn is_active(&self) -> bool {
        true
    }
}

impl SyncScope for Option<ThreadId> {
    fn is_active(&self) -> bool {
        self.is_some()
    }
}

struct QueryDone<S, T> {
    token: u64,
    scope: S,
    result: Result<Vec<T>, SyncError>,
}

/// Owner side of a running engine. Dropping it stops the worker.
pub(crate) struct SyncHandle<S, T> {
    scope_tx: Arc<watch::Sender<S>>,
    snapshot_rx: watch::Receiver<Snapshot<S, T>>,
    task: JoinHandle<()>,
}

impl<S, T> SyncHandle<S, T>
where
    S: SyncScope,
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub(crate) fn spawn<Q, Fut>(
        runtime: &Handle,
        name: &'static str,
        ticks: ChangeTicks,
        scope: S,
        gateway: StoreGateway,
        query: Q,
    ) -> Self
    where
        Q: Fn(StoreGateway, S) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<T>, SyncError>> + Send + 'static,
    {
        let initial_status = if scope.is_active() {
            SnapshotStatus::Loading
        } else {
            SnapshotStatus::Fresh
        };
        let (snapshot_tx, snapshot_rx) =
            watch::channel(Snapshot::empty(scope.clone(), initial_status));
        let (scope_tx, scope_rx) = watch::channel(scope);
        let (results_tx, results_rx) = flume::unbounded();

        let worker = Worker {
            name,
            gateway,
            query,
            snapshot_tx,
            results_tx,
            issued: 0,
        };
        let task = runtime.spawn(worker.run(ticks, scope_rx, results_rx));

        Self {
            scope_tx: Arc::new(scope_tx),
            snapshot_rx,
            task,
        }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Snapshot<S, T>> {
        self.snapshot_rx.clone()
    }

    pub(crate) fn snapshot(&self) -> Snapshot<S, T> {
        self.snapshot_rx.borrow().clone()
    }

    pub(crate) fn scope_sender(&self) -> Arc<watch::Sender<S>> {
        self.scope_tx.clone()
    }

    pub(crate) fn set_scope(&self, scope: S) {
        set_scope(&self.scope_tx, scope);
    }
}

impl<S, T> Drop for SyncHandle<S, T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub(crate) fn set_scope<S: PartialEq>(tx: &watch::Sender<S>, scope: S) {
    tx.send_if_modified(|current| {
        if *current == scope {
            return false;
        }
        *current = scope;
        true
    });
}

struct Worker<S, T, Q> {
    name: &'static str,
    gateway: StoreGateway,
    query: Q,
    snapshot_tx: watch::Sender<Snapshot<S, T>>,
    results_tx: flume::Sender<QueryDone<S, T>>,
    issued: u64,
}

impl<S, T, Q, Fut> Worker<S, T, Q>
where
    S: SyncScope,
    T: Clone + PartialEq + Send + Sync + 'static,
    Q: Fn(StoreGateway, S) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<T>, SyncError>> + Send + 'static,
{
    async fn run(
        mut self,
        mut ticks: ChangeTicks,
        mut scope_rx: watch::Receiver<S>,
        results_rx: flume::Receiver<QueryDone<S, T>>,
    ) {
        let mut scope = scope_rx.borrow_and_update().clone();
        tracing::debug!(engine = self.name, ?scope, "sync engine started");
        loop {
            tokio::select! {
                biased;

                changed = scope_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let next = scope_rx.borrow_and_update().clone();
                    if next == scope {
                        continue;
                    }
                    tracing::debug!(engine = self.name, from = ?scope, to = ?next, "scope changed");
                    scope = next;
                    // Anything still in flight belongs to the old scope.
                    self.issued += 1;
                    self.publish_empty(&scope);
                    self.issue(&scope);
                }
                tick = ticks.next() => {
                    let Some(tick) = tick else { break };
                    tracing::trace!(engine = self.name, seq = tick.seq, "tick");
                    self.issue(&scope);
                }
                Ok(done) = results_rx.recv_async() => {
                    // A scope change may be sent but not yet handled.
                    let latest = scope_rx.borrow().clone();
                    self.apply(done, &scope, &latest);
                }
            }
        }
        tracing::debug!(engine = self.name, "sync engine stopped");
    }

    fn issue(&mut self, scope: &S) {
        if !scope.is_active() {
            return;
        }
        self.issued += 1;
        let token = self.issued;
        let query = (self.query)(self.gateway.clone(), scope.clone());
        let results_tx = self.results_tx.clone();
        let scope = scope.clone();
        tokio::spawn(async move {
            let result = query.await;
            let _ = results_tx.send(QueryDone {
                token,
                scope,
                result,
            });
        });
    }

    fn apply(&mut self, done: QueryDone<S, T>, scope: &S, latest: &S) {
        // Ignore results of anything but the most recent query.
        if done.token != self.issued || done.scope != *scope || done.scope != *latest {
            tracing::trace!(engine = self.name, token = done.token, issued = self.issued, "discarding superseded result");
            return;
        }
        match done.result {
            Ok(items) => self.publish(done.scope, items),
            Err(err) => {
                tracing::warn!(engine = self.name, %err, "query failed; keeping last snapshot");
                self.snapshot_tx.send_if_modified(|snapshot| {
                    if snapshot.status == SnapshotStatus::Stale {
                        return false;
                    }
                    snapshot.status = SnapshotStatus::Stale;
                    snapshot.rev += 1;
                    true
                });
            }
        }
    }

    fn publish(&self, scope: S, items: Vec<T>) {
        self.snapshot_tx.send_if_modified(|snapshot| {
            if snapshot.scope == scope
                && snapshot.status == SnapshotStatus::Fresh
                && *snapshot.items == items
            {
                return false;
            }
            snapshot.scope = scope;
            snapshot.status = SnapshotStatus::Fresh;
            snapshot.items = Arc::new(items);
            snapshot.rev += 1;
            true
        });
    }

    fn publish_empty(&self, scope: &S) {
        let status = if scope.is_active() {
            SnapshotStatus::Loading
        } else {
            SnapshotStatus::Fresh
        };
        self.snapshot_tx.send_modify(|snapshot| {
            snapshot.scope = scope.clone();
            snapshot.status = status;
            snapshot.items = Arc::new(Vec::new());
            snapshot.rev += 1;
        });
    }
}
