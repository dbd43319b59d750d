//! Owned state container fed through a message queue.
//!
//! A single reducer task owns the state. Actions are queued on an unbounded
//! channel and applied in arrival order; every applied state is published
//! on a `watch` channel. `dispatch` resolves once its action has been
//! applied, so a caller always observes its own transition.

use crate::core::Entity;
use crate::slice::action::Action;
use crate::slice::reducer::reduce;
use crate::slice::state::EntityState;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{error, trace};

struct Envelope<T> {
    action: Action<T>,
    applied: oneshot::Sender<()>,
}

#[derive(Clone)]
pub struct Store<T: Entity> {
    queue: mpsc::UnboundedSender<Envelope<T>>,
    state: watch::Receiver<EntityState<T>>,
}

impl<T: Entity> Store<T> {
    /// Spawns the reducer task. Must be called from within a tokio runtime.
    pub fn new() -> Self {
        Self::with_state(EntityState::initial())
    }

    pub fn with_state(initial: EntityState<T>) -> Self {
        let (queue, inbox) = mpsc::unbounded_channel();
        let (publisher, state) = watch::channel(initial.clone());

        tokio::spawn(run_reducer(initial, inbox, publisher));

        Self { queue, state }
    }

    /// Queues `action` and waits until the reducer has applied it.
    pub async fn dispatch(&self, action: Action<T>) {
        let (applied, done) = oneshot::channel();
        if self.queue.send(Envelope { action, applied }).is_err() {
            error!("reducer task is gone, action dropped");
            return;
        }
        let _ = done.await;
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> EntityState<T> {
        self.state.borrow().clone()
    }

    /// Receiver that is notified after every applied action.
    pub fn subscribe(&self) -> watch::Receiver<EntityState<T>> {
        self.state.clone()
    }
}

impl<T: Entity> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_reducer<T: Entity>(
    mut current: EntityState<T>,
    mut inbox: mpsc::UnboundedReceiver<Envelope<T>>,
    publisher: watch::Sender<EntityState<T>>,
) {
    while let Some(Envelope { action, applied }) = inbox.recv().await {
        trace!(action = action.kind(), phase = ?action.phase_name(), "applying action");
        current = reduce(std::mem::take(&mut current), action);
        publisher.send_replace(current.clone());
        let _ = applied.send(());
    }
}
