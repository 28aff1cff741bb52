use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::error::Result;
use crate::network::Messenger;

/// Owner of the one authoritative messenger configuration.
///
/// Every mutation builds a fresh immutable snapshot and publishes it with a
/// single `send_replace`, so all dependents switch at the same instant.
/// Calls already running keep the snapshot they started with.
pub struct MessengerContext {
    tx: watch::Sender<Arc<Messenger>>,
}

impl MessengerContext {
    pub fn new(messenger: Messenger) -> Self {
        let (tx, _) = watch::channel(Arc::new(messenger));
        Self { tx }
    }

    /// Handle to inject into a dependent at construction.
    pub fn handle(&self) -> MessengerRef {
        MessengerRef {
            rx: self.tx.subscribe(),
        }
    }

    pub fn current(&self) -> Arc<Messenger> {
        self.tx.borrow().clone()
    }

    /// Apply `change` to a copy of the current messenger and publish it.
    /// On error nothing is published.
    pub fn update<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut Messenger) -> Result<()>,
    {
        let mut next = Messenger::clone(&self.current());
        change(&mut next)?;
        self.tx.send_replace(Arc::new(next));
        debug!(
            "Messenger snapshot published to {} dependent(s)",
            self.tx.receiver_count()
        );
        Ok(())
    }

    /// Number of live dependent handles.
    pub fn dependents(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Dependent-side view of the messenger configuration.
#[derive(Clone)]
pub struct MessengerRef {
    rx: watch::Receiver<Arc<Messenger>>,
}

impl MessengerRef {
    /// A handle over a messenger that never changes.
    pub fn fixed(messenger: Messenger) -> Self {
        let (_tx, rx) = watch::channel(Arc::new(messenger));
        Self { rx }
    }

    /// Latest published snapshot.
    pub fn current(&self) -> Arc<Messenger> {
        self.rx.borrow().clone()
    }
}
