//! Shutdown coordination for the server.

use std::sync::{Condvar, Mutex, PoisonError};

use tokio::sync::watch;

/// One-shot close signal shared by the acceptor task and blocking callers.
///
/// Async tasks subscribe to a watch channel; threads blocked in
/// [`Server::block`](crate::lifecycle::Server::block) wait on a condvar.
#[derive(Debug)]
pub struct CloseSignal {
    /// Watch channel sender.
    tx: watch::Sender<bool>,
    fired: Mutex<bool>,
    condvar: Condvar,
}

impl CloseSignal {
    /// Create a new, unfired signal.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            tx,
            fired: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    /// Subscribe to the close signal.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Trigger the close signal. Returns `false` if it had already fired.
    pub fn fire(&self) -> bool {
        let mut fired = self.fired.lock().unwrap_or_else(PoisonError::into_inner);
        if *fired {
            return false;
        }
        *fired = true;
        self.tx.send_replace(true);
        self.condvar.notify_all();
        true
    }

    pub fn is_fired(&self) -> bool {
        *self.fired.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block the calling thread until the signal fires.
    pub fn wait(&self) {
        let mut fired = self.fired.lock().unwrap_or_else(PoisonError::into_inner);
        while !*fired {
            fired = self
                .condvar
                .wait(fired)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

impl Default for CloseSignal {
    fn default() -> Self {
        Self::new()
    }
}
