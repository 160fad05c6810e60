//! Single-threaded event loops and the pools that own them.
//!
//! # Responsibilities
//! - Run one current-thread Tokio runtime per OS thread
//! - Hand new connections to I/O loops in round-robin order
//! - Drain a loop's connections on shutdown, bounded by the drain timeout
//!
//! # Design Decisions
//! - A connection is owned by exactly one loop for its whole life
//! - Dropping the runtime after the drain cancels whatever is left, closing those sockets
//! - Joining skips the calling thread so a handler may stop the server it runs on

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::runtime::{Builder, Handle};
use tokio::sync::watch;

use crate::net::ConnectionTracker;

/// What other threads need to schedule work on a loop.
#[derive(Debug, Clone)]
pub struct LoopHandle {
    name: Arc<str>,
    runtime: Handle,
    shutdown: watch::Receiver<bool>,
    tracker: ConnectionTracker,
}

impl LoopHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle to the loop's runtime.
    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    /// Receiver that flips to `true` when the loop starts draining.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.clone()
    }

    /// Live connections owned by this loop.
    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }
}

/// One OS thread driving one current-thread runtime.
#[derive(Debug)]
pub struct EventLoop {
    handle: LoopHandle,
    shutdown: watch::Sender<bool>,
    thread: Option<JoinHandle<()>>,
}

impl EventLoop {
    /// Start a loop named `name`. Once shut down it waits up to `drain_timeout`
    /// for its tracked connections before dropping its runtime.
    pub fn spawn(name: String, drain_timeout: Duration) -> io::Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let (shutdown, mut signal) = watch::channel(false);
        let handle = LoopHandle {
            name: Arc::from(name.as_str()),
            runtime: runtime.handle().clone(),
            shutdown: shutdown.subscribe(),
            tracker: ConnectionTracker::new(),
        };

        let tracker = handle.tracker.clone();
        let loop_name = Arc::clone(&handle.name);
        let thread = std::thread::Builder::new().name(name).spawn(move || {
            runtime.block_on(async {
                // Also resolves if the sender is dropped.
                let _ = signal.wait_for(|stop| *stop).await;
                let draining = tracker.active_count();
                if draining > 0 {
                    tracing::debug!(event_loop = %loop_name, connections = draining, "Draining connections");
                }
                if tokio::time::timeout(drain_timeout, tracker.wait_until_idle())
                    .await
                    .is_err()
                {
                    tracing::warn!(
                        event_loop = %loop_name,
                        connections = tracker.active_count(),
                        "Drain timeout elapsed, closing remaining connections"
                    );
                }
            });
            drop(runtime);
            tracing::debug!(event_loop = %loop_name, "Event loop stopped");
        })?;

        Ok(Self {
            handle,
            shutdown,
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> &LoopHandle {
        &self.handle
    }

    /// Ask the loop to drain and stop. Does not wait.
    pub fn signal_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Wait for the loop thread to exit. Returns immediately when called from
    /// the loop's own thread or when already joined.
    pub fn join(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        if thread.thread().id() == std::thread::current().id() {
            tracing::warn!(event_loop = %self.handle.name, "Not joining event loop from its own thread");
            return;
        }
        if thread.join().is_err() {
            tracing::error!(event_loop = %self.handle.name, "Event loop thread panicked");
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread
            .as_ref()
            .is_some_and(|thread| !thread.is_finished())
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        self.signal_shutdown();
        self.join();
    }
}

/// Round-robin selector over a fixed set of loops. Cheap to clone and `Send`,
/// so the accept task can carry it.
#[derive(Debug, Clone)]
pub struct LoopSelector {
    loops: Arc<[LoopHandle]>,
    counter: Arc<AtomicUsize>,
}

impl LoopSelector {
    /// Next loop in rotation.
    pub fn next(&self) -> &LoopHandle {
        let index = self.counter.fetch_add(1, Ordering::Relaxed) % self.loops.len();
        &self.loops[index]
    }

    pub fn len(&self) -> usize {
        self.loops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }
}

/// A named pool of event loops.
#[derive(Debug)]
pub struct EventLoopGroup {
    name: &'static str,
    loops: Vec<EventLoop>,
    selector: LoopSelector,
}

impl EventLoopGroup {
    /// Start `threads` loops named `{name}-{index}`. If any fails to start,
    /// those already started are shut down before the error is returned.
    pub fn new(name: &'static str, threads: usize, drain_timeout: Duration) -> io::Result<Self> {
        if threads == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{name} pool needs at least one thread"),
            ));
        }

        let mut loops = Vec::with_capacity(threads);
        for index in 0..threads {
            // On error `loops` drops here, which stops every loop started so far.
            loops.push(EventLoop::spawn(format!("{name}-{index}"), drain_timeout)?);
        }

        let handles: Vec<LoopHandle> = loops.iter().map(|l| l.handle().clone()).collect();
        tracing::debug!(pool = name, threads, "Event loop pool started");

        Ok(Self {
            name,
            loops,
            selector: LoopSelector {
                loops: handles.into(),
                counter: Arc::new(AtomicUsize::new(0)),
            },
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.loops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    /// Next loop in rotation.
    pub fn next(&self) -> &LoopHandle {
        self.selector.next()
    }

    pub fn selector(&self) -> LoopSelector {
        self.selector.clone()
    }

    /// Connections currently owned by the pool.
    pub fn active_connections(&self) -> usize {
        self.loops
            .iter()
            .map(|l| l.handle().tracker().active_count())
            .sum()
    }

    /// Signal every loop, then wait for all of them. Loops drain concurrently,
    /// so the whole pool is bounded by one drain timeout. Idempotent.
    pub fn shutdown_gracefully(&mut self) {
        for event_loop in &self.loops {
            event_loop.signal_shutdown();
        }
        for event_loop in &mut self.loops {
            event_loop.join();
        }
        tracing::debug!(pool = self.name, "Event loop pool stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Instant;

    const DRAIN: Duration = Duration::from_millis(200);

    #[test]
    fn round_robin_cycles_through_loops() {
        let mut group = EventLoopGroup::new("io", 3, DRAIN).unwrap();
        let picked: Vec<String> = (0..6).map(|_| group.next().name().to_string()).collect();
        assert_eq!(picked, vec!["io-0", "io-1", "io-2", "io-0", "io-1", "io-2"]);
        group.shutdown_gracefully();
    }

    #[test]
    fn zero_threads_is_rejected() {
        assert!(EventLoopGroup::new("io", 0, DRAIN).is_err());
    }

    #[test]
    fn each_loop_runs_on_its_own_thread() {
        let mut group = EventLoopGroup::new("io", 2, DRAIN).unwrap();
        let (tx, rx) = std::sync::mpsc::channel();
        for _ in 0..2 {
            let tx = tx.clone();
            group.next().runtime().spawn(async move {
                let current = std::thread::current();
                let _ = tx.send((current.id(), current.name().map(str::to_owned)));
            });
        }

        let seen: Vec<_> = (0..2).map(|_| rx.recv().unwrap()).collect();
        let ids: HashSet<_> = seen.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids.len(), 2);
        for (_, name) in &seen {
            assert!(name.as_deref().is_some_and(|n| n.starts_with("io-")));
        }
        group.shutdown_gracefully();
    }

    #[test]
    fn shutdown_waits_for_tracked_connections() {
        let mut group = EventLoopGroup::new("io", 1, Duration::from_secs(5)).unwrap();
        let target = group.next().clone();
        let guard = target.tracker().track();
        let mut shutdown = target.shutdown_signal();
        target.runtime().spawn(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
            tokio::time::sleep(Duration::from_millis(50)).await;
            drop(guard);
        });

        let started = Instant::now();
        group.shutdown_gracefully();
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(group.active_connections(), 0);
    }

    #[test]
    fn drain_timeout_bounds_shutdown() {
        let mut group = EventLoopGroup::new("io", 1, DRAIN).unwrap();
        let target = group.next().clone();
        let guard = target.tracker().track();
        target.runtime().spawn(async move {
            std::future::pending::<()>().await;
            drop(guard);
        });

        let started = Instant::now();
        group.shutdown_gracefully();
        assert!(started.elapsed() >= DRAIN);
        assert!(started.elapsed() < Duration::from_secs(3));
        // Dropping the runtime dropped the task and its guard.
        assert_eq!(target.tracker().active_count(), 0);
    }

    #[test]
    fn shutdown_is_idempotent() {
        let mut group = EventLoopGroup::new("acceptor", 2, DRAIN).unwrap();
        group.shutdown_gracefully();
        group.shutdown_gracefully();
        assert!(group.loops.iter().all(|l| !l.is_running()));
    }
}
