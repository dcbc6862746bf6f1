//! Worker threads started by triggers.
//!
//! Workers are detached from the dispatch call that started them: nothing
//! waits for them except [`WorkerSet::join_all`]. A worker can be asked to
//! stop through its [`StopToken`], which it is free to ignore.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use launchterm_types::error::Result;

use crate::context::lock;

/// Cooperative stop flag.
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the worker holding this token to halt.
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether a stop was requested.
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

struct Worker {
    name: String,
    handle: JoinHandle<()>,
    stop: StopToken,
}

/// Tracks every worker the dispatcher started.
#[derive(Default)]
pub(crate) struct WorkerSet {
    workers: Mutex<Vec<Worker>>,
}

impl WorkerSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Start a named worker thread running `f`.
    pub(crate) fn spawn<F>(&self, name: &str, f: F) -> Result<()>
    where
        F: FnOnce(StopToken) + Send + 'static,
    {
        let stop = StopToken::new();
        let token = stop.clone();
        let handle = thread::Builder::new()
            .name(format!("launchterm-{name}"))
            .spawn(move || f(token))?;

        let mut workers = lock(&self.workers);
        workers.retain(|w| !w.handle.is_finished());
        workers.push(Worker {
            name: name.to_string(),
            handle,
            stop,
        });
        Ok(())
    }

    /// Number of workers that have not finished yet.
    pub(crate) fn active(&self) -> usize {
        lock(&self.workers)
            .iter()
            .filter(|w| !w.handle.is_finished())
            .count()
    }

    /// Raise the stop flag of every tracked worker.
    pub(crate) fn stop_all(&self) {
        for w in lock(&self.workers).iter() {
            w.stop.stop();
        }
    }

    /// Wait for every tracked worker, including ones started while waiting.
    pub(crate) fn join_all(&self) {
        loop {
            let batch = std::mem::take(&mut *lock(&self.workers));
            if batch.is_empty() {
                return;
            }
            for w in batch {
                if w.handle.join().is_err() {
                    log::warn!("Worker '{}' panicked", w.name);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::time::Duration;

    use super::*;

    #[test]
    fn stop_token_shared_between_clones() {
        let a = StopToken::new();
        let b = a.clone();
        assert!(!b.is_stopped());
        a.stop();
        assert!(b.is_stopped());
    }

    #[test]
    fn join_all_waits_for_every_worker() {
        let set = WorkerSet::new();
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..4 {
            let count = Arc::clone(&count);
            set.spawn("count", move |_| {
                thread::sleep(Duration::from_millis(10));
                count.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        set.join_all();
        assert_eq!(count.load(Ordering::SeqCst), 4);
        assert_eq!(set.active(), 0);
    }

    #[test]
    fn stop_all_reaches_running_worker() {
        let set = WorkerSet::new();
        let (started_tx, started_rx) = mpsc::channel();
        set.spawn("loop", move |stop| {
            started_tx.send(()).unwrap();
            while !stop.is_stopped() {
                thread::sleep(Duration::from_millis(1));
            }
        })
        .unwrap();
        started_rx.recv().unwrap();
        assert_eq!(set.active(), 1);
        set.stop_all();
        set.join_all();
        assert_eq!(set.active(), 0);
    }

    #[test]
    fn panicking_worker_does_not_poison_join() {
        let set = WorkerSet::new();
        set.spawn("boom", |_| panic!("worker failure")).unwrap();
        set.join_all();
        assert_eq!(set.active(), 0);
    }
}
