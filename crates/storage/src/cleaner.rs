//! Background reclamation of expired records
//!
//! Expired records are already invisible to reads; the cleaner only frees
//! their memory. It wakes every `interval`, purges, and goes back to sleep
//! until the next tick or until [`TTLCleaner::shutdown`] is called.

use crate::sharded::ShardedStore;
use chrono::Utc;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

struct Signal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

/// Handle to the background TTL cleaner thread
///
/// Dropping the handle stops the thread.
pub struct TTLCleaner {
    signal: Arc<Signal>,
    handle: Option<JoinHandle<()>>,
}

impl TTLCleaner {
    /// Spawn a cleaner purging `store` every `interval`
    pub fn start(store: Arc<ShardedStore>, interval: Duration) -> std::io::Result<Self> {
        let signal = Arc::new(Signal {
            stopped: Mutex::new(false),
            wake: Condvar::new(),
        });
        let thread_signal = Arc::clone(&signal);

        let handle = std::thread::Builder::new()
            .name("tally-ttl-cleaner".to_string())
            .spawn(move || {
                let mut stopped = thread_signal.stopped.lock();
                while !*stopped {
                    thread_signal.wake.wait_for(&mut stopped, interval);
                    if *stopped {
                        break;
                    }
                    let removed = store.purge_expired(Utc::now().timestamp());
                    if removed > 0 {
                        tracing::debug!(removed, "purged expired records");
                    }
                }
            })?;

        Ok(Self {
            signal,
            handle: Some(handle),
        })
    }

    /// Stop the thread and wait for it to exit
    pub fn shutdown(&mut self) {
        *self.signal.stopped.lock() = true;
        self.signal.wake.notify_all();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("TTL cleaner thread panicked");
            }
        }
    }

    /// Whether the thread is still running
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for TTLCleaner {
    fn drop(&mut self) {
        self.shutdown();
    }
}
