use crate::core::{Blockchain, MiningOutcome};
use crate::error::Result;
use log::{debug, error, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Background mining cadence: one round right away, then one every
/// `interval` until stopped. Dropping the scheduler stops it too.
pub struct MiningScheduler {
    cancel: Arc<AtomicBool>,
    shutdown: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl MiningScheduler {
    pub fn start(blockchain: Blockchain, interval: Duration) -> Result<MiningScheduler> {
        let cancel = Arc::new(AtomicBool::new(false));
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let thread_cancel = Arc::clone(&cancel);

        let handle = thread::Builder::new()
            .name("mining".to_string())
            .spawn(move || {
                info!("Mining scheduler started, interval {interval:?}");
                loop {
                    match blockchain.mine_with_cancel(&thread_cancel) {
                        Ok(MiningOutcome::Sealed(block)) => {
                            debug!("Scheduled round sealed block {}", block.hash_hex());
                        }
                        Ok(MiningOutcome::NothingToMine) => {}
                        Ok(MiningOutcome::Cancelled) => break,
                        Err(e) => error!("Mining round failed: {e}"),
                    }

                    // A message or a dropped sender both mean shut down
                    match shutdown_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                info!("Mining scheduler stopped");
            })?;

        Ok(MiningScheduler {
            cancel,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Cancels any in-flight proof-of-work, wakes the ticker and joins the thread.
    pub fn stop(mut self) {
        self.shutdown_now();
    }

    fn shutdown_now(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        drop(self.shutdown.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Mining thread panicked");
            }
        }
    }
}

impl Drop for MiningScheduler {
    fn drop(&mut self) {
        self.shutdown_now();
    }
}
