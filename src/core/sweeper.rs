//! Periodic sweep that flushes pending queues of users who have become active.
//!
//! Each tick rescans every user, then launches one flush task per active user via a
//! [`Spawn`] implementation. Tasks report back over a channel; a task that fails or
//! panics only affects its own user. Ticks themselves run as separate tasks, so a
//! push that never returns stalls one user, not the timer.
//!
//! With [`SweepConfig::skip_in_flight_users`] set, a user whose flush from an earlier
//! tick is still running is left out of the current tick instead of being flushed
//! twice concurrently.
//!
//! [`SweepConfig::max_concurrent_flushes`] bounds each tick on its own. Flushes stuck
//! in an earlier tick keep that tick's permits and never starve a later tick.

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch, Semaphore};
use tokio::time::MissedTickBehavior;

use crate::config::SweepConfig;
use crate::core::dispatcher::{EventDispatcher, PendingQueue, PushChannel, UserFailure};
use crate::core::model::UserId;
use crate::core::NotifyError;

/// Abstraction for spawning task execution on a runtime.
pub trait Spawn {
    /// Spawn a detached future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Outcome of one sweep tick.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    /// Tick sequence number, starting at 1.
    pub tick: u64,
    /// Users examined.
    pub scanned: usize,
    /// Users flushed and how many entries each received.
    pub flushed: Vec<(UserId, usize)>,
    /// Users whose evaluation or flush failed.
    pub failed: Vec<UserFailure>,
    /// Active users left out because an earlier flush was still running.
    pub skipped: Vec<UserId>,
}

impl SweepReport {
    /// Entries delivered across all users.
    #[must_use]
    pub fn delivered(&self) -> usize {
        self.flushed.iter().map(|(_, n)| n).sum()
    }
}

/// Removes a user from the in-flight set when the flush task ends, panics included.
struct InFlight {
    users: Arc<Mutex<HashSet<UserId>>>,
    user_id: UserId,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.users.lock().remove(&self.user_id);
    }
}

/// Timer-driven controller that flushes active users' pending queues.
pub struct Sweeper<Q, C: ?Sized, S> {
    dispatcher: EventDispatcher<Q, C>,
    spawner: S,
    config: SweepConfig,
    in_flight: Arc<Mutex<HashSet<UserId>>>,
    ticks: Arc<AtomicU64>,
}

impl<Q, C: ?Sized, S: Clone> Clone for Sweeper<Q, C, S> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            spawner: self.spawner.clone(),
            config: self.config.clone(),
            in_flight: Arc::clone(&self.in_flight),
            ticks: Arc::clone(&self.ticks),
        }
    }
}

/// Stops a running sweeper. Dropping the handle stops it as well.
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
}

impl SweeperHandle {
    /// Ask the sweep loop to exit. Flush tasks already running finish on their own.
    pub fn shutdown(self) {
        let _ = self.shutdown.send(true);
    }
}

impl<Q, C, S> Sweeper<Q, C, S>
where
    Q: PendingQueue + 'static,
    C: PushChannel + ?Sized + 'static,
    S: Spawn + Clone + Send + Sync + 'static,
{
    /// Create a sweeper over a dispatcher.
    #[must_use]
    pub fn new(dispatcher: EventDispatcher<Q, C>, spawner: S, config: SweepConfig) -> Self {
        Self {
            dispatcher,
            spawner,
            config,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            ticks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Dispatcher the sweeper flushes through.
    #[must_use]
    pub const fn dispatcher(&self) -> &EventDispatcher<Q, C> {
        &self.dispatcher
    }

    /// Sweep configuration.
    #[must_use]
    pub const fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Number of users with a flush currently running.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Run one tick: scan, fan out one flush per active user, wait for all of them.
    ///
    /// # Errors
    ///
    /// Only when the user store cannot be listed. Per-user failures are in the report.
    pub async fn sweep_once(&self) -> Result<SweepReport, NotifyError> {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        let scan = self.dispatcher.scan_active(self.dispatcher.now())?;
        let mut report = SweepReport {
            tick,
            scanned: scan.scanned,
            failed: scan.failed,
            ..SweepReport::default()
        };
        tracing::debug!("sweep {}: {} of {} users active", tick, scan.active.len(), scan.scanned);

        let permits = self.config.max_concurrent_flushes.clamp(1, Semaphore::MAX_PERMITS);
        let limiter = Arc::new(Semaphore::new(permits));
        let (tx, mut rx) = mpsc::unbounded_channel::<(UserId, Result<usize, NotifyError>)>();
        let mut launched = HashSet::new();

        for user in scan.active {
            let guard = if self.config.skip_in_flight_users {
                if !self.in_flight.lock().insert(user.id) {
                    tracing::warn!("sweep {}: user {} still flushing, skipped", tick, user.id);
                    report.skipped.push(user.id);
                    continue;
                }
                Some(InFlight {
                    users: Arc::clone(&self.in_flight),
                    user_id: user.id,
                })
            } else {
                None
            };

            let dispatcher = self.dispatcher.clone();
            let limiter = Arc::clone(&limiter);
            let tx = tx.clone();
            launched.insert(user.id);

            self.spawner.spawn(async move {
                let _guard = guard;
                let _permit = limiter.acquire_owned().await;
                let outcome = dispatcher.flush(&user).await;
                let _ = tx.send((user.id, outcome));
            });
        }
        drop(tx);

        while let Some((user_id, outcome)) = rx.recv().await {
            launched.remove(&user_id);
            match outcome {
                Ok(delivered) => report.flushed.push((user_id, delivered)),
                Err(e) => {
                    tracing::error!("sweep {}: flush of user {} failed: {}", tick, user_id, e);
                    report.failed.push(UserFailure {
                        user_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        for user_id in launched {
            tracing::error!("sweep {}: flush task of user {} ended without reporting", tick, user_id);
            report.failed.push(UserFailure {
                user_id,
                error: "flush task aborted".into(),
            });
        }

        Ok(report)
    }

    fn spawn_sweep(&self) {
        let this = self.clone();
        self.spawner.spawn(async move {
            match this.sweep_once().await {
                Ok(report) => tracing::info!(
                    tick = report.tick,
                    scanned = report.scanned,
                    flushed = report.flushed.len(),
                    delivered = report.delivered(),
                    failed = report.failed.len(),
                    skipped = report.skipped.len(),
                    "sweep finished"
                ),
                Err(e) => tracing::error!("sweep failed: {}", e),
            }
        });
    }

    /// Sweep loop: wait the initial delay, then tick at the configured period until
    /// `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            "sweeper started (initial delay {:?}, period {:?})",
            self.config.initial_delay(),
            self.config.period()
        );

        tokio::select! {
            () = tokio::time::sleep(self.config.initial_delay()) => {}
            _ = shutdown.changed() => {
                tracing::info!("sweeper stopped before first tick");
                return;
            }
        }

        let mut interval = tokio::time::interval(self.config.period());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => self.spawn_sweep(),
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!("sweeper stopped");
    }

    /// Spawn [`run`](Self::run) and return a handle that stops it.
    #[must_use]
    pub fn start(self) -> SweeperHandle {
        let (tx, rx) = watch::channel(false);
        let spawner = self.spawner.clone();
        spawner.spawn(self.run(rx));
        SweeperHandle { shutdown: tx }
    }
}
