//! Per-website recurring check tasks.
//!
//! The scheduler owns one tokio task per registered website. Each task loops
//! on a fixed interval and runs a check cycle on every tick; a cycle that
//! fails is logged and the loop keeps its cadence. Upsert and remove go
//! through a single map lock, so replacing a task always stops the old loop
//! before the new one is armed. Stopping is graceful: the stop signal is
//! only observed between ticks, so a cycle that is already running (probing,
//! committing or alerting) always finishes before the loop exits.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info};

use crate::alerting::dispatcher::AlertDispatcher;
use crate::db::store::{MonitorStore, StoreError};
use crate::monitor::checker;
use crate::monitor::prober::{HttpProber, Probe};

pub struct MonitorScheduler {
    tasks: Mutex<HashMap<i32, watch::Sender<bool>>>,
    store: Arc<dyn MonitorStore>,
    dispatcher: Arc<AlertDispatcher>,
    prober: Arc<dyn Probe>,
}

impl MonitorScheduler {
    pub fn new(store: Arc<dyn MonitorStore>, dispatcher: Arc<AlertDispatcher>) -> Self {
        Self::with_prober(store, dispatcher, Arc::new(HttpProber::new()))
    }

    pub fn with_prober(
        store: Arc<dyn MonitorStore>,
        dispatcher: Arc<AlertDispatcher>,
        prober: Arc<dyn Probe>,
    ) -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            store,
            dispatcher,
            prober,
        }
    }

    /// Installs or replaces the recurring check task for a website. The
    /// first tick fires one full interval after installation. An in-flight
    /// cycle of a replaced task finishes; only its next tick is gone.
    pub fn upsert(&self, website_id: i32, interval_seconds: u64) {
        let store = self.store.clone();
        let dispatcher = self.dispatcher.clone();
        let prober = self.prober.clone();
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let mut tasks = self.tasks.lock().unwrap();
        if let Some(old) = tasks.remove(&website_id) {
            let _ = old.send(true);
        }

        tokio::spawn(async move {
            let period = Duration::from_secs(interval_seconds.max(1));
            let mut ticker = time::interval_at(time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    // Fires on a stop signal or when the scheduler was
                    // dropped. Never races a running cycle: run_check runs
                    // in the tick arm's body, after the race is decided.
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = checker::run_check(
                            store.as_ref(),
                            prober.as_ref(),
                            &dispatcher,
                            website_id,
                        )
                        .await
                        {
                            error!(website_id, error = %e, "Check cycle failed.");
                        }
                    }
                }
            }
        });
        tasks.insert(website_id, stop_tx);
        info!(website_id, interval_seconds, "Check task installed.");
    }

    /// Stops the website's check task; no-op when none exists. A cycle that
    /// is already running completes normally, only future ticks are gone.
    pub fn remove(&self, website_id: i32) {
        let mut tasks = self.tasks.lock().unwrap();
        if let Some(stop) = tasks.remove(&website_id) {
            let _ = stop.send(true);
            info!(website_id, "Check task removed.");
        }
    }

    pub fn is_scheduled(&self, website_id: i32) -> bool {
        self.tasks.lock().unwrap().contains_key(&website_id)
    }

    /// Re-installs check tasks for every persisted website. Called once at
    /// process start so polling resumes after a restart; the scheduler keeps
    /// no persisted state of its own.
    pub async fn bootstrap(&self) -> Result<usize, StoreError> {
        let websites = self.store.all_websites().await?;
        let count = websites.len();
        for site in websites {
            self.upsert(site.id, site.check_interval.max(1) as u64);
        }
        info!(websites = count, "Scheduler bootstrapped from store.");
        Ok(count)
    }
}
