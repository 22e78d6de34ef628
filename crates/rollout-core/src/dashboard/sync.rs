//! Polling driver for the dashboard store.
//!
//! A single loop task owns the [`DashboardStore`]. Refresh cycles run as
//! detached tasks and report back over a channel; the loop decides whether a
//! result still applies and publishes the new state on a `watch` channel.
//! Dropping the synchronizer stops the loop; in-flight requests finish on
//! their own but their results have nowhere to land.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::debug;

use super::{CycleTicket, DashboardSnapshot, DashboardState, DashboardStore, Invalidation};
use crate::source::{DataSource, SourceMode};

/// Published after every applied transition.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardUpdate {
    pub state: DashboardState,
    pub invalidation: Invalidation,
    /// Increments with every publication.
    pub revision: u64,
}

#[derive(Debug)]
enum Command {
    SwitchMode(SourceMode),
    RefreshNow,
}

type CycleResult = (CycleTicket, Result<DashboardSnapshot, String>);

/// Keeps a dashboard state current while mounted.
#[derive(Debug)]
pub struct PollingSynchronizer {
    commands: mpsc::UnboundedSender<Command>,
    updates: watch::Receiver<DashboardUpdate>,
    handle: JoinHandle<()>,
}

impl PollingSynchronizer {
    /// Mount on `source` and start polling every `interval` in live mode.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(source: DataSource, interval: Duration) -> Self {
        let mut store = DashboardStore::new();
        let invalidation = store.mount(source.mode());
        let initial = DashboardUpdate {
            state: store.state().clone(),
            invalidation,
            revision: 0,
        };

        let (updates_tx, updates) = watch::channel(initial);
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let poller = Poller {
            store,
            source,
            interval,
            updates: updates_tx,
            revision: 0,
        };
        let handle = tokio::spawn(poller.run(commands_rx));

        Self {
            commands,
            updates,
            handle,
        }
    }

    /// Latest published state.
    pub fn state(&self) -> DashboardState {
        self.updates.borrow().state.clone()
    }

    /// A receiver that is notified on every publication.
    pub fn subscribe(&self) -> watch::Receiver<DashboardUpdate> {
        self.updates.clone()
    }

    /// Remount on a different data source mode.
    pub fn switch_mode(&self, mode: SourceMode) {
        let _ = self.commands.send(Command::SwitchMode(mode));
    }

    /// Issue a refresh cycle without waiting for the next tick.
    pub fn refresh_now(&self) {
        let _ = self.commands.send(Command::RefreshNow);
    }

    /// Stop polling. Equivalent to dropping the synchronizer.
    pub fn unmount(self) {}
}

impl Drop for PollingSynchronizer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

struct Poller {
    store: DashboardStore,
    source: DataSource,
    interval: Duration,
    updates: watch::Sender<DashboardUpdate>,
    revision: u64,
}

impl Poller {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let (results_tx, mut results_rx) = mpsc::unbounded_channel::<CycleResult>();
        let mut ticker = self.ticker();

        loop {
            tokio::select! {
                _ = next_tick(&mut ticker) => {
                    self.start_cycle(&results_tx);
                }
                Some((ticket, result)) = results_rx.recv() => {
                    if let Some(invalidation) = self.store.resolve(ticket, result) {
                        self.publish(invalidation);
                    }
                }
                command = commands.recv() => match command {
                    Some(Command::SwitchMode(mode)) => {
                        self.source = self.source.with_mode(mode);
                        let invalidation = self.store.mount(mode);
                        self.publish(invalidation);
                        ticker = self.ticker();
                    }
                    Some(Command::RefreshNow) => self.start_cycle(&results_tx),
                    None => break,
                },
            }
        }

        self.store.unmount();
    }

    /// Live mode ticks immediately, then every interval; demo mode never ticks.
    fn ticker(&self) -> Option<Interval> {
        if self.source.is_demo() {
            return None;
        }
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Some(interval)
    }

    fn start_cycle(&mut self, results: &mpsc::UnboundedSender<CycleResult>) {
        let Some(ticket) = self.store.begin_cycle() else {
            return;
        };
        debug!(seq = ticket.seq(), "starting dashboard refresh");

        let source = self.source.clone();
        let results = results.clone();
        tokio::spawn(async move {
            let result = source
                .load_snapshot()
                .await
                .map_err(|err| err.to_string());
            let _ = results.send((ticket, result));
        });
    }

    fn publish(&mut self, invalidation: Invalidation) {
        self.revision += 1;
        let update = DashboardUpdate {
            state: self.store.state().clone(),
            invalidation,
            revision: self.revision,
        };
        let _ = self.updates.send(update);
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
