//! SchedulerActor - Runs sweeps at fixed minutes of every hour
//!
//! Two independent timelines share one [`Fetcher`]:
//!
//! 1. **Startup sweep** (optional): spawned once when the scheduler starts.
//! 2. **Minute loop**: a one-minute ticker compares the wall-clock minute against the
//!    configured [`TriggerMinutes`] and runs a sweep on a match.
//!
//! ## Message Flow
//!
//! ```text
//! Minute tick → minute matches? → sweep (target, 2s, target, 2s, ...) → SweepSummary
//!     ↑
//!     └─── Commands (SweepNow, Shutdown)
//! ```
//!
//! Within a sweep targets are fetched one after another, never in parallel. Sweeps are
//! not cancelled once started.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, instrument, trace, warn};

use crate::target::Target;
use crate::util::{SWEEP_PACING, TICK_INTERVAL};

use super::fetcher::Fetcher;
use super::messages::{SchedulerCommand, SweepSummary};

/// Minutes of the hour (0-59) at which a sweep is triggered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerMinutes(BTreeSet<u32>);

impl TriggerMinutes {
    /// Parse a comma separated list, dropping entries that are not a minute of the hour
    pub fn parse(list: &str) -> Self {
        Self::from_values(
            list.split(',')
                .filter_map(|part| part.trim().parse::<i64>().ok()),
        )
    }

    /// Keep only values in `0..=59`
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        Self(
            values
                .into_iter()
                .filter(|minute| (0..60).contains(minute))
                .map(|minute| minute as u32)
                .collect(),
        )
    }

    pub fn contains(&self, minute: u32) -> bool {
        self.0.contains(&minute)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
}

/// Static settings of a scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Targets of every sweep, in sweep order
    pub targets: Arc<[Target]>,

    pub minutes: TriggerMinutes,

    /// Pause between two consecutive targets of a sweep
    pub pacing: Duration,

    /// How often the wall clock is checked
    pub tick_interval: Duration,

    /// Run one sweep immediately at startup
    pub run_on_start: bool,
}

impl SchedulerConfig {
    pub fn new(targets: Vec<Target>, minutes: TriggerMinutes) -> Self {
        Self {
            targets: targets.into(),
            minutes,
            pacing: SWEEP_PACING,
            tick_interval: TICK_INTERVAL,
            run_on_start: false,
        }
    }
}

/// Fetch every target once, pausing `pacing` between consecutive targets
///
/// Failures are isolated per target: an exhausted target is counted and the sweep moves
/// on.
#[instrument(skip_all, fields(targets = targets.len()))]
pub async fn sweep(fetcher: &Fetcher, targets: &[Target], pacing: Duration) -> SweepSummary {
    let mut summary = SweepSummary::default();

    for (index, target) in targets.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(pacing).await;
        }

        match fetcher.fetch(target).await {
            Ok(_) => summary.succeeded += 1,
            Err(e) => {
                warn!("dropping {target} until the next sweep: {e}");
                summary.failed += 1;
            }
        }
    }

    info!(
        "sweep finished: {} succeeded, {} failed",
        summary.succeeded, summary.failed
    );

    summary
}

/// (date, hour, minute) of the last minute that triggered a sweep
type MinuteSlot = (NaiveDate, u32, u32);

/// Actor that owns the minute loop
pub struct SchedulerActor {
    config: SchedulerConfig,

    fetcher: Fetcher,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<SchedulerCommand>,

    /// Guards against sweeping twice within the same wall-clock minute
    last_slot: Option<MinuteSlot>,
}

impl SchedulerActor {
    pub fn new(
        config: SchedulerConfig,
        fetcher: Fetcher,
        command_rx: mpsc::Receiver<SchedulerCommand>,
    ) -> Self {
        Self {
            config,
            fetcher,
            command_rx,
            last_slot: None,
        }
    }

    /// Run the actor's main loop
    ///
    /// The first tick fires one `tick_interval` after startup. The loop runs until a
    /// Shutdown command is received.
    #[instrument(skip(self), fields(targets = self.config.targets.len()))]
    pub async fn run(mut self) {
        debug!(
            "starting scheduler actor (minutes: {:?})",
            self.config.minutes.iter().collect::<Vec<_>>()
        );

        let period = self.config.tick_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.handle_tick(Local::now().naive_local()).await;
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        SchedulerCommand::SweepNow { respond_to } => {
                            debug!("received SweepNow command");
                            let summary = self.run_sweep().await;
                            let _ = respond_to.send(summary);
                        }

                        SchedulerCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }
            }
        }

        debug!("scheduler actor stopped");
    }

    /// Evaluate one tick at the given local wall-clock time
    ///
    /// Returns the sweep outcome if the minute matched and had not fired yet.
    pub async fn handle_tick(&mut self, now: NaiveDateTime) -> Option<SweepSummary> {
        let minute = now.minute();

        if !self.config.minutes.contains(minute) {
            trace!("minute {minute} not scheduled");
            return None;
        }

        let slot = (now.date(), now.hour(), minute);
        if self.last_slot == Some(slot) {
            debug!("minute {minute} already handled");
            return None;
        }
        self.last_slot = Some(slot);

        info!("minute match {minute}: fetching");
        Some(self.run_sweep().await)
    }

    async fn run_sweep(&self) -> SweepSummary {
        sweep(&self.fetcher, &self.config.targets, self.config.pacing).await
    }
}

/// Handle for controlling a SchedulerActor
#[derive(Clone)]
pub struct SchedulerHandle {
    sender: mpsc::Sender<SchedulerCommand>,
}

impl SchedulerHandle {
    /// Spawn the minute loop and, if configured, the startup sweep
    pub fn spawn(config: SchedulerConfig, fetcher: Fetcher) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        if config.run_on_start {
            let fetcher = fetcher.clone();
            let targets = config.targets.clone();
            let pacing = config.pacing;
            tokio::spawn(async move {
                info!("running startup sweep over {} targets", targets.len());
                sweep(&fetcher, &targets, pacing).await;
            });
        }

        let actor = SchedulerActor::new(config, fetcher, cmd_rx);
        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    /// Run a full sweep now and wait for it to finish
    pub async fn sweep_now(&self) -> Result<SweepSummary> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SchedulerCommand::SweepNow { respond_to: tx })
            .await
            .context("failed to send SweepNow command")?;

        rx.await.context("failed to receive sweep summary")
    }

    /// Stop the minute loop
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(SchedulerCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }
}
