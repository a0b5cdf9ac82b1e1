//! Shutdown orchestration.
//!
//! `RUNNING -> SIGNAL_RECEIVED -> DRAINING -> STOPPING -> {STOPPED | FORCED}`
//!
//! On the first trigger the health flag is flipped, then the orchestrator
//! sleeps for the grace period so upstream load balancers can see the flip,
//! then asks the listener to stop and waits for in-flight requests up to the
//! shutdown timeout. Past the timeout the listener task is aborted, and with
//! it every connection it owns. A second
//! trigger at any point after the first skips straight to `FORCED`.

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use zero_core::error::{Result, ZeroError};

use crate::ops::health::HealthState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainPolicy {
    /// Pause between the health flip and closing the listener.
    pub grace_period: Duration,
    /// Upper bound on waiting for in-flight requests once the listener closes.
    pub shutdown_timeout: Duration,
}

impl Default for DrainPolicy {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_secs(5),
            shutdown_timeout: Duration::from_secs(20),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Requested,
    Forced,
}

/// Termination requests, decoupled from OS signals.
///
/// The first `trigger()` requests a graceful shutdown; every later one forces
/// termination.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    count: Arc<AtomicUsize>,
    requested: CancellationToken,
    forced: CancellationToken,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) -> Trigger {
        if self.count.fetch_add(1, Ordering::SeqCst) == 0 {
            self.requested.cancel();
            Trigger::Requested
        } else {
            self.forced.cancel();
            Trigger::Forced
        }
    }

    pub fn is_requested(&self) -> bool {
        self.requested.is_cancelled()
    }

    pub async fn requested(&self) {
        self.requested.cancelled().await
    }

    pub async fn forced(&self) {
        self.forced.cancelled().await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    SignalReceived,
    Draining,
    Stopping,
    Stopped,
    Forced,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Running => "running",
            Phase::SignalReceived => "signal_received",
            Phase::Draining => "draining",
            Phase::Stopping => "stopping",
            Phase::Stopped => "stopped",
            Phase::Forced => "forced",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceCause {
    /// In-flight requests outlived the shutdown timeout.
    Timeout,
    /// A second termination request arrived while draining.
    Signal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    Stopped,
    Forced(ForceCause),
}

#[derive(Debug, Clone)]
pub struct ShutdownReport {
    pub outcome: ShutdownOutcome,
    pub signal_at: Instant,
    /// When the listener was told to stop; `None` if forced during the grace period.
    pub stop_initiated_at: Option<Instant>,
    pub finished_at: Instant,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.outcome == ShutdownOutcome::Stopped
    }

    /// Time between the signal and the listener stop.
    pub fn grace_elapsed(&self) -> Option<Duration> {
        self.stop_initiated_at
            .map(|at| at.duration_since(self.signal_at))
    }
}

/// Drives one shutdown sequence for one listener task.
pub struct Orchestrator {
    health: HealthState,
    policy: DrainPolicy,
    signal: ShutdownSignal,
    phase: watch::Sender<Phase>,
}

impl Orchestrator {
    pub fn new(health: HealthState, policy: DrainPolicy, signal: ShutdownSignal) -> Self {
        let (phase, _) = watch::channel(Phase::Running);
        Self {
            health,
            policy,
            signal,
            phase,
        }
    }

    /// Follow phase transitions.
    pub fn phase(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    /// Run the sequence. `listener` is the serving task and `stop` is the
    /// token it watches for graceful shutdown.
    pub async fn drive(
        self,
        mut listener: JoinHandle<io::Result<()>>,
        stop: CancellationToken,
    ) -> Result<ShutdownReport> {
        self.enter(Phase::Running);

        tokio::select! {
            _ = self.signal.requested() => {}
            joined = &mut listener => {
                return Err(match flatten(joined) {
                    Ok(()) => ZeroError::Internal("listener exited before shutdown was requested".into()),
                    Err(e) => e,
                });
            }
        }

        let signal_at = Instant::now();
        self.enter(Phase::SignalReceived);
        self.health.set_unhealthy();

        self.enter(Phase::Draining);
        info!(
            grace_ms = self.policy.grace_period.as_millis() as u64,
            "waiting for traffic to move away before closing the listener"
        );
        let forced = tokio::select! {
            _ = tokio::time::sleep(self.policy.grace_period) => false,
            _ = self.signal.forced() => true,
        };
        if forced {
            return Ok(self.force(listener, ForceCause::Signal, signal_at, None).await);
        }

        self.enter(Phase::Stopping);
        let stop_initiated_at = Instant::now();
        stop.cancel();
        info!(
            timeout_ms = self.policy.shutdown_timeout.as_millis() as u64,
            "listener closed; waiting for in-flight requests"
        );

        let waited = tokio::select! {
            res = tokio::time::timeout(self.policy.shutdown_timeout, &mut listener) => Some(res),
            _ = self.signal.forced() => None,
        };

        match waited {
            Some(Ok(joined)) => {
                if let Err(e) = flatten(joined) {
                    error!(error = %e, "listener failed while draining");
                    self.enter(Phase::Forced);
                    return Err(e);
                }
                self.enter(Phase::Stopped);
                info!("server gracefully stopped");
                Ok(ShutdownReport {
                    outcome: ShutdownOutcome::Stopped,
                    signal_at,
                    stop_initiated_at: Some(stop_initiated_at),
                    finished_at: Instant::now(),
                })
            }
            Some(Err(_elapsed)) => Ok(self.force(
                listener,
                ForceCause::Timeout,
                signal_at,
                Some(stop_initiated_at),
            )
            .await),
            None => Ok(self
                .force(listener, ForceCause::Signal, signal_at, Some(stop_initiated_at))
                .await),
        }
    }

    /// Abort the listener task and wait until it is gone, so no connection it
    /// owned outlives the returned report.
    async fn force(
        &self,
        listener: JoinHandle<io::Result<()>>,
        cause: ForceCause,
        signal_at: Instant,
        stop_initiated_at: Option<Instant>,
    ) -> ShutdownReport {
        listener.abort();
        let _ = listener.await;
        match cause {
            ForceCause::Timeout => error!(
                timeout_ms = self.policy.shutdown_timeout.as_millis() as u64,
                "shutdown timeout exceeded; terminating outstanding connections"
            ),
            ForceCause::Signal => warn!("repeated termination signal; terminating immediately"),
        }
        self.enter(Phase::Forced);
        ShutdownReport {
            outcome: ShutdownOutcome::Forced(cause),
            signal_at,
            stop_initiated_at,
            finished_at: Instant::now(),
        }
    }

    fn enter(&self, phase: Phase) {
        self.phase.send_replace(phase);
        info!(%phase, "shutdown phase");
    }
}

fn flatten(joined: std::result::Result<io::Result<()>, JoinError>) -> Result<()> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(ZeroError::Internal(format!("listener failed: {e}"))),
        Err(e) => Err(ZeroError::Internal(format!("listener task failed: {e}"))),
    }
}
