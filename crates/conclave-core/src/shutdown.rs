//! Graceful shutdown
//!
//! Components take a [`CancellationToken`] from the controller and stop
//! pulling work once it fires. Long-running jobs hold a [`TaskGuard`] so
//! [`ShutdownController::shutdown`] can wait for them to drain.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Default drain timeout in seconds
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Shutdown phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ShutdownPhase {
    /// Normal operation
    Running = 0,
    /// Token cancelled, waiting for guarded tasks
    Draining = 1,
    /// Drain timed out
    Terminating = 2,
    /// Shutdown complete
    Terminated = 3,
}

impl std::fmt::Display for ShutdownPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "Running"),
            Self::Draining => write!(f, "Draining"),
            Self::Terminating => write!(f, "Terminating"),
            Self::Terminated => write!(f, "Terminated"),
        }
    }
}

/// Coordinates shutdown of the server and the execution dispatcher
pub struct ShutdownController {
    cancel_token: CancellationToken,
    phase: AtomicU8,
    shutdown_initiated: AtomicBool,
    active_tasks: AtomicU32,
    timeout: Duration,
}

impl ShutdownController {
    /// Controller with the default drain timeout
    #[must_use]
    pub fn new() -> Arc<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS))
    }

    /// Controller with a custom drain timeout
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            cancel_token: CancellationToken::new(),
            phase: AtomicU8::new(ShutdownPhase::Running as u8),
            shutdown_initiated: AtomicBool::new(false),
            active_tasks: AtomicU32::new(0),
            timeout,
        })
    }

    /// Child token for a component
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.cancel_token.child_token()
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> ShutdownPhase {
        match self.phase.load(Ordering::SeqCst) {
            0 => ShutdownPhase::Running,
            1 => ShutdownPhase::Draining,
            2 => ShutdownPhase::Terminating,
            _ => ShutdownPhase::Terminated,
        }
    }

    /// Whether shutdown has started
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_initiated.load(Ordering::SeqCst)
    }

    /// Track a running job until the guard drops
    pub fn register_task(self: &Arc<Self>) -> TaskGuard {
        self.active_tasks.fetch_add(1, Ordering::SeqCst);
        TaskGuard {
            controller: Arc::clone(self),
        }
    }

    /// Number of guarded jobs still running
    #[must_use]
    pub fn active_task_count(&self) -> u32 {
        self.active_tasks.load(Ordering::SeqCst)
    }

    fn set_phase(&self, phase: ShutdownPhase) {
        self.phase.store(phase as u8, Ordering::SeqCst);
        info!(phase = %phase, "Shutdown phase changed");
    }

    /// Cancel every token, then wait for guarded jobs up to the timeout
    pub async fn shutdown(&self) {
        if self
            .shutdown_initiated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Shutdown already initiated");
            return;
        }

        self.set_phase(ShutdownPhase::Draining);
        self.cancel_token.cancel();

        let drained = tokio::time::timeout(self.timeout, async {
            while self.active_task_count() > 0 {
                debug!(active_tasks = self.active_task_count(), "Waiting for tasks to drain");
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        })
        .await;

        if drained.is_err() {
            warn!(
                active_tasks = self.active_task_count(),
                timeout_secs = self.timeout.as_secs(),
                "Shutdown timeout exceeded, abandoning remaining tasks"
            );
            self.set_phase(ShutdownPhase::Terminating);
        }
        self.set_phase(ShutdownPhase::Terminated);
    }
}

/// Decrements the active task count on drop
pub struct TaskGuard {
    controller: Arc<ShutdownController>,
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.controller.active_tasks.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Resolve on Ctrl+C or SIGTERM
pub async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
