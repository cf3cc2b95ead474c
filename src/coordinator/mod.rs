//! Packager start coordination.
//!
//! `Packager::start` does two things that are deliberately not ordered:
//!
//! 1. A detached launch task probes once and, if the packager is not
//!    running, spawns `<command> start <extra params>`. Nobody awaits it.
//! 2. The caller's task polls `/status` under the retry policy until the
//!    packager reports running or the attempt budget is spent.
//!
//! The poll may start, and even succeed, before the launch task has
//! decided anything. Each poll re-checks readiness on its own, so the
//! launch only serves to bring up a packager that was not there.

pub mod state;

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::PackagerConfig;
use crate::error::PackagerError;
use crate::launcher::{DetachedLauncher, LaunchConfig, LaunchOutcome, ProcessLauncher};
use crate::probe::{PackagerStatus, StatusProbe};
use crate::retry::retry_async;

use self::state::{PackagerState, StateMachine};

/// What the launch task ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchDecision {
    /// Initial probe said running; nothing was spawned.
    AlreadyRunning,
    Attempted(LaunchOutcome),
}

pub struct Packager<S = StatusProbe, L = DetachedLauncher> {
    config: PackagerConfig,
    status: Arc<S>,
    launcher: Arc<L>,
}

impl Packager {
    /// HTTP probe + detached process launcher for the given configuration.
    pub fn new(config: PackagerConfig) -> Result<Self, PackagerError> {
        config.validate()?;
        let status = StatusProbe::new(&config.endpoint)?;
        Ok(Self::with_parts(config, status, DetachedLauncher::new()))
    }
}

impl<S, L> Packager<S, L>
where
    S: PackagerStatus + 'static,
    L: ProcessLauncher + 'static,
{
    pub fn with_parts(config: PackagerConfig, status: S, launcher: L) -> Self {
        Self::from_shared(config, Arc::new(status), Arc::new(launcher))
    }

    pub fn from_shared(config: PackagerConfig, status: Arc<S>, launcher: Arc<L>) -> Self {
        Self {
            config,
            status,
            launcher,
        }
    }

    pub fn config(&self) -> &PackagerConfig {
        &self.config
    }

    /// Single probe of the status endpoint.
    pub async fn is_running(&self) -> bool {
        self.status.probe().await
    }

    /// Make sure the packager is up and wait until it answers `/status`.
    ///
    /// Succeeds the same way whether the packager was already running, was
    /// launched here, or came up despite a failed launch. The only error is
    /// [`PackagerError::ReadinessTimeout`].
    pub async fn start(&self) -> Result<(), PackagerError> {
        // fire-and-forget: dropping the handle detaches the task
        let _launch = self.spawn_launch_decision();

        self.await_start().await?;
        tracing::info!("[Packager] Packager started.");
        Ok(())
    }

    /// Spawn the probe-then-maybe-launch task. The handle is only useful to
    /// callers that want to observe the decision; `start` drops it.
    pub fn spawn_launch_decision(&self) -> JoinHandle<LaunchDecision> {
        let status = Arc::clone(&self.status);
        let launcher = Arc::clone(&self.launcher);
        let launch = LaunchConfig::for_packager(&self.config);
        tokio::spawn(async move { decide_and_launch(status.as_ref(), launcher.as_ref(), &launch).await })
    }

    /// Poll until the packager reports running or the retry budget runs out.
    pub async fn await_start(&self) -> Result<(), PackagerError> {
        let mut sm = StateMachine::new("poll");
        sm.advance(PackagerState::Polling);

        let policy = self.config.retry_policy();
        let status: &S = self.status.as_ref();
        tracing::debug!(
            "[Packager] Waiting for {} ({} attempts, {:?} apart)",
            self.config.status_url(),
            policy.max_attempts,
            policy.delay
        );

        match retry_async(move || status.probe(), |running| *running, &policy).await {
            Ok(_) => {
                sm.advance(PackagerState::Ready);
                Ok(())
            }
            Err(e) => {
                sm.advance(PackagerState::TimedOut);
                tracing::error!("[Packager] {}", e);
                Err(e.into())
            }
        }
    }
}

async fn decide_and_launch<S, L>(status: &S, launcher: &L, launch: &LaunchConfig) -> LaunchDecision
where
    S: PackagerStatus + ?Sized,
    L: ProcessLauncher + ?Sized,
{
    let mut sm = StateMachine::new("launch");
    sm.advance(PackagerState::ProbingInitial);

    if status.probe().await {
        sm.advance(PackagerState::SkipLaunch);
        tracing::debug!("[Packager] Already running, skipping launch");
        return LaunchDecision::AlreadyRunning;
    }

    sm.advance(PackagerState::Launching);
    tracing::info!(
        "[Packager] Starting packager: {} (cwd {})",
        launch.command_line(),
        launch.working_directory.display()
    );

    let outcome = LaunchOutcome::from(launcher.spawn_detached(launch).await);
    if let LaunchOutcome::LaunchFailed(reason) = &outcome {
        // 실패해도 폴링은 계속됨 — 다른 경로로 packager가 뜰 수 있음
        tracing::warn!("[Packager] Launch failed, still waiting for readiness: {}", reason);
    }
    LaunchDecision::Attempted(outcome)
}
