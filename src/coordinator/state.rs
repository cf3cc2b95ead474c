use thiserror::Error;

/// Phases of one `Packager::start` call.
///
/// The launch decision and the readiness poll run as separate tasks, so
/// each tracks its own walk from `Idle`: the launch task through
/// `ProbingInitial` to `Launching`/`SkipLaunch`, the poll task through
/// `Polling` to `Ready`/`TimedOut`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackagerState {
    Idle,
    ProbingInitial,
    Launching,
    SkipLaunch,
    Polling,
    Ready,
    TimedOut,
}

impl PackagerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::TimedOut)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TransitionError {
    #[error("invalid transition: {0:?} -> {1:?}")]
    InvalidTransition(PackagerState, PackagerState),
}

#[derive(Debug)]
pub struct StateMachine {
    label: &'static str,
    state: PackagerState,
}

impl StateMachine {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            state: PackagerState::Idle,
        }
    }

    pub fn state(&self) -> PackagerState {
        self.state
    }

    pub fn can_transition(&self, to: PackagerState) -> bool {
        use PackagerState::*;
        matches!(
            (self.state, to),
            (Idle, ProbingInitial)
                | (ProbingInitial, Launching)
                | (ProbingInitial, SkipLaunch)
                | (Launching, Polling)
                | (SkipLaunch, Polling)
                | (Idle, Polling)
                | (Polling, Ready)
                | (Polling, TimedOut)
        )
    }

    pub fn transition(&mut self, to: PackagerState) -> Result<(), TransitionError> {
        if self.can_transition(to) {
            tracing::info!("[Packager:{}] State transition: {:?} -> {:?}", self.label, self.state, to);
            self.state = to;
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition(self.state, to))
        }
    }

    /// Transition, logging instead of failing on an invalid edge. Used on
    /// paths where a bad edge is a bug worth seeing but not worth aborting a
    /// start for.
    pub fn advance(&mut self, to: PackagerState) {
        if let Err(e) = self.transition(to) {
            tracing::warn!("[Packager:{}] {}", self.label, e);
        }
    }
}
