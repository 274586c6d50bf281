use crate::config::PilotConfig;
use crate::dom::PageQuery;
use crate::errors::Result;
use crate::player::{self, quality, restriction, theater};
use crate::wait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time;
use tracing::{error, info, warn};

/// Pause before touching the player, letting the page settle after load.
pub const SEQUENCE_SETTLE: Duration = Duration::from_secs(2);

/// Counters for one page lifetime.
///
/// `execution_started` keeps overlapping runs out; it is released only when
/// a pass fails, so a success pins the machine in its terminal state.
/// `retry_count` is monotone and ceilinged by the configured budget.
#[derive(Debug, Default, Clone)]
pub struct RunState {
    pub initialized: bool,
    pub execution_started: bool,
    pub retry_count: u32,
}

/// Where a call to [`Orchestrator::run`] left the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The whole sequence went through; the machine is finished for this page.
    Succeeded,
    /// Another run is in flight; this call did nothing.
    AlreadyRunning,
    /// Every attempt failed and the retry budget is spent.
    GaveUp,
}

/// Drives the adjustment sequence against one page, whole-sequence retries
/// included. All shared state lives in [`RunState`] behind its lock; the
/// steps themselves run strictly one after another.
pub struct Orchestrator {
    page: Arc<dyn PageQuery>,
    config: PilotConfig,
    run_id: String,
    state: RwLock<RunState>,
}

impl Orchestrator {
    pub fn new(page: Arc<dyn PageQuery>, config: PilotConfig) -> Self {
        Self {
            page,
            config,
            run_id: uuid::Uuid::new_v4().to_string(),
            state: RwLock::new(RunState::default()),
        }
    }

    pub async fn state(&self) -> RunState {
        self.state.read().await.clone()
    }

    /// Run the whole adjustment sequence, restarting complete passes until
    /// one succeeds or the retry budget runs out. Calls made while a pass
    /// is in flight are no-ops.
    pub async fn run(&self) -> RunOutcome {
        loop {
            {
                let mut state = self.state.write().await;
                if state.execution_started {
                    return RunOutcome::AlreadyRunning;
                }
                state.execution_started = true;
            }

            match self.run_sequence().await {
                Ok(()) => {
                    let mut state = self.state.write().await;
                    state.initialized = true;
                    info!(run_id = %self.run_id, "player adjustments complete");
                    return RunOutcome::Succeeded;
                }
                Err(err) => {
                    error!(run_id = %self.run_id, error = %err, "player setup pass failed");
                    let mut state = self.state.write().await;
                    state.execution_started = false;
                    if state.retry_count >= self.config.retry_times {
                        return RunOutcome::GaveUp;
                    }
                    state.retry_count += 1;
                    let attempt = state.retry_count;
                    drop(state);
                    warn!(run_id = %self.run_id, attempt, "retrying player setup");
                    time::sleep(self.config.retry_delay()).await;
                }
            }
        }
    }

    /// One full pass. The first failing step aborts the rest.
    async fn run_sequence(&self) -> Result<()> {
        time::sleep(SEQUENCE_SETTLE).await;

        let page = self.page.as_ref();
        wait::for_elements(page, player::THEATER_BUTTON, wait::PLAYER_CONTROL_TIMEOUT).await?;
        wait::for_elements(page, player::QUALITY_LIST, wait::QUALITY_LIST_TIMEOUT).await?;

        restriction::unlock_qualities(page).await?;

        if !quality::switch_quality(page, &self.config).await? {
            warn!(run_id = %self.run_id, "continuing with unconfirmed quality");
        }
        time::sleep(self.config.quality_switch_delay()).await;

        theater::enter_theater_mode(page).await
    }
}
