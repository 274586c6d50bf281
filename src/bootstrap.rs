use crate::config::PilotConfig;
use crate::dom::{DocumentState, PageHost, PageQuery};
use crate::orchestrator::{Orchestrator, RunOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tracing::{debug, info};

/// Spacing between checks for the page's query runtime. This wait has no
/// timeout: nothing can be driven without the runtime, so there is nothing
/// sensible to fall back to.
pub const ENGINE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Extra quiet period after the document reports itself loaded.
pub const STARTUP_SETTLE: Duration = Duration::from_secs(1);

/// Wait out the page's own startup, then seed the orchestrator exactly
/// once. Returns the orchestrator so callers can inspect the final
/// [`crate::orchestrator::RunState`].
pub async fn start(host: &dyn PageHost, config: PilotConfig) -> (Orchestrator, RunOutcome) {
    let engine = wait_for_query_engine(host).await;

    if host.document_state().await == DocumentState::Loading {
        debug!("document still loading");
        while host.document_state().await == DocumentState::Loading {
            time::sleep(ENGINE_POLL_INTERVAL).await;
        }
    }
    time::sleep(STARTUP_SETTLE).await;

    info!("page ready, starting player setup");
    let orchestrator = Orchestrator::new(engine, config);
    let outcome = orchestrator.run().await;
    (orchestrator, outcome)
}

async fn wait_for_query_engine(host: &dyn PageHost) -> Arc<dyn PageQuery> {
    loop {
        if let Some(engine) = host.query_engine().await {
            return engine;
        }
        time::sleep(ENGINE_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedPage;

    #[tokio::test(start_paused = true)]
    async fn waits_for_the_engine_and_document_before_running() {
        let page = ScriptedPage::new()
            .with_quality("蓝光8M", 0)
            .with_quality("高清", 0)
            .with_current_quality("高清")
            .with_engine_delay(3)
            .with_document_loading(2);

        let (orchestrator, outcome) = start(&page, PilotConfig::default()).await;

        assert_eq!(outcome, RunOutcome::Succeeded);
        assert!(orchestrator.state().await.initialized);
        assert_eq!(page.current_quality(), "蓝光8M");
    }

    #[tokio::test(start_paused = true)]
    async fn already_loaded_documents_skip_the_readiness_gate() {
        let page = ScriptedPage::new()
            .with_quality("蓝光8M", 0)
            .with_current_quality("蓝光8M");

        let (_, outcome) = start(&page, PilotConfig::default()).await;

        assert_eq!(outcome, RunOutcome::Succeeded);
        // The engine was handed out on the first probe.
        assert_eq!(page.engine_probes(), 1);
    }
}
