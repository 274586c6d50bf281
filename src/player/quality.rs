use crate::config::PilotConfig;
use crate::dom::{ElementSnapshot, PageQuery};
use crate::errors::{PilotError, Result};
use crate::wait;
use std::time::Duration;
use tracing::{debug, warn};

/// Poll spacing while watching the active-quality label flip over. Tighter
/// than the element waits because the label changes fast once it changes.
pub const CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// How long a triggered switch may take before it is given up on.
pub const CONFIRM_TIMEOUT: Duration = Duration::from_secs(5);

/// Whether a configured label actually names a quality. Templated config
/// values can collapse to sentinel strings; none of them count.
pub fn is_valid_target(target: &str) -> bool {
    !matches!(target, "null" | "undefined" | "false") && !target.trim().is_empty()
}

/// Pick and activate a quality.
///
/// The configured label wins when the list offers it; otherwise the first
/// (best) entry is taken, with a warning when a configured label went
/// unmatched. No click fires when the chosen quality is already playing.
/// `Ok(false)` means the click fired but the player never reported the new
/// quality within [`CONFIRM_TIMEOUT`]; callers treat that as
/// success-with-warning, not as a failure of the run.
pub async fn switch_quality(page: &dyn PageQuery, config: &PilotConfig) -> Result<bool> {
    let entries = page.select(super::QUALITY_LIST).await?;
    if entries.is_empty() {
        return Err(PilotError::ElementNotFound(super::QUALITY_LIST.to_string()));
    }
    let current = page.select(super::CURRENT_QUALITY).await?;
    let Some(current) = current.first() else {
        return Err(PilotError::ElementNotFound(
            super::CURRENT_QUALITY.to_string(),
        ));
    };
    let current_label = current.text_trimmed().to_string();

    let mut chosen: Option<&ElementSnapshot> = None;
    if is_valid_target(&config.target_quality) {
        match entries
            .iter()
            .find(|e| e.text_trimmed() == config.target_quality)
        {
            Some(_) if current_label == config.target_quality => return Ok(true),
            Some(entry) => chosen = Some(entry),
            None => warn!(
                quality = %config.target_quality,
                "configured quality not offered, taking best available"
            ),
        }
    }

    let entry = match chosen {
        Some(entry) => entry,
        None => {
            let first = &entries[0];
            if current_label == first.text_trimmed() {
                return Ok(true);
            }
            first
        }
    };

    let target_label = entry.text_trimmed().to_string();
    page.click(&entry.element).await?;
    debug!(quality = %target_label, "selection triggered");

    confirm_switch(page, &target_label).await
}

/// Poll the active-quality indicator until it shows `target`.
async fn confirm_switch(page: &dyn PageQuery, target: &str) -> Result<bool> {
    let confirmed = wait::until(
        "quality confirmation",
        CONFIRM_TIMEOUT,
        CONFIRM_POLL_INTERVAL,
        || async move {
            let current = page.select(super::CURRENT_QUALITY).await?;
            let matched = current.first().is_some_and(|c| c.text_trimmed() == target);
            Ok(matched.then_some(()))
        },
    )
    .await;

    match confirmed {
        Ok(()) => Ok(true),
        Err(PilotError::Timeout(_)) => {
            warn!(quality = %target, "switch triggered but never confirmed");
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedPage;

    fn config_for(target: &str) -> PilotConfig {
        PilotConfig {
            target_quality: target.to_string(),
            ..PilotConfig::default()
        }
    }

    #[test]
    fn sentinel_labels_are_not_valid_targets() {
        for target in ["", "null", "undefined", "false", "   "] {
            assert!(!is_valid_target(target), "{target:?} accepted");
        }
        assert!(is_valid_target("蓝光8M"));
        assert!(is_valid_target("1080P"));
    }

    #[tokio::test(start_paused = true)]
    async fn switches_to_the_configured_quality() {
        let page = ScriptedPage::new()
            .with_quality("蓝光8M", 0)
            .with_quality("超清", 0)
            .with_quality("高清", 0)
            .with_current_quality("高清");

        let switched = switch_quality(&page, &config_for("蓝光8M")).await.unwrap();

        assert!(switched);
        assert_eq!(page.clicked_labels(), vec!["蓝光8M"]);
        assert_eq!(page.current_quality(), "蓝光8M");
    }

    #[tokio::test(start_paused = true)]
    async fn already_active_target_needs_no_click_or_confirmation() {
        let page = ScriptedPage::new()
            .with_quality("蓝光8M", 0)
            .with_quality("高清", 0)
            .with_current_quality("蓝光8M");

        let switched = switch_quality(&page, &config_for("蓝光8M")).await.unwrap();

        assert!(switched);
        assert!(page.clicked_labels().is_empty());
        // One read to learn the current quality, no confirmation polling.
        assert_eq!(page.select_count(crate::player::CURRENT_QUALITY), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_targets_fall_back_to_the_first_entry() {
        for target in ["", "null", "undefined", "false", "   "] {
            let page = ScriptedPage::new()
                .with_quality("蓝光8M", 0)
                .with_quality("高清", 0)
                .with_current_quality("高清");

            let switched = switch_quality(&page, &config_for(target)).await.unwrap();

            assert!(switched, "target {target:?}");
            assert_eq!(page.clicked_labels(), vec!["蓝光8M"], "target {target:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_target_falls_back_to_the_first_entry() {
        let page = ScriptedPage::new()
            .with_quality("蓝光8M", 0)
            .with_quality("高清", 0)
            .with_current_quality("高清");

        let switched = switch_quality(&page, &config_for("1080P60")).await.unwrap();

        assert!(switched);
        assert_eq!(page.clicked_labels(), vec!["蓝光8M"]);
    }

    #[tokio::test(start_paused = true)]
    async fn first_entry_already_active_is_a_no_op() {
        let page = ScriptedPage::new()
            .with_quality("蓝光8M", 0)
            .with_quality("高清", 0)
            .with_current_quality("蓝光8M");

        let switched = switch_quality(&page, &config_for("")).await.unwrap();

        assert!(switched);
        assert!(page.clicked_labels().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unconfirmed_switch_is_a_soft_failure() {
        let page = ScriptedPage::new()
            .with_quality("蓝光8M", 0)
            .with_quality("高清", 0)
            .with_current_quality("高清")
            .with_unconfirmable_switch();

        let switched = switch_quality(&page, &config_for("蓝光8M")).await.unwrap();

        assert!(!switched);
        assert_eq!(page.clicked_labels(), vec!["蓝光8M"]);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_list_or_indicator_is_a_hard_error() {
        let no_list = ScriptedPage::new().with_current_quality("高清");
        assert!(matches!(
            switch_quality(&no_list, &config_for("蓝光8M")).await,
            Err(PilotError::ElementNotFound(_))
        ));

        let no_indicator = ScriptedPage::new()
            .with_quality("蓝光8M", 0)
            .without_current_indicator();
        assert!(matches!(
            switch_quality(&no_indicator, &config_for("蓝光8M")).await,
            Err(PilotError::ElementNotFound(_))
        ));
    }
}
