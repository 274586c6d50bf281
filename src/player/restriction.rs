use crate::dom::PageQuery;
use crate::errors::{PilotError, Result};
use serde_json::Value;
use tracing::debug;

/// Attached-data key the player stores per-entry metadata under.
pub const DATA_KEY: &str = "data";

/// `status` value the player treats as freely selectable.
pub const STATUS_UNLOCKED: i64 = 0;

/// Clear the gating flag on every quality entry so all of them become
/// selectable. Safe to run repeatedly; entries already unlocked are left
/// untouched. The host page reads the flag lazily on the next selection,
/// so no re-render is triggered here.
pub async fn unlock_qualities(page: &dyn PageQuery) -> Result<bool> {
    let entries = page.select(super::QUALITY_LIST).await?;
    if entries.is_empty() {
        return Err(PilotError::ElementNotFound(super::QUALITY_LIST.to_string()));
    }

    let mut unlocked = 0usize;
    for entry in &entries {
        let Some(mut data) = page.read_data(&entry.element, DATA_KEY).await? else {
            continue;
        };
        let changed = match data.as_object_mut() {
            Some(bag) if bag.get("status").and_then(Value::as_i64) != Some(STATUS_UNLOCKED) => {
                bag.insert("status".to_string(), Value::from(STATUS_UNLOCKED));
                true
            }
            _ => false,
        };
        if changed {
            page.write_data(&entry.element, DATA_KEY, data).await?;
            unlocked += 1;
        }
    }

    if unlocked > 0 {
        debug!(unlocked, "cleared quality restrictions");
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedPage;

    #[tokio::test]
    async fn clears_flags_and_stays_idempotent() {
        let page = ScriptedPage::new()
            .with_quality("蓝光8M", 2)
            .with_quality("超清", 1)
            .with_quality("高清", 0);

        assert!(unlock_qualities(&page).await.unwrap());
        assert_eq!(page.quality_status("蓝光8M"), Some(0));
        assert_eq!(page.quality_status("超清"), Some(0));
        let writes_after_first = page.data_writes();
        assert_eq!(writes_after_first, 2);

        // Second pass finds nothing left to change.
        assert!(unlock_qualities(&page).await.unwrap());
        assert_eq!(page.data_writes(), writes_after_first);
    }

    #[tokio::test]
    async fn entries_without_a_data_bag_are_skipped() {
        let page = ScriptedPage::new()
            .with_plain_quality("蓝光8M")
            .with_quality("超清", 2);

        assert!(unlock_qualities(&page).await.unwrap());
        assert_eq!(page.quality_status("蓝光8M"), None);
        assert_eq!(page.quality_status("超清"), Some(0));
    }

    #[tokio::test]
    async fn empty_list_is_a_hard_error() {
        let page = ScriptedPage::new();
        let result = unlock_qualities(&page).await;
        assert!(matches!(result, Err(PilotError::ElementNotFound(_))));
    }
}
