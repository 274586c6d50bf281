use crate::dom::{ElementSnapshot, PageQuery};
use crate::errors::{PilotError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::{self, Instant};

/// Default spacing between element re-queries.
pub const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// The theater control is the last part of the player chrome to render, so
/// it gets the long budget.
pub const PLAYER_CONTROL_TIMEOUT: Duration = Duration::from_secs(15);

/// The quality list renders with the player core; a shorter budget is enough.
pub const QUALITY_LIST_TIMEOUT: Duration = Duration::from_secs(5);

/// Re-evaluate `probe` every `interval` until it yields a value or `timeout`
/// elapses. `what` names the awaited condition in the timeout error.
///
/// The probe runs at least once, and read errors from it abort the wait
/// immediately rather than burning the remaining budget.
pub async fn until<T, F, Fut>(
    what: &str,
    timeout: Duration,
    interval: Duration,
    mut probe: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let started = Instant::now();
    loop {
        if let Some(value) = probe().await? {
            return Ok(value);
        }
        if started.elapsed() > timeout {
            return Err(PilotError::Timeout(what.to_string()));
        }
        time::sleep(interval).await;
    }
}

/// Wait until `selector` matches at least one element, returning the match.
pub async fn for_elements(
    page: &dyn PageQuery,
    selector: &str,
    timeout: Duration,
) -> Result<Vec<ElementSnapshot>> {
    until(selector, timeout, ELEMENT_POLL_INTERVAL, || async move {
        let matches = page.select(selector).await?;
        Ok(if matches.is_empty() { None } else { Some(matches) })
    })
    .await
}
