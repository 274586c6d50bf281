use crate::dom::PageQuery;
use crate::errors::{PilotError, Result};
use tracing::debug;

/// Enlarge the player unless the page is already in the wide layout. The
/// host applies the layout synchronously, so there is nothing to poll
/// afterwards.
pub async fn enter_theater_mode(page: &dyn PageQuery) -> Result<()> {
    let buttons = page.select(super::THEATER_BUTTON).await?;
    let Some(button) = buttons.first() else {
        return Err(PilotError::ElementNotFound(
            super::THEATER_BUTTON.to_string(),
        ));
    };

    if button.has_class(super::NARROW_PAGE_CLASS) {
        debug!("theater mode already active");
        return Ok(());
    }
    page.click(&button.element).await
}
