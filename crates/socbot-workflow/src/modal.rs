use crate::dom;
use crate::session::Session;
use crate::Result;
use socbot_browser::Locator;
use tracing::{debug, warn};

/// Outcome of one modal check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModalResult {
    pub found: bool,
    pub message: String,
}

impl ModalResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn found(message: impl Into<String>) -> Self {
        Self {
            found: true,
            message: message.into(),
        }
    }

    /// The dismissed modal's text, if one was found
    pub fn message(&self) -> Option<&str> {
        self.found.then_some(self.message.as_str())
    }
}

/// Look for the application's alert modal in the focused document and dismiss it.
///
/// Waits at most the configured modal timeout. Absence is the normal case, so this is safe to
/// call after any action that might raise an alert.
pub async fn check_and_handle_modal(session: &Session) -> Result<ModalResult> {
    let container = Locator::id(dom::MODAL);
    if !session.wait_for(&container, session.timings().modal).await? {
        return Ok(ModalResult::none());
    }

    let driver = session.driver();
    let ctx = session.context();
    if driver.is_displayed(&ctx, &container).await? == Some(false) {
        debug!("Modal container present but hidden");
        return Ok(ModalResult::none());
    }

    let message = driver
        .text(&ctx, &Locator::css(dom::MODAL_CONTENT))
        .await?
        .map(|text| text.trim().to_string())
        .unwrap_or_default();
    warn!("Modal detected: {}", message);

    if !driver.click(&ctx, &Locator::css(dom::MODAL_OK)).await? {
        warn!("Modal has no dismiss button");
    }
    Ok(ModalResult::found(message))
}
