use super::controls::{CheckboxChange, set_checkbox};
use super::PhaseOutcome;
use crate::dom;
use crate::modal::check_and_handle_modal;
use crate::session::Session;
use crate::Result;
use socbot_browser::Locator;
use socbot_core::TransferRequest;
use tracing::{debug, info, warn};

const EDIT_ATTEMPTS: u32 = 3;

/// Put the transfer screen in edit mode and set the copy options
pub(super) async fn run(session: &mut Session, request: &TransferRequest) -> Result<PhaseOutcome> {
    session.ensure_context().await;

    let mut editable = false;
    for attempt in 1..=EDIT_ATTEMPTS {
        match enter_edit_mode(session, attempt).await {
            Ok(true) => {
                info!("Edit mode enabled");
                editable = true;
                break;
            }
            Ok(false) => {
                warn!("Edit mode not confirmed on attempt {}", attempt);
                let file_name = format!(
                    "transfer_edit_{}_{}.png",
                    chrono::Utc::now().timestamp(),
                    attempt
                );
                session.screenshot(&file_name).await;
            }
            Err(e) => {
                warn!("Edit mode attempt {} failed: {}", attempt, e);
                session.settle(session.timings().action_settle).await;
            }
        }
    }
    if !editable {
        warn!(
            "Edit mode not confirmed after {} attempts; setting options anyway",
            EDIT_ATTEMPTS
        );
    }

    for (id, desired) in request.copy_options() {
        match set_checkbox(session, &Locator::id(id), desired).await {
            Ok(CheckboxChange::Missing) => warn!("Checkbox '{}' not found", id),
            Ok(CheckboxChange::Toggled) => debug!("Checkbox '{}' set to {}", id, desired),
            Ok(CheckboxChange::Unchanged) => {}
            Err(e) => warn!("Could not set checkbox '{}': {}", id, e),
        }
    }

    match session.dispatch(dom::ASSOCIATE_ALL_SCRIPT).await {
        Ok(()) => {
            session.settle(session.timings().action_settle).await;
            debug!("Associated all records");
        }
        Err(e) => warn!("Could not associate all records: {}", e),
    }

    info!("Transfer options configured");
    Ok(PhaseOutcome::Success)
}

async fn enter_edit_mode(session: &Session, attempt: u32) -> Result<bool> {
    info!("Entering edit mode (attempt {}/{})", attempt, EDIT_ATTEMPTS);
    session.run_action("alt").await?;

    let checkbox = Locator::id(dom::COPY_CLINICAL_RECORD);
    if session.wait_for(&checkbox, session.timings().edit_mode).await? {
        return Ok(true);
    }

    // An alert may be covering the form
    if let Some(message) = check_and_handle_modal(session).await?.message() {
        info!("Modal while entering edit mode: {}", message);
        return session.exists(&checkbox).await;
    }
    Ok(false)
}
