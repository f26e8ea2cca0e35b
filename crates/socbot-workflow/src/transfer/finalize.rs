use super::PhaseOutcome;
use crate::dom;
use crate::modal::check_and_handle_modal;
use crate::navigator::{current_screen_info, go_to_main_screen};
use crate::session::Session;
use crate::Result;
use socbot_browser::Locator;
use tracing::{debug, info, warn};

const DIALOG_POLLS: u32 = 3;

/// Save the transfer and work out whether it went through.
///
/// The application gives no reliable confirmation, so the transfer counts as done when the
/// final screen is a known one, when any confirmation surfaced, or failing both, regardless.
pub(super) async fn run(session: &mut Session) -> Result<PhaseOutcome> {
    session.ensure_context().await;

    info!("Saving transfer");
    session.run_action("save").await?;

    let dialog_seen = accept_confirmation(session).await?;
    let transfer_modal_seen = handle_transfer_modals(session).await;

    let mut modal_seen = false;
    if let Some(message) = check_and_handle_modal(session).await?.message() {
        info!("Modal after saving: {}", message);
        modal_seen = true;
    }

    match return_home(session).await {
        Ok(found) => modal_seen |= found,
        Err(e) => warn!("Could not return to the main screen: {}", e),
    }

    let transfer_screen = session.options().transfer_screen.clone();
    match current_screen_info(session).await {
        Ok(screen) => {
            info!("Final screen: {}", screen.program);
            if is_expected_final_screen(&screen.program, &transfer_screen) {
                info!("Transfer completed");
                return Ok(PhaseOutcome::Success);
            }
        }
        Err(e) => warn!("Could not read the final screen: {}", e),
    }

    if dialog_seen || transfer_modal_seen || modal_seen {
        info!("Transfer completed (confirmation seen)");
    } else {
        warn!("No confirmation seen after saving; assuming the transfer completed");
    }
    Ok(PhaseOutcome::Success)
}

fn is_expected_final_screen(program: &str, transfer_screen: &str) -> bool {
    program.contains(transfer_screen)
        || program.contains(dom::EMPLOYEE_SCREEN_LABEL)
        || program.contains(dom::HOME_SCREEN_LABEL)
}

/// Accept the native confirmation raised by saving, if it shows up
async fn accept_confirmation(session: &Session) -> Result<bool> {
    let timings = session.timings();
    session.settle(timings.action_settle).await;

    for poll in 1..=DIALOG_POLLS {
        if let Some(message) = session.driver().accept_dialog(session.window()).await? {
            info!("Confirmation accepted: {}", message);
            session.settle(timings.action_settle).await;
            return Ok(true);
        }
        debug!("No confirmation dialog yet ({}/{})", poll, DIALOG_POLLS);
        session.settle(timings.dialog_interval).await;
    }
    debug!("No confirmation dialog appeared");
    Ok(false)
}

/// Dismiss the first visible transfer-result modal; failures only logged
async fn handle_transfer_modals(session: &Session) -> bool {
    match find_transfer_modal(session).await {
        Ok(seen) => seen,
        Err(e) => {
            warn!("Error checking transfer modals: {}", e);
            false
        }
    }
}

async fn find_transfer_modal(session: &Session) -> Result<bool> {
    let driver = session.driver();
    let ctx = session.context();

    for modal in dom::TRANSFER_MODALS {
        if driver.is_displayed(&ctx, &Locator::id(modal)).await? != Some(true) {
            continue;
        }

        match transfer_modal_message(session, modal).await? {
            Some(message) => info!("Transfer modal '{}': {}", modal, message),
            None => warn!("Transfer modal '{}' has no readable message", modal),
        }

        let dismissed = if modal == dom::TRANSFER_ERROR_MODAL {
            session.dispatch(dom::CLOSE_TRANSFER_ERROR_SCRIPT).await?;
            true
        } else {
            let button = Locator::css(format!("#{} {}", modal, dom::TRANSFER_MODAL_OK));
            driver.click(&ctx, &button).await?
        };
        if !dismissed {
            warn!("Could not dismiss transfer modal '{}'", modal);
        }
        session.settle(session.timings().dialog_interval).await;
        return Ok(true);
    }
    Ok(false)
}

async fn transfer_modal_message(session: &Session, modal: &str) -> Result<Option<String>> {
    let driver = session.driver();
    let ctx = session.context();
    for part in [dom::TRANSFER_MODAL_MESSAGE, dom::TRANSFER_MODAL_MESSAGE_ALT] {
        let locator = Locator::css(format!("#{} {}", modal, part));
        if let Some(text) = driver.text(&ctx, &locator).await? {
            let text = text.trim();
            if !text.is_empty() {
                return Ok(Some(text.to_string()));
            }
        }
    }
    Ok(None)
}

/// Back to the home screen; reports whether a modal had to be dismissed there
async fn return_home(session: &mut Session) -> Result<bool> {
    go_to_main_screen(session).await?;
    let modal = check_and_handle_modal(session).await?;
    if let Some(message) = modal.message() {
        info!("Modal on the main screen: {}", message);
    }
    Ok(modal.found)
}
