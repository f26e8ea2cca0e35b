use super::PhaseOutcome;
use crate::navigator::{change_company, navigate_to_screen_by_number};
use crate::session::Session;
use crate::Result;
use socbot_core::TransferRequest;
use tracing::{debug, error, info};

/// Switch to the source company if needed and open the transfer screen
pub(super) async fn run(session: &mut Session, request: &TransferRequest) -> Result<PhaseOutcome> {
    if let Some(source) = request.source() {
        if session.company() == Some(source) {
            debug!("Already working in company {}", source);
        } else {
            change_company(session, source).await?;
        }
    }

    let screen = session.options().transfer_screen.clone();
    if !navigate_to_screen_by_number(session, &screen).await? {
        error!("Could not open transfer screen {}", screen);
        return Ok(PhaseOutcome::Failure);
    }

    session.enter_content_frame().await?;
    info!("Transfer screen {} ready", screen);
    Ok(PhaseOutcome::Success)
}
