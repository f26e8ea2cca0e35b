use super::controls::inline_script;
use super::PhaseOutcome;
use crate::dom;
use crate::session::Session;
use crate::{Error, Result};
use socbot_browser::{Locator, WindowHandle};
use socbot_core::TransferRequest;
use tracing::{debug, error, info, warn};

/// Set the destination company and, when possible, the matching destination employee
pub(super) async fn run(session: &mut Session, request: &TransferRequest) -> Result<PhaseOutcome> {
    let Some(company) = request.destination() else {
        error!("Destination company is required");
        return Ok(PhaseOutcome::Failure);
    };

    session.ensure_context().await;

    if !set_destination_company(session, company).await? {
        return Ok(PhaseOutcome::Failure);
    }

    match select_destination_employee(session, request).await {
        Ok(true) => {}
        Ok(false) => info!("Continuing without a destination employee"),
        Err(e) => {
            warn!("Destination employee selection failed: {}", e);
            info!("Continuing without a destination employee");
            session.ensure_context().await;
        }
    }
    Ok(PhaseOutcome::Success)
}

async fn set_destination_company(session: &Session, company: &str) -> Result<bool> {
    let field = Locator::id(dom::DESTINATION_COMPANY);
    if !session.wait_for(&field, session.timings().element).await? {
        error!("Destination company field not found");
        return Ok(false);
    }

    let driver = session.driver();
    driver.set_value(&session.context(), &field, company).await?;
    session.dispatch(dom::DESTINATION_UPDATE_SCRIPT).await?;
    session.settle(session.timings().action_settle).await;
    info!("Destination company set to {}", company);
    Ok(true)
}

/// Pick the destination employee in the zoom popup.
///
/// Returns `false` when no popup opened or nothing matched. Focus is back on the original
/// window's content frame whenever this returns `Ok`.
async fn select_destination_employee(
    session: &mut Session,
    request: &TransferRequest,
) -> Result<bool> {
    let origin = session.window().clone();
    let before = session.driver().window_handles().await?;
    debug!("{} window(s) open before the popup", before.len());

    info!("Opening destination employee selection");
    session.dispatch(dom::ZOOM_SCRIPT).await?;

    let driver = session.driver();
    let opened = session
        .wait(session.timings().popup)
        .until(|| {
            let before = &before;
            async move { Ok::<_, Error>(driver.window_handles().await?.len() > before.len()) }
        })
        .await?;
    if !opened {
        warn!("No selection window opened");
        return Ok(false);
    }

    let handles = driver.window_handles().await?;
    let Some(popup) = handles.into_iter().find(|handle| !before.contains(handle)) else {
        warn!("Selection window could not be identified");
        return Ok(false);
    };

    session.switch_to_window(popup.clone());
    info!("Switched to selection window {}", popup);

    let picked = pick_in_popup(session, &popup, request).await;

    if session.driver().window_handles().await?.contains(&popup) {
        debug!("Closing selection window {}", popup);
        session.driver().close_window(&popup).await?;
    }
    session.switch_to_window(origin);
    session.enter_content_frame().await?;
    debug!("Back on the transfer screen");

    picked
}

async fn pick_in_popup(
    session: &Session,
    popup: &WindowHandle,
    request: &TransferRequest,
) -> Result<bool> {
    let driver = session.driver();
    let ctx = session.context();

    if !driver
        .type_text(&ctx, &Locator::name(dom::SEARCH_FIELD), &request.search_term)
        .await?
    {
        warn!("Search field not found in selection window");
        return Ok(false);
    }

    if let Some(radio) = request.search_kind.popup_radio_id() {
        let radio = Locator::id(radio);
        match driver.is_checked(&ctx, &radio).await? {
            Some(true) => {}
            Some(false) => {
                driver.click(&ctx, &radio).await?;
            }
            None => warn!("Search option {} not found in selection window", radio),
        }
    } else {
        debug!("No selection-window option for {}; using its default", request.search_kind);
    }

    session.run_action("browse").await?;

    let links = Locator::css(dom::POPUP_RESULT_LINKS);
    if !session.wait_for(&links, session.timings().action_settle).await? {
        warn!("No destination employee found for '{}'", request.search_term);
        return Ok(false);
    }

    let href = driver.attribute(&ctx, &links, "href").await?.unwrap_or_default();
    let Some(script) = inline_script(&href) else {
        warn!("Unexpected selection link: {}", href);
        return Ok(false);
    };
    debug!("Selecting with: {}", script);
    session.dispatch(script).await?;

    // The page closes its own popup after sending the value
    let closed = session
        .wait(session.timings().action_settle)
        .until(|| async move { Ok::<_, Error>(!driver.window_handles().await?.contains(popup)) })
        .await?;
    if !closed {
        debug!("Selection window still open after selecting");
    }

    info!("Destination employee selected: {}", request.search_term);
    Ok(true)
}
