use super::controls::{CheckboxChange, selbrowse_id, set_checkbox};
use super::PhaseOutcome;
use crate::dom;
use crate::modal::check_and_handle_modal;
use crate::session::Session;
use crate::{Error, Result};
use socbot_browser::Locator;
use socbot_core::TransferRequest;
use tracing::{debug, error, info, warn};

const PROBE_ROUNDS: u32 = 3;

/// Search the source employee, open the first match and start the transfer
pub(super) async fn run(session: &mut Session, request: &TransferRequest) -> Result<PhaseOutcome> {
    if !search(session, request).await? {
        return Ok(PhaseOutcome::Failure);
    }
    if !open_first_record(session).await? {
        return Ok(PhaseOutcome::Failure);
    }
    start_transfer(session).await?;
    Ok(PhaseOutcome::Success)
}

async fn search(session: &Session, request: &TransferRequest) -> Result<bool> {
    let driver = session.driver();
    let ctx = session.context();
    info!(
        "Searching employee '{}' by {}",
        request.search_term, request.search_kind
    );

    let kind = Locator::css(format!(
        "input[name='{}'][value='{}']",
        dom::SEARCH_KIND_RADIO,
        request.search_kind.radio_value()
    ));
    if !driver.set_checked(&ctx, &kind, true).await? {
        warn!("Search kind option '{}' not found", request.search_kind);
    }

    for (name, desired) in request.status_filters.entries() {
        match set_checkbox(session, &Locator::name(name), desired).await? {
            CheckboxChange::Missing => warn!("Status filter '{}' not found", name),
            CheckboxChange::Toggled => debug!("Status filter '{}' set to {}", name, desired),
            CheckboxChange::Unchanged => {}
        }
    }

    let field = Locator::name(dom::SEARCH_FIELD);
    if !driver.type_text(&ctx, &field, &request.search_term).await? {
        error!("Search field not found");
        return Ok(false);
    }
    session.run_action("browse").await?;

    let rows = Locator::css(dom::RESULT_ROWS);
    if !session.wait_for(&rows, session.timings().action_settle).await? {
        error!("No employee found for '{}'", request.search_term);
        return Ok(false);
    }
    info!("Found {} employee(s)", driver.count(&ctx, &rows).await?);
    Ok(true)
}

async fn open_first_record(session: &Session) -> Result<bool> {
    let driver = session.driver();
    let ctx = session.context();
    let link = Locator::css(dom::RESULT_LINKS);

    if driver.count(&ctx, &link).await? == 0 {
        error!("No employee available for selection");
        return Ok(false);
    }
    let href = driver.attribute(&ctx, &link, "href").await?.unwrap_or_default();
    let code = driver
        .text(&ctx, &link)
        .await?
        .map(|text| text.trim().to_string())
        .unwrap_or_default();
    let name = driver
        .text(&ctx, &Locator::css(dom::RESULT_NAMES))
        .await?
        .map(|text| text.trim().to_string())
        .filter(|name| !name.is_empty());

    let Some(record_id) = selbrowse_id(&href) else {
        error!("Unexpected record link: {}", href);
        return Ok(false);
    };

    match name {
        Some(name) => info!("Selecting employee {} (code {})", name, code),
        None => info!("Selecting employee with code {}", code),
    }
    session
        .dispatch(&format!("selbrowse({});", dom::js_string(record_id)))
        .await?;
    session.settle(session.timings().action_settle).await;
    Ok(true)
}

async fn start_transfer(session: &Session) -> Result<()> {
    let driver = session.driver();
    let ctx = session.context();

    if !driver.click(&ctx, &Locator::css(dom::TRANSFER_LINK)).await? {
        debug!("Transfer link not found, running the action directly");
        session.run_action("transfunc").await?;
    }
    info!("Transfer started");

    // Give the screen a chance to load before looking for alerts on it
    session
        .wait(session.timings().transfer_load)
        .until(|| async move {
            Ok::<_, Error>(transfer_screen_signal(session).await?.is_some())
        })
        .await?;

    if let Some(message) = check_and_handle_modal(session).await?.message() {
        info!("Modal after starting transfer: {}", message);
    }

    for round in 1..=PROBE_ROUNDS {
        match transfer_screen_signal(session).await {
            Ok(Some(signal)) => {
                info!("Transfer screen loaded (found {})", signal);
                return Ok(());
            }
            Ok(None) => warn!(
                "Transfer screen not identified yet (round {}/{})",
                round, PROBE_ROUNDS
            ),
            Err(e) => warn!("Error probing transfer screen: {}", e),
        }
        if round < PROBE_ROUNDS {
            session.settle(session.timings().probe_interval).await;
        }
    }

    warn!("Transfer screen never confirmed; continuing as if it loaded");
    Ok(())
}

/// Which of the transfer screen's landmarks is present, if any
async fn transfer_screen_signal(session: &Session) -> Result<Option<&'static str>> {
    let driver = session.driver();
    let ctx = session.context();

    if driver
        .count(&ctx, &Locator::id(dom::COPY_CLINICAL_RECORD))
        .await?
        > 0
    {
        return Ok(Some(dom::COPY_CLINICAL_RECORD));
    }
    if driver
        .count(&ctx, &Locator::name(dom::TRANSFER_COMPANY_FIELD))
        .await?
        > 0
    {
        return Ok(Some(dom::TRANSFER_COMPANY_FIELD));
    }
    let body = driver
        .text(&ctx, &Locator::css("body"))
        .await?
        .unwrap_or_default();
    if body.contains(dom::TRANSFER_TITLE) {
        return Ok(Some("page title"));
    }
    Ok(None)
}
