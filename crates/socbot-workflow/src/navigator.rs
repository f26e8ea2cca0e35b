//! Menu-driven screen navigation.
//!
//! The application is a frameset: the menu and the screen banner live in the root document,
//! screens render inside the content frame. Anything done at the root leaves the session
//! there, so callers re-enter the content frame afterwards.

use crate::dom;
use crate::modal::check_and_handle_modal;
use crate::session::Session;
use crate::{Error, Result};
use socbot_browser::Locator;
use tracing::{debug, error, info};

/// Banner shown in the root document for the current screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenInfo {
    pub program: String,
    pub company: String,
}

/// Open screen `code` from the menu and check the banner confirms it.
///
/// Returns `false` when no menu row carries the code or the banner shows another screen.
pub async fn navigate_to_screen_by_number(session: &mut Session, code: &str) -> Result<bool> {
    session.to_root();
    let ctx = session.context();

    let triggers = session
        .driver()
        .attributes(&ctx, &Locator::xpath(dom::MENU_ROWS), "onclick")
        .await?;
    debug!("Scanning {} menu rows for screen {}", triggers.len(), code);

    let needle = format!("'{}'", code);
    let Some(trigger) = triggers.into_iter().flatten().find(|t| t.contains(&needle)) else {
        error!("Menu entry for screen {} not found", code);
        return Ok(false);
    };

    info!("Navigating to screen {}", code);
    session.dispatch(&trigger).await?;

    let driver = session.driver();
    let reached = session
        .wait(session.timings().navigation)
        .until(|| {
            let ctx = &ctx;
            async move {
                let program = driver
                    .text(ctx, &Locator::id(dom::SCREEN_PROGRAM))
                    .await?
                    .unwrap_or_default();
                Ok::<_, Error>(program.trim().starts_with(code))
            }
        })
        .await?;

    let screen = current_screen_info(session).await?;
    if reached {
        info!("Screen {} confirmed: {}", code, screen.program);
    } else {
        error!("Expected screen {} but found '{}'", code, screen.program);
    }
    Ok(reached)
}

/// Read the screen banner from the root document, whatever frame is focused.
///
/// Missing banner elements read as empty strings.
pub async fn current_screen_info(session: &Session) -> Result<ScreenInfo> {
    let root = socbot_browser::FrameContext::root(session.window().clone());
    let driver = session.driver();
    let read = |id: &'static str| {
        let root = &root;
        async move {
            Ok::<_, Error>(
                driver
                    .text(root, &Locator::id(id))
                    .await?
                    .map(|text| text.trim().to_string())
                    .unwrap_or_default(),
            )
        }
    };

    Ok(ScreenInfo {
        program: read(dom::SCREEN_PROGRAM).await?,
        company: read(dom::SCREEN_COMPANY).await?,
    })
}

/// Run the home-screen script from the root document
pub async fn go_to_main_screen(session: &mut Session) -> Result<()> {
    session.to_root();
    session.dispatch(dom::HOME_SCRIPT).await?;
    session.settle(session.timings().home_settle).await;
    info!("Returned to the main screen");
    Ok(())
}

/// Switch the working company through the home screen's company picker
pub async fn change_company(session: &mut Session, company_id: &str) -> Result<()> {
    info!("Switching to company {}", company_id);
    go_to_main_screen(session).await?;
    session.enter_content_frame().await?;

    session
        .dispatch(&format!("choiceemp({});", dom::js_string(company_id)))
        .await?;
    session.settle(session.timings().action_settle).await;

    if let Some(message) = check_and_handle_modal(session).await?.message() {
        info!("Modal after company switch: {}", message);
    }
    session.set_company(company_id);
    Ok(())
}
