//! Small form helpers shared by the transfer phases.

use crate::session::Session;
use crate::Result;
use socbot_browser::Locator;

/// What [`set_checkbox`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckboxChange {
    Missing,
    Unchanged,
    Toggled,
}

/// Click the checkbox only when its state differs from `desired`
pub async fn set_checkbox(
    session: &Session,
    locator: &Locator,
    desired: bool,
) -> Result<CheckboxChange> {
    let driver = session.driver();
    let ctx = session.context();
    match driver.is_checked(&ctx, locator).await? {
        None => Ok(CheckboxChange::Missing),
        Some(current) if current == desired => Ok(CheckboxChange::Unchanged),
        Some(_) => {
            driver.click(&ctx, locator).await?;
            Ok(CheckboxChange::Toggled)
        }
    }
}

/// Record id from a `javascript:selbrowse('<id>')` link
pub fn selbrowse_id(href: &str) -> Option<&str> {
    let (_, rest) = href.split_once("selbrowse(")?;
    let id = rest.split('\'').nth(1)?;
    (!id.is_empty()).then_some(id)
}

/// Script part of a `javascript:` link
pub fn inline_script(href: &str) -> Option<&str> {
    let (_, script) = href.split_once("javascript:")?;
    let script = script.trim();
    (!script.is_empty()).then_some(script)
}
