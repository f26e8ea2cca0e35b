//! Authentication against the SOC login page.

use crate::dom;
use crate::modal::{ModalResult, check_and_handle_modal};
use crate::session::Session;
use crate::{Error, Result};
use socbot_browser::Locator;
use std::fmt;
use tracing::{debug, error, info, warn};

/// Fragments of the login page's bad-credential alerts, matched case-insensitively
const CREDENTIAL_ERROR_HINTS: [&str; 3] = ["incorret", "senha", "password"];

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub company_id: String,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        company_id: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            company_id: company_id.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .field("company_id", &self.company_id)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Filling,
    Submitted,
    ModalCheck,
    Verified,
    Failed,
}

/// Whether an alert raised after submitting means the credentials were rejected
pub fn is_credential_error(message: &str) -> bool {
    let message = message.to_lowercase();
    CREDENTIAL_ERROR_HINTS.iter().any(|hint| message.contains(hint))
}

/// Open the login page in the focused window and sign in.
///
/// On success the window becomes the session's primary window. Every failure ends as `false`
/// with the reason logged.
pub async fn login(
    session: &mut Session,
    base_url: &str,
    credentials: &Credentials,
    max_attempts: u32,
) -> bool {
    info!(
        "Logging in as {} (company {})",
        credentials.username, credentials.company_id
    );

    if let Err(e) = open_login_page(session, base_url).await {
        error!("Could not open login page: {}", e);
        return false;
    }

    match authenticate(session, credentials, max_attempts).await {
        Ok(true) => {
            session.designate_primary();
            session.set_company(&credentials.company_id);
            true
        }
        Ok(false) => false,
        Err(e) => {
            error!("Login failed: {}", e);
            false
        }
    }
}

async fn open_login_page(session: &mut Session, base_url: &str) -> Result<()> {
    session.to_root();
    debug!("Opening {}", base_url);
    session
        .driver()
        .navigate(session.window(), base_url)
        .await?;
    Ok(())
}

/// Run the fill/submit/verify loop on an already open login page.
///
/// A credential-rejection alert consumes an attempt; once `max_attempts` submits were rejected
/// the flow stops rather than risk locking the account.
pub async fn authenticate(
    session: &mut Session,
    credentials: &Credentials,
    max_attempts: u32,
) -> Result<bool> {
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;
    let mut state = LoginState::Filling;

    loop {
        state = match state {
            LoginState::Filling => {
                attempt += 1;
                info!("Login attempt {}/{}", attempt, max_attempts);
                fill_credentials(session, credentials).await?;
                session.dispatch(dom::LOGIN_SUBMIT_SCRIPT).await?;
                LoginState::Submitted
            }
            LoginState::Submitted => LoginState::ModalCheck,
            LoginState::ModalCheck => {
                let modal = match check_and_handle_modal(session).await {
                    Ok(modal) => modal,
                    Err(e) => {
                        warn!("Could not check for alerts after login: {}", e);
                        ModalResult::none()
                    }
                };
                match modal.message() {
                    Some(message) if is_credential_error(message) => {
                        error!("Credentials rejected: {}", message);
                        if attempt >= max_attempts {
                            error!(
                                "Stopping after {} rejected attempt(s) to avoid locking the account",
                                attempt
                            );
                            LoginState::Failed
                        } else {
                            LoginState::Filling
                        }
                    }
                    other => {
                        if let Some(message) = other {
                            warn!("Alert after login: {}", message);
                        }
                        let logged_in = is_logged_in(session).await.unwrap_or_else(|e| {
                            warn!("Could not verify login: {}", e);
                            false
                        });
                        if logged_in {
                            LoginState::Verified
                        } else if attempt >= max_attempts {
                            error!("Login could not be confirmed after {} attempt(s)", attempt);
                            LoginState::Failed
                        } else {
                            warn!("Login not confirmed on attempt {}, retrying", attempt);
                            LoginState::Filling
                        }
                    }
                }
            }
            LoginState::Verified => {
                info!("Login successful");
                return Ok(true);
            }
            LoginState::Failed => return Ok(false),
        };
    }
}

async fn fill_credentials(session: &mut Session, credentials: &Credentials) -> Result<()> {
    session.to_root();
    let username = Locator::id(dom::LOGIN_USERNAME);
    if !session
        .wait_for(&username, session.timings().element)
        .await?
    {
        return Err(Error::ElementNotFound(dom::LOGIN_USERNAME.to_string()));
    }

    let driver = session.driver();
    let ctx = session.context();
    let fields = [
        (dom::LOGIN_USERNAME, credentials.username.as_str()),
        (dom::LOGIN_PASSWORD, credentials.password.as_str()),
        (dom::LOGIN_COMPANY, credentials.company_id.as_str()),
    ];
    for (id, value) in fields {
        if !driver.set_value(&ctx, &Locator::id(id), value).await? {
            return Err(Error::ElementNotFound(id.to_string()));
        }
    }
    debug!("Credentials filled");
    Ok(())
}

/// Both toolbar elements only exist once logged in
async fn is_logged_in(session: &Session) -> Result<bool> {
    let timings = session.timings();
    if !session
        .wait_for(&Locator::id(dom::LOGGED_IN_BAR), timings.login_bar)
        .await?
    {
        debug!("Element '{}' not found", dom::LOGGED_IN_BAR);
        return Ok(false);
    }
    session
        .wait_for(&Locator::id(dom::LOGGED_IN_ICONS), timings.login_icons)
        .await
}
