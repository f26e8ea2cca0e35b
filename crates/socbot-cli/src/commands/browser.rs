use crate::commands::CredentialArgs;
use anyhow::Result;
use socbot_browser::{BrowserHost, HostOptions, LaunchOptions};
use socbot_core::Config;
use socbot_workflow::{Credentials, Session, SessionOptions};

/// Launch Chrome as configured and attach a session to its first window
pub async fn open_session(config: &Config) -> Result<(BrowserHost, Session)> {
    println!("🔍 Launching Chrome...");
    let browser = &config.browser;
    let options = HostOptions {
        chrome_path: browser.chrome_path.clone(),
        profile: browser.profile.clone(),
        launch: LaunchOptions {
            headless: browser.headless,
            window_width: browser.window_width,
            window_height: browser.window_height,
            debugging_port: browser.debugging_port,
            extra_args: browser.extra_args.clone(),
        },
        script_timeout: Some(config.timings().script),
    };

    let host = BrowserHost::launch(options).await?;
    println!("✅ Chrome ready");

    let session = Session::attach(host.driver(), SessionOptions::from_config(config)).await?;
    Ok((host, session))
}

/// Log in on the session's window
pub async fn sign_in(config: &Config, session: &mut Session, credentials: &CredentialArgs) -> bool {
    println!("🔐 Logging in as {}...", credentials.username);
    socbot_workflow::login(
        session,
        &config.target.base_url,
        &Credentials::from(credentials),
        config.login.max_attempts,
    )
    .await
}
