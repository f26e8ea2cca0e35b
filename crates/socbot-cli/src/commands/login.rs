use super::{CredentialArgs, browser};
use anyhow::Result;
use console::style;
use socbot_core::Config;

pub fn execute(config: &Config, credentials: &CredentialArgs) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let (host, mut session) = browser::open_session(config).await?;
        let logged_in = browser::sign_in(config, &mut session, credentials).await;
        drop(session);
        host.shutdown();

        if !logged_in {
            anyhow::bail!("Login failed for {} (see the log for details)", credentials.username);
        }
        println!(
            "{} Logged in as {} (company {})",
            style("✅").green(),
            style(&credentials.username).bold(),
            credentials.company
        );
        Ok(())
    })
}
