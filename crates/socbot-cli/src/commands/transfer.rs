use super::{CredentialArgs, browser};
use anyhow::Result;
use console::style;
use socbot_core::{Config, TransferRequest};

pub fn execute(config: &Config, credentials: &CredentialArgs, request: &TransferRequest) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    print_request(request);

    runtime.block_on(async {
        let (host, mut session) = browser::open_session(config).await?;

        if !browser::sign_in(config, &mut session, credentials).await {
            drop(session);
            host.shutdown();
            anyhow::bail!("Login failed for {} (see the log for details)", credentials.username);
        }

        println!("🚚 Transferring employee...");
        let transferred = socbot_workflow::transfer(&mut session, request).await;
        drop(session);
        host.shutdown();

        if !transferred {
            anyhow::bail!(
                "Transfer of '{}' failed (see the log for details)",
                request.search_term
            );
        }
        println!(
            "{} Employee '{}' transferred to company {}",
            style("✅").green(),
            style(&request.search_term).bold(),
            request.destination().unwrap_or("-")
        );
        Ok(())
    })
}

fn print_request(request: &TransferRequest) {
    println!("\n{}", style("Employee Transfer").bold().cyan());
    println!("{}", style("=================").cyan());
    println!("  Search:      {} ({})", request.search_term, request.search_kind);
    if let Some(source) = request.source() {
        println!("  Source:      {}", source);
    }
    println!("  Destination: {}", request.destination().unwrap_or("-"));

    let statuses: Vec<&str> = request
        .status_filters
        .entries()
        .filter(|(_, enabled)| *enabled)
        .map(|(name, _)| name)
        .collect();
    println!("  Statuses:    {}", statuses.join(", "));

    let copied: Vec<&str> = request
        .copy_options()
        .into_iter()
        .filter(|(_, enabled)| *enabled)
        .map(|(id, _)| id)
        .collect();
    println!("  Options:     {}", style(copied.join(", ")).dim());
    println!();
}
