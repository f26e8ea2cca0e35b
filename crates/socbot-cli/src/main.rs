use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use socbot_cli::commands::{self, CredentialArgs, config::ConfigAction};
use socbot_cli::{CopyArg, StatusArg, copy_flags, parse_search_kind, status_filters};
use socbot_core::config::LoggingConfig;
use socbot_core::{Config, ConfigLoader, SearchKind, TransferRequest};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser)]
#[command(name = "socbot")]
#[command(author, version)]
#[command(
    about = "Automates employee workflows in the SOC web application",
    long_about = "socbot drives Chrome through the SOC web application: it logs in, \
                  navigates the frame-based screens and transfers employees between companies."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (default: ~/.socbot/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Run Chrome without a visible window
    #[arg(long, global = true)]
    headless: bool,

    /// Path to the Chrome binary
    #[arg(long, global = true, value_name = "PATH")]
    chrome_path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to SOC and report whether it worked
    Login {
        #[command(flatten)]
        credentials: CredentialArgs,
    },

    /// Transfer an employee to another company
    Transfer {
        /// Search term identifying the employee
        #[arg(value_name = "TERM")]
        term: String,

        /// What TERM is matched against: name, code, rg, cpf, registration, pis,
        /// hr-registration or social-name (Portuguese names such as matricula also work)
        #[arg(long, default_value = "name", value_parser = parse_search_kind)]
        kind: SearchKind,

        /// Employment status to include in the search (repeatable; default: all)
        #[arg(long = "status", value_enum, value_name = "STATUS")]
        statuses: Vec<StatusArg>,

        /// Company to switch to before searching
        #[arg(long, value_name = "CODE")]
        source: Option<String>,

        /// Company receiving the employee
        #[arg(long, value_name = "CODE")]
        destination: String,

        /// Record parts not to copy (comma separated)
        #[arg(long = "no-copy", value_enum, value_delimiter = ',', value_name = "PART")]
        no_copy: Vec<CopyArg>,

        /// Migrate the whole record instead of only the clinical file
        #[arg(long)]
        full_migration: bool,

        #[command(flatten)]
        credentials: CredentialArgs,
    },

    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(after_help = "SUPPORTED SHELLS:\n  \
        bash, zsh, fish, powershell, elvish\n\n\
        INSTALLATION:\n  \
        Bash:  socbot completion --shell bash >> ~/.bashrc\n  \
        Zsh:   socbot completion --shell zsh > \"${fpath[1]}/_socbot\"\n  \
        Fish:  socbot completion --shell fish > ~/.config/fish/completions/socbot.fish")]
    Completion {
        /// Shell to generate completions for
        #[arg(long, value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let Cli {
        command,
        config,
        verbose,
        headless,
        chrome_path,
    } = Cli::parse();

    match command {
        Commands::Login { credentials } => {
            let (config, _guard) =
                runtime_config(config.as_deref(), verbose, headless, chrome_path)?;
            commands::login::execute(&config, &credentials)
        }
        Commands::Transfer {
            term,
            kind,
            statuses,
            source,
            destination,
            no_copy,
            full_migration,
            credentials,
        } => {
            let (config, _guard) =
                runtime_config(config.as_deref(), verbose, headless, chrome_path)?;
            let mut request = TransferRequest::new(term, kind, destination)
                .with_status_filters(status_filters(&statuses))
                .with_copy_flags(copy_flags(&no_copy))
                .with_migrate_record_only(!full_migration);
            if let Some(source) = source {
                request = request.with_source_company(source);
            }
            commands::transfer::execute(&config, &credentials, &request)
        }
        Commands::Config { action } => {
            init_logging(verbose, None)?;
            commands::config::execute(action, config.as_deref())
        }
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            commands::completion::execute(shell, &mut cmd)
        }
    }
}

/// Load configuration, apply command-line overrides and start logging to file
fn runtime_config(
    path: Option<&Path>,
    verbose: bool,
    headless: bool,
    chrome_path: Option<PathBuf>,
) -> Result<(Config, Option<WorkerGuard>)> {
    let mut config = ConfigLoader::resolve(path)?;
    if headless {
        config.browser.headless = true;
    }
    if chrome_path.is_some() {
        config.browser.chrome_path = chrome_path;
    }
    let guard = init_logging(verbose, Some(&config.logging))?;
    Ok((config, guard))
}

fn init_logging(verbose: bool, file: Option<&LoggingConfig>) -> Result<Option<WorkerGuard>> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(
            ["socbot", "socbot_cli", "socbot_core", "socbot_browser", "socbot_workflow"]
                .map(|target| format!("{}={}", target, level))
                .join(","),
        )
    });
    let console = fmt::layer();

    let Some(logging) = file else {
        tracing_subscriber::registry()
            .with(filter)
            .with(console.without_time())
            .init();
        return Ok(None);
    };

    std::fs::create_dir_all(&logging.dir)?;
    let file_name = format!(
        "{}_{}.log",
        logging.file_prefix,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let appender = RollingFileAppender::new(Rotation::NEVER, &logging.dir, &file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();

    tracing::debug!("Logging to {}", logging.dir.join(&file_name).display());
    Ok(Some(guard))
}
