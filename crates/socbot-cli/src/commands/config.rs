use anyhow::Result;
use clap::Subcommand;
use console::style;
use socbot_core::ConfigLoader;
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,

    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn execute(action: ConfigAction, explicit: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = ConfigLoader::resolve(explicit)?;
            print!("{}", config.to_toml_string()?);
        }
        ConfigAction::Init { force } => {
            let path = explicit
                .map(Path::to_path_buf)
                .unwrap_or_else(ConfigLoader::default_path);
            ConfigLoader::write_default(&path, force)?;
            println!(
                "{} Configuration written to {}",
                style("✅").green(),
                path.display()
            );
        }
    }
    Ok(())
}
