use clap::Args;
use socbot_workflow::Credentials;

pub mod browser;
pub mod completion;
pub mod config;
pub mod login;
pub mod transfer;

/// SOC account used to log in
#[derive(Args, Clone)]
pub struct CredentialArgs {
    /// SOC username
    #[arg(short, long, env = "SOC_USERNAME")]
    pub username: String,

    /// SOC password
    #[arg(short, long, env = "SOC_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Company id to log in to
    #[arg(short, long, env = "SOC_COMPANY")]
    pub company: String,
}

impl From<&CredentialArgs> for Credentials {
    fn from(args: &CredentialArgs) -> Self {
        Credentials::new(&args.username, &args.password, &args.company)
    }
}
