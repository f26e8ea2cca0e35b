use crate::{CdpDriver, CdpSession, ChromeFinder, ChromeLauncher, LaunchOptions, ProfileManager, Result};
use std::path::PathBuf;
use std::process::Child;
use std::sync::Arc;
use std::time::Duration;

/// Everything needed to bring up a browser for one run
#[derive(Debug, Clone, Default)]
pub struct HostOptions {
    pub chrome_path: Option<PathBuf>,
    /// Persistent profile name; a temporary profile is used when `None`
    pub profile: Option<String>,
    pub launch: LaunchOptions,
    pub script_timeout: Option<Duration>,
}

/// A launched Chrome process, its profile directory and the connected driver.
///
/// Chrome is killed on [`BrowserHost::shutdown`] or drop; a temporary profile is removed
/// afterwards.
pub struct BrowserHost {
    child: Option<Child>,
    driver: Arc<CdpDriver>,
    _profile: ProfileManager,
}

impl BrowserHost {
    pub async fn launch(options: HostOptions) -> Result<Self> {
        let chrome_binary = ChromeFinder::new(options.chrome_path).find()?;
        tracing::info!("Found Chrome at: {}", chrome_binary.display());

        let profile = match options.profile.as_deref() {
            Some(name) => ProfileManager::named(name)?,
            None => ProfileManager::temporary()?,
        };
        tracing::debug!(
            "Using {} profile at {}",
            if profile.is_temporary() { "temporary" } else { "persistent" },
            profile.path().display()
        );

        let launcher = ChromeLauncher::new(
            chrome_binary,
            profile.path().to_path_buf(),
            options.launch,
        );
        let mut child = launcher.launch()?;
        tracing::info!("Chrome started (pid {})", child.id());

        let mut session = CdpSession::new(launcher.debugging_port());
        if let Some(timeout) = options.script_timeout {
            session = session.with_script_timeout(timeout);
        }

        let driver = match session.connect().await {
            Ok(driver) => driver,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
        };

        Ok(Self {
            child: Some(child),
            driver: Arc::new(driver),
            _profile: profile,
        })
    }

    pub fn driver(&self) -> Arc<CdpDriver> {
        Arc::clone(&self.driver)
    }

    /// Kill Chrome and wait for it to exit
    pub fn shutdown(mut self) {
        self.kill();
    }

    fn kill(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                tracing::debug!("Chrome already exited: {}", e);
            }
            let _ = child.wait();
            tracing::info!("Browser closed");
        }
    }
}

impl Drop for BrowserHost {
    fn drop(&mut self) {
        self.kill();
    }
}
