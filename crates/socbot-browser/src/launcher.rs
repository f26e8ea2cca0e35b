use crate::{Error, Result};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

/// Options that shape the Chrome command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub debugging_port: u16,
    pub extra_args: Vec<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: false,
            window_width: 1366,
            window_height: 768,
            debugging_port: 9222,
            extra_args: Vec::new(),
        }
    }
}

/// Manages the Chrome process lifecycle
pub struct ChromeLauncher {
    chrome_path: PathBuf,
    profile_path: PathBuf,
    options: LaunchOptions,
}

impl ChromeLauncher {
    pub fn new(chrome_path: PathBuf, profile_path: PathBuf, options: LaunchOptions) -> Self {
        Self {
            chrome_path,
            profile_path,
            options,
        }
    }

    /// Launch the Chrome process
    pub fn launch(&self) -> Result<Child> {
        let args = self.build_args();
        tracing::debug!("Launching {} {}", self.chrome_path.display(), args.join(" "));

        Command::new(&self.chrome_path)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Browser(format!("Failed to launch Chrome: {}", e)))
    }

    fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--remote-debugging-port={}", self.options.debugging_port),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            format!("--user-data-dir={}", self.profile_path.display()),
            format!(
                "--window-size={},{}",
                self.options.window_width, self.options.window_height
            ),
            "--disable-gpu".to_string(),
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            // Hides the "controlled by automated software" infobar and navigator.webdriver
            "--disable-blink-features=AutomationControlled".to_string(),
            // The target system opens selection popups with window.open
            "--disable-popup-blocking".to_string(),
        ];

        if self.options.headless {
            args.push("--headless=new".to_string());
        }

        args.extend(self.options.extra_args.iter().cloned());
        args.push("about:blank".to_string());

        args
    }

    pub fn debugging_port(&self) -> u16 {
        self.options.debugging_port
    }
}
