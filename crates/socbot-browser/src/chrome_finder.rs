use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Executable names looked up on `PATH` when no install location matches
const PATH_CANDIDATES: [&str; 4] = [
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
];

#[cfg(target_os = "macos")]
const INSTALL_LOCATIONS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
];

#[cfg(target_os = "linux")]
const INSTALL_LOCATIONS: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
];

#[cfg(target_os = "windows")]
const INSTALL_LOCATIONS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
];

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
const INSTALL_LOCATIONS: &[&str] = &[];

/// Locates the Chrome binary used for automation
pub struct ChromeFinder {
    custom_path: Option<PathBuf>,
}

impl ChromeFinder {
    pub fn new(custom_path: Option<PathBuf>) -> Self {
        Self { custom_path }
    }

    /// A configured path is used as-is; otherwise install locations, then `PATH`
    pub fn find(&self) -> Result<PathBuf> {
        if let Some(path) = &self.custom_path {
            return usable_binary(path);
        }

        let installed = INSTALL_LOCATIONS
            .iter()
            .map(Path::new)
            .find_map(|path| usable_binary(path).ok());
        if let Some(path) = installed {
            return Ok(path);
        }

        if let Some((name, path)) = PATH_CANDIDATES
            .iter()
            .find_map(|name| which::which(name).ok().map(|path| (name, path)))
        {
            tracing::debug!("Using {} from PATH: {}", name, path.display());
            return usable_binary(&path);
        }

        Err(Error::Browser(format!(
            "Chrome not found. Checked: {} and PATH ({}). \
             Set browser.chrome_path or pass --chrome-path.",
            INSTALL_LOCATIONS.join(", "),
            PATH_CANDIDATES.join(", ")
        )))
    }
}

/// The path must exist and, on unix, be executable
fn usable_binary(path: &Path) -> Result<PathBuf> {
    if !path.is_file() {
        return Err(Error::Browser(format!(
            "Chrome not found at: {}",
            path.display()
        )));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(path).map_err(Error::Io)?.permissions().mode();
        if mode & 0o111 == 0 {
            return Err(Error::Browser(format!(
                "Chrome binary not executable: {}",
                path.display()
            )));
        }
    }

    Ok(path.to_path_buf())
}
