//! Browser session state shared by every workflow.
//!
//! The session owns the window and frame focus explicitly. Nothing switches focus behind the
//! caller's back; each change is a method call here and every driver call is made with
//! [`Session::context`].

use crate::dom;
use crate::{Error, Result};
use socbot_browser::{Driver, FrameContext, Locator, WindowHandle};
use socbot_core::wait::settle;
use socbot_core::{Config, Timings, WaitPolicy};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Target-system settings the workflows need at runtime
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub timings: Timings,
    pub content_frame: String,
    pub transfer_screen: String,
    pub screenshot_dir: PathBuf,
}

impl SessionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timings: config.timings(),
            content_frame: config.target.content_frame.clone(),
            transfer_screen: config.target.transfer_screen.clone(),
            screenshot_dir: config.artifacts.screenshot_dir.clone(),
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

pub struct Session {
    driver: Arc<dyn Driver>,
    options: SessionOptions,
    primary: Option<WindowHandle>,
    window: WindowHandle,
    frames: Vec<String>,
    company: Option<String>,
}

impl Session {
    /// Attach to the driver's currently active window, focused on its root document
    pub async fn attach(driver: Arc<dyn Driver>, options: SessionOptions) -> Result<Self> {
        let window = driver.active_window().await?;
        debug!("Session attached to window {}", window);
        Ok(Self {
            driver,
            options,
            primary: None,
            window,
            frames: Vec::new(),
            company: None,
        })
    }

    pub fn driver(&self) -> &dyn Driver {
        &*self.driver
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn timings(&self) -> &Timings {
        &self.options.timings
    }

    pub fn window(&self) -> &WindowHandle {
        &self.window
    }

    pub fn frame_path(&self) -> &[String] {
        &self.frames
    }

    pub fn primary_window(&self) -> Option<&WindowHandle> {
        self.primary.as_ref()
    }

    /// Company the session is currently working in, when known
    pub fn company(&self) -> Option<&str> {
        self.company.as_deref()
    }

    pub(crate) fn set_company(&mut self, company: &str) {
        self.company = Some(company.to_string());
    }

    /// Where driver calls go right now
    pub fn context(&self) -> FrameContext {
        FrameContext {
            window: self.window.clone(),
            frames: self.frames.clone(),
        }
    }

    /// Make the focused window the primary one, replacing any earlier designation
    pub fn designate_primary(&mut self) -> &WindowHandle {
        if self.primary.as_ref() != Some(&self.window) {
            info!("Primary window: {}", self.window);
        }
        self.primary.insert(self.window.clone())
    }

    /// Primary window, designating the focused one if none was set yet
    pub fn ensure_primary(&mut self) -> WindowHandle {
        match &self.primary {
            Some(primary) => primary.clone(),
            None => self.designate_primary().clone(),
        }
    }

    pub fn to_root(&mut self) {
        self.frames.clear();
    }

    /// Focus `window`'s root document
    pub fn switch_to_window(&mut self, window: WindowHandle) {
        debug!("Switching to window {}", window);
        self.window = window;
        self.frames.clear();
    }

    /// Wait for the named child frame of the focused document and focus it
    pub async fn enter_frame(&mut self, name: &str) -> Result<()> {
        let ctx = self.context();
        let driver = self.driver();
        let present = self
            .wait(self.options.timings.frame)
            .until(|| {
                let ctx = &ctx;
                async move { Ok::<_, Error>(driver.has_frame(ctx, name).await?) }
            })
            .await?;

        if !present {
            return Err(Error::FrameUnavailable(name.to_string()));
        }
        self.frames.push(name.to_string());
        Ok(())
    }

    /// Focus the application's content frame from the root of the focused window
    pub async fn enter_content_frame(&mut self) -> Result<()> {
        self.to_root();
        let frame = self.options.content_frame.clone();
        self.enter_frame(&frame).await
    }

    /// Close every non-primary window, focus the primary one and re-enter the content frame.
    ///
    /// With a single window already focused on the primary this only re-enters the frame.
    pub async fn restore_context(&mut self) -> Result<()> {
        let primary = self.ensure_primary();
        let handles = self.driver.window_handles().await?;
        if !handles.contains(&primary) {
            return Err(Error::PrimaryWindowLost(primary.to_string()));
        }

        let mut closed = 0;
        if handles.len() > 1 {
            for handle in handles.iter().filter(|handle| **handle != primary) {
                debug!("Closing transient window {}", handle);
                self.driver.close_window(handle).await?;
                closed += 1;
            }
        }

        if self.window != primary {
            self.switch_to_window(primary);
        }
        self.enter_content_frame().await?;

        if closed > 0 {
            info!("Context restored to primary window ({} window(s) closed)", closed);
        } else {
            debug!("Context restored to primary window");
        }
        Ok(())
    }

    /// [`Self::restore_context`], logging instead of failing
    pub async fn ensure_context(&mut self) -> bool {
        match self.restore_context().await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to restore main context: {}", e);
                false
            }
        }
    }

    /// Polling policy for this session's waits
    pub fn wait(&self, timeout: Duration) -> WaitPolicy {
        let timings = &self.options.timings;
        WaitPolicy::new(timeout)
            .with_interval(timings.poll_interval)
            .with_backoff(timings.poll_backoff, timings.poll_max_interval)
    }

    pub async fn exists(&self, locator: &Locator) -> Result<bool> {
        Ok(self.driver.count(&self.context(), locator).await? > 0)
    }

    /// Wait up to `timeout` for `locator` to match in the focused document
    pub async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<bool> {
        let ctx = self.context();
        let driver = self.driver();
        self.wait(timeout)
            .until(|| {
                let ctx = &ctx;
                async move { Ok::<_, Error>(driver.count(ctx, locator).await? > 0) }
            })
            .await
    }

    /// Run `script` without waiting for it; for page hooks that may raise dialogs
    pub async fn dispatch(&self, script: &str) -> Result<()> {
        Ok(self.driver.dispatch(&self.context(), script).await?)
    }

    /// Dispatch the named `doAcao` toolbar action
    pub async fn run_action(&self, name: &str) -> Result<()> {
        debug!("Running action '{}'", name);
        self.dispatch(&dom::action(name)).await
    }

    pub async fn settle(&self, delay: Duration) {
        settle(delay).await;
    }

    /// Save a screenshot of the focused window into the artifact directory; failures are only
    /// logged
    pub async fn screenshot(&self, file_name: &str) -> Option<PathBuf> {
        let path = self.options.screenshot_dir.join(file_name);
        match self.driver.screenshot(&self.window, &path).await {
            Ok(()) => {
                info!("Screenshot saved: {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("Could not save screenshot: {}", e);
                None
            }
        }
    }
}
