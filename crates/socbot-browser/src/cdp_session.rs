use crate::driver::{Driver, FrameContext, Locator, WindowHandle};
use crate::{Error, Result, script};
use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

const CONNECT_ATTEMPTS: u32 = 5;

/// Connects to a Chrome instance over the DevTools Protocol
pub struct CdpSession {
    debugging_port: u16,
    script_timeout: Duration,
}

impl CdpSession {
    pub fn new(debugging_port: u16) -> Self {
        Self {
            debugging_port,
            script_timeout: Duration::from_secs(30),
        }
    }

    /// Upper bound for a single script evaluation
    pub fn with_script_timeout(mut self, timeout: Duration) -> Self {
        self.script_timeout = timeout;
        self
    }

    /// Connect to Chrome and wrap its first page in a [`CdpDriver`]
    pub async fn connect(&self) -> Result<CdpDriver> {
        tracing::info!(
            "CDP session: connecting to Chrome on port {}",
            self.debugging_port
        );

        // Chrome may still be starting up
        let url = format!("http://localhost:{}", self.debugging_port);
        let (browser, mut handler) = {
            let mut retries = CONNECT_ATTEMPTS;
            loop {
                tracing::debug!("Attempting CDP connection to {}...", url);
                match Browser::connect(&url).await {
                    Ok(result) => {
                        tracing::info!("CDP connection established");
                        break result;
                    }
                    Err(e) => {
                        retries -= 1;
                        if retries == 0 {
                            return Err(Error::Cdp(format!(
                                "Failed to connect to Chrome after {} attempts: {}",
                                CONNECT_ATTEMPTS, e
                            )));
                        }
                        tracing::info!(
                            "CDP connection attempt failed, retrying... ({} left)",
                            retries
                        );
                        tokio::time::sleep(Duration::from_millis(500)).await;
                    }
                }
            }
        };

        // The handler must be polled for any browser command to complete
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("CDP handler event error (continuing): {}", e);
                }
            }
        });

        // Give Chrome a moment to create its initial page
        tokio::time::sleep(Duration::from_millis(500)).await;

        let page = if let Some(page) = browser.pages().await?.first() {
            tracing::debug!("CDP: using existing page");
            page.clone()
        } else {
            tracing::debug!("CDP: no existing pages, creating new page");
            browser.new_page("about:blank").await?
        };

        let driver = CdpDriver {
            initial: WindowHandle::new(page.target_id().inner().clone()),
            browser,
            dialogs: Arc::new(Mutex::new(HashMap::new())),
            watched: Mutex::new(HashSet::new()),
            tasks: Mutex::new(vec![handler_task]),
            script_timeout: self.script_timeout,
        };
        driver.watch_dialogs(&page).await?;

        Ok(driver)
    }
}

/// [`Driver`] backed by chromiumoxide.
///
/// Windows are page targets. Native dialogs are recorded per target by a listener task as
/// they open and stay blocking until [`Driver::accept_dialog`] handles them.
pub struct CdpDriver {
    browser: Browser,
    initial: WindowHandle,
    dialogs: Arc<Mutex<HashMap<String, String>>>,
    watched: Mutex<HashSet<String>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    script_timeout: Duration,
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl CdpDriver {
    async fn page(&self, window: &WindowHandle) -> Result<Page> {
        for page in self.browser.pages().await? {
            if page.target_id().inner() == window.as_str() {
                self.watch_dialogs(&page).await?;
                return Ok(page);
            }
        }
        Err(Error::WindowNotFound(window.to_string()))
    }

    async fn watch_dialogs(&self, page: &Page) -> Result<()> {
        let target = page.target_id().inner().clone();
        if !lock(&self.watched).insert(target.clone()) {
            return Ok(());
        }

        let mut events = page.event_listener::<EventJavascriptDialogOpening>().await?;
        let dialogs = Arc::clone(&self.dialogs);
        let task = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                tracing::debug!("Native dialog opened on {}: {}", target, event.message);
                lock(&*dialogs).insert(target.clone(), event.message.clone());
            }
        });
        lock(&self.tasks).push(task);

        Ok(())
    }

    async fn eval(&self, window: &WindowHandle, source: String) -> Result<Value> {
        let page = self.page(window).await?;
        let params = EvaluateParams::builder()
            .expression(source)
            .return_by_value(true)
            .await_promise(false)
            .build()
            .map_err(Error::Script)?;

        let result = tokio::time::timeout(self.script_timeout, page.evaluate_expression(params))
            .await
            .map_err(|_| Error::Timeout(self.script_timeout, "script evaluation".to_string()))??;

        let value = result.value().cloned().unwrap_or(Value::Null);
        script::check_frame(&value)?;
        Ok(value)
    }

    async fn eval_bool(&self, window: &WindowHandle, source: String) -> Result<bool> {
        Ok(self.eval(window, source).await?.as_bool().unwrap_or(false))
    }

    async fn eval_opt_bool(&self, window: &WindowHandle, source: String) -> Result<Option<bool>> {
        Ok(self.eval(window, source).await?.as_bool())
    }

    async fn eval_opt_string(&self, window: &WindowHandle, source: String) -> Result<Option<String>> {
        Ok(self
            .eval(window, source)
            .await?
            .as_str()
            .map(str::to_string))
    }
}

impl Drop for CdpDriver {
    fn drop(&mut self) {
        for task in lock(&self.tasks).drain(..) {
            task.abort();
        }
    }
}

#[async_trait]
impl Driver for CdpDriver {
    async fn active_window(&self) -> Result<WindowHandle> {
        Ok(self.initial.clone())
    }

    async fn window_handles(&self) -> Result<Vec<WindowHandle>> {
        Ok(self
            .browser
            .pages()
            .await?
            .iter()
            .map(|page| WindowHandle::new(page.target_id().inner().clone()))
            .collect())
    }

    async fn navigate(&self, window: &WindowHandle, url: &str) -> Result<()> {
        let page = self.page(window).await?;
        page.goto(url).await?;
        Ok(())
    }

    async fn close_window(&self, window: &WindowHandle) -> Result<()> {
        let page = self.page(window).await?;
        page.close().await?;
        lock(&*self.dialogs).remove(window.as_str());
        lock(&self.watched).remove(window.as_str());
        Ok(())
    }

    async fn has_frame(&self, ctx: &FrameContext, name: &str) -> Result<bool> {
        self.eval_bool(&ctx.window, script::has_frame(&ctx.frames, name)?)
            .await
    }

    async fn count(&self, ctx: &FrameContext, locator: &Locator) -> Result<usize> {
        let value = self
            .eval(&ctx.window, script::count(&ctx.frames, locator)?)
            .await?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    async fn text(&self, ctx: &FrameContext, locator: &Locator) -> Result<Option<String>> {
        self.eval_opt_string(&ctx.window, script::text(&ctx.frames, locator)?)
            .await
    }

    async fn attribute(
        &self,
        ctx: &FrameContext,
        locator: &Locator,
        name: &str,
    ) -> Result<Option<String>> {
        self.eval_opt_string(&ctx.window, script::attribute(&ctx.frames, locator, name)?)
            .await
    }

    async fn attributes(
        &self,
        ctx: &FrameContext,
        locator: &Locator,
        name: &str,
    ) -> Result<Vec<Option<String>>> {
        let value = self
            .eval(&ctx.window, script::attributes(&ctx.frames, locator, name)?)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn is_checked(&self, ctx: &FrameContext, locator: &Locator) -> Result<Option<bool>> {
        self.eval_opt_bool(&ctx.window, script::is_checked(&ctx.frames, locator)?)
            .await
    }

    async fn is_displayed(&self, ctx: &FrameContext, locator: &Locator) -> Result<Option<bool>> {
        self.eval_opt_bool(&ctx.window, script::is_displayed(&ctx.frames, locator)?)
            .await
    }

    async fn click(&self, ctx: &FrameContext, locator: &Locator) -> Result<bool> {
        self.eval_bool(&ctx.window, script::click(&ctx.frames, locator)?)
            .await
    }

    async fn type_text(&self, ctx: &FrameContext, locator: &Locator, text: &str) -> Result<bool> {
        self.eval_bool(&ctx.window, script::type_text(&ctx.frames, locator, text)?)
            .await
    }

    async fn set_value(&self, ctx: &FrameContext, locator: &Locator, value: &str) -> Result<bool> {
        self.eval_bool(&ctx.window, script::set_value(&ctx.frames, locator, value)?)
            .await
    }

    async fn set_checked(
        &self,
        ctx: &FrameContext,
        locator: &Locator,
        checked: bool,
    ) -> Result<bool> {
        self.eval_bool(&ctx.window, script::set_checked(&ctx.frames, locator, checked)?)
            .await
    }

    async fn dispatch(&self, ctx: &FrameContext, source: &str) -> Result<()> {
        self.eval(&ctx.window, script::dispatch(&ctx.frames, source)?)
            .await?;
        Ok(())
    }

    async fn accept_dialog(&self, window: &WindowHandle) -> Result<Option<String>> {
        let pending = lock(&*self.dialogs).remove(window.as_str());
        let Some(message) = pending else {
            return Ok(None);
        };

        let page = self.page(window).await?;
        page.execute(HandleJavaScriptDialogParams::new(true)).await?;
        Ok(Some(message))
    }

    async fn screenshot(&self, window: &WindowHandle, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let page = self.page(window).await?;
        page.save_screenshot(ScreenshotParams::builder().full_page(true).build(), path)
            .await?;
        Ok(())
    }
}
