//! Scripted in-memory [`Driver`] for workflow tests.
//!
//! Windows hold one document per frame path. Elements match locators by id, name or any of
//! their registered CSS/XPath selectors. Scripts are recorded and fire hooks registered by
//! substring, which is how tests give page functions like `doAcao('browse')` their effects.

use crate::dom;
use crate::session::{Session, SessionOptions};
use async_trait::async_trait;
use socbot_browser::{Driver, Error, FrameContext, Locator, Result, WindowHandle};
use socbot_core::Timings;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

pub(crate) const MAIN: &str = "main";
pub(crate) const CONTENT: &str = "socframe";

pub(crate) fn options() -> SessionOptions {
    SessionOptions {
        timings: Timings::instant(),
        content_frame: CONTENT.to_string(),
        transfer_screen: "232".to_string(),
        screenshot_dir: std::env::temp_dir().join("socbot-test-screenshots"),
    }
}

pub(crate) async fn session_on(fake: &Arc<FakeDriver>) -> Session {
    Session::attach(fake.clone(), options()).await.unwrap()
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeElement {
    pub id: Option<String>,
    pub name: Option<String>,
    pub selectors: Vec<String>,
    pub text: String,
    pub attrs: HashMap<String, String>,
    /// `None` for elements without a checked state
    pub checked: Option<bool>,
    pub hidden: bool,
    pub value: String,
    /// Script fired through the hooks when clicked
    pub on_click: Option<String>,
}

impl FakeElement {
    pub fn with_id(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            ..Default::default()
        }
    }

    pub fn with_name(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn matching(selector: &str) -> Self {
        Self {
            selectors: vec![selector.to_string()],
            ..Default::default()
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn on_click(mut self, script: &str) -> Self {
        self.on_click = Some(script.to_string());
        self
    }

    fn matches(&self, locator: &Locator) -> bool {
        match locator {
            Locator::Id(id) => self.id.as_deref() == Some(id.as_str()),
            Locator::Name(name) => self.name.as_deref() == Some(name.as_str()),
            Locator::Css(selector) | Locator::XPath(selector) => {
                self.selectors.iter().any(|s| s == selector)
            }
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeDoc {
    pub elements: Vec<FakeElement>,
}

impl FakeDoc {
    fn find(&self, locator: &Locator) -> Option<&FakeElement> {
        self.elements.iter().find(|el| el.matches(locator))
    }

    fn find_mut(&mut self, locator: &Locator) -> Option<&mut FakeElement> {
        self.elements.iter_mut().find(|el| el.matches(locator))
    }
}

#[derive(Debug)]
pub(crate) struct FakeWindow {
    pub handle: String,
    pub docs: HashMap<Vec<String>, FakeDoc>,
}

#[derive(Debug, Default)]
pub(crate) struct FakeState {
    pub windows: Vec<FakeWindow>,
    pub active: String,
    /// `<context>|<locator>` of every successful click
    pub clicks: Vec<String>,
    /// Every dispatched script, in order
    pub scripts: Vec<String>,
    /// `(locator, text)` of every typed or assigned value
    pub values: Vec<(String, String)>,
    pub dialogs: HashMap<String, String>,
    pub accepted_dialogs: Vec<String>,
    pub screenshots: Vec<PathBuf>,
    pub navigations: Vec<String>,
    pub closed: Vec<String>,
    /// Upcoming `count` calls that fail as if the page were being replaced
    pub count_failures: usize,
    /// `(window, needle)`: scripts containing `needle` fail in that window
    pub failing_scripts: Vec<(String, String)>,
}

fn path_of(frames: &[&str]) -> Vec<String> {
    frames.iter().map(|f| f.to_string()).collect()
}

impl FakeState {
    pub fn open_window(&mut self, handle: &str) {
        let mut docs = HashMap::new();
        docs.insert(Vec::new(), FakeDoc::default());
        self.windows.push(FakeWindow {
            handle: handle.to_string(),
            docs,
        });
    }

    pub fn close(&mut self, handle: &str) {
        self.windows.retain(|w| w.handle != handle);
        self.dialogs.remove(handle);
    }

    pub fn has_window(&self, handle: &str) -> bool {
        self.windows.iter().any(|w| w.handle == handle)
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    /// Create the document at `frames` (and its ancestors) in `window`
    pub fn add_frame(&mut self, window: &str, frames: &[&str]) {
        if let Some(w) = self.windows.iter_mut().find(|w| w.handle == window) {
            for depth in 0..=frames.len() {
                w.docs.entry(path_of(&frames[..depth])).or_default();
            }
        }
    }

    pub fn add(&mut self, window: &str, frames: &[&str], element: FakeElement) {
        self.add_frame(window, frames);
        if let Some(doc) = self.doc_at(window, frames) {
            doc.elements.push(element);
        }
    }

    pub fn remove(&mut self, window: &str, frames: &[&str], locator: &Locator) {
        if let Some(doc) = self.doc_at(window, frames) {
            doc.elements.retain(|el| !el.matches(locator));
        }
    }

    pub fn element(&self, window: &str, frames: &[&str], locator: &Locator) -> Option<&FakeElement> {
        self.windows
            .iter()
            .find(|w| w.handle == window)?
            .docs
            .get(&path_of(frames))?
            .find(locator)
    }

    pub fn element_mut(
        &mut self,
        window: &str,
        frames: &[&str],
        locator: &Locator,
    ) -> Option<&mut FakeElement> {
        self.doc_at(window, frames)?.find_mut(locator)
    }

    pub fn clicked(&self, needle: &str) -> bool {
        self.clicks.iter().any(|c| c.contains(needle))
    }

    pub fn ran(&self, needle: &str) -> bool {
        self.scripts.iter().any(|s| s.contains(needle))
    }

    pub fn script_count(&self, needle: &str) -> usize {
        self.scripts.iter().filter(|s| s.contains(needle)).count()
    }

    fn doc_at(&mut self, window: &str, frames: &[&str]) -> Option<&mut FakeDoc> {
        self.windows
            .iter_mut()
            .find(|w| w.handle == window)?
            .docs
            .get_mut(&path_of(frames))
    }

    fn doc(&self, ctx: &FrameContext) -> Result<&FakeDoc> {
        let window = self
            .windows
            .iter()
            .find(|w| w.handle == ctx.window.as_str())
            .ok_or_else(|| Error::WindowNotFound(ctx.window.to_string()))?;
        window
            .docs
            .get(&ctx.frames)
            .ok_or_else(|| Error::Frame(ctx.to_string()))
    }

    fn doc_mut(&mut self, ctx: &FrameContext) -> Result<&mut FakeDoc> {
        let window = self
            .windows
            .iter_mut()
            .find(|w| w.handle == ctx.window.as_str())
            .ok_or_else(|| Error::WindowNotFound(ctx.window.to_string()))?;
        window
            .docs
            .get_mut(&ctx.frames)
            .ok_or_else(|| Error::Frame(ctx.to_string()))
    }
}

type HookFn = Box<dyn FnMut(&mut FakeState, &FrameContext) + Send>;

struct Hook {
    pattern: String,
    once: bool,
    action: HookFn,
}

pub(crate) struct FakeDriver {
    state: Mutex<FakeState>,
    hooks: Mutex<Vec<Hook>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl FakeDriver {
    /// One window, [`MAIN`], with an empty root document
    pub fn new() -> Self {
        let mut state = FakeState::default();
        state.open_window(MAIN);
        state.active = MAIN.to_string();
        Self {
            state: Mutex::new(state),
            hooks: Mutex::new(Vec::new()),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        lock(&self.state)
    }

    /// Run `action` whenever a script containing `pattern` executes
    pub fn on(
        &self,
        pattern: &str,
        action: impl FnMut(&mut FakeState, &FrameContext) + Send + 'static,
    ) {
        self.add_hook(pattern, false, Box::new(action));
    }

    /// Like [`Self::on`], but only for the first matching script
    pub fn once(
        &self,
        pattern: &str,
        action: impl FnMut(&mut FakeState, &FrameContext) + Send + 'static,
    ) {
        self.add_hook(pattern, true, Box::new(action));
    }

    fn add_hook(&self, pattern: &str, once: bool, action: HookFn) {
        lock(&self.hooks).push(Hook {
            pattern: pattern.to_string(),
            once,
            action,
        });
    }

    fn fire(&self, script: &str, ctx: &FrameContext) {
        let mut hooks = lock(&self.hooks);
        let mut state = lock(&self.state);
        let mut i = 0;
        while i < hooks.len() {
            if script.contains(&hooks[i].pattern) {
                (hooks[i].action)(&mut state, ctx);
                if hooks[i].once {
                    hooks.remove(i);
                    continue;
                }
            }
            i += 1;
        }
    }

    fn run_script(&self, ctx: &FrameContext, script: &str) -> Result<()> {
        {
            let mut state = self.state();
            state.doc(ctx)?;
            state.scripts.push(script.to_string());
            let fails = state
                .failing_scripts
                .iter()
                .any(|(window, needle)| window == ctx.window.as_str() && script.contains(needle));
            if fails {
                return Err(Error::Script(format!("{} threw", script)));
            }
        }
        self.fire(script, ctx);
        Ok(())
    }

    /// Add the generic alert modal with `message` to `frames` of `window`.
    ///
    /// Clicking its OK button removes it again.
    pub fn raise_modal(&self, window: &str, frames: &[&str], message: &str) {
        {
            let mut state = self.state();
            state.add(window, frames, FakeElement::with_id(dom::MODAL));
            state.add(
                window,
                frames,
                FakeElement::matching(dom::MODAL_CONTENT).text(message),
            );
            state.add(
                window,
                frames,
                FakeElement::matching(dom::MODAL_OK).on_click("__dismiss_modal__"),
            );
        }
        self.once("__dismiss_modal__", |state, ctx| {
            let window = ctx.window.as_str().to_string();
            let frames: Vec<&str> = ctx.frames.iter().map(String::as_str).collect();
            state.remove(&window, &frames, &Locator::id(dom::MODAL));
            state.remove(&window, &frames, &Locator::css(dom::MODAL_CONTENT));
            state.remove(&window, &frames, &Locator::css(dom::MODAL_OK));
        });
    }
}

#[async_trait]
impl Driver for FakeDriver {
    async fn active_window(&self) -> Result<WindowHandle> {
        Ok(WindowHandle::new(self.state().active.clone()))
    }

    async fn window_handles(&self) -> Result<Vec<WindowHandle>> {
        Ok(self
            .state()
            .windows
            .iter()
            .map(|w| WindowHandle::new(w.handle.clone()))
            .collect())
    }

    async fn navigate(&self, window: &WindowHandle, url: &str) -> Result<()> {
        let mut state = self.state();
        if !state.has_window(window.as_str()) {
            return Err(Error::WindowNotFound(window.to_string()));
        }
        state.navigations.push(url.to_string());
        Ok(())
    }

    async fn close_window(&self, window: &WindowHandle) -> Result<()> {
        let mut state = self.state();
        if !state.has_window(window.as_str()) {
            return Err(Error::WindowNotFound(window.to_string()));
        }
        state.close(window.as_str());
        state.closed.push(window.to_string());
        Ok(())
    }

    async fn has_frame(&self, ctx: &FrameContext, name: &str) -> Result<bool> {
        let state = self.state();
        state.doc(ctx)?;
        let child = ctx.child(name);
        Ok(state.doc(&child).is_ok())
    }

    async fn count(&self, ctx: &FrameContext, locator: &Locator) -> Result<usize> {
        let mut state = self.state();
        if state.count_failures > 0 {
            state.count_failures -= 1;
            return Err(Error::Script("Execution context was destroyed".to_string()));
        }
        Ok(state
            .doc(ctx)?
            .elements
            .iter()
            .filter(|el| el.matches(locator))
            .count())
    }

    async fn text(&self, ctx: &FrameContext, locator: &Locator) -> Result<Option<String>> {
        let state = self.state();
        Ok(state.doc(ctx)?.find(locator).map(|el| el.text.clone()))
    }

    async fn attribute(
        &self,
        ctx: &FrameContext,
        locator: &Locator,
        name: &str,
    ) -> Result<Option<String>> {
        let state = self.state();
        Ok(state
            .doc(ctx)?
            .find(locator)
            .and_then(|el| el.attrs.get(name).cloned()))
    }

    async fn attributes(
        &self,
        ctx: &FrameContext,
        locator: &Locator,
        name: &str,
    ) -> Result<Vec<Option<String>>> {
        let state = self.state();
        Ok(state
            .doc(ctx)?
            .elements
            .iter()
            .filter(|el| el.matches(locator))
            .map(|el| el.attrs.get(name).cloned())
            .collect())
    }

    async fn is_checked(&self, ctx: &FrameContext, locator: &Locator) -> Result<Option<bool>> {
        let state = self.state();
        Ok(state
            .doc(ctx)?
            .find(locator)
            .map(|el| el.checked.unwrap_or(false)))
    }

    async fn is_displayed(&self, ctx: &FrameContext, locator: &Locator) -> Result<Option<bool>> {
        let state = self.state();
        Ok(state.doc(ctx)?.find(locator).map(|el| !el.hidden))
    }

    async fn click(&self, ctx: &FrameContext, locator: &Locator) -> Result<bool> {
        let on_click = {
            let mut state = self.state();
            let Some(element) = state.doc_mut(ctx)?.find_mut(locator) else {
                return Ok(false);
            };
            if let Some(checked) = element.checked.as_mut() {
                *checked = !*checked;
            }
            let on_click = element.on_click.clone();
            state.clicks.push(format!("{}|{}", ctx, locator));
            on_click
        };
        if let Some(script) = on_click {
            self.fire(&script, ctx);
        }
        Ok(true)
    }

    async fn type_text(&self, ctx: &FrameContext, locator: &Locator, text: &str) -> Result<bool> {
        self.set_value(ctx, locator, text).await
    }

    async fn set_value(&self, ctx: &FrameContext, locator: &Locator, value: &str) -> Result<bool> {
        let mut state = self.state();
        let Some(element) = state.doc_mut(ctx)?.find_mut(locator) else {
            return Ok(false);
        };
        element.value = value.to_string();
        state.values.push((locator.to_string(), value.to_string()));
        Ok(true)
    }

    async fn set_checked(
        &self,
        ctx: &FrameContext,
        locator: &Locator,
        checked: bool,
    ) -> Result<bool> {
        let mut state = self.state();
        let Some(element) = state.doc_mut(ctx)?.find_mut(locator) else {
            return Ok(false);
        };
        element.checked = Some(checked);
        Ok(true)
    }

    async fn dispatch(&self, ctx: &FrameContext, script: &str) -> Result<()> {
        self.run_script(ctx, script)
    }

    async fn accept_dialog(&self, window: &WindowHandle) -> Result<Option<String>> {
        let mut state = self.state();
        let message = state.dialogs.remove(window.as_str());
        if let Some(message) = &message {
            state.accepted_dialogs.push(message.clone());
        }
        Ok(message)
    }

    async fn screenshot(&self, window: &WindowHandle, path: &Path) -> Result<()> {
        let mut state = self.state();
        if !state.has_window(window.as_str()) {
            return Err(Error::WindowNotFound(window.to_string()));
        }
        state.screenshots.push(path.to_path_buf());
        Ok(())
    }
}
