//! Browser control surface.
//!
//! Everything above this crate talks to the browser through [`Driver`]. Calls never rely on
//! an implicit "current" window or frame: each one names the [`FrameContext`] it acts in, so
//! focus tracking stays with the caller.

use crate::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Opaque identifier of a top-level browser window (a CDP page target)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowHandle(String);

impl WindowHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A window plus the chain of frame names from its document root
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameContext {
    pub window: WindowHandle,
    pub frames: Vec<String>,
}

impl FrameContext {
    /// Top-level document of `window`
    pub fn root(window: WindowHandle) -> Self {
        Self {
            window,
            frames: Vec::new(),
        }
    }

    /// Context of the named child frame inside this one
    pub fn child(&self, name: &str) -> Self {
        let mut frames = self.frames.clone();
        frames.push(name.to_string());
        Self {
            window: self.window.clone(),
            frames,
        }
    }
}

impl fmt::Display for FrameContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frames.is_empty() {
            write!(f, "{}:<root>", self.window)
        } else {
            write!(f, "{}:{}", self.window, self.frames.join("/"))
        }
    }
}

/// How an element is looked up
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Locator {
    Id(String),
    Name(String),
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn id(value: impl Into<String>) -> Self {
        Locator::Id(value.into())
    }

    pub fn name(value: impl Into<String>) -> Self {
        Locator::Name(value.into())
    }

    pub fn css(value: impl Into<String>) -> Self {
        Locator::Css(value.into())
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Locator::XPath(value.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(v) => write!(f, "#{}", v),
            Locator::Name(v) => write!(f, "[name={}]", v),
            Locator::Css(v) => write!(f, "css:{}", v),
            Locator::XPath(v) => write!(f, "xpath:{}", v),
        }
    }
}

/// Browser operations the automation needs.
///
/// Element operations act on the first match of the locator. A missing element is not an
/// error: lookups return `None`/`false`/`0` and the caller decides what absence means.
/// Errors are reserved for a broken connection, an unavailable frame, or a script fault.
#[async_trait]
pub trait Driver: Send + Sync {
    /// The window the browser was opened with
    async fn active_window(&self) -> Result<WindowHandle>;

    async fn window_handles(&self) -> Result<Vec<WindowHandle>>;

    async fn navigate(&self, window: &WindowHandle, url: &str) -> Result<()>;

    async fn close_window(&self, window: &WindowHandle) -> Result<()>;

    /// Whether a child frame called `name` is loaded inside `ctx`
    async fn has_frame(&self, ctx: &FrameContext, name: &str) -> Result<bool>;

    async fn count(&self, ctx: &FrameContext, locator: &Locator) -> Result<usize>;

    /// Rendered text of the first match
    async fn text(&self, ctx: &FrameContext, locator: &Locator) -> Result<Option<String>>;

    async fn attribute(
        &self,
        ctx: &FrameContext,
        locator: &Locator,
        name: &str,
    ) -> Result<Option<String>>;

    /// Attribute of every match, in document order
    async fn attributes(
        &self,
        ctx: &FrameContext,
        locator: &Locator,
        name: &str,
    ) -> Result<Vec<Option<String>>>;

    async fn is_checked(&self, ctx: &FrameContext, locator: &Locator) -> Result<Option<bool>>;

    async fn is_displayed(&self, ctx: &FrameContext, locator: &Locator) -> Result<Option<bool>>;

    /// User-style click; `false` when nothing matched
    async fn click(&self, ctx: &FrameContext, locator: &Locator) -> Result<bool>;

    /// Clear the field and type `text`, firing input events
    async fn type_text(&self, ctx: &FrameContext, locator: &Locator, text: &str) -> Result<bool>;

    /// Assign the `value` property directly, without firing events
    async fn set_value(&self, ctx: &FrameContext, locator: &Locator, value: &str) -> Result<bool>;

    /// Assign the `checked` property directly, without firing events
    async fn set_checked(&self, ctx: &FrameContext, locator: &Locator, checked: bool)
    -> Result<bool>;

    /// Schedule a script in the frame's global scope without waiting for it.
    ///
    /// Used for page actions that may open a native dialog or a new window, which would
    /// otherwise block evaluation until the dialog is handled.
    async fn dispatch(&self, ctx: &FrameContext, script: &str) -> Result<()>;

    /// Accept the pending native dialog of `window`, returning its message
    async fn accept_dialog(&self, window: &WindowHandle) -> Result<Option<String>>;

    async fn screenshot(&self, window: &WindowHandle, path: &Path) -> Result<()>;
}
