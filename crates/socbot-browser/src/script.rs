//! JavaScript snippets evaluated by [`crate::CdpDriver`].
//!
//! Every snippet is an IIFE that first walks the frame path from the top-level window, then
//! runs its body against that frame's `document`. Frame lookups go through the DOM rather
//! than CDP execution contexts, which keeps a frame path a plain list of names.

use crate::driver::Locator;
use crate::{Error, Result};
use serde::Serialize;
use serde_json::Value;

/// Key of the sentinel object returned when a frame on the path is missing
pub const FRAME_ERROR_KEY: &str = "__socbot_frame_error";

const PRELUDE: &str = r#"(function() {
  var frameOf = function(win, name) {
    var q = '[name=' + JSON.stringify(name) + ']';
    var el = win.document.querySelector('iframe' + q + ',frame' + q) || win.document.getElementById(name);
    if (!el || !el.contentWindow) { return null; }
    try { return el.contentWindow.document ? el.contentWindow : null; } catch (e) { return null; }
  };
  var w = window;
  var path = __PATH__;
  for (var i = 0; i < path.length; i++) {
    var next = frameOf(w, path[i]);
    if (!next) { return { "__socbot_frame_error": path.slice(0, i + 1).join('/') }; }
    w = next;
  }
  var doc = w.document;
  var find = function(loc) {
    switch (loc.kind) {
      case 'id': var e = doc.getElementById(loc.value); return e ? [e] : [];
      case 'name': return Array.prototype.slice.call(doc.getElementsByName(loc.value));
      case 'css': return Array.prototype.slice.call(doc.querySelectorAll(loc.value));
      case 'xpath':
        var snap = doc.evaluate(loc.value, doc, null, 7, null);
        var out = [];
        for (var j = 0; j < snap.snapshotLength; j++) { out.push(snap.snapshotItem(j)); }
        return out;
    }
    return [];
  };
  __BODY__
})()"#;

fn json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Wrap `body` so it runs inside the frame reached through `frames`
pub fn scoped(frames: &[String], body: &str) -> Result<String> {
    Ok(PRELUDE
        .replace("__PATH__", &json(frames)?)
        .replace("__BODY__", body))
}

fn with_first(frames: &[String], locator: &Locator, body: &str) -> Result<String> {
    scoped(
        frames,
        &format!("var el = find({})[0];\n  {}", json(locator)?, body),
    )
}

pub fn has_frame(frames: &[String], name: &str) -> Result<String> {
    scoped(frames, &format!("return frameOf(w, {}) !== null;", json(name)?))
}

pub fn count(frames: &[String], locator: &Locator) -> Result<String> {
    scoped(frames, &format!("return find({}).length;", json(locator)?))
}

pub fn text(frames: &[String], locator: &Locator) -> Result<String> {
    with_first(
        frames,
        locator,
        "return el ? String(el.innerText || el.textContent || '') : null;",
    )
}

pub fn attribute(frames: &[String], locator: &Locator, name: &str) -> Result<String> {
    with_first(
        frames,
        locator,
        &format!("return el ? el.getAttribute({}) : null;", json(name)?),
    )
}

pub fn attributes(frames: &[String], locator: &Locator, name: &str) -> Result<String> {
    scoped(
        frames,
        &format!(
            "var attr = {};\n  return find({}).map(function(el) {{ return el.getAttribute(attr); }});",
            json(name)?,
            json(locator)?
        ),
    )
}

pub fn is_checked(frames: &[String], locator: &Locator) -> Result<String> {
    with_first(frames, locator, "return el ? !!el.checked : null;")
}

pub fn is_displayed(frames: &[String], locator: &Locator) -> Result<String> {
    with_first(
        frames,
        locator,
        "if (!el) { return null; }\n  var style = w.getComputedStyle(el);\n  return style.display !== 'none' && style.visibility !== 'hidden' && el.getClientRects().length > 0;",
    )
}

pub fn click(frames: &[String], locator: &Locator) -> Result<String> {
    with_first(
        frames,
        locator,
        "if (!el) { return false; }\n  if (el.scrollIntoView) { el.scrollIntoView({ block: 'center' }); }\n  el.click();\n  return true;",
    )
}

pub fn type_text(frames: &[String], locator: &Locator, text: &str) -> Result<String> {
    with_first(
        frames,
        locator,
        &format!(
            "if (!el) {{ return false; }}\n  el.focus();\n  el.value = '';\n  el.value = {};\n  el.dispatchEvent(new w.Event('input', {{ bubbles: true }}));\n  el.dispatchEvent(new w.Event('change', {{ bubbles: true }}));\n  return true;",
            json(text)?
        ),
    )
}

pub fn set_value(frames: &[String], locator: &Locator, value: &str) -> Result<String> {
    with_first(
        frames,
        locator,
        &format!("if (!el) {{ return false; }}\n  el.value = {};\n  return true;", json(value)?),
    )
}

pub fn set_checked(frames: &[String], locator: &Locator, checked: bool) -> Result<String> {
    with_first(
        frames,
        locator,
        &format!("if (!el) {{ return false; }}\n  el.checked = {};\n  return true;", checked),
    )
}

pub fn dispatch(frames: &[String], source: &str) -> Result<String> {
    scoped(
        frames,
        &format!(
            "var source = {};\n  w.setTimeout(function() {{ w.eval(source); }}, 0);\n  return null;",
            json(source)?
        ),
    )
}

/// Turn the frame sentinel into [`Error::Frame`]
pub fn check_frame(value: &Value) -> Result<()> {
    if let Some(path) = value.get(FRAME_ERROR_KEY) {
        return Err(Error::Frame(
            path.as_str().unwrap_or("<unknown>").to_string(),
        ));
    }
    Ok(())
}
