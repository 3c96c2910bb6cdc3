//! In-page scripts used by the extractor and their payload decoding.

use serde::Deserialize;
use serde_json::Value;
use webprobe_core_types::{ExtractionReport, InteractiveElement};

use crate::error::CdpAdapterError;

/// Liveness probe for the extraction capability.
pub const PING_SCRIPT: &str =
    "(() => typeof document !== 'undefined' && !!document.documentElement)()";

/// Element discovery. Called with the maximum visible-text length.
const EXTRACT_FN: &str = r#"(maxText) => {
  const SELECTOR = 'a[href], button, input:not([type="hidden"]), select, textarea, [role="button"], [role="link"]';
  const clean = (value) => (value || '').replace(/\s+/g, ' ').trim();
  const truncate = (value) => value.length > maxText ? value.slice(0, maxText) : value;
  const classesOf = (el) => Array.from(el.classList || []).filter(Boolean);
  const kindOf = (el) => {
    const tag = el.tagName.toLowerCase();
    const role = (el.getAttribute('role') || '').toLowerCase();
    if (tag === 'a' || role === 'link') return 'link';
    if (tag === 'button' || role === 'button') return 'button';
    if (tag === 'input') {
      const type = (el.getAttribute('type') || 'text').toLowerCase();
      return ['submit', 'button', 'reset', 'image'].includes(type) ? 'button' : 'input';
    }
    if (tag === 'select') return 'select';
    if (tag === 'textarea') return 'textarea';
    return 'button';
  };
  const visible = (el, rect) => {
    if (rect.width <= 0 || rect.height <= 0) return false;
    if (rect.bottom < 0 || rect.right < 0) return false;
    if (rect.top > window.innerHeight || rect.left > window.innerWidth) return false;
    const style = window.getComputedStyle(el);
    return style.visibility !== 'hidden' && style.display !== 'none' && style.pointerEvents !== 'none';
  };
  const elements = [];
  for (const el of document.querySelectorAll(SELECTOR)) {
    if (el.disabled) continue;
    const rect = el.getBoundingClientRect();
    if (!visible(el, rect)) continue;
    const type = kindOf(el);
    const text = truncate(clean(el.innerText || el.value || el.getAttribute('aria-label') || el.getAttribute('placeholder') || el.getAttribute('title')));
    const ancestors = [];
    let parent = el.parentElement;
    while (parent && ancestors.length < 3) {
      ancestors.push({ tag: parent.tagName.toLowerCase(), classes: classesOf(parent) });
      parent = parent.parentElement;
    }
    elements.push({
      index: elements.length,
      type,
      text,
      href: type === 'link' ? el.getAttribute('href') : null,
      x: rect.left + rect.width / 2,
      y: rect.top + rect.height / 2,
      rect: { x: rect.left, y: rect.top, width: rect.width, height: rect.height },
      tag: el.tagName.toLowerCase(),
      classes: classesOf(el),
      ancestors,
    });
  }
  return { url: window.location.href, title: document.title || '', elements };
}"#;

pub fn extraction_script(max_text_len: usize) -> String {
    format!("({})({})", EXTRACT_FN, max_text_len)
}

#[derive(Debug, Deserialize)]
struct ScriptPayload {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    elements: Vec<InteractiveElement>,
}

/// Decode the extraction script result into a report without error lists.
pub fn parse_extraction(value: Value) -> Result<ExtractionReport, CdpAdapterError> {
    if value.is_null() {
        return Err(CdpAdapterError::Payload(
            "extraction script returned null".to_string(),
        ));
    }
    let payload: ScriptPayload = serde_json::from_value(value)
        .map_err(|err| CdpAdapterError::Payload(err.to_string()))?;
    Ok(ExtractionReport {
        success: true,
        url: payload.url,
        title: payload.title,
        elements: payload.elements,
        console_errors: Vec::new(),
        network_errors: Vec::new(),
    })
}
