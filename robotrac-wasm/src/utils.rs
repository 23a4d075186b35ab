use std::fmt::Display;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, HtmlElement, Window};

use robotrac_core::ids::STATUS;

/// Log a message to the browser console.
pub fn log(s: &str) {
    web_sys::console::log_1(&JsValue::from_str(s));
}

pub fn warn(s: &str) {
    web_sys::console::warn_1(&JsValue::from_str(s));
}

pub fn error(s: &str) {
    web_sys::console::error_1(&JsValue::from_str(s));
}

/// Show `msg` in the page's status line and mirror it to the console.
pub fn report(document: &Document, msg: &str, is_error: bool) {
    if is_error {
        warn(msg);
    } else {
        log(msg);
    }
    if let Some(el) = document.get_element_by_id(STATUS)
        && let Ok(el) = el.dyn_into::<HtmlElement>()
    {
        el.set_inner_text(msg);
        let _ = el.set_attribute("data-error", if is_error { "true" } else { "false" });
    }
}

/// Report every per-frame outcome; errors do not stop the remaining frames.
pub fn report_all<T, E: Display>(document: &Document, action: &str, results: &[(String, Result<T, E>)]) {
    let mut failures = Vec::new();
    for (frame, result) in results {
        if let Err(e) = result {
            failures.push(format!("{frame}: {e}"));
        }
    }
    if failures.is_empty() {
        report(document, &format!("{action}: done"), false);
    } else {
        report(document, &format!("{action}: {}", failures.join("; ")), true);
    }
}

/// Ask before an action that discards what the user did in the frames.
pub fn confirm(window: &Window, msg: &str) -> bool {
    window.confirm_with_message(msg).unwrap_or(false)
}

/// Build an absolute URL for an asset, taking into account the optional
/// `window.__BASE_URL` which is set by the host page.
pub fn asset_url(path: &str) -> String {
    let p = path.trim();
    if p.starts_with("http://") || p.starts_with("https://") || p.starts_with("data:") {
        return p.to_string();
    }
    let base = base_url();
    let p = p.trim_start_matches('/');
    format!("{}/{}", base, p)
}

/// `window.__BASE_URL` without a trailing slash; empty when unset.
pub fn base_url() -> String {
    web_sys::window()
        .and_then(|w| {
            let v = js_sys::Reflect::get(&w, &JsValue::from_str("__BASE_URL")).ok()?;
            v.as_string()
        })
        .unwrap_or_default()
        .trim_end_matches('/')
        .to_string()
}

/// Fetch a text resource trying a list of fallback URLs in order.
pub async fn fetch_text_with_fallbacks(window: &Window, urls: &[&str]) -> Option<String> {
    for url in urls {
        let resp_value =
            match wasm_bindgen_futures::JsFuture::from(window.fetch_with_str(url)).await {
                Ok(v) => v,
                Err(_) => continue,
            };
        let resp: web_sys::Response = match resp_value.dyn_into() {
            Ok(r) => r,
            Err(_) => continue,
        };
        if !resp.ok() {
            continue;
        }
        if let Ok(text_promise) = resp.text()
            && let Ok(text_js) = wasm_bindgen_futures::JsFuture::from(text_promise).await
            && let Some(s) = text_js.as_string()
        {
            return Some(s);
        }
    }
    None
}

/// Simple query string parser used at start-up.
pub fn get_query_param(search: &str, key: &str) -> Option<String> {
    let s = search.trim_start_matches('?');
    for pair in s.split('&') {
        let mut it = pair.splitn(2, '=');
        let k = it.next()?;
        let v = it.next().unwrap_or("");
        if k == key {
            return Some(url_decode(v));
        }
    }
    None
}

fn url_decode(s: &str) -> String {
    let s = s.replace('+', " ");
    percent_encoding::percent_decode_str(&s)
        .decode_utf8_lossy()
        .to_string()
}
