use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Event, HtmlElement};

// Form controls of both documents are read and written through the `value`
// property so buttons, inputs and selects share one path.
pub fn get_value(el: &JsValue) -> Option<String> {
    js_sys::Reflect::get(el, &JsValue::from_str("value"))
        .ok()?
        .as_string()
}

pub fn set_value(el: &JsValue, value: &str) -> bool {
    js_sys::Reflect::set(el, &JsValue::from_str("value"), &JsValue::from_str(value))
        .unwrap_or(false)
}

pub fn input_value(doc: &Document, id: &str) -> Option<String> {
    get_value(doc.get_element_by_id(id)?.as_ref())
}

pub fn input_number(doc: &Document, id: &str) -> Result<f64, String> {
    let raw = input_value(doc, id).ok_or_else(|| format!("field `{id}` not found"))?;
    raw.trim()
        .parse::<f64>()
        .map_err(|_| format!("field `{id}` is not a number: `{raw}`"))
}

pub fn set_input_value(doc: &Document, id: &str, value: &str) {
    if let Some(el) = doc.get_element_by_id(id) {
        set_value(el.as_ref(), value);
    }
}

pub fn is_checked(doc: &Document, id: &str) -> bool {
    doc.get_element_by_id(id)
        .and_then(|el| js_sys::Reflect::get(el.as_ref(), &JsValue::from_str("checked")).ok())
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

pub fn set_text(doc: &Document, id: &str, text: &str) {
    if let Some(el) = html_element(doc, id) {
        el.set_inner_text(text);
    }
}

pub fn html_element(doc: &Document, id: &str) -> Option<HtmlElement> {
    doc.get_element_by_id(id)?.dyn_into::<HtmlElement>().ok()
}

pub fn click(el: &Element) -> bool {
    match el.dyn_ref::<HtmlElement>() {
        Some(el) => {
            el.click();
            true
        }
        None => false,
    }
}

pub fn set_visible(doc: &Document, id: &str, visible: bool) {
    if let Some(el) = html_element(doc, id) {
        let _ = el
            .style()
            .set_property("display", if visible { "" } else { "none" });
    }
}

/// Attach `handler` to `event` on the element with `id`. Missing elements are
/// skipped so partial page layouts still start.
pub fn on<F>(doc: &Document, id: &str, event: &str, handler: F) -> Result<(), JsValue>
where
    F: FnMut(Event) + 'static,
{
    let Some(el) = doc.get_element_by_id(id) else {
        return Ok(());
    };
    let cb = Closure::<dyn FnMut(Event)>::wrap(Box::new(handler));
    el.add_event_listener_with_callback(event, cb.as_ref().unchecked_ref())?;
    cb.forget();
    Ok(())
}
