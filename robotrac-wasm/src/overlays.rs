//! Top-arrow helper and canvas background, applied to both viewers.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::Document;

use robotrac_core::FrameSet;
use robotrac_core::ids::{TOP_ARROW_TEMPLATE, VIEWER_FRAMES};
use robotrac_core::overlay::{Rgba, inject_top_arrow, set_background, set_top_arrow};

use crate::constants::{BACKGROUND_ALPHA, BACKGROUND_COLOR, TOP_ARROW_CHECKBOX};
use crate::dom;
use crate::frames::PageFrames;
use crate::state::State;
use crate::utils::{report, report_all, warn};

/// Inject the helper into every loaded viewer. The script text is kept in a
/// template element of the host page.
pub fn inject_top_arrows(doc: &Document) {
    let Some(template) = doc
        .get_element_by_id(TOP_ARROW_TEMPLATE)
        .map(|el| el.inner_html())
    else {
        warn("no top-arrow template on the page");
        return;
    };
    let frames = PageFrames::new(doc.clone());
    for id in VIEWER_FRAMES {
        if let Err(e) = inject_top_arrow(frames.frame(id).as_ref(), id, &template) {
            warn(&format!("{id}: {e}"));
        }
    }
}

pub fn show_top_arrows(doc: &Document, visible: bool) {
    let frames = PageFrames::new(doc.clone());
    let results: Vec<_> = VIEWER_FRAMES
        .iter()
        .map(|id| (id.to_string(), set_top_arrow(frames.frame(id).as_ref(), id, visible)))
        .collect();
    report_all(doc, "Top arrow", &results);
}

fn read_background(doc: &Document, current: Rgba) -> Result<Rgba, String> {
    let mut color = current;
    if let Some(hex) = dom::input_value(doc, BACKGROUND_COLOR) {
        let rgb = hex
            .parse::<robotrac_core::Rgb>()
            .map_err(|e| e.to_string())?;
        color.r = rgb.r;
        color.g = rgb.g;
        color.b = rgb.b;
    }
    if dom::input_value(doc, BACKGROUND_ALPHA).is_some() {
        let a = dom::input_number(doc, BACKGROUND_ALPHA)?;
        if !(0.0..=1.0).contains(&a) {
            return Err("alpha must be within 0..=1".into());
        }
        color.a = a;
    }
    Ok(color)
}

pub fn apply_background(doc: &Document, color: Rgba) {
    let frames = PageFrames::new(doc.clone());
    let results: Vec<_> = VIEWER_FRAMES
        .iter()
        .map(|id| (id.to_string(), set_background(frames.frame(id).as_ref(), id, color)))
        .collect();
    report_all(doc, "Background", &results);
}

pub fn attach(state: Rc<RefCell<State>>) -> Result<(), JsValue> {
    let doc = state.borrow().document.clone();

    // The helper disappears with every reload of a viewer.
    let frames = PageFrames::new(doc.clone());
    for id in VIEWER_FRAMES {
        let Some(iframe) = frames.iframe(id) else { continue };
        let st = state.clone();
        let onload = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            let s = st.borrow();
            inject_top_arrows(&s.document);
            if s.top_arrow {
                show_top_arrows(&s.document, true);
            }
        }));
        iframe.add_event_listener_with_callback("load", onload.as_ref().unchecked_ref())?;
        onload.forget();
    }

    let st = state.clone();
    dom::on(&doc, TOP_ARROW_CHECKBOX, "change", move |_e| {
        let mut s = st.borrow_mut();
        s.top_arrow = dom::is_checked(&s.document, TOP_ARROW_CHECKBOX);
        show_top_arrows(&s.document, s.top_arrow);
    })?;

    for id in [BACKGROUND_COLOR, BACKGROUND_ALPHA] {
        let st = state.clone();
        dom::on(&doc, id, "input", move |_e| {
            let mut s = st.borrow_mut();
            match read_background(&s.document, s.background) {
                Ok(color) => {
                    s.background = color;
                    apply_background(&s.document, color);
                }
                Err(e) => report(&s.document, &format!("Background: {e}"), true),
            }
        })?;
    }
    Ok(())
}
