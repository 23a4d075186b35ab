//! Browser front-end of the RoboTRAC viewer: host page wiring around the
//! script injection done by `robotrac_core`.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;

use robotrac_core::draw::{self, FrameSelection};
use robotrac_core::{ScriptError, ShapeDescriptor, ShapeKind};

mod constants;
mod dom;
mod forms;
mod frames;
mod overlays;
mod state;
mod upload;
mod utils;
mod viewer;

use constants::DATASET_PARAM;
use frames::PageFrames;
use state::{STATE, State};
use utils::{fetch_text_with_fallbacks, get_query_param, log, report_all};

fn attach_ui(state: Rc<RefCell<State>>) -> Result<(), JsValue> {
    upload::attach_file_input(state.clone())?;
    viewer::attach(state.clone())?;
    forms::attach(state.clone())?;
    overlays::attach(state)?;
    Ok(())
}

fn to_js(e: ScriptError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn with_state<T>(f: impl FnOnce(&State) -> Result<T, JsValue>) -> Result<T, JsValue> {
    STATE.with(|st| match st.borrow().as_ref() {
        Some(rc) => f(&rc.borrow()),
        None => Err(JsValue::from_str("viewer not started")),
    })
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;
    let requested = window
        .location()
        .search()
        .ok()
        .and_then(|search| get_query_param(&search, DATASET_PARAM));

    let state = Rc::new(RefCell::new(State::new(window.clone(), document)));
    STATE.with(|st| st.replace(Some(state.clone())));
    {
        let mut s = state.borrow_mut();
        viewer::populate_datasets(&s.document, &s.catalog, requested.as_deref());
        viewer::show_dataset(&mut s, requested.as_deref());
    }
    attach_ui(state.clone())?;

    // A catalog next to the page replaces the built-in one.
    wasm_bindgen_futures::spawn_local(async move {
        let urls = viewer::catalog_urls();
        let urls: Vec<&str> = urls.iter().map(String::as_str).collect();
        let Some(text) = fetch_text_with_fallbacks(&window, &urls).await else {
            log("no dataset catalog found, using the built-in list");
            return;
        };
        let mut s = state.borrow_mut();
        upload::load_catalog(&mut s, &text);
        if let Some(id) = requested.as_deref()
            && s.catalog.get(id).is_some()
        {
            viewer::populate_datasets(&s.document, &s.catalog, Some(id));
            viewer::show_dataset(&mut s, Some(id));
        }
    });
    Ok(())
}

/// Draw a shape given in the bridge encoding (`Kind,p1,..,p6,#rrggbb`) on
/// `frames` (`both`, `title1` or `title2`). Returns how many frames took it.
#[wasm_bindgen]
pub fn draw_shape(encoded: &str, frames: &str) -> Result<u32, JsValue> {
    let shape = ShapeDescriptor::decode(encoded).map_err(to_js)?;
    let selection: FrameSelection = frames.parse().map_err(to_js)?;
    with_state(|s| {
        let reports = draw::draw(&PageFrames::new(s.document.clone()), &selection, &shape);
        let done = reports.iter().filter(|r| r.result.is_ok()).count() as u32;
        let results: Vec<_> = reports.into_iter().map(|r| (r.frame, r.result)).collect();
        report_all(&s.document, &format!("Draw {}", shape.kind), &results);
        Ok(done)
    })
}

/// Remove drawn shapes of `kind` (`Line`, `Sphere` or `Plane`) from `frames`.
#[wasm_bindgen]
pub fn clear_shapes(kind: &str, frames: &str) -> Result<u32, JsValue> {
    let kind: ShapeKind = kind.parse().map_err(to_js)?;
    let selection: FrameSelection = frames.parse().map_err(to_js)?;
    with_state(|s| {
        let reports = draw::clear(&PageFrames::new(s.document.clone()), &selection, kind);
        let done = reports.iter().filter(|r| r.result.is_ok()).count() as u32;
        let results: Vec<_> = reports.into_iter().map(|r| (r.frame, r.result)).collect();
        report_all(&s.document, &format!("Clear {kind}"), &results);
        Ok(done)
    })
}

/// Load a dataset catalog given as JSON text.
#[wasm_bindgen]
pub fn load_catalog(json: &str) -> Result<(), JsValue> {
    STATE.with(|st| match st.borrow().as_ref() {
        Some(rc) => {
            upload::load_catalog(&mut rc.borrow_mut(), json);
            Ok(())
        }
        None => Err(JsValue::from_str("viewer not started")),
    })
}
