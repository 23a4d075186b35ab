//! Dataset selection, the slice slider and the buttons acting on both viewer
//! frames at once.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Element, Event, HtmlIFrameElement, HtmlImageElement, HtmlInputElement,
    HtmlOptionElement, HtmlSelectElement, PointerEvent, PointerEventInit, WheelEvent,
    WheelEventInit,
};

use robotrac_core::FrameSet;
use robotrac_core::catalog::{Catalog, Layout};
use robotrac_core::grid::{GridExtent, SliderPosition};
use robotrac_core::ids::{
    FRAME_GROUND_TRUTH, FRAME_PREDICTED, RESET_CAMERA_BUTTON, ROTATE_CHECKBOX, TEMP_STYLE,
    VIEWER_FRAMES,
};

use crate::constants::*;
use crate::dom;
use crate::frames::PageFrames;
use crate::state::State;
use crate::utils::{asset_url, base_url, log, report, warn};

/// Canvas the widget renders into inside each viewer document.
const WIDGET_CANVAS: &str = "myCanvas";

const FORWARDED_POINTER_EVENTS: [&str; 4] =
    ["pointerdown", "pointermove", "pointerup", "pointercancel"];

pub fn populate_datasets(doc: &Document, catalog: &Catalog, selected: Option<&str>) {
    let Some(select) = doc
        .get_element_by_id(DATASET_SELECT)
        .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
    else {
        return;
    };
    select.set_inner_html("");
    for d in &catalog.datasets {
        let Ok(option) = HtmlOptionElement::new_with_text_and_value(&d.label(), &d.id) else {
            continue;
        };
        option.set_selected(selected == Some(d.id.as_str()));
        let _ = select.append_child(&option);
    }
}

fn set_frame_src(doc: &Document, id: &str, src: &str) {
    if let Some(frame) = PageFrames::new(doc.clone()).iframe(id)
        && frame.src() != src
    {
        frame.set_src(src);
    }
}

fn set_image_src(doc: &Document, id: &str, src: &str) {
    if let Some(img) = doc
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<HtmlImageElement>().ok())
    {
        img.set_src(src);
    }
}

fn slider(doc: &Document) -> Option<HtmlInputElement> {
    let inputs = doc.get_elements_by_tag_name("input");
    (0..inputs.length())
        .filter_map(|i| inputs.item(i))
        .filter_map(|el| el.dyn_into::<HtmlInputElement>().ok())
        .find(|input| input.name() == SLIDER_NAME && input.type_() == "range")
}

/// Current slider range and value; `None` until the slider is on the page.
pub fn slider_position(doc: &Document) -> Option<SliderPosition> {
    let input = slider(doc)?;
    let max = input.max().trim().parse::<u32>().ok()?;
    let value = input.value().trim().parse::<u32>().ok()?;
    Some(SliderPosition { max, value })
}

/// Show the dataset `id`, falling back to the first one in the catalog.
pub fn show_dataset(state: &mut State, id: Option<&str>) {
    let Some(dataset) = state.catalog.get_or_first(id).cloned() else {
        warn("catalog has no datasets");
        return;
    };
    let doc = state.document.clone();
    let paths = dataset.paths(&base_url());
    let comparison = dataset.layout() == Layout::Comparison;
    dom::set_visible(&doc, COMPARISON_VIEW, comparison);
    dom::set_visible(&doc, SINGLE_VIEW, !comparison);
    if comparison {
        set_frame_src(&doc, FRAME_GROUND_TRUTH, &paths.ground_truth());
        set_frame_src(&doc, FRAME_PREDICTED, &paths.predicted());
    } else {
        set_frame_src(&doc, EXPERIMENT_FRAME, &paths.experiment());
    }
    if state.dataset.as_ref().is_some_and(|d| d.id != dataset.id) {
        state.index = 1;
    }
    state.index = dataset.clamp_index(state.index);
    if let Some(input) = slider(&doc) {
        input.set_min("1");
        input.set_max(&dataset.max_index().to_string());
        input.set_value(&state.index.to_string());
    }
    log(&format!("showing {}", dataset.label()));
    state.dataset = Some(dataset);
    show_slice(state);
}

/// Point the slice images at the slider's current index.
pub fn show_slice(state: &State) {
    let Some(dataset) = &state.dataset else { return };
    let src = dataset.paths(&base_url()).slice_image(state.index);
    set_image_src(&state.document, SLICE_IMAGE, &src);
    set_image_src(&state.document, SINGLE_SLICE_IMAGE, &src);
}

/// Bounding grid of the Ground Truth scene, read from its axis labels.
pub fn grid_extent(frames: &PageFrames) -> Option<GridExtent> {
    let labels = frames.frame(FRAME_GROUND_TRUTH)?.axis_labels();
    GridExtent::from_axis_labels(&labels)
}

/// Fold (`true`) or expand the widget's control panels in both viewers.
pub fn fold_panels(frames: &PageFrames, fold: bool) {
    for id in VIEWER_FRAMES {
        if let Some(frame) = frames.frame(id) {
            frame.toggle_panels(fold);
        }
    }
}

pub fn reset_cameras(frames: &PageFrames) {
    for id in VIEWER_FRAMES {
        match frames.frame(id) {
            Some(frame) => {
                frame.click_widget_button(WIDGET_RESET_CAMERA);
            }
            None => warn(&format!("{id}: not loaded, camera not reset")),
        }
    }
    fold_panels(frames, true);
}

pub fn reload_frames(frames: &PageFrames) {
    for id in VIEWER_FRAMES {
        if let Some(frame) = frames.iframe(id)
            && let Some(window) = frame.content_window()
            && window.location().reload().is_err()
        {
            warn(&format!("{id}: reload refused"));
        }
    }
    fold_panels(frames, true);
}

/// Insert or remove the style sheet that routes pointer events over the
/// viewers to the host page. Returns whether simultaneous mode is on.
pub fn set_simultaneous(doc: &Document, on: bool) -> bool {
    let frames = PageFrames::new(doc.clone());
    if on && VIEWER_FRAMES.iter().any(|id| frames.iframe(id).is_none()) {
        return false;
    }
    while let Some(sheet) = doc.get_element_by_id(TEMP_STYLE) {
        sheet.remove();
    }
    if !on {
        return false;
    }
    fold_panels(&frames, true);
    let Some(body) = doc.body() else { return false };
    let Ok(sheet) = doc.create_element("style") else {
        return false;
    };
    sheet.set_id(TEMP_STYLE);
    sheet.set_inner_html(SIMULTANEOUS_STYLE);
    body.append_child(&sheet).is_ok()
}

// The viewers sit as the last child of their wrapper, which is what receives
// pointer events once the iframes stop taking them.
fn viewer_under(event: &Event) -> Option<HtmlIFrameElement> {
    let target: Element = event.target()?.dyn_into().ok()?;
    let frame: HtmlIFrameElement = target.last_element_child()?.dyn_into().ok()?;
    let id = frame.id().to_lowercase();
    VIEWER_FRAMES.contains(&id.as_str()).then_some(frame)
}

fn widget_canvases(frames: &PageFrames) -> Vec<Element> {
    VIEWER_FRAMES
        .iter()
        .filter_map(|id| frames.frame(id))
        .filter_map(|f| f.document().get_element_by_id(WIDGET_CANVAS))
        .collect()
}

fn forward_pointer(frames: &PageFrames, e: &PointerEvent) {
    let init = PointerEventInit::new();
    init.set_bubbles(true);
    init.set_cancelable(true);
    init.set_client_x(e.client_x());
    init.set_client_y(e.client_y());
    init.set_screen_x(e.screen_x());
    init.set_screen_y(e.screen_y());
    init.set_button(e.button());
    init.set_buttons(e.buttons());
    init.set_ctrl_key(e.ctrl_key());
    init.set_shift_key(e.shift_key());
    init.set_pointer_id(e.pointer_id());
    init.set_pointer_type(&e.pointer_type());
    init.set_is_primary(e.is_primary());
    for canvas in widget_canvases(frames) {
        if let Ok(copy) = PointerEvent::new_with_event_init_dict(&e.type_(), &init) {
            let _ = canvas.dispatch_event(&copy);
        }
    }
}

fn forward_wheel(frames: &PageFrames, e: &WheelEvent) {
    let init = WheelEventInit::new();
    init.set_bubbles(true);
    init.set_cancelable(true);
    init.set_client_x(e.client_x());
    init.set_client_y(e.client_y());
    init.set_delta_x(e.delta_x());
    init.set_delta_y(e.delta_y());
    init.set_delta_mode(e.delta_mode());
    for canvas in widget_canvases(frames) {
        if let Ok(copy) = WheelEvent::new_with_event_init_dict(&e.type_(), &init) {
            let _ = canvas.dispatch_event(&copy);
        }
    }
}

/// Replay a pointer or wheel event over one viewer on both widget canvases,
/// so the two cameras move together.
fn forward(doc: &Document, event: &Event) {
    if !dom::is_checked(doc, ROTATE_CHECKBOX) || viewer_under(event).is_none() {
        return;
    }
    let frames = PageFrames::new(doc.clone());
    fold_panels(&frames, true);
    if let Some(e) = event.dyn_ref::<WheelEvent>() {
        forward_wheel(&frames, e);
    } else if let Some(e) = event.dyn_ref::<PointerEvent>() {
        forward_pointer(&frames, e);
    }
}

fn detach(doc: &Document, event: &Event) {
    let Some(iframe) = viewer_under(event) else { return };
    if let Some(frame) = PageFrames::new(doc.clone()).frame(&iframe.id()) {
        frame.click_widget_button(WIDGET_DETACH);
    }
}

pub fn attach(state: Rc<RefCell<State>>) -> Result<(), JsValue> {
    let doc = state.borrow().document.clone();

    let st = state.clone();
    dom::on(&doc, DATASET_SELECT, "change", move |_e| {
        let mut s = st.borrow_mut();
        let id = dom::input_value(&s.document, DATASET_SELECT);
        show_dataset(&mut s, id.as_deref());
    })?;

    if let Some(input) = slider(&doc) {
        let st = state.clone();
        let cb = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            let mut s = st.borrow_mut();
            if let Some(pos) = slider_position(&s.document) {
                s.index = pos.value;
                show_slice(&s);
            }
        }));
        input.add_event_listener_with_callback("input", cb.as_ref().unchecked_ref())?;
        cb.forget();
    }

    let d = doc.clone();
    dom::on(&doc, RELOAD_BUTTON, "click", move |_e| {
        reload_frames(&PageFrames::new(d.clone()));
    })?;

    let d = doc.clone();
    dom::on(&doc, RESET_CAMERA_BUTTON, "click", move |_e| {
        reset_cameras(&PageFrames::new(d.clone()));
    })?;

    let d = doc.clone();
    dom::on(&doc, ROTATE_CHECKBOX, "change", move |_e| {
        let wanted = dom::is_checked(&d, ROTATE_CHECKBOX);
        let on = set_simultaneous(&d, wanted);
        if wanted && !on {
            if let Some(input) = d
                .get_element_by_id(ROTATE_CHECKBOX)
                .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
            {
                input.set_checked(false);
            }
            report(&d, "Simultaneous frames need both viewers", true);
        }
    })?;

    for event in FORWARDED_POINTER_EVENTS.into_iter().chain(["wheel"]) {
        let d = doc.clone();
        dom::on(&doc, VIEWERS, event, move |e| forward(&d, &e))?;
    }

    let d = doc.clone();
    dom::on(&doc, VIEWERS, "dblclick", move |e| detach(&d, &e))?;

    Ok(())
}

/// Asset URL of the catalog, with the fallbacks tried at start-up.
pub fn catalog_urls() -> Vec<String> {
    vec![
        asset_url(CATALOG_FILE),
        format!("/{CATALOG_FILE}"),
        CATALOG_FILE.to_string(),
    ]
}
