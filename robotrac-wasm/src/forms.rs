//! The draw/clear form for each shape kind and the merge form.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlIFrameElement, Window};

use robotrac_core::draw::{self, DrawAction, FrameReport, FrameSelection};
use robotrac_core::ids::{
    FRAME_GROUND_TRUTH, FRAME_PREDICTED, MERGE_FRAME, MERGE_FRAME_DIV, PLANE_INFO,
    RESET_CAMERA_BUTTON, ROTATE_CHECKBOX,
};
use robotrac_core::merge::{MergeOptions, merge_frames};
use robotrac_core::{Rgb, ShapeDescriptor, ShapeKind};

use crate::constants::*;
use crate::dom;
use crate::frames::PageFrames;
use crate::state::State;
use crate::utils::{confirm, error, report, report_all};
use crate::viewer::{grid_extent, slider_position};

/// Field ids of one shape tab: the six numeric inputs and the colour picker.
struct ShapeFields {
    kind: ShapeKind,
    numbers: [&'static str; 6],
    color: &'static str,
}

const LINE_FIELDS: ShapeFields = ShapeFields {
    kind: ShapeKind::Line,
    numbers: ["x1", "y1", "z1", "x2", "y2", "z2"],
    color: "lineColor",
};

const SPHERE_FIELDS: ShapeFields = ShapeFields {
    kind: ShapeKind::Sphere,
    numbers: ["x3", "y3", "z3", "x4", "y4", "z4"],
    color: "sphereColor",
};

const PLANE_FIELDS: ShapeFields = ShapeFields {
    kind: ShapeKind::Plane,
    numbers: ["x5", "y5", "z5", "x6", "y6", "z6"],
    color: "planeColor",
};

fn fields(kind: ShapeKind) -> &'static ShapeFields {
    match kind {
        ShapeKind::Line => &LINE_FIELDS,
        ShapeKind::Sphere => &SPHERE_FIELDS,
        ShapeKind::Plane => &PLANE_FIELDS,
    }
}

fn color(doc: &Document, id: &str) -> Result<Rgb, String> {
    let raw = dom::input_value(doc, id).ok_or_else(|| format!("field `{id}` not found"))?;
    raw.parse::<Rgb>().map_err(|e| e.to_string())
}

fn selection(doc: &Document, kind: ShapeKind) -> FrameSelection {
    dom::input_value(doc, &format!("frames{kind}"))
        .and_then(|v| v.parse().ok())
        .unwrap_or_default()
}

/// Read a shape from its tab; field order matches the bridge encoding.
fn read_shape(doc: &Document, f: &ShapeFields) -> Result<ShapeDescriptor, String> {
    let mut params = [0.0; 6];
    for (p, id) in params.iter_mut().zip(f.numbers) {
        *p = dom::input_number(doc, id)?;
    }
    let paint = color(doc, f.color)?;
    ShapeDescriptor::from_params(f.kind, params, paint).map_err(|e| e.to_string())
}

/// The slice plane only takes opacity and colour from its tab; position comes
/// from the Ground Truth grid and the slider.
fn read_plane(doc: &Document) -> Result<ShapeDescriptor, String> {
    let frames = PageFrames::new(doc.clone());
    let extent = grid_extent(&frames).ok_or("Ground Truth grid not loaded yet")?;
    let slider = slider_position(doc).ok_or("slider not loaded yet")?;
    let opacity = dom::input_number(doc, PLANE_FIELDS.numbers[5])?;
    let paint = color(doc, PLANE_FIELDS.color)?;
    let (plane, slice) = robotrac_core::grid::plane_for_slice(extent, slider, opacity, paint)
        .map_err(|e| e.to_string())?;

    let p = plane.params;
    dom::set_input_value(doc, "z5", &p[2].to_string());
    dom::set_input_value(doc, "x6", &p[3].to_string());
    dom::set_input_value(doc, "y6", &p[4].to_string());
    dom::set_text(doc, PLANE_INFO, &format!("{PLANE_INFO_PREFIX}{} (Index: {slice})", p[2]));
    Ok(plane)
}

fn click_reset_camera(doc: &Document) {
    if let Some(btn) = doc.get_element_by_id(RESET_CAMERA_BUTTON) {
        dom::click(&btn);
    }
}

fn pairs(reports: Vec<FrameReport>) -> Vec<(String, robotrac_core::Result<DrawAction>)> {
    reports.into_iter().map(|r| (r.frame, r.result)).collect()
}

pub fn submit_draw(doc: &Document, window: &Window, kind: ShapeKind) {
    if !confirm(window, CONFIRM_DRAW) {
        return;
    }
    let shape = match kind {
        ShapeKind::Plane => read_plane(doc),
        _ => read_shape(doc, fields(kind)),
    };
    let shape = match shape {
        Ok(s) => s,
        Err(e) => {
            report(doc, &format!("Draw {kind}: {e}"), true);
            return;
        }
    };
    let frames = PageFrames::new(doc.clone());
    let reports = draw::draw(&frames, &selection(doc, kind), &shape);
    click_reset_camera(doc);
    report_all(doc, &format!("Draw {kind}"), &pairs(reports));
}

pub fn submit_clear(doc: &Document, window: &Window, kind: ShapeKind) {
    if !confirm(window, CONFIRM_CLEAR) {
        return;
    }
    if kind == ShapeKind::Plane {
        dom::set_text(doc, PLANE_INFO, PLANE_INFO_PREFIX);
    }
    let frames = PageFrames::new(doc.clone());
    let reports = draw::clear(&frames, &selection(doc, kind), kind);
    report_all(doc, &format!("Clear {kind}"), &pairs(reports));
}

/// Show the tab of `kind` and hide the others.
pub fn open_tab(doc: &Document, kind: ShapeKind) {
    for k in ShapeKind::ALL {
        dom::set_visible(doc, k.as_str(), k == kind);
    }
}

fn read_merge_options(doc: &Document, current: &MergeOptions) -> Result<MergeOptions, String> {
    let number = |id: &str, fallback: f64| match dom::input_value(doc, id) {
        Some(_) => dom::input_number(doc, id),
        None => Ok(fallback),
    };
    let rgb = |id: &str, fallback: Rgb| match dom::input_value(doc, id) {
        Some(_) => color(doc, id),
        None => Ok(fallback),
    };
    let options = MergeOptions {
        frame_color_1: rgb("frameColor1", current.frame_color_1)?,
        frame_opacity_1: number("frameOpacity1", current.frame_opacity_1)?,
        frame_color_2: rgb("frameColor2", current.frame_color_2)?,
        frame_opacity_2: number("frameOpacity2", current.frame_opacity_2)?,
        background: rgb("backgroundColor", current.background)?,
        grid: rgb("gridColor", current.grid)?,
    };
    options.validate().map_err(|e| e.to_string())?;
    Ok(options)
}

// Creates the merge frame and its wrapper, and injects the merge script each
// time the frame finishes loading.
fn create_merge_frame(state: &Rc<RefCell<State>>) -> Result<HtmlIFrameElement, JsValue> {
    let doc = state.borrow().document.clone();
    let div = doc.create_element("div")?;
    div.set_id(MERGE_FRAME_DIV);
    div.set_class_name("flex_child");
    div.set_attribute("style", "text-align: center")?;
    let title = doc.create_element("h3")?;
    title.set_text_content(Some(MERGE_TITLE));
    div.append_child(&title)?;

    let frame: HtmlIFrameElement = doc.create_element("iframe")?.dyn_into()?;
    frame.set_id(MERGE_FRAME);
    frame.set_title(MERGE_FRAME);
    frame.set_width(MERGE_FRAME_SIZE);
    frame.set_height(MERGE_FRAME_SIZE);
    div.append_child(&frame)?;
    doc.body().ok_or("no body")?.append_child(&div)?;

    let st = state.clone();
    let onload = Closure::<dyn FnMut()>::wrap(Box::new(move || {
        let s = st.borrow();
        let frames = PageFrames::new(s.document.clone());
        let result = merge_frames(&frames, MERGE_FRAME, FRAME_PREDICTED, &s.merge);
        report_all(&s.document, "Merge frames", &[(MERGE_FRAME.to_string(), result)]);
    }));
    frame.add_event_listener_with_callback("load", onload.as_ref().unchecked_ref())?;
    onload.forget();
    Ok(frame)
}

pub fn submit_merge(state: &Rc<RefCell<State>>) -> Result<(), JsValue> {
    let (doc, window, current) = {
        let s = state.borrow();
        (s.document.clone(), s.window.clone(), s.merge)
    };
    if !confirm(&window, CONFIRM_MERGE) {
        return Ok(());
    }
    let options = match read_merge_options(&doc, &current) {
        Ok(o) => o,
        Err(e) => {
            report(&doc, &format!("Merge frames: {e}"), true);
            return Ok(());
        }
    };
    state.borrow_mut().merge = options;

    if dom::is_checked(&doc, ROTATE_CHECKBOX)
        && let Some(chk) = doc.get_element_by_id(ROTATE_CHECKBOX)
    {
        dom::click(&chk);
    }

    let frames = PageFrames::new(doc.clone());
    let Some(source) = frames.iframe(FRAME_GROUND_TRUTH) else {
        report(&doc, "Merge frames: Ground Truth frame is not on the page", true);
        return Ok(());
    };
    let frame = match frames.iframe(MERGE_FRAME) {
        Some(f) => f,
        None => create_merge_frame(state)?,
    };
    frame.set_src(&source.src());
    Ok(())
}

pub fn hide_merge(doc: &Document, window: &Window) {
    if !confirm(window, CONFIRM_HIDE_MERGE) {
        return;
    }
    if let Some(div) = doc.get_element_by_id(MERGE_FRAME_DIV) {
        div.remove();
    }
}

pub fn attach(state: Rc<RefCell<State>>) -> Result<(), JsValue> {
    let (doc, window) = {
        let s = state.borrow();
        (s.document.clone(), s.window.clone())
    };

    for kind in ShapeKind::ALL {
        let (d, w) = (doc.clone(), window.clone());
        dom::on(&doc, &format!("draw{kind}"), "click", move |_e| submit_draw(&d, &w, kind))?;
        let (d, w) = (doc.clone(), window.clone());
        dom::on(&doc, &format!("clear{kind}"), "click", move |_e| submit_clear(&d, &w, kind))?;
        let d = doc.clone();
        dom::on(&doc, &format!("tab{kind}"), "click", move |_e| open_tab(&d, kind))?;
    }
    if doc.get_element_by_id(ShapeKind::Line.as_str()).is_some() {
        open_tab(&doc, ShapeKind::Line);
    }

    let st = state.clone();
    dom::on(&doc, MERGE_BUTTON, "click", move |_e| {
        if let Err(e) = submit_merge(&st) {
            error(&format!("Merge frames failed: {e:?}"));
        }
    })?;
    let (d, w) = (doc.clone(), window.clone());
    dom::on(&doc, HIDE_MERGE_BUTTON, "click", move |_e| hide_merge(&d, &w))?;

    Ok(())
}
