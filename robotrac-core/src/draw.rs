//! Drawing and clearing annotation shapes in the viewer frames.

use std::str::FromStr;

use crate::bridge::ParameterBridge;
use crate::error::{Result, ScriptError};
use crate::ids::{CANVAS_TARGET, DRAW_SCRIPT, HEAD_SCRIPT, VIEWER_FRAMES};
use crate::inject::{
    FrameSet, InjectOutcome, Placement, ScriptHost, ScriptIdentity, ScriptSpec, ScriptType, inject,
};
use crate::shape::{ShapeDescriptor, ShapeKind};
use crate::splice::{AnchorSet, DRAW_PRELUDE, splice_fragment};
use crate::template::{build_draw_fragment, head_import_map};

/// Which viewer frames an action applies to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FrameSelection {
    One(String),
    #[default]
    Both,
}

impl FrameSelection {
    pub fn frames(&self) -> Vec<&str> {
        match self {
            FrameSelection::One(id) => vec![id.as_str()],
            FrameSelection::Both => VIEWER_FRAMES.to_vec(),
        }
    }
}

impl FromStr for FrameSelection {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "both" => Ok(FrameSelection::Both),
            id if VIEWER_FRAMES.contains(&id) => Ok(FrameSelection::One(id.to_string())),
            other => Err(ScriptError::invalid(format!("unknown frame `{other}`"))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawAction {
    /// New parameters went through the existing bridge.
    Pushed,
    /// The drawing script was spliced and injected.
    Injected,
    /// Nothing to do in this frame (clear without a drawing script).
    Skipped,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    pub frame: String,
    pub result: Result<DrawAction>,
}

/// The import map every module we inject depends on.
pub fn head_script_spec(frame: &str) -> ScriptSpec {
    ScriptSpec {
        identity: ScriptIdentity::new(frame, HEAD_SCRIPT),
        placement: Placement::Head,
        script_type: ScriptType::ImportMap,
        text: head_import_map(),
    }
}

/// Make sure the import map is there; an identical one already present is fine.
pub fn ensure_head_script<H: ScriptHost + ?Sized>(host: &H) -> Result<InjectOutcome> {
    inject(Some(host), &head_script_spec(host.frame_id()))
}

/// Splice a fresh drawing script for `shape` and swap it in.
///
/// The new text is built before the document is touched, so an incompatible
/// widget script leaves the frame as it was.
pub fn inject_draw_script<H: ScriptHost + ?Sized>(
    host: &H,
    shape: &ShapeDescriptor,
    anchors: AnchorSet,
) -> Result<InjectOutcome> {
    let frame = host.frame_id();
    let identity = ScriptIdentity::new(frame, DRAW_SCRIPT);
    let id = identity.element_id();
    let (current, injected) = match host.script_text(&id) {
        Some(text) => (text, true),
        None => (
            host.original_script_text()
                .ok_or_else(|| ScriptError::not_ready(frame))?,
            false,
        ),
    };
    let text = splice_fragment(
        &current,
        &build_draw_fragment(shape),
        DRAW_PRELUDE,
        injected,
        anchors,
    )?;

    ensure_head_script(host)?;
    if let Ok(stale) = ParameterBridge::attach(host) {
        stale.detach();
    }
    host.clear_children(CANVAS_TARGET);
    if !injected {
        host.remove_original_script();
    }
    inject(
        Some(host),
        &ScriptSpec {
            identity,
            placement: Placement::Body,
            script_type: ScriptType::Module,
            text,
        },
    )
}

/// Draw `shape` in one frame: through the bridge when the drawing script is
/// already running there, by injection otherwise.
pub fn draw_in_frame<H: ScriptHost + ?Sized>(
    host: Option<&H>,
    frame: &str,
    shape: &ShapeDescriptor,
) -> Result<DrawAction> {
    let host = host.ok_or_else(|| ScriptError::not_ready(frame))?;
    shape.validate()?;
    let script_id = ScriptIdentity::new(frame, DRAW_SCRIPT).element_id();
    if host.element_exists(&script_id)
        && let Ok(bridge) = ParameterBridge::attach(host)
    {
        bridge.push(shape)?;
        return Ok(DrawAction::Pushed);
    }
    inject_draw_script(host, shape, AnchorSet::K3D_2_X)?;
    Ok(DrawAction::Injected)
}

/// Remove drawn shapes of `kind` from one frame. Frames that never had the
/// drawing script are skipped; a drawing script whose bridge is gone is
/// injected again carrying the clear request.
pub fn clear_in_frame<H: ScriptHost + ?Sized>(
    host: Option<&H>,
    frame: &str,
    kind: ShapeKind,
) -> Result<DrawAction> {
    let host = host.ok_or_else(|| ScriptError::not_ready(frame))?;
    let script_id = ScriptIdentity::new(frame, DRAW_SCRIPT).element_id();
    if !host.element_exists(&script_id) {
        return Ok(DrawAction::Skipped);
    }
    let clear = ShapeDescriptor::clear(kind);
    if let Ok(bridge) = ParameterBridge::attach(host) {
        bridge.push(&clear)?;
        return Ok(DrawAction::Pushed);
    }
    inject_draw_script(host, &clear, AnchorSet::K3D_2_X)?;
    Ok(DrawAction::Injected)
}

pub fn draw<F: FrameSet>(
    frames: &F,
    selection: &FrameSelection,
    shape: &ShapeDescriptor,
) -> Vec<FrameReport> {
    selection
        .frames()
        .into_iter()
        .map(|id| FrameReport {
            frame: id.to_string(),
            result: draw_in_frame(frames.frame(id).as_ref(), id, shape),
        })
        .collect()
}

pub fn clear<F: FrameSet>(
    frames: &F,
    selection: &FrameSelection,
    kind: ShapeKind,
) -> Vec<FrameReport> {
    selection
        .frames()
        .into_iter()
        .map(|id| FrameReport {
            frame: id.to_string(),
            result: clear_in_frame(frames.frame(id).as_ref(), id, kind),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{BRIDGE_ELEMENT, FRAME_GROUND_TRUTH, FRAME_PREDICTED};
    use crate::shape::Rgb;
    use crate::testing::{FakeFrame, FakeFrames};

    fn line() -> ShapeDescriptor {
        ShapeDescriptor::default_for(ShapeKind::Line)
    }

    #[test]
    fn selection_parses_form_values() {
        assert_eq!("both".parse::<FrameSelection>().unwrap(), FrameSelection::Both);
        assert_eq!(
            "title2".parse::<FrameSelection>().unwrap().frames(),
            vec!["title2"]
        );
        assert!("title9".parse::<FrameSelection>().is_err());
    }

    #[test]
    fn first_draw_injects_then_pushes() {
        let frames = FakeFrames::viewers();
        let reports = draw(&frames, &FrameSelection::Both, &line());
        assert!(reports.iter().all(|r| r.result == Ok(DrawAction::Injected)));

        let gt = frames.get(FRAME_GROUND_TRUTH);
        assert!(gt.element_exists("threeJSheadScript_title1"));
        assert!(gt.element_exists("drawShapeScript_title1"));
        assert_eq!(gt.canvas_children(), 0);
        assert_eq!(gt.scene().user_objects().len(), 1);

        let sphere = ShapeDescriptor::default_for(ShapeKind::Sphere);
        let reports = draw(&frames, &FrameSelection::Both, &sphere);
        assert!(reports.iter().all(|r| r.result == Ok(DrawAction::Pushed)));
        assert_eq!(gt.executed(), vec!["drawShapeScript_title1".to_string()]);
        assert_eq!(gt.scene().user_objects().len(), 2);
        assert_eq!(gt.scene().draggable, 2);
    }

    #[test]
    fn redraw_of_same_kind_replaces_object() {
        let frames = FakeFrames::viewers();
        draw(&frames, &FrameSelection::Both, &line());
        let moved = ShapeDescriptor::line([0.0; 3], [5.0, 5.0, 5.0], Rgb::new(9, 9, 9));
        draw(&frames, &FrameSelection::Both, &moved);
        let scene = frames.get(FRAME_PREDICTED).scene();
        assert_eq!(scene.user_objects().len(), 1);
        assert_eq!(scene.user_objects()[0].params, moved.params);
    }

    #[test]
    fn single_frame_selection_leaves_other_alone() {
        let frames = FakeFrames::viewers();
        let sel = FrameSelection::One(FRAME_PREDICTED.into());
        draw(&frames, &sel, &line());
        assert!(!frames.get(FRAME_GROUND_TRUTH).element_exists("drawShapeScript_title1"));
        assert!(frames.get(FRAME_PREDICTED).element_exists("drawShapeScript_title2"));
    }

    #[test]
    fn missing_frame_is_reported_not_fatal() {
        let mut frames = FakeFrames::new();
        frames.insert(FakeFrame::with_widget(FRAME_GROUND_TRUTH));
        let reports = draw(&frames, &FrameSelection::Both, &line());
        assert_eq!(reports[0].result, Ok(DrawAction::Injected));
        assert_eq!(
            reports[1].result,
            Err(ScriptError::not_ready(FRAME_PREDICTED))
        );
    }

    #[test]
    fn incompatible_widget_script_leaves_frame_untouched() {
        let frame = FakeFrame::with_script(FRAME_GROUND_TRUTH, "renderOldWidget();");
        let err = draw_in_frame(Some(&frame), FRAME_GROUND_TRUTH, &line()).unwrap_err();
        assert!(matches!(err, ScriptError::IncompatibleHostScript { .. }));
        assert_eq!(frame.head_len(), 0);
        assert_eq!(frame.canvas_children(), 4);
        assert_eq!(frame.original_script_text().as_deref(), Some("renderOldWidget();"));
    }

    #[test]
    fn frame_without_widget_script_is_not_ready() {
        let frame = FakeFrame::empty(FRAME_GROUND_TRUTH);
        let err = draw_in_frame(Some(&frame), FRAME_GROUND_TRUTH, &line()).unwrap_err();
        assert_eq!(err, ScriptError::not_ready(FRAME_GROUND_TRUTH));
    }

    #[test]
    fn lost_bridge_is_recreated_by_reinjection() {
        let frames = FakeFrames::viewers();
        draw(&frames, &FrameSelection::Both, &line());
        let gt = frames.get(FRAME_GROUND_TRUTH);
        gt.remove_element(BRIDGE_ELEMENT);

        let result = draw_in_frame(Some(gt), FRAME_GROUND_TRUTH, &line());
        assert_eq!(result, Ok(DrawAction::Injected));
        assert_eq!(gt.count_with_id("drawShapeScript_title1"), 1);
        assert_eq!(gt.count_with_id(BRIDGE_ELEMENT), 1);
        let text = gt.script_text("drawShapeScript_title1").unwrap();
        assert_eq!(text.matches("import * as THREE").count(), 1);
    }

    #[test]
    fn clear_without_bridge_reinjects_clear_request() {
        let frames = FakeFrames::viewers();
        draw(&frames, &FrameSelection::Both, &line());
        let gt = frames.get(FRAME_GROUND_TRUTH);
        gt.remove_element(BRIDGE_ELEMENT);

        let only_gt = FrameSelection::One(FRAME_GROUND_TRUTH.into());
        let reports = clear(&frames, &only_gt, ShapeKind::Line);
        assert_eq!(reports[0].result, Ok(DrawAction::Injected));
        assert!(gt.scene().user_objects().is_empty());
        assert_eq!(gt.count_with_id("drawShapeScript_title1"), 1);
        assert_eq!(gt.count_with_id(BRIDGE_ELEMENT), 1);
        assert_eq!(
            gt.control_value(BRIDGE_ELEMENT).as_deref(),
            Some("Line,0,0,0,0,0,0,clear")
        );
    }

    #[test]
    fn leftover_bridge_is_replaced_on_first_injection() {
        let frame = FakeFrame::with_widget(FRAME_GROUND_TRUTH);
        frame.add_control(BRIDGE_ELEMENT, "Line,0,0,0,0,0,0,#000000");
        let sphere = ShapeDescriptor::default_for(ShapeKind::Sphere);

        let result = draw_in_frame(Some(&frame), FRAME_GROUND_TRUTH, &sphere);
        assert_eq!(result, Ok(DrawAction::Injected));
        assert_eq!(frame.count_with_id(BRIDGE_ELEMENT), 1);
        assert_eq!(frame.control_value(BRIDGE_ELEMENT), Some(sphere.encode()));
        let objects = frame.scene().user_objects().to_vec();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].geometry, Some("SphereGeometry"));
    }

    #[test]
    fn clear_skips_frames_without_drawing_script() {
        let frames = FakeFrames::viewers();
        draw(&frames, &FrameSelection::One(FRAME_GROUND_TRUTH.into()), &line());
        let reports = clear(&frames, &FrameSelection::Both, ShapeKind::Line);
        assert_eq!(reports[0].result, Ok(DrawAction::Pushed));
        assert_eq!(reports[1].result, Ok(DrawAction::Skipped));
        assert!(frames.get(FRAME_GROUND_TRUTH).scene().user_objects().is_empty());
    }

    #[test]
    fn clear_only_removes_matching_kind() {
        let frames = FakeFrames::viewers();
        let sel = FrameSelection::Both;
        draw(&frames, &sel, &line());
        draw(&frames, &sel, &ShapeDescriptor::default_for(ShapeKind::Plane));
        clear(&frames, &sel, ShapeKind::Line);
        let scene = frames.get(FRAME_GROUND_TRUTH).scene();
        assert_eq!(scene.user_objects().len(), 1);
        assert_eq!(scene.user_objects()[0].geometry, Some("PlaneGeometry"));
    }
}
