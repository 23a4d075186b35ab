//! Fixed element ids shared between the host page, the viewer frames and
//! the scripts injected into them.

/// Ground Truth viewer frame.
pub const FRAME_GROUND_TRUTH: &str = "title1";
/// Predicted/Augmented viewer frame.
pub const FRAME_PREDICTED: &str = "title2";
/// Both viewer frames, in display order.
pub const VIEWER_FRAMES: [&str; 2] = [FRAME_GROUND_TRUTH, FRAME_PREDICTED];

/// Frame created on demand to show the merged scenes.
pub const MERGE_FRAME: &str = "mergeFrame";
/// Wrapper div around the merge frame and its title.
pub const MERGE_FRAME_DIV: &str = "mergeFrameDiv";

// Inside a viewer document.
pub const CANVAS_TARGET: &str = "canvasTarget";
pub const BRIDGE_ELEMENT: &str = "hiddenDrawShapeParams";
pub const TOP_ARROW_CONTROL: &str = "showTopArrow";

// Host page.
pub const RESET_CAMERA_BUTTON: &str = "btnResetCamera";
pub const ROTATE_CHECKBOX: &str = "rotateChkBox";
pub const TEMP_STYLE: &str = "tempStyle";
pub const PLANE_INFO: &str = "planeInfo";
pub const TOP_ARROW_TEMPLATE: &str = "showTopArrowScript";
pub const STATUS: &str = "status";

// Logical script names; the element id is `<name>_<frame>`.
pub const HEAD_SCRIPT: &str = "threeJSheadScript";
pub const DRAW_SCRIPT: &str = "drawShapeScript";
pub const MERGE_SCRIPT: &str = "mergeFramesScript";
pub const TOP_ARROW_SCRIPT: &str = "showTopArrowScript";

/// Scene children at or beyond this index were added by the drawing script.
/// The widget starts with a light, a camera and the object group.
pub const USER_OBJECT_START: usize = 3;
