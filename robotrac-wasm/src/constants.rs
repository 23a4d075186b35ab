/// Host page constants. Element ids shared with the frames live in
/// `robotrac_core::ids`.
pub const CATALOG_FILE: &str = "datasets.json";
/// Query parameter selecting the initial dataset.
pub const DATASET_PARAM: &str = "pig";
/// Frame used for datasets without a Ground Truth reconstruction.
pub const EXPERIMENT_FRAME: &str = "title3";
/// Side of the merged-frames iframe.
pub const MERGE_FRAME_SIZE: &str = "800px";

pub const CONFIRM_DRAW: &str =
    "This may result in a loss of all manipulation and may take a while to reload for the first use.";
pub const CONFIRM_CLEAR: &str =
    "This may result in a loss of all manipulation and may take a while to reload.";
pub const CONFIRM_MERGE: &str = "This may take a long time to show the merged frames.";
pub const CONFIRM_HIDE_MERGE: &str = "This will result in a loss of all manipulation.";

/// Style sheet that lets pointer events reach the host page during
/// simultaneous rotation.
pub const SIMULTANEOUS_STYLE: &str = "iframe {overflow: hidden; pointer-events: none;}";

// Host page controls.
pub const DATASET_SELECT: &str = "pigSelect";
pub const CATALOG_INPUT: &str = "catalogFile";
pub const SLIDER_NAME: &str = "index";
pub const SLICE_IMAGE: &str = "sliceImage";
pub const SINGLE_SLICE_IMAGE: &str = "singleSliceImage";
pub const COMPARISON_VIEW: &str = "comparisonView";
pub const SINGLE_VIEW: &str = "singleView";
pub const VIEWERS: &str = "viewers";
pub const RELOAD_BUTTON: &str = "btnReloadFrames";
pub const TOP_ARROW_CHECKBOX: &str = "chkShowTopArrow";
pub const BACKGROUND_COLOR: &str = "canvasBackground";
pub const BACKGROUND_ALPHA: &str = "canvasBackgroundAlpha";
pub const MERGE_BUTTON: &str = "btnMergeFrames";
pub const HIDE_MERGE_BUTTON: &str = "btnHideMergeFrames";
pub const MERGE_TITLE: &str = "Merged Frames";

/// Label of the widget's own camera reset entry.
pub const WIDGET_RESET_CAMERA: &str = "reset camera";
/// Label of the widget's own detach entry.
pub const WIDGET_DETACH: &str = "detach widget";

/// Prefix shown before the height of the last slice plane.
pub const PLANE_INFO_PREFIX: &str = "Drawn at Z: ";
