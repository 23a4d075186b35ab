//! Small per-frame tweaks: the top-arrow helper script and the canvas
//! background colour.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScriptError};
use crate::ids::{CANVAS_TARGET, TOP_ARROW_CONTROL, TOP_ARROW_SCRIPT};
use crate::inject::{
    InjectOutcome, Placement, ScriptHost, ScriptIdentity, ScriptSpec, ScriptType, inject,
};

/// Call appended to the host page's top-arrow template so the helper sets
/// itself up as soon as it is injected.
pub const TOP_ARROW_BOOTSTRAP: &str = " addCanvasAndHiddenInput();";

pub fn top_arrow_spec(frame: &str, template: &str) -> ScriptSpec {
    ScriptSpec {
        identity: ScriptIdentity::new(frame, TOP_ARROW_SCRIPT),
        placement: Placement::Body,
        script_type: ScriptType::Classic,
        text: format!("{template}{TOP_ARROW_BOOTSTRAP}"),
    }
}

/// Inject (or re-inject after a reload) the top-arrow helper.
pub fn inject_top_arrow<H: ScriptHost + ?Sized>(
    host: Option<&H>,
    frame: &str,
    template: &str,
) -> Result<InjectOutcome> {
    inject(host, &top_arrow_spec(frame, template))
}

/// Turn the arrow on or off. Frames where the helper has not created its
/// control yet are reported as not ready.
pub fn set_top_arrow<H: ScriptHost + ?Sized>(host: Option<&H>, frame: &str, visible: bool) -> Result<()> {
    let host = host.ok_or_else(|| ScriptError::not_ready(frame))?;
    let value = if visible { "true" } else { "false" };
    if host.set_control_value(TOP_ARROW_CONTROL, value) {
        Ok(())
    } else {
        Err(ScriptError::not_ready(frame))
    }
}

/// Colour from the background picker, alpha in `0..=1`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Default for Rgba {
    fn default() -> Self {
        Rgba {
            r: 255,
            g: 255,
            b: 255,
            a: 1.0,
        }
    }
}

pub fn background_style(color: Rgba) -> String {
    format!(
        "cursor: auto; background-color: rgba({}, {}, {}, {})",
        color.r,
        color.g,
        color.b,
        color.a.clamp(0.0, 1.0)
    )
}

pub fn set_background<H: ScriptHost + ?Sized>(host: Option<&H>, frame: &str, color: Rgba) -> Result<()> {
    let host = host.ok_or_else(|| ScriptError::not_ready(frame))?;
    if host.set_style(CANVAS_TARGET, &background_style(color)) {
        Ok(())
    } else {
        Err(ScriptError::not_ready(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeFrame;

    #[test]
    fn top_arrow_is_replaced_on_reinjection() {
        let frame = FakeFrame::with_widget("title1");
        let first = inject_top_arrow(Some(&frame), "title1", "function addCanvasAndHiddenInput() {}");
        assert_eq!(first, Ok(InjectOutcome::Inserted));
        let second = inject_top_arrow(Some(&frame), "title1", "function addCanvasAndHiddenInput() {}");
        assert_eq!(second, Ok(InjectOutcome::Replaced));
        assert_eq!(frame.count_with_id("showTopArrowScript_title1"), 1);
        assert!(frame
            .script_text("showTopArrowScript_title1")
            .unwrap()
            .ends_with("{} addCanvasAndHiddenInput();"));
    }

    #[test]
    fn toggle_needs_helper_control() {
        let frame = FakeFrame::with_widget("title1");
        assert!(set_top_arrow(Some(&frame), "title1", true).is_err());
        frame.add_control(TOP_ARROW_CONTROL, "false");
        set_top_arrow(Some(&frame), "title1", true).unwrap();
        assert_eq!(frame.control_value(TOP_ARROW_CONTROL).as_deref(), Some("true"));
    }

    #[test]
    fn background_style_is_written_to_canvas_target() {
        let frame = FakeFrame::with_widget("title1");
        let color = Rgba {
            r: 10,
            g: 20,
            b: 30,
            a: 0.5,
        };
        set_background(Some(&frame), "title1", color).unwrap();
        assert_eq!(
            frame.style(CANVAS_TARGET).as_deref(),
            Some("cursor: auto; background-color: rgba(10, 20, 30, 0.5)")
        );
        assert!(set_background::<FakeFrame>(None, "title2", color).is_err());
    }
}
