//! Merging the Predicted scene into a copy of the Ground Truth frame.
//!
//! The merge frame loads the Ground Truth page. Its widget script is spliced
//! so that, once its own instance is up, it loads the Predicted snapshot into a
//! second instance, recolours both objects with flat textures, moves the
//! Predicted object into the first instance and then strips the UI the second
//! instance created.

use serde::{Deserialize, Serialize};

use crate::draw::ensure_head_script;
use crate::error::{Result, ScriptError};
use crate::ids::{CANVAS_TARGET, DRAW_SCRIPT, MERGE_SCRIPT};
use crate::inject::{
    FrameSet, InjectOutcome, Placement, ScriptHost, ScriptIdentity, ScriptSpec, ScriptType, inject,
};
use crate::shape::Rgb;
use crate::splice::{AnchorSet, MERGE_PRELUDE, extract_snapshot, splice_fragment};

/// Side of the square colour texture assigned to each object.
pub const TEXTURE_SIZE: u32 = 512;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MergeOptions {
    pub frame_color_1: Rgb,
    pub frame_opacity_1: f64,
    pub frame_color_2: Rgb,
    pub frame_opacity_2: f64,
    pub background: Rgb,
    pub grid: Rgb,
}

impl Default for MergeOptions {
    fn default() -> Self {
        MergeOptions {
            frame_color_1: Rgb::new(0x00, 0xff, 0x00),
            frame_opacity_1: 0.9,
            frame_color_2: Rgb::new(0xff, 0x00, 0x00),
            frame_opacity_2: 0.9,
            background: Rgb::new(0xf6, 0xef, 0xef),
            grid: Rgb::new(0xbb, 0xff, 0x00),
        }
    }
}

impl MergeOptions {
    pub fn validate(&self) -> Result<()> {
        for (n, o) in [(1, self.frame_opacity_1), (2, self.frame_opacity_2)] {
            if !(0.0..=1.0).contains(&o) {
                return Err(ScriptError::invalid(format!(
                    "frame {n} opacity must be within 0..=1"
                )));
            }
        }
        Ok(())
    }
}

/// Assumptions about the UI a second widget instance adds to the document.
///
/// None of this is a documented widget contract; it matches the release the
/// anchors in [`AnchorSet::K3D_2_X`] were taken from and is unverified for any
/// other.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChromeShim {
    /// Canvases at these ends of the list are duplicates: `(last, first)`.
    pub duplicate_canvases: (bool, bool),
    /// Class of colour legends; all of them are removed.
    pub legend_class: &'static str,
    /// Class of control panels.
    pub panel_class: &'static str,
    /// Panels at these ends of the list are duplicates: `(last, first)`.
    pub duplicate_panels: (bool, bool),
    /// Label wrappers at these ends are duplicates: `(last, first)`. The last
    /// one is removed together with its parent.
    pub duplicate_wrappers: (bool, bool),
}

impl ChromeShim {
    pub const K3D_2_X: ChromeShim = ChromeShim {
        duplicate_canvases: (true, true),
        legend_class: "colorMapLegend",
        panel_class: "dg",
        duplicate_panels: (true, true),
        duplicate_wrappers: (true, true),
    };

    fn script(&self) -> String {
        let mut out = format!(
            "let canvasTarget = document.getElementById('{CANVAS_TARGET}'); \
             let canvases = canvasTarget.getElementsByTagName('canvas'); "
        );
        if self.duplicate_canvases.0 {
            out.push_str("canvases[canvases.length - 1].remove(); ");
        }
        if self.duplicate_canvases.1 {
            out.push_str("canvases[0].remove(); ");
        }
        out.push_str(&format!(
            "let svgs = canvasTarget.getElementsByClassName('{legend}'); \
             for (let i = svgs.length - 1; i >= 0; i--) svgs[i].remove(); \
             let dgs = canvasTarget.getElementsByClassName('{panel}'); ",
            legend = self.legend_class,
            panel = self.panel_class,
        ));
        if self.duplicate_panels.0 {
            out.push_str("dgs[dgs.length - 1].remove(); ");
        }
        if self.duplicate_panels.1 {
            out.push_str("dgs[0].remove(); ");
        }
        out.push_str("let divs = canvasTarget.getElementsByTagName('div'); ");
        if self.duplicate_wrappers.0 {
            out.push_str("divs[divs.length - 1].parentNode.remove(); ");
        }
        if self.duplicate_wrappers.1 {
            out.push_str("divs[0].remove(); ");
        }
        out
    }
}

// Fills a TEXTURE_SIZE^2 RGBA buffer with one colour and assigns it as the
// object's colour map.
fn recolor(object: &str, color: Rgb, opacity: f64) -> String {
    let alpha = (255.0 * opacity).to_string();
    format!(
        "{{ const width = {TEXTURE_SIZE}; \
         const height = {TEXTURE_SIZE}; \
         const size = width * height; \
         const dataArr = new Uint8Array( 4 * size ); \
         const color = new THREE.Color( {color} ); \
         for ( let i = 0; i < size; i ++ ) {{ \
         const stride = i * 4; \
         dataArr[ stride ] = Math.floor( color.r * 255 ); \
         dataArr[ stride + 1 ] = Math.floor( color.g * 255 ); \
         dataArr[ stride + 2 ] = Math.floor( color.b * 255 ); \
         dataArr[ stride + 3 ] = {alpha}; \
         }} \
         const texture = new THREE.DataTexture( dataArr, width, height ); \
         texture.needsUpdate = true; \
         {object}.material.uniforms.colormap.value = texture; }} ",
        color = color.to_js_literal(),
    )
}

/// Merge logic run inside the Ground Truth instance's callback. Expects
/// `data1` to hold the Predicted snapshot.
pub fn build_merge_fragment(options: &MergeOptions, shim: &ChromeShim) -> String {
    let mut out = String::from(
        "var K3DInstance1; \
         let objectId0 = Object.keys(K3DInstance.getWorld().ObjectsById)[0]; \
         let object0 = K3DInstance.getObjectById(objectId0); ",
    );
    out.push_str(&recolor(
        "object0",
        options.frame_color_1,
        options.frame_opacity_1,
    ));
    out.push_str(&format!(
        "K3DInstance1 = new lib.CreateK3DAndLoadBinarySnapshot( \
         _base64ToArrayBuffer(data1), \
         document.getElementById('{CANVAS_TARGET}'), \
         ); \
         K3DInstance1.then(function(K3DInstance1) {{ \
         let objectId = Object.keys(K3DInstance1.getWorld().ObjectsById)[0]; \
         let object = K3DInstance1.getObjectById(objectId); "
    ));
    out.push_str(&recolor(
        "object",
        options.frame_color_2,
        options.frame_opacity_2,
    ));
    out.push_str(&format!(
        "let e = {{id: objectId, type: 'json'}}; \
         K3DInstance.addOrUpdateObject(e, object); \
         K3DInstance.setMenuVisibility(false); \
         K3DInstance.setClearColor({bg}); \
         K3DInstance.setGridColor({grid}); ",
        bg = options.background.to_js_literal(),
        grid = options.grid.to_js_literal(),
    ));
    out.push_str(&shim.script());
    out.push_str("});");
    out
}

/// Compose the merge script.
///
/// `target` is the script currently in the merge frame and `source` the script
/// of the frame whose snapshot is merged in. The text is spliced as
/// `var data1 =<snapshot>` followed by the merge fragment.
pub fn build_merge_script(
    target: &str,
    previously_injected: bool,
    source: &str,
    options: &MergeOptions,
) -> Result<String> {
    options.validate()?;
    let anchors = AnchorSet::K3D_2_X;
    let snapshot = extract_snapshot(source, anchors)?;
    let mut fragment = format!("var data1 ={snapshot} ");
    fragment.push_str(&build_merge_fragment(options, &ChromeShim::K3D_2_X));
    splice_fragment(target, &fragment, MERGE_PRELUDE, previously_injected, anchors)
}

// Prefer a drawing script already running in the source frame; it still
// carries the snapshot.
fn current_script<H: ScriptHost + ?Sized>(host: &H, name: &'static str) -> Option<(String, bool)> {
    let id = ScriptIdentity::new(host.frame_id(), name).element_id();
    host.script_text(&id)
        .map(|t| (t, true))
        .or_else(|| host.original_script_text().map(|t| (t, false)))
}

/// Merge the scene of `source_frame` into `merge_frame`, which must already have
/// loaded the Ground Truth page.
pub fn merge_frames<F: FrameSet>(
    frames: &F,
    merge_frame: &str,
    source_frame: &str,
    options: &MergeOptions,
) -> Result<InjectOutcome> {
    let target = frames
        .frame(merge_frame)
        .ok_or_else(|| ScriptError::not_ready(merge_frame))?;
    let source = frames
        .frame(source_frame)
        .ok_or_else(|| ScriptError::not_ready(source_frame))?;
    let (source_text, _) =
        current_script(&source, DRAW_SCRIPT).ok_or_else(|| ScriptError::not_ready(source_frame))?;
    let (target_text, injected) =
        current_script(&target, MERGE_SCRIPT).ok_or_else(|| ScriptError::not_ready(merge_frame))?;
    let text = build_merge_script(&target_text, injected, &source_text, options)?;

    ensure_head_script(&target)?;
    if !injected {
        target.remove_original_script();
    }
    target.clear_children(CANVAS_TARGET);
    inject(
        Some(&target),
        &ScriptSpec {
            identity: ScriptIdentity::new(merge_frame, MERGE_SCRIPT),
            placement: Placement::Body,
            script_type: ScriptType::Module,
            text,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{FRAME_PREDICTED, MERGE_FRAME};
    use crate::draw::{FrameSelection, draw};
    use crate::shape::{ShapeDescriptor, ShapeKind};
    use crate::testing::{FakeFrame, FakeFrames, K3D_FIXTURE};

    fn frames() -> FakeFrames {
        let mut frames = FakeFrames::viewers();
        frames.insert(FakeFrame::with_widget(MERGE_FRAME));
        frames
    }

    #[test]
    fn fragment_uses_chosen_colours() {
        let text = build_merge_fragment(&MergeOptions::default(), &ChromeShim::K3D_2_X);
        assert!(text.contains("new THREE.Color( 0x00ff00 )"));
        assert!(text.contains("new THREE.Color( 0xff0000 )"));
        assert!(text.contains("K3DInstance.setClearColor(0xf6efef)"));
        assert!(text.contains("K3DInstance.setGridColor(0xbbff00)"));
        assert_eq!(text.matches("dataArr[ stride + 3 ] = 229.5;").count(), 2);
        assert!(text.ends_with("});"));
    }

    #[test]
    fn chrome_shim_removes_both_duplicate_canvases() {
        let text = ChromeShim::K3D_2_X.script();
        assert!(text.contains("canvases[canvases.length - 1].remove();"));
        assert!(text.contains("canvases[0].remove();"));
        assert!(text.contains("getElementsByClassName('colorMapLegend')"));
    }

    #[test]
    fn opacity_outside_unit_range_is_rejected() {
        let opts = MergeOptions {
            frame_opacity_2: 1.5,
            ..Default::default()
        };
        assert!(build_merge_script(K3D_FIXTURE, false, K3D_FIXTURE, &opts).is_err());
    }

    #[test]
    fn merge_script_carries_source_snapshot() {
        let text = build_merge_script(K3D_FIXTURE, false, K3D_FIXTURE, &MergeOptions::default())
            .unwrap();
        assert!(text.starts_with(MERGE_PRELUDE));
        assert!(text.contains(
            "function(K3DInstance) {\nvar data1 = 'eNrtwTEBAAAAwqD1T20JT6AAAHgaDqAAAQ=='; var K3DInstance1;"
        ));
        assert!(text.contains("}); } catch (e) {"));
    }

    #[test]
    fn merging_injects_into_merge_frame() {
        let frames = frames();
        let outcome =
            merge_frames(&frames, MERGE_FRAME, FRAME_PREDICTED, &MergeOptions::default()).unwrap();
        assert_eq!(outcome, InjectOutcome::Inserted);
        let target = frames.get(MERGE_FRAME);
        assert!(target.element_exists("threeJSheadScript_mergeFrame"));
        assert_eq!(target.canvas_children(), 0);

        let again =
            merge_frames(&frames, MERGE_FRAME, FRAME_PREDICTED, &MergeOptions::default()).unwrap();
        assert_eq!(again, InjectOutcome::Replaced);
        let text = target.script_text("mergeFramesScript_mergeFrame").unwrap();
        assert_eq!(text.matches("var data1 =").count(), 1);
        assert_eq!(text.matches("import * as THREE").count(), 1);
    }

    #[test]
    fn snapshot_is_read_from_drawing_script_after_a_draw() {
        let frames = frames();
        let only_pred = FrameSelection::One(FRAME_PREDICTED.into());
        draw(&frames, &only_pred, &ShapeDescriptor::default_for(ShapeKind::Line));
        let pred = frames.get(FRAME_PREDICTED);
        assert!(pred.element_exists("drawShapeScript_title2"));
        assert_ne!(pred.original_script_text().as_deref(), Some(K3D_FIXTURE));

        let outcome =
            merge_frames(&frames, MERGE_FRAME, FRAME_PREDICTED, &MergeOptions::default()).unwrap();
        assert_eq!(outcome, InjectOutcome::Inserted);
        let text = frames
            .get(MERGE_FRAME)
            .script_text("mergeFramesScript_mergeFrame")
            .unwrap();
        assert!(text.contains("var data1 = 'eNrtwTEBAAAAwqD1T20JT6AAAHgaDqAAAQ==';"));
    }

    #[test]
    fn chrome_shim_can_keep_panels_and_wrappers() {
        let shim = ChromeShim {
            duplicate_panels: (false, false),
            duplicate_wrappers: (false, true),
            ..ChromeShim::K3D_2_X
        };
        let text = shim.script();
        assert!(!text.contains("dgs[0].remove();"));
        assert!(!text.contains("parentNode.remove();"));
        assert!(text.contains("divs[0].remove();"));
    }

    #[test]
    fn merge_needs_both_frames() {
        let frames = FakeFrames::viewers();
        let err = merge_frames(&frames, MERGE_FRAME, FRAME_PREDICTED, &MergeOptions::default())
            .unwrap_err();
        assert_eq!(err, ScriptError::not_ready(MERGE_FRAME));
    }
}
