//! Locating insertion points in the widget's generated module script.
//!
//! The widget writes a standalone page whose module script loads a base64
//! snapshot and then runs `.then(function(K3DInstance) { ... })` inside a
//! `try` block. Injected fragments replace the body of that callback. The
//! anchors are tied to the widget release that produced the pages, so they
//! live in one pinned [`AnchorSet`] and a mismatch is a hard error.

use crate::error::{Result, ScriptError};

/// Module imports the drawing fragment relies on.
pub const DRAW_PRELUDE: &str = "import * as THREE from 'three'; \
     import { EventDispatcher, Matrix4, Plane, Raycaster, Vector2, Vector3 } from 'three'; ";

/// Module imports the merge fragment relies on.
pub const MERGE_PRELUDE: &str = "import * as THREE from 'three'; ";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnchorSet {
    /// Widget release these anchors were taken from; shows up in errors.
    pub label: &'static str,
    /// Opens the callback body that fragments replace.
    pub open: &'static str,
    /// First text after the callback; everything from here is kept.
    pub close: &'static str,
    /// Closes the callback again after the fragment.
    pub closing_glue: &'static str,
    /// Start of the embedded snapshot literal.
    pub snapshot_start: &'static str,
    /// End of the embedded snapshot literal, kept in the extracted text.
    pub snapshot_end: &'static str,
}

impl AnchorSet {
    pub const K3D_2_X: AnchorSet = AnchorSet {
        label: "K3D 2.x standalone snapshot",
        open: "function(K3DInstance) {",
        close: "} catch (e) {",
        closing_glue: "}); ",
        snapshot_start: "var data =",
        snapshot_end: "';",
    };

    fn missing(&self, anchor: &'static str) -> ScriptError {
        ScriptError::IncompatibleHostScript {
            anchor,
            anchors: self.label,
        }
    }
}

impl Default for AnchorSet {
    fn default() -> Self {
        AnchorSet::K3D_2_X
    }
}

/// A host script with both anchors located.
#[derive(Clone, Copy, Debug)]
pub struct HostScript<'a> {
    text: &'a str,
    before_end: usize,
    after_start: usize,
    anchors: AnchorSet,
}

impl<'a> HostScript<'a> {
    pub fn locate(text: &'a str, anchors: AnchorSet) -> Result<Self> {
        let open = text
            .find(anchors.open)
            .ok_or_else(|| anchors.missing(anchors.open))?;
        let mut before_end = open + anchors.open.len();
        // Keep the separator that follows the opening brace.
        if let Some(c) = text[before_end..].chars().next() {
            before_end += c.len_utf8();
        }
        let after_start = text[before_end..]
            .find(anchors.close)
            .map(|i| before_end + i)
            .ok_or_else(|| anchors.missing(anchors.close))?;
        Ok(HostScript {
            text,
            before_end,
            after_start,
            anchors,
        })
    }

    /// Text up to and including the opening anchor and its separator.
    pub fn before(&self) -> &'a str {
        &self.text[..self.before_end]
    }

    /// The callback body a splice discards.
    pub fn body(&self) -> &'a str {
        &self.text[self.before_end..self.after_start]
    }

    /// Closing glue followed by the text from the close anchor onward.
    pub fn after(&self) -> String {
        format!(
            "{}{}",
            self.anchors.closing_glue,
            &self.text[self.after_start..]
        )
    }

    /// `prelude + before + fragment + after`.
    pub fn splice(&self, fragment: &str, prelude: Option<&str>) -> String {
        let prelude = prelude.unwrap_or("");
        let tail = self.after();
        let mut out =
            String::with_capacity(prelude.len() + self.before_end + fragment.len() + tail.len());
        out.push_str(prelude);
        out.push_str(self.before());
        out.push_str(fragment);
        out.push_str(&tail);
        out
    }
}

/// Splice `fragment` into `text`. The prelude is only added when `text` is the
/// widget's untouched script; an injected variant already carries it.
pub fn splice_fragment(
    text: &str,
    fragment: &str,
    prelude: &str,
    previously_injected: bool,
    anchors: AnchorSet,
) -> Result<String> {
    let host = HostScript::locate(text, anchors)?;
    let prelude = (!previously_injected).then_some(prelude);
    Ok(host.splice(fragment, prelude))
}

/// The serialized snapshot literal assigned to `var data`, including its
/// closing quote and semicolon.
pub fn extract_snapshot(text: &str, anchors: AnchorSet) -> Result<&str> {
    let start = text
        .find(anchors.snapshot_start)
        .ok_or_else(|| anchors.missing(anchors.snapshot_start))?;
    let body_start = start + anchors.snapshot_start.len();
    let end = text[body_start..]
        .find(anchors.snapshot_end)
        .map(|i| body_start + i + anchors.snapshot_end.len())
        .ok_or_else(|| anchors.missing(anchors.snapshot_end))?;
    Ok(&text[body_start..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::K3D_FIXTURE;

    #[test]
    fn locates_callback_body() {
        let host = HostScript::locate(K3D_FIXTURE, AnchorSet::K3D_2_X).unwrap();
        assert!(host.before().ends_with("function(K3DInstance) {\n"));
        assert!(host.body().contains("K3DInstance.setMenuVisibility"));
        assert!(host.after().starts_with("}); } catch (e) {"));
    }

    #[test]
    fn splice_keeps_both_ends_intact() {
        let host = HostScript::locate(K3D_FIXTURE, AnchorSet::K3D_2_X).unwrap();
        let out = host.splice("/* fragment */", None);
        assert_eq!(out, format!("{}/* fragment */{}", host.before(), host.after()));
        assert!(!out.contains("setMenuVisibility"));
    }

    #[test]
    fn prelude_only_for_untouched_scripts() {
        let first = splice_fragment(K3D_FIXTURE, "A", DRAW_PRELUDE, false, AnchorSet::K3D_2_X)
            .unwrap();
        assert!(first.starts_with(DRAW_PRELUDE));
        let second = splice_fragment(&first, "B", DRAW_PRELUDE, true, AnchorSet::K3D_2_X).unwrap();
        assert_eq!(second.matches("import * as THREE").count(), 1);
        assert!(second.contains("function(K3DInstance) {\nB}); } catch (e) {"));
        assert!(!second.contains("A}); "));
    }

    #[test]
    fn missing_anchor_is_reported() {
        let err = HostScript::locate("console.log('no widget here');", AnchorSet::K3D_2_X)
            .unwrap_err();
        assert_eq!(
            err,
            ScriptError::IncompatibleHostScript {
                anchor: "function(K3DInstance) {",
                anchors: "K3D 2.x standalone snapshot",
            }
        );

        let no_catch = "p.then(function(K3DInstance) { x(); });";
        assert!(matches!(
            HostScript::locate(no_catch, AnchorSet::K3D_2_X),
            Err(ScriptError::IncompatibleHostScript { anchor: "} catch (e) {", .. })
        ));
    }

    #[test]
    fn close_anchor_must_follow_open_anchor() {
        let text = "try {} catch (e) {} p.then(function(K3DInstance) { x(); });";
        assert!(HostScript::locate(text, AnchorSet::K3D_2_X).is_err());
    }

    #[test]
    fn snapshot_literal_is_extracted_with_terminator() {
        let snap = extract_snapshot(K3D_FIXTURE, AnchorSet::K3D_2_X).unwrap();
        assert_eq!(snap, " 'eNrtwTEBAAAAwqD1T20JT6AAAHgaDqAAAQ==';");
        assert!(extract_snapshot("var other = 1;", AnchorSet::K3D_2_X).is_err());
    }
}
