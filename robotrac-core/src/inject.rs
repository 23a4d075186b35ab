//! Attaching scripts to frame documents, at most once per identity.

use std::fmt;

use crate::error::{Result, ScriptError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Placement {
    /// Global setup such as an import map. Never replaced once present.
    Head,
    /// Replaced wholesale on every injection.
    Body,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScriptType {
    ImportMap,
    Module,
    Classic,
}

impl ScriptType {
    /// Value of the `type` attribute; classic scripts carry none.
    pub fn attribute(&self) -> Option<&'static str> {
        match self {
            ScriptType::ImportMap => Some("importmap"),
            ScriptType::Module => Some("module"),
            ScriptType::Classic => None,
        }
    }
}

/// `(frame, logical name)`. Rendered as the element id `<name>_<frame>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScriptIdentity {
    pub frame: String,
    pub name: &'static str,
}

impl ScriptIdentity {
    pub fn new(frame: &str, name: &'static str) -> Self {
        ScriptIdentity {
            frame: frame.to_string(),
            name,
        }
    }

    pub fn element_id(&self) -> String {
        format!("{}_{}", self.name, self.frame)
    }
}

impl fmt::Display for ScriptIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.name, self.frame)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptSpec {
    pub identity: ScriptIdentity,
    pub placement: Placement,
    pub script_type: ScriptType,
    pub text: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InjectOutcome {
    Inserted,
    Replaced,
    Unchanged,
}

/// The document of one viewer frame.
///
/// Implementations wrap a DOM they do not own; every method reports absence
/// rather than failing. Methods take `&self` because DOM handles mutate
/// through shared references.
pub trait ScriptHost {
    fn frame_id(&self) -> &str;

    fn element_exists(&self, id: &str) -> bool;

    /// Text of the element with `id`, if it exists.
    fn script_text(&self, id: &str) -> Option<String>;

    /// Text of the first `<script>` in `<body>`: the widget's own script
    /// before anything has been injected.
    fn original_script_text(&self) -> Option<String>;

    /// Remove the first `<script>` in `<body>`.
    fn remove_original_script(&self) -> bool;

    fn remove_element(&self, id: &str) -> bool;

    fn append_script(
        &self,
        placement: Placement,
        id: &str,
        script_type: ScriptType,
        text: &str,
    ) -> Result<()>;

    /// Drop every child of the element with `id`.
    fn clear_children(&self, id: &str) -> bool;

    /// Read the `value` of a form control.
    fn control_value(&self, id: &str) -> Option<String>;

    fn set_control_value(&self, id: &str, value: &str) -> bool;

    fn click(&self, id: &str) -> bool;

    fn set_style(&self, id: &str, style: &str) -> bool;
}

/// Lookup of frame documents by id. A frame that is missing or still loading
/// yields `None`.
pub trait FrameSet {
    type Host: ScriptHost;

    fn frame(&self, id: &str) -> Option<Self::Host>;
}

/// Attach `spec` to `host`.
///
/// A head script already present is left alone when its text matches and is a
/// conflict otherwise; a body script is removed and inserted again.
pub fn inject<H: ScriptHost + ?Sized>(host: Option<&H>, spec: &ScriptSpec) -> Result<InjectOutcome> {
    let host = host.ok_or_else(|| ScriptError::not_ready(&spec.identity.frame))?;
    let id = spec.identity.element_id();
    let outcome = if host.element_exists(&id) {
        match spec.placement {
            Placement::Head => {
                if host.script_text(&id).as_deref() == Some(spec.text.as_str()) {
                    return Ok(InjectOutcome::Unchanged);
                }
                return Err(ScriptError::InjectionConflict { id });
            }
            Placement::Body => {
                host.remove_element(&id);
                InjectOutcome::Replaced
            }
        }
    } else {
        InjectOutcome::Inserted
    };
    host.append_script(spec.placement, &id, spec.script_type, &spec.text)?;
    Ok(outcome)
}

/// Remove the script with `identity`. Returns whether one was present.
pub fn remove<H: ScriptHost + ?Sized>(host: Option<&H>, identity: &ScriptIdentity) -> Result<bool> {
    let host = host.ok_or_else(|| ScriptError::not_ready(&identity.frame))?;
    Ok(host.remove_element(&identity.element_id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeFrame;

    fn spec(placement: Placement, text: &str) -> ScriptSpec {
        ScriptSpec {
            identity: ScriptIdentity::new("title1", "probe"),
            placement,
            script_type: ScriptType::Module,
            text: text.to_string(),
        }
    }

    #[test]
    fn element_id_joins_name_and_frame() {
        let id = ScriptIdentity::new("title2", "drawShapeScript");
        assert_eq!(id.element_id(), "drawShapeScript_title2");
        assert_eq!(id.to_string(), id.element_id());
    }

    #[test]
    fn absent_frame_is_not_ready() {
        let err = inject::<FakeFrame>(None, &spec(Placement::Body, "x")).unwrap_err();
        assert_eq!(err, ScriptError::not_ready("title1"));
        assert!(remove::<FakeFrame>(None, &ScriptIdentity::new("title1", "probe")).is_err());
    }

    #[test]
    fn head_script_is_injected_once() {
        let frame = FakeFrame::with_widget("title1");
        let s = spec(Placement::Head, "{}");
        assert_eq!(inject(Some(&frame), &s).unwrap(), InjectOutcome::Inserted);
        let count = frame.head_len();
        assert_eq!(inject(Some(&frame), &s).unwrap(), InjectOutcome::Unchanged);
        assert_eq!(frame.head_len(), count);
    }

    #[test]
    fn head_script_with_new_text_conflicts() {
        let frame = FakeFrame::with_widget("title1");
        inject(Some(&frame), &spec(Placement::Head, "{}")).unwrap();
        let err = inject(Some(&frame), &spec(Placement::Head, "{ \"imports\": {} }")).unwrap_err();
        assert_eq!(
            err,
            ScriptError::InjectionConflict {
                id: "probe_title1".into()
            }
        );
        assert_eq!(frame.script_text("probe_title1").as_deref(), Some("{}"));
    }

    #[test]
    fn body_script_is_replaced() {
        let frame = FakeFrame::with_widget("title1");
        inject(Some(&frame), &spec(Placement::Body, "first")).unwrap();
        let outcome = inject(Some(&frame), &spec(Placement::Body, "second")).unwrap();
        assert_eq!(outcome, InjectOutcome::Replaced);
        assert_eq!(frame.count_with_id("probe_title1"), 1);
        assert_eq!(frame.script_text("probe_title1").as_deref(), Some("second"));
    }

    #[test]
    fn remove_reports_presence() {
        let frame = FakeFrame::with_widget("title1");
        let id = ScriptIdentity::new("title1", "probe");
        assert!(!remove(Some(&frame), &id).unwrap());
        inject(Some(&frame), &spec(Placement::Body, "x")).unwrap();
        assert!(remove(Some(&frame), &id).unwrap());
        assert!(!frame.element_exists("probe_title1"));
    }
}
