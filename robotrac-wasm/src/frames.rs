//! Viewer frame documents seen through the core's `ScriptHost` trait.

use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlIFrameElement, HtmlScriptElement};

use robotrac_core::inject::{FrameSet, Placement, ScriptHost, ScriptType};
use robotrac_core::{Result, ScriptError};

use crate::dom;

/// The document inside one iframe of the host page.
#[derive(Clone)]
pub struct IframeDocument {
    frame: String,
    document: Document,
}

impl IframeDocument {
    pub fn document(&self) -> &Document {
        &self.document
    }

    fn first_body_script(&self) -> Option<Element> {
        self.document
            .body()?
            .get_elements_by_tag_name("script")
            .item(0)
    }

    /// Numeric labels of the widget's bounding grid, in document order.
    pub fn axis_labels(&self) -> Vec<f64> {
        let Some(target) = self
            .document
            .get_element_by_id(robotrac_core::ids::CANVAS_TARGET)
        else {
            return Vec::new();
        };
        let labels = target.get_elements_by_tag_name("mn");
        (0..labels.length())
            .filter_map(|i| labels.item(i))
            .filter_map(|el| el.inner_html().trim().parse::<f64>().ok())
            .collect()
    }

    /// Click the widget's own control-panel entries whose label matches
    /// `label`, ignoring case.
    pub fn click_widget_button(&self, label: &str) -> usize {
        let buttons = self.document.get_elements_by_class_name("name");
        let mut clicked = 0;
        for i in 0..buttons.length() {
            if let Some(b) = buttons.item(i)
                && b.text_content()
                    .is_some_and(|t| t.trim().eq_ignore_ascii_case(label))
                && dom::click(&b)
            {
                clicked += 1;
            }
        }
        clicked
    }

    /// Click every collapsible panel title whose `aria-expanded` equals
    /// `expanded`, which toggles it to the other state.
    pub fn toggle_panels(&self, expanded: bool) {
        let want = if expanded { "true" } else { "false" };
        let titles = self.document.get_elements_by_class_name("title");
        for i in 0..titles.length() {
            let Some(t) = titles.item(i) else { continue };
            let is_button = t
                .get_attribute("role")
                .is_some_and(|r| r.eq_ignore_ascii_case("button"));
            let matches = t
                .get_attribute("aria-expanded")
                .is_some_and(|a| a.eq_ignore_ascii_case(want));
            if is_button && matches {
                dom::click(&t);
            }
        }
    }
}

impl ScriptHost for IframeDocument {
    fn frame_id(&self) -> &str {
        &self.frame
    }

    fn element_exists(&self, id: &str) -> bool {
        self.document.get_element_by_id(id).is_some()
    }

    fn script_text(&self, id: &str) -> Option<String> {
        self.document.get_element_by_id(id)?.text_content()
    }

    fn original_script_text(&self) -> Option<String> {
        self.first_body_script()?.text_content()
    }

    fn remove_original_script(&self) -> bool {
        match self.first_body_script() {
            Some(s) => {
                s.remove();
                true
            }
            None => false,
        }
    }

    fn remove_element(&self, id: &str) -> bool {
        match self.document.get_element_by_id(id) {
            Some(el) => {
                el.remove();
                true
            }
            None => false,
        }
    }

    fn append_script(
        &self,
        placement: Placement,
        id: &str,
        script_type: ScriptType,
        text: &str,
    ) -> Result<()> {
        let not_ready = |_| ScriptError::not_ready(&self.frame);
        let script: HtmlScriptElement = self
            .document
            .create_element("script")
            .map_err(not_ready)?
            .dyn_into()
            .map_err(|_| ScriptError::not_ready(&self.frame))?;
        script.set_id(id);
        if let Some(t) = script_type.attribute() {
            script.set_type(t);
        }
        script.set_text(text).map_err(not_ready)?;
        let parent: Element = match placement {
            Placement::Head => self.document.head().map(Element::from),
            Placement::Body => self.document.body().map(Element::from),
        }
        .ok_or_else(|| ScriptError::not_ready(&self.frame))?;
        parent.append_child(&script).map_err(not_ready)?;
        Ok(())
    }

    fn clear_children(&self, id: &str) -> bool {
        match self.document.get_element_by_id(id) {
            Some(el) => {
                el.set_inner_html("");
                true
            }
            None => false,
        }
    }

    fn control_value(&self, id: &str) -> Option<String> {
        dom::get_value(self.document.get_element_by_id(id)?.as_ref())
    }

    fn set_control_value(&self, id: &str, value: &str) -> bool {
        self.document
            .get_element_by_id(id)
            .is_some_and(|el| dom::set_value(el.as_ref(), value))
    }

    fn click(&self, id: &str) -> bool {
        self.document
            .get_element_by_id(id)
            .is_some_and(|el| dom::click(&el))
    }

    fn set_style(&self, id: &str, style: &str) -> bool {
        self.document
            .get_element_by_id(id)
            .is_some_and(|el| el.set_attribute("style", style).is_ok())
    }
}

/// Iframes of the host page, looked up by id on every access since the page
/// recreates them when the dataset changes.
#[derive(Clone)]
pub struct PageFrames {
    document: Document,
}

impl PageFrames {
    pub fn new(document: Document) -> Self {
        PageFrames { document }
    }

    pub fn iframe(&self, id: &str) -> Option<HtmlIFrameElement> {
        self.document.get_element_by_id(id)?.dyn_into().ok()
    }
}

impl FrameSet for PageFrames {
    type Host = IframeDocument;

    fn frame(&self, id: &str) -> Option<IframeDocument> {
        let document = self.iframe(id)?.content_document()?;
        // A frame that has not loaded yet still exposes an empty document.
        document.body()?;
        Some(IframeDocument {
            frame: id.to_string(),
            document,
        })
    }
}
