//! In-memory frame documents for exercising injection without a browser.
//!
//! [`FakeFrame`] models just enough of a viewer page: a `<head>`, a `<body>`
//! holding the canvas container and the widget's module script, form controls,
//! and a scene graph. Scripts produced by this crate are "executed" by
//! recognising the bridge they create, so bridge clicks redraw the scene the
//! same way the in-frame handler does.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::Result;
use crate::ids::{BRIDGE_ELEMENT, CANVAS_TARGET, USER_OBJECT_START};
use crate::inject::{FrameSet, Placement, ScriptHost, ScriptType};
use crate::shape::{Paint, Rgb, ShapeDescriptor};

/// Trimmed-down module script as written by the widget's standalone export.
pub const K3D_FIXTURE: &str = r#"import { lib } from './k3d.js';
var data = 'eNrtwTEBAAAAwqD1T20JT6AAAHgaDqAAAQ==';
function _base64ToArrayBuffer(base64) {
    var binary_string = window.atob(base64);
    var bytes = new Uint8Array(binary_string.length);
    for (var i = 0; i < binary_string.length; i++) { bytes[i] = binary_string.charCodeAt(i); }
    return bytes.buffer;
}
var K3DInstance;
try {
    K3DInstance = new lib.CreateK3DAndLoadBinarySnapshot(
        _base64ToArrayBuffer(data),
        document.getElementById('canvasTarget')
    );
    K3DInstance.then(function(K3DInstance) {
        if (window.parent !== window) { K3DInstance.setMenuVisibility(true); }
    });
} catch (e) {
    console.error(e);
}
"#;

#[derive(Clone, Debug, PartialEq)]
pub struct SceneObject {
    pub label: String,
    pub geometry: Option<&'static str>,
    pub params: [f64; 6],
    pub color: Option<Rgb>,
}

impl SceneObject {
    fn builtin(label: &str) -> Self {
        SceneObject {
            label: label.to_string(),
            geometry: None,
            params: [0.0; 6],
            color: None,
        }
    }
}

/// Scene graph as the widget leaves it: light, camera and object group,
/// followed by anything the drawing handler added.
#[derive(Clone, Debug)]
pub struct FakeScene {
    pub children: Vec<SceneObject>,
    /// Objects handed to the most recent drag controls.
    pub draggable: usize,
}

impl Default for FakeScene {
    fn default() -> Self {
        FakeScene {
            children: vec![
                SceneObject::builtin("AmbientLight"),
                SceneObject::builtin("PerspectiveCamera"),
                SceneObject::builtin("Group"),
            ],
            draggable: 0,
        }
    }
}

impl FakeScene {
    /// Same steps as the bridge click handler.
    pub fn apply(&mut self, shape: &ShapeDescriptor) {
        let geometry = shape.kind.geometry_type();
        let mut i = self.children.len();
        while i > USER_OBJECT_START {
            i -= 1;
            if self.children[i].geometry == Some(geometry) {
                self.children.remove(i);
            }
        }
        let Paint::Color(color) = shape.paint else {
            return;
        };
        self.children.push(SceneObject {
            label: shape.kind.as_str().to_string(),
            geometry: Some(geometry),
            params: shape.params,
            color: Some(color),
        });
        self.draggable = self.user_objects().len();
    }

    pub fn user_objects(&self) -> &[SceneObject] {
        self.children.get(USER_OBJECT_START..).unwrap_or(&[])
    }
}

#[derive(Clone, Debug)]
struct Element {
    id: Option<String>,
    script_type: Option<ScriptType>,
    text: String,
    children: usize,
    style: Option<String>,
    clicks: usize,
}

impl Element {
    fn new(id: Option<&str>, text: &str) -> Self {
        Element {
            id: id.map(str::to_string),
            script_type: None,
            text: text.to_string(),
            children: 0,
            style: None,
            clicks: 0,
        }
    }
}

#[derive(Debug, Default)]
struct FrameState {
    head: Vec<Element>,
    body: Vec<Element>,
    scene: FakeScene,
    executed: Vec<String>,
}

impl FrameState {
    fn find(&self, id: &str) -> Option<&Element> {
        self.head
            .iter()
            .chain(self.body.iter())
            .find(|e| e.id.as_deref() == Some(id))
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.head
            .iter_mut()
            .chain(self.body.iter_mut())
            .find(|e| e.id.as_deref() == Some(id))
    }
}

/// Cheap to clone; clones share the same document.
#[derive(Clone, Debug)]
pub struct FakeFrame {
    id: String,
    state: Rc<RefCell<FrameState>>,
}

impl FakeFrame {
    /// A loaded viewer page whose widget wrote [`K3D_FIXTURE`].
    pub fn with_widget(id: &str) -> Self {
        Self::with_script(id, K3D_FIXTURE)
    }

    pub fn with_script(id: &str, script: &str) -> Self {
        let frame = Self::empty(id);
        {
            let mut st = frame.state.borrow_mut();
            let mut canvas = Element::new(Some(CANVAS_TARGET), "");
            canvas.children = 4;
            st.body.push(canvas);
            let mut widget = Element::new(None, script);
            widget.script_type = Some(ScriptType::Module);
            st.body.push(widget);
        }
        frame
    }

    /// A loaded page with nothing in it.
    pub fn empty(id: &str) -> Self {
        FakeFrame {
            id: id.to_string(),
            state: Rc::new(RefCell::new(FrameState::default())),
        }
    }

    pub fn add_control(&self, id: &str, value: &str) {
        self.state.borrow_mut().body.push(Element::new(Some(id), value));
    }

    pub fn head_len(&self) -> usize {
        self.state.borrow().head.len()
    }

    pub fn count_with_id(&self, id: &str) -> usize {
        let st = self.state.borrow();
        st.head
            .iter()
            .chain(st.body.iter())
            .filter(|e| e.id.as_deref() == Some(id))
            .count()
    }

    pub fn clicks(&self, id: &str) -> usize {
        self.state.borrow().find(id).map_or(0, |e| e.clicks)
    }

    pub fn style(&self, id: &str) -> Option<String> {
        self.state.borrow().find(id).and_then(|e| e.style.clone())
    }

    pub fn canvas_children(&self) -> usize {
        self.state.borrow().find(CANVAS_TARGET).map_or(0, |e| e.children)
    }

    pub fn scene(&self) -> FakeScene {
        self.state.borrow().scene.clone()
    }

    /// Ids of body scripts run so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.state.borrow().executed.clone()
    }

    // A drawing script creates the bridge on first run and clicks it once.
    fn run_body_script(&self, id: &str, text: &str) {
        self.state.borrow_mut().executed.push(id.to_string());
        const MARKER: &str = "bridge.value = \"";
        let Some(start) = text.find(MARKER).map(|i| i + MARKER.len()) else {
            return;
        };
        let Some(len) = text[start..].find('"') else {
            return;
        };
        if self.element_exists(BRIDGE_ELEMENT) {
            return;
        }
        self.add_control(BRIDGE_ELEMENT, &text[start..start + len]);
        self.click(BRIDGE_ELEMENT);
    }
}

impl ScriptHost for FakeFrame {
    fn frame_id(&self) -> &str {
        &self.id
    }

    fn element_exists(&self, id: &str) -> bool {
        self.state.borrow().find(id).is_some()
    }

    fn script_text(&self, id: &str) -> Option<String> {
        self.state.borrow().find(id).map(|e| e.text.clone())
    }

    fn original_script_text(&self) -> Option<String> {
        self.state
            .borrow()
            .body
            .iter()
            .find(|e| e.script_type.is_some())
            .map(|e| e.text.clone())
    }

    fn remove_original_script(&self) -> bool {
        let mut st = self.state.borrow_mut();
        match st.body.iter().position(|e| e.script_type.is_some()) {
            Some(i) => {
                st.body.remove(i);
                true
            }
            None => false,
        }
    }

    fn remove_element(&self, id: &str) -> bool {
        let mut st = self.state.borrow_mut();
        let before = st.head.len() + st.body.len();
        st.head.retain(|e| e.id.as_deref() != Some(id));
        st.body.retain(|e| e.id.as_deref() != Some(id));
        before != st.head.len() + st.body.len()
    }

    fn append_script(
        &self,
        placement: Placement,
        id: &str,
        script_type: ScriptType,
        text: &str,
    ) -> Result<()> {
        let mut el = Element::new(Some(id), text);
        el.script_type = Some(script_type);
        match placement {
            Placement::Head => self.state.borrow_mut().head.push(el),
            Placement::Body => {
                self.state.borrow_mut().body.push(el);
                self.run_body_script(id, text);
            }
        }
        Ok(())
    }

    fn clear_children(&self, id: &str) -> bool {
        match self.state.borrow_mut().find_mut(id) {
            Some(e) => {
                e.children = 0;
                true
            }
            None => false,
        }
    }

    fn control_value(&self, id: &str) -> Option<String> {
        self.script_text(id)
    }

    fn set_control_value(&self, id: &str, value: &str) -> bool {
        match self.state.borrow_mut().find_mut(id) {
            Some(e) => {
                e.text = value.to_string();
                true
            }
            None => false,
        }
    }

    fn click(&self, id: &str) -> bool {
        let value = {
            let mut st = self.state.borrow_mut();
            let Some(el) = st.find_mut(id) else {
                return false;
            };
            el.clicks += 1;
            el.text.clone()
        };
        if id == BRIDGE_ELEMENT
            && let Ok(shape) = ShapeDescriptor::decode(&value)
        {
            self.state.borrow_mut().scene.apply(&shape);
        }
        true
    }

    fn set_style(&self, id: &str, style: &str) -> bool {
        match self.state.borrow_mut().find_mut(id) {
            Some(e) => {
                e.style = Some(style.to_string());
                true
            }
            None => false,
        }
    }
}

/// Frames by id; ids not registered behave like frames that never loaded.
#[derive(Clone, Debug, Default)]
pub struct FakeFrames {
    frames: HashMap<String, FakeFrame>,
}

impl FakeFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Both viewer frames, loaded with the widget fixture.
    pub fn viewers() -> Self {
        let mut frames = Self::new();
        for id in crate::ids::VIEWER_FRAMES {
            frames.insert(FakeFrame::with_widget(id));
        }
        frames
    }

    pub fn insert(&mut self, frame: FakeFrame) {
        self.frames.insert(frame.id.clone(), frame);
    }

    pub fn get(&self, id: &str) -> &FakeFrame {
        &self.frames[id]
    }
}

impl FrameSet for FakeFrames {
    type Host = FakeFrame;

    fn frame(&self, id: &str) -> Option<FakeFrame> {
        self.frames.get(id).cloned()
    }
}
