//! Passing new shape parameters to an already injected drawing script.
//!
//! The drawing script creates a hidden button whose `value` holds the encoded
//! [`ShapeDescriptor`] and whose click handler redraws from that value. The
//! host rewrites the value and clicks, which avoids re-injecting the script and
//! keeps whatever the user has dragged around.

use crate::error::{Result, ScriptError};
use crate::ids::BRIDGE_ELEMENT;
use crate::inject::ScriptHost;
use crate::shape::ShapeDescriptor;

pub struct ParameterBridge<'a, H: ScriptHost + ?Sized> {
    host: &'a H,
}

impl<'a, H: ScriptHost + ?Sized> ParameterBridge<'a, H> {
    /// Fails with `TargetNotReady` when the frame has no bridge element yet.
    pub fn attach(host: &'a H) -> Result<Self> {
        if host.element_exists(BRIDGE_ELEMENT) {
            Ok(ParameterBridge { host })
        } else {
            Err(ScriptError::not_ready(host.frame_id()))
        }
    }

    pub fn present(host: &H) -> bool {
        host.element_exists(BRIDGE_ELEMENT)
    }

    /// Write `shape` and fire the handler.
    pub fn push(&self, shape: &ShapeDescriptor) -> Result<()> {
        shape.validate()?;
        let frame = self.host.frame_id();
        if !self.host.set_control_value(BRIDGE_ELEMENT, &shape.encode()) {
            return Err(ScriptError::not_ready(frame));
        }
        if !self.host.click(BRIDGE_ELEMENT) {
            return Err(ScriptError::not_ready(frame));
        }
        Ok(())
    }

    /// Descriptor the bridge currently holds.
    pub fn read(&self) -> Result<ShapeDescriptor> {
        let value = self
            .host
            .control_value(BRIDGE_ELEMENT)
            .ok_or_else(|| ScriptError::not_ready(self.host.frame_id()))?;
        ShapeDescriptor::decode(&value)
    }

    /// Drop the element so the next injected script creates a fresh one bound
    /// to its own handler.
    pub fn detach(self) -> bool {
        self.host.remove_element(BRIDGE_ELEMENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{Rgb, ShapeKind};
    use crate::testing::FakeFrame;

    #[test]
    fn attach_requires_bridge_element() {
        let frame = FakeFrame::with_widget("title1");
        assert!(matches!(
            ParameterBridge::attach(&frame),
            Err(ScriptError::TargetNotReady { .. })
        ));
        frame.add_control(BRIDGE_ELEMENT, "");
        assert!(ParameterBridge::attach(&frame).is_ok());
    }

    #[test]
    fn push_writes_encoding_and_clicks() {
        let frame = FakeFrame::with_widget("title1");
        frame.add_control(BRIDGE_ELEMENT, "");
        let bridge = ParameterBridge::attach(&frame).unwrap();
        let line = ShapeDescriptor::line([0.0, 0.0, 0.0], [1.0, 1.0, 1.0], Rgb::new(1, 2, 3));
        bridge.push(&line).unwrap();
        assert_eq!(bridge.read().unwrap(), line);
        assert_eq!(frame.clicks(BRIDGE_ELEMENT), 1);
    }

    #[test]
    fn push_rejects_invalid_shapes_before_touching_frame() {
        let frame = FakeFrame::with_widget("title1");
        frame.add_control(BRIDGE_ELEMENT, "keep");
        let bridge = ParameterBridge::attach(&frame).unwrap();
        let mut sphere = ShapeDescriptor::default_for(ShapeKind::Sphere);
        sphere.params[3] = -1.0;
        assert!(bridge.push(&sphere).is_err());
        assert_eq!(frame.control_value(BRIDGE_ELEMENT).as_deref(), Some("keep"));
        assert_eq!(frame.clicks(BRIDGE_ELEMENT), 0);
    }

    #[test]
    fn detach_removes_element() {
        let frame = FakeFrame::with_widget("title1");
        frame.add_control(BRIDGE_ELEMENT, "");
        assert!(ParameterBridge::attach(&frame).unwrap().detach());
        assert!(!ParameterBridge::present(&frame));
    }
}
