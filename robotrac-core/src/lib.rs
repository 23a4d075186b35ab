//! Host-independent core of the RoboTRAC viewer.
//!
//! The viewer frames are standalone pages written by a third-party 3-D
//! widget. This crate builds the scripts injected into them (shape drawing,
//! scene merging, small overlays), splices them into the widget's own module
//! script and keeps at most one copy of each script per frame. Frame documents
//! are reached through the [`inject::ScriptHost`] trait so everything here
//! runs and is tested without a browser.

pub mod bridge;
pub mod catalog;
pub mod draw;
pub mod error;
pub mod grid;
pub mod ids;
pub mod inject;
pub mod merge;
pub mod overlay;
pub mod shape;
pub mod splice;
pub mod template;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{Result, ScriptError};
pub use inject::{FrameSet, ScriptHost};
pub use shape::{Paint, Rgb, ShapeDescriptor, ShapeKind};
