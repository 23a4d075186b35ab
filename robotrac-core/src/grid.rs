//! Placing a plane at the slice currently shown by the image slider.

use crate::error::{Result, ScriptError};
use crate::shape::{Rgb, ShapeDescriptor};

/// Extra margin around the grid for slice planes, in scene units.
pub const PLANE_MARGIN: f64 = 100.0;

/// Largest tick value on each axis of the widget's bounding grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridExtent {
    pub max_x: f64,
    pub max_y: f64,
    pub max_z: f64,
}

impl GridExtent {
    /// Rebuild the extent from the grid's tick labels in document order.
    ///
    /// The widget labels the four edges of the box along each axis, y first,
    /// then x, then z, each edge counting up from 0. A drop in value starts
    /// the next edge, so the maxima of y, x and z are the last values of
    /// runs 0, 4 and 8.
    pub fn from_axis_labels(labels: &[f64]) -> Option<Self> {
        let mut runs: Vec<f64> = Vec::new();
        let mut current = -PLANE_MARGIN;
        for &v in labels {
            if !v.is_finite() {
                continue;
            }
            if v < current || runs.is_empty() {
                runs.push(v);
            } else if let Some(last) = runs.last_mut() {
                *last = v;
            }
            current = v;
        }
        Some(GridExtent {
            max_y: *runs.first()?,
            max_x: *runs.get(4)?,
            max_z: *runs.get(8)?,
        })
    }
}

/// Position of the range slider over the slice images.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SliderPosition {
    pub max: u32,
    pub value: u32,
}

impl SliderPosition {
    /// Slice number counted from the far end of the volume.
    pub fn slice(&self) -> u32 {
        self.max.saturating_sub(self.value)
    }
}

/// A plane covering the grid at the slider's slice, plus that slice number.
pub fn plane_for_slice(
    extent: GridExtent,
    slider: SliderPosition,
    opacity: f64,
    color: Rgb,
) -> Result<(ShapeDescriptor, u32)> {
    if slider.max == 0 {
        return Err(ScriptError::invalid("slider has no range"));
    }
    let slice = slider.slice();
    let z = (extent.max_z * slice as f64 / slider.max as f64).floor();
    let plane = ShapeDescriptor::plane(
        [-PLANE_MARGIN, -PLANE_MARGIN],
        [
            extent.max_x.floor() + PLANE_MARGIN,
            extent.max_y.floor() + PLANE_MARGIN,
        ],
        z,
        opacity,
        color,
    );
    plane.validate()?;
    Ok((plane, slice))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(max_y: u32, max_x: u32, max_z: u32) -> Vec<f64> {
        let mut out = Vec::new();
        for max in [max_y, max_x, max_z] {
            for _ in 0..4 {
                out.extend((0..=max).step_by(100).map(|v| v as f64));
            }
        }
        out
    }

    #[test]
    fn extent_from_grid_labels() {
        let ext = GridExtent::from_axis_labels(&labels(200, 300, 500)).unwrap();
        assert_eq!(
            ext,
            GridExtent {
                max_x: 300.0,
                max_y: 200.0,
                max_z: 500.0
            }
        );
    }

    #[test]
    fn too_few_runs_gives_none() {
        assert!(GridExtent::from_axis_labels(&[]).is_none());
        assert!(GridExtent::from_axis_labels(&[0.0, 100.0, 0.0, 100.0]).is_none());
    }

    #[test]
    fn plane_sits_at_slider_slice() {
        let ext = GridExtent {
            max_x: 300.0,
            max_y: 200.0,
            max_z: 500.0,
        };
        let slider = SliderPosition { max: 84, value: 22 };
        let (plane, slice) = plane_for_slice(ext, slider, 40.0, Rgb::new(0, 0, 255)).unwrap();
        assert_eq!(slice, 62);
        assert_eq!(plane.params, [-100.0, -100.0, 369.0, 400.0, 300.0, 40.0]);
    }

    #[test]
    fn empty_slider_range_is_rejected() {
        let ext = GridExtent {
            max_x: 1.0,
            max_y: 1.0,
            max_z: 1.0,
        };
        let slider = SliderPosition { max: 0, value: 0 };
        assert!(plane_for_slice(ext, slider, 50.0, Rgb::default()).is_err());
    }
}
