//! Shape descriptors drawn over the viewer scenes and their delimited
//! encoding, which is what the hidden bridge control carries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScriptError};

/// Paint value that removes previously drawn objects instead of adding one.
pub const CLEAR_SENTINEL: &str = "clear";

const FIELD_SEPARATOR: char = ',';
const FIELD_COUNT: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Line,
    Sphere,
    Plane,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 3] = [ShapeKind::Line, ShapeKind::Sphere, ShapeKind::Plane];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::Line => "Line",
            ShapeKind::Sphere => "Sphere",
            ShapeKind::Plane => "Plane",
        }
    }

    /// three.js geometry type of the object built for this kind. Used to pick
    /// which user objects a redraw or clear removes.
    pub fn geometry_type(&self) -> &'static str {
        match self {
            ShapeKind::Line => "BufferGeometry",
            ShapeKind::Sphere => "SphereGeometry",
            ShapeKind::Plane => "PlaneGeometry",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShapeKind {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self> {
        ShapeKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ScriptError::invalid(format!("unknown shape kind `{s}`")))
    }
}

/// 24-bit colour as used by colour pickers (`#rrggbb`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// `#rrggbb`
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// `0xrrggbb`, the form three.js colour setters accept.
    pub fn to_js_literal(&self) -> String {
        format!("0x{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        let bad = || ScriptError::invalid(format!("`{s}` is not a #rrggbb colour"));
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(bad());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| bad());
        Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Paint {
    Color(Rgb),
    Clear,
}

impl Paint {
    pub fn is_clear(&self) -> bool {
        matches!(self, Paint::Clear)
    }
}

impl fmt::Display for Paint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Paint::Color(c) => write!(f, "{c}"),
            Paint::Clear => f.write_str(CLEAR_SENTINEL),
        }
    }
}

impl FromStr for Paint {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self> {
        // The in-frame handler tests for the sentinel by substring.
        if s.contains(CLEAR_SENTINEL) {
            Ok(Paint::Clear)
        } else {
            s.parse().map(Paint::Color)
        }
    }
}

/// A shape to add to (or clear from) a viewer scene.
///
/// The six parameters keep the positional meaning the in-frame script uses:
///
/// | kind   | p1..p3         | p4       | p5         | p6             |
/// |--------|----------------|----------|------------|----------------|
/// | Line   | start x, y, z  | end x    | end y      | end z          |
/// | Sphere | centre x, y, z | radius   | segments   | opacity 0..100 |
/// | Plane  | x1, y1, z      | x2       | y2         | opacity 0..100 |
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapeDescriptor {
    pub kind: ShapeKind,
    pub params: [f64; 6],
    pub paint: Paint,
}

impl ShapeDescriptor {
    pub fn line(from: [f64; 3], to: [f64; 3], color: Rgb) -> Self {
        ShapeDescriptor {
            kind: ShapeKind::Line,
            params: [from[0], from[1], from[2], to[0], to[1], to[2]],
            paint: Paint::Color(color),
        }
    }

    pub fn sphere(center: [f64; 3], radius: f64, segments: u32, opacity: f64, color: Rgb) -> Self {
        ShapeDescriptor {
            kind: ShapeKind::Sphere,
            params: [center[0], center[1], center[2], radius, segments as f64, opacity],
            paint: Paint::Color(color),
        }
    }

    pub fn plane(from: [f64; 2], to: [f64; 2], z: f64, opacity: f64, color: Rgb) -> Self {
        ShapeDescriptor {
            kind: ShapeKind::Plane,
            params: [from[0], from[1], z, to[0], to[1], opacity],
            paint: Paint::Color(color),
        }
    }

    /// Descriptor from the six form fields of `kind`, in the order of the
    /// bridge encoding. Rejected unless it passes [`Self::validate`].
    pub fn from_params(kind: ShapeKind, params: [f64; 6], color: Rgb) -> Result<Self> {
        let shape = ShapeDescriptor {
            kind,
            params,
            paint: Paint::Color(color),
        };
        shape.validate()?;
        Ok(shape)
    }

    /// Descriptor that removes every drawn object of `kind`.
    pub fn clear(kind: ShapeKind) -> Self {
        ShapeDescriptor {
            kind,
            params: [0.0; 6],
            paint: Paint::Clear,
        }
    }

    /// Values the draw form starts with.
    pub fn default_for(kind: ShapeKind) -> Self {
        match kind {
            ShapeKind::Line => {
                Self::line([300.0, 300.0, 300.0], [100.0, 100.0, 300.0], Rgb::new(0, 255, 0))
            }
            ShapeKind::Sphere => {
                Self::sphere([200.0, 200.0, 200.0], 20.0, 32, 100.0, Rgb::new(255, 0, 0))
            }
            ShapeKind::Plane => {
                Self::plane([0.0, 0.0], [200.0, 200.0], 300.0, 100.0, Rgb::new(0, 0, 255))
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(i) = self.params.iter().position(|p| !p.is_finite()) {
            return Err(ScriptError::invalid(format!(
                "{} parameter {} is not a finite number",
                self.kind,
                i + 1
            )));
        }
        if self.paint.is_clear() {
            return Ok(());
        }
        let p = &self.params;
        match self.kind {
            ShapeKind::Line => {}
            ShapeKind::Sphere => {
                if p[3] <= 0.0 {
                    return Err(ScriptError::invalid("sphere radius must be positive"));
                }
                if p[4] < 1.0 || p[4].fract() != 0.0 {
                    return Err(ScriptError::invalid(
                        "sphere segments must be a positive integer",
                    ));
                }
            }
            ShapeKind::Plane => {
                if p[3] == p[0] || p[4] == p[1] {
                    return Err(ScriptError::invalid("plane corners must span an area"));
                }
            }
        }
        if matches!(self.kind, ShapeKind::Sphere | ShapeKind::Plane) && !(0.0..=100.0).contains(&p[5])
        {
            return Err(ScriptError::invalid("opacity must be within 0..=100"));
        }
        Ok(())
    }

    /// `kind,p1,p2,p3,p4,p5,p6,paint`
    pub fn encode(&self) -> String {
        let mut out = String::from(self.kind.as_str());
        for p in self.params {
            out.push(FIELD_SEPARATOR);
            out.push_str(&p.to_string());
        }
        out.push(FIELD_SEPARATOR);
        out.push_str(&self.paint.to_string());
        out
    }

    pub fn decode(s: &str) -> Result<Self> {
        let fields: Vec<&str> = s.split(FIELD_SEPARATOR).collect();
        if fields.len() != FIELD_COUNT {
            return Err(ScriptError::invalid(format!(
                "expected {FIELD_COUNT} fields, got {}",
                fields.len()
            )));
        }
        let kind: ShapeKind = fields[0].parse()?;
        let mut params = [0.0; 6];
        for (slot, raw) in params.iter_mut().zip(&fields[1..7]) {
            *slot = raw
                .trim()
                .parse::<f64>()
                .map_err(|_| ScriptError::invalid(format!("`{raw}` is not a number")))?;
        }
        let paint: Paint = fields[7].parse()?;
        Ok(ShapeDescriptor {
            kind,
            params,
            paint,
        })
    }
}

impl fmt::Display for ShapeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_integral_values_without_fraction() {
        let d = ShapeDescriptor::default_for(ShapeKind::Line);
        assert_eq!(d.encode(), "Line,300,300,300,100,100,300,#00ff00");
    }

    #[test]
    fn clear_descriptor_uses_sentinel() {
        let d = ShapeDescriptor::clear(ShapeKind::Sphere);
        assert_eq!(d.encode(), "Sphere,0,0,0,0,0,0,clear");
        assert!(d.validate().is_ok());
    }

    #[test]
    fn decode_reads_back_fractional_plane() {
        let d = ShapeDescriptor::decode("Plane,-100,-100,187.5,400,300,40,#0000ff").unwrap();
        assert_eq!(d.kind, ShapeKind::Plane);
        assert_eq!(d.params, [-100.0, -100.0, 187.5, 400.0, 300.0, 40.0]);
        assert_eq!(d.paint, Paint::Color(Rgb::new(0, 0, 255)));
    }

    #[test]
    fn decode_rejects_malformed_values() {
        assert!(ShapeDescriptor::decode("Line,1,2,3").is_err());
        assert!(ShapeDescriptor::decode("Cube,0,0,0,0,0,0,#000000").is_err());
        assert!(ShapeDescriptor::decode("Line,a,0,0,0,0,0,#000000").is_err());
        assert!(ShapeDescriptor::decode("Line,0,0,0,0,0,0,green").is_err());
    }

    #[test]
    fn paint_treats_any_sentinel_mention_as_clear() {
        assert_eq!("clear".parse::<Paint>().unwrap(), Paint::Clear);
        assert_eq!(" clear ".parse::<Paint>().unwrap(), Paint::Clear);
    }

    #[test]
    fn colour_parsing_and_literals() {
        let c: Rgb = "#BBFF00".parse().unwrap();
        assert_eq!(c, Rgb::new(0xbb, 0xff, 0x00));
        assert_eq!(c.to_hex(), "#bbff00");
        assert_eq!(c.to_js_literal(), "0xbbff00");
        assert!("#12345".parse::<Rgb>().is_err());
        assert!("#12345g".parse::<Rgb>().is_err());
    }

    #[test]
    fn fractional_sphere_segments_are_rejected() {
        let red = Rgb::new(255, 0, 0);
        let fractional = [200.0, 200.0, 200.0, 20.0, 16.7, 100.0];
        assert!(ShapeDescriptor::from_params(ShapeKind::Sphere, fractional, red).is_err());

        let whole = [200.0, 200.0, 200.0, 20.0, 16.0, 100.0];
        let sphere = ShapeDescriptor::from_params(ShapeKind::Sphere, whole, red).unwrap();
        assert_eq!(sphere, ShapeDescriptor::sphere([200.0; 3], 20.0, 16, 100.0, red));
    }

    #[test]
    fn validation_catches_degenerate_shapes() {
        let mut s = ShapeDescriptor::default_for(ShapeKind::Sphere);
        assert!(s.validate().is_ok());
        s.params[3] = 0.0;
        assert!(s.validate().is_err());

        let mut s = ShapeDescriptor::default_for(ShapeKind::Sphere);
        s.params[5] = 120.0;
        assert!(s.validate().is_err());

        let p = ShapeDescriptor::plane([0.0, 0.0], [0.0, 200.0], 10.0, 50.0, Rgb::default());
        assert!(p.validate().is_err());

        let mut l = ShapeDescriptor::default_for(ShapeKind::Line);
        l.params[0] = f64::NAN;
        assert!(l.validate().is_err());
    }
}
