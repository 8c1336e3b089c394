//! Coordinate access for arbitrary point representations.
//!
//! The engine never looks inside a point. It asks a [`CoordinateProvider`]
//! for the coordinates of the point at a given index, passing along a
//! caller supplied context value that the provider may use to decide how
//! to extract them.

use geojson::{Feature, Value};
use serde_json::{Map, Value as JsonValue};

/// Number of axes the engine measures distances in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimensions {
    Two,
    Three,
}

impl Dimensions {
    pub fn axes(self) -> usize {
        match self {
            Dimensions::Two => 2,
            Dimensions::Three => 3,
        }
    }
}

/// A coordinate tuple of up to three axes.
///
/// Values past the third are accessor-private and dropped on construction.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Coordinates {
    values: [f64; 3],
    len: usize,
}

impl Coordinates {
    pub fn xy(x: f64, y: f64) -> Self {
        Coordinates { values: [x, y, 0.0], len: 2 }
    }

    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Coordinates { values: [x, y, z], len: 3 }
    }

    pub fn from_slice(values: &[f64]) -> Self {
        let mut coords = Coordinates::default();
        for &value in values.iter().take(3) {
            coords.values[coords.len] = value;
            coords.len += 1;
        }
        coords
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values[..self.len]
    }
}

/// Maps `(points, index, context)` to the coordinates of `points[index]`.
///
/// Implementations must be pure: the engine calls them many times per
/// point and in no particular order.
pub trait CoordinateProvider<P, C = ()> {
    fn coordinates(&self, points: &[P], index: usize, context: &C) -> Coordinates;
}

impl<P, C, F> CoordinateProvider<P, C> for F
where
    F: Fn(&[P], usize, &C) -> Coordinates,
{
    fn coordinates(&self, points: &[P], index: usize, context: &C) -> Coordinates {
        self(points, index, context)
    }
}

/// Treats every point as a coordinate tuple already, e.g. `[f64; 3]`,
/// `Vec<f64>` or a GeoJSON position. The context is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectAccessor;

impl<P, C> CoordinateProvider<P, C> for DirectAccessor
where
    P: AsRef<[f64]>,
{
    fn coordinates(&self, points: &[P], index: usize, _context: &C) -> Coordinates {
        Coordinates::from_slice(points[index].as_ref())
    }
}

/// Reads the position of GeoJSON point features.
///
/// Features without a `Point` geometry yield no coordinates, which the
/// engine reports as a precondition violation.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureAccessor;

impl<C> CoordinateProvider<Feature, C> for FeatureAccessor {
    fn coordinates(&self, points: &[Feature], index: usize, _context: &C) -> Coordinates {
        match points[index].geometry.as_ref().map(|g| &g.value) {
            Some(Value::Point(position)) => Coordinates::from_slice(position),
            _ => Coordinates::default(),
        }
    }
}

/// Names of the record fields holding each axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNames {
    pub x: String,
    pub y: String,
    pub z: Option<String>,
}

impl FieldNames {
    pub fn new(x: &str, y: &str) -> Self {
        FieldNames { x: x.to_string(), y: y.to_string(), z: None }
    }

    pub fn with_z(mut self, z: &str) -> Self {
        self.z = Some(z.to_string());
        self
    }
}

impl Default for FieldNames {
    fn default() -> Self {
        FieldNames::new("longitude", "latitude").with_z("altitude")
    }
}

/// Reads coordinates out of JSON records using the field names given as
/// the call context. Numeric strings are accepted, since loggers often
/// export every value as text.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldAccessor;

pub(crate) fn json_number(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl CoordinateProvider<Map<String, JsonValue>, FieldNames> for FieldAccessor {
    fn coordinates(
        &self,
        points: &[Map<String, JsonValue>],
        index: usize,
        names: &FieldNames,
    ) -> Coordinates {
        let record = &points[index];
        let mut values = Vec::with_capacity(3);
        let axes = [Some(&names.x), Some(&names.y), names.z.as_ref()];
        // stop at the first missing axis so the engine sees a short tuple
        for name in axes.iter().flatten() {
            match record.get(name.as_str()).and_then(json_number) {
                Some(v) => values.push(v),
                None => break,
            }
        }
        Coordinates::from_slice(&values)
    }
}
