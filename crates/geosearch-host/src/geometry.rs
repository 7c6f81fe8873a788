//! Map geometry primitives.
//!
//! Just enough geometry for result navigation: points, axis-aligned
//! rectangles, and coordinate reference system identifiers. Rendering and
//! full geometry types stay on the host side.

use serde::{Deserialize, Serialize};

/// A coordinate reference system identified by its authority id
/// (e.g. `EPSG:4326`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crs(pub String);

impl Crs {
    /// Creates a CRS from an authority id string.
    pub fn new(authid: impl Into<String>) -> Self {
        Self(authid.into())
    }

    /// The authority id.
    pub fn authid(&self) -> &str {
        &self.0
    }
}

/// A point in map units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Easting / x coordinate.
    pub x: f64,
    /// Northing / y coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in map units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Minimum x.
    pub x_min: f64,
    /// Minimum y.
    pub y_min: f64,
    /// Maximum x.
    pub x_max: f64,
    /// Maximum y.
    pub y_max: f64,
}

impl Rect {
    /// Creates a rectangle from its corner coordinates, normalizing the
    /// min/max ordering.
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min: x_min.min(x_max),
            y_min: y_min.min(y_max),
            x_max: x_min.max(x_max),
            y_max: y_min.max(y_max),
        }
    }

    /// A zero-size rectangle at a point.
    pub fn from_point(point: Point) -> Self {
        Self::new(point.x, point.y, point.x, point.y)
    }

    /// Rectangle width.
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Rectangle height.
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// The center point.
    pub fn center(&self) -> Point {
        Point::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// The smallest rectangle containing both `self` and `other`.
    pub fn combined(&self, other: &Self) -> Self {
        Self {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }

    /// Grows the rectangle by `fraction` of its width/height on each side.
    pub fn buffered(&self, fraction: f64) -> Self {
        let dx = self.width() * fraction;
        let dy = self.height() * fraction;
        Self {
            x_min: self.x_min - dx,
            y_min: self.y_min - dy,
            x_max: self.x_max + dx,
            y_max: self.y_max + dy,
        }
    }
}
