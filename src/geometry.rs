//! Point and vector primitives shared by the estimator and segmenter.

use serde::{Deserialize, Serialize};

/// Magnitude below which a vector is treated as zero-length.
const NEAR_ZERO: f64 = 1e-10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point2D) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(&self, other: &Point3D) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn sub(&self, other: &Point3D) -> Point3D {
        Point3D::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn scale(&self, factor: f64) -> Point3D {
        Point3D::new(self.x * factor, self.y * factor, self.z * factor)
    }

    pub fn add(&self, other: &Point3D) -> Point3D {
        Point3D::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn magnitude(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Normalize to unit length. A near-zero vector yields the default
    /// forward direction instead of NaN components.
    pub fn normalized(&self) -> Point3D {
        let magnitude = self.magnitude();
        if magnitude < NEAR_ZERO {
            return Point3D::new(0.0, 0.0, 1.0);
        }
        Point3D::new(self.x / magnitude, self.y / magnitude, self.z / magnitude)
    }

    /// Mean position of a landmark group. Empty input yields the origin.
    pub fn centroid(points: &[Point3D]) -> Point3D {
        if points.is_empty() {
            return Point3D::default();
        }
        let n = points.len() as f64;
        let sum = points
            .iter()
            .fold(Point3D::default(), |acc, p| acc.add(p));
        Point3D::new(sum.x / n, sum.y / n, sum.z / n)
    }
}

/// Mean position of 2D points. Empty input yields `None`.
pub fn centroid_2d(points: &[Point2D]) -> Option<Point2D> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point2D::new(sx / n, sy / n))
}
