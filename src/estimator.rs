//! Per-frame 3D gaze projection.
//!
//! Eye center is triangulated from four face-mesh landmarks, the gaze ray
//! runs from it through the iris center, and the ray is intersected with a
//! fixed screen plane derived once per session from the capability
//! descriptor. Head rotation is separated from gaze direction this way.

use serde::{Deserialize, Serialize};

use crate::config::{EstimatorConfig, ScreenDescriptor};
use crate::constants::{
    LEFT_EYE_INNER, LEFT_EYE_LOWER, LEFT_EYE_OUTER, LEFT_EYE_UPPER, MM_PER_INCH, RIGHT_EYE_INNER,
    RIGHT_EYE_LOWER, RIGHT_EYE_OUTER, RIGHT_EYE_UPPER,
};
use crate::geometry::{centroid_2d, Point2D, Point3D};
use crate::types::{FrameLandmarks, GazePoint};

/// Ray/plane denominator below which the ray counts as parallel.
const PARALLEL_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GazeVector {
    pub origin: Point3D,
    /// Unit direction
    pub direction: Point3D,
}

/// Screen plane in metric units, perpendicular to the z axis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenPlane {
    pub normal: Point3D,
    /// Distance from the ray origin along the normal (mm)
    pub distance: f64,
    pub width_mm: f64,
    pub height_mm: f64,
}

impl ScreenPlane {
    /// Derive the plane from pixel dimensions at the descriptor's DPI and
    /// viewing distance.
    pub fn from_descriptor(screen: &ScreenDescriptor) -> Self {
        let pixels_per_mm = screen.dpi / MM_PER_INCH;
        Self {
            normal: Point3D::new(0.0, 0.0, 1.0),
            distance: screen.viewing_distance_mm,
            width_mm: screen.width_px as f64 / pixels_per_mm,
            height_mm: screen.height_px as f64 / pixels_per_mm,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Eye {
    Left,
    Right,
}

impl Eye {
    /// Inner corner, outer corner, upper lid, lower lid.
    fn corner_indices(self) -> [usize; 4] {
        match self {
            Eye::Left => [LEFT_EYE_INNER, LEFT_EYE_OUTER, LEFT_EYE_UPPER, LEFT_EYE_LOWER],
            Eye::Right => [RIGHT_EYE_INNER, RIGHT_EYE_OUTER, RIGHT_EYE_UPPER, RIGHT_EYE_LOWER],
        }
    }
}

pub struct GazeEstimator {
    plane: ScreenPlane,
    config: EstimatorConfig,
}

impl GazeEstimator {
    pub fn new(screen: &ScreenDescriptor, config: EstimatorConfig) -> Self {
        Self {
            plane: ScreenPlane::from_descriptor(screen),
            config,
        }
    }

    pub fn plane(&self) -> &ScreenPlane {
        &self.plane
    }

    /// Estimate the normalized screen-space gaze point for one frame.
    ///
    /// Both eyes are projected and averaged; a single valid eye is used
    /// alone. `None` means the frame carried no usable estimate (missing
    /// landmarks, parallel ray, or intersection behind the origin) and must
    /// be dropped, never substituted with a stale value.
    pub fn estimate(&self, frame: &FrameLandmarks) -> Option<GazePoint> {
        let left = self.estimate_eye(frame, Eye::Left);
        let right = self.estimate_eye(frame, Eye::Right);

        let point = match (left, right) {
            (Some(l), Some(r)) => Point2D::new((l.x + r.x) / 2.0, (l.y + r.y) / 2.0),
            (Some(p), None) | (None, Some(p)) => p,
            (None, None) => {
                tracing::debug!(timestamp = frame.timestamp, "frame dropped: no eye projected");
                return None;
            }
        };

        Some(GazePoint {
            x: point.x,
            y: point.y,
            timestamp: frame.timestamp,
            pupil_diameter: frame.pupil_diameter_or_default(),
            confidence: frame.confidence_or_default(),
        })
    }

    fn estimate_eye(&self, frame: &FrameLandmarks, eye: Eye) -> Option<Point2D> {
        let indices = eye.corner_indices();
        let max_index = *indices.iter().max().expect("non-empty");
        if frame.face_landmarks.len() <= max_index {
            return None;
        }

        let iris = match eye {
            Eye::Left => &frame.left_iris,
            Eye::Right => &frame.right_iris,
        };
        if iris.len() < self.config.min_iris_landmarks {
            return None;
        }

        let corners: Vec<Point3D> = indices
            .iter()
            .map(|&i| frame.face_landmarks[i])
            .collect();
        let eye_center = Point3D::centroid(&corners);

        let iris_center = centroid_2d(iris)?;
        let iris_center_3d = Point3D::new(
            iris_center.x,
            iris_center.y,
            eye_center.z + self.config.iris_depth_offset,
        );

        let ray = GazeVector {
            origin: eye_center,
            direction: iris_center_3d.sub(&eye_center).normalized(),
        };

        let intersection = self.intersect(&ray)?;
        Some(self.to_screen_coordinates(&intersection))
    }

    /// Parametric ray/plane intersection. `None` when the ray is parallel
    /// to the screen or the intersection lies behind the origin.
    fn intersect(&self, ray: &GazeVector) -> Option<Point3D> {
        let denom = ray.direction.dot(&self.plane.normal);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }

        let t = (self.plane.distance - ray.origin.dot(&self.plane.normal)) / denom;
        if t < 0.0 {
            return None;
        }

        Some(ray.origin.add(&ray.direction.scale(t)))
    }

    /// Re-center the metric intersection against the plane and clamp to
    /// normalized [0,1] screen coordinates.
    fn to_screen_coordinates(&self, intersection: &Point3D) -> Point2D {
        let x = (intersection.x + self.plane.width_mm / 2.0) / self.plane.width_mm;
        let y = (intersection.y + self.plane.height_mm / 2.0) / self.plane.height_mm;
        Point2D::new(x.clamp(0.0, 1.0), y.clamp(0.0, 1.0))
    }
}
