use gaze_analytics::config::ScreenDescriptor;
use gaze_analytics::constants::{
    IRIS_DEPTH_OFFSET, LEFT_EYE_INNER, LEFT_EYE_LOWER, LEFT_EYE_OUTER, LEFT_EYE_UPPER,
    MIN_IRIS_LANDMARKS, MM_PER_INCH, RIGHT_EYE_INNER, RIGHT_EYE_LOWER, RIGHT_EYE_OUTER,
    RIGHT_EYE_UPPER,
};
use gaze_analytics::geometry::{Point2D, Point3D};
use gaze_analytics::lines::TextLayout;
use gaze_analytics::types::FrameLandmarks;

/// Synthetic frame whose geometry projects exactly onto the normalized
/// screen point `(nx, ny)` under the default screen descriptor: the iris
/// offset is chosen parallel to the ray that hits that point.
pub fn frame_looking_at(nx: f64, ny: f64, timestamp: f64) -> FrameLandmarks {
    let screen = ScreenDescriptor::default();
    let pixels_per_mm = screen.dpi / MM_PER_INCH;
    let width_mm = screen.width_px as f64 / pixels_per_mm;
    let height_mm = screen.height_px as f64 / pixels_per_mm;

    let target_x_mm = (nx - 0.5) * width_mm;
    let target_y_mm = (ny - 0.5) * height_mm;

    let mut face = vec![Point3D::default(); 478];
    let mut iris_for = |center_x: f64, center_y: f64, indices: [usize; 4]| {
        face[indices[0]] = Point3D::new(center_x - 0.02, center_y, 0.0);
        face[indices[1]] = Point3D::new(center_x + 0.02, center_y, 0.0);
        face[indices[2]] = Point3D::new(center_x, center_y - 0.01, 0.0);
        face[indices[3]] = Point3D::new(center_x, center_y + 0.01, 0.0);

        // Direction to the target is (Δx, Δy, distance); the iris sits
        // IRIS_DEPTH_OFFSET in front of the eye center along that ray.
        let scale = IRIS_DEPTH_OFFSET / screen.viewing_distance_mm;
        let iris_x = center_x + (target_x_mm - center_x) * scale;
        let iris_y = center_y + (target_y_mm - center_y) * scale;
        vec![Point2D::new(iris_x, iris_y); MIN_IRIS_LANDMARKS]
    };

    let left_iris = iris_for(
        0.45,
        0.5,
        [LEFT_EYE_INNER, LEFT_EYE_OUTER, LEFT_EYE_UPPER, LEFT_EYE_LOWER],
    );
    let right_iris = iris_for(
        0.55,
        0.5,
        [
            RIGHT_EYE_INNER,
            RIGHT_EYE_OUTER,
            RIGHT_EYE_UPPER,
            RIGHT_EYE_LOWER,
        ],
    );

    FrameLandmarks {
        timestamp,
        face_landmarks: face,
        left_iris,
        right_iris,
        pupil_diameter: Some(4.0),
        confidence: Some(0.95),
    }
}

/// A frame the estimator must drop: no landmarks at all.
pub fn blank_frame(timestamp: f64) -> FrameLandmarks {
    FrameLandmarks {
        timestamp,
        face_landmarks: vec![],
        left_iris: vec![],
        right_iris: vec![],
        pupil_diameter: None,
        confidence: None,
    }
}

/// Frames dwelling on one point: `count` frames spaced `step_ms` apart.
pub fn dwell_frames(
    nx: f64,
    ny: f64,
    start_ts: f64,
    count: usize,
    step_ms: f64,
) -> Vec<FrameLandmarks> {
    (0..count)
        .map(|i| frame_looking_at(nx, ny, start_ts + i as f64 * step_ms))
        .collect()
}

/// Eight-line sample passage laid out on the default screen.
pub fn reading_layout() -> TextLayout {
    let text = (0..8)
        .map(|i| format!("sample passage line number {i} with several words"))
        .collect::<Vec<_>>()
        .join("\n");
    TextLayout::from_text(&text, 1920.0, 1080.0, 40.0, 2.0)
}

/// Normalized y at the center of the given layout line.
pub fn line_center_y(layout: &TextLayout, line: usize) -> f64 {
    layout.lines[line].y
}
