/// Face-mesh landmark index: left eye inner corner
pub const LEFT_EYE_INNER: usize = 133;

/// Face-mesh landmark index: left eye outer corner
pub const LEFT_EYE_OUTER: usize = 33;

/// Face-mesh landmark index: left upper eyelid
pub const LEFT_EYE_UPPER: usize = 159;

/// Face-mesh landmark index: left lower eyelid
pub const LEFT_EYE_LOWER: usize = 145;

/// Face-mesh landmark index: right eye inner corner
pub const RIGHT_EYE_INNER: usize = 362;

/// Face-mesh landmark index: right eye outer corner
pub const RIGHT_EYE_OUTER: usize = 263;

/// Face-mesh landmark index: right upper eyelid
pub const RIGHT_EYE_UPPER: usize = 386;

/// Face-mesh landmark index: right lower eyelid
pub const RIGHT_EYE_LOWER: usize = 374;

/// Minimum iris landmarks required per eye
pub const MIN_IRIS_LANDMARKS: usize = 5;

/// Iris sits slightly forward of the eye center (normalized depth units)
pub const IRIS_DEPTH_OFFSET: f64 = 0.01;

/// Assumed viewer-to-screen distance in millimetres
pub const DEFAULT_VIEWING_DISTANCE_MM: f64 = 600.0;

/// Assumed display density for pixel-to-millimetre conversion
pub const DEFAULT_SCREEN_DPI: f64 = 96.0;

pub const MM_PER_INCH: f64 = 25.4;

/// Dispersion threshold for fixation detection (fraction of normalized screen)
pub const DEFAULT_FIXATION_THRESHOLD: f64 = 0.03;

/// Minimum dwell before a candidate counts as a fixation (ms)
pub const DEFAULT_MIN_FIXATION_DURATION_MS: f64 = 100.0;

/// Pupil diameter substituted when the detector omits it
pub const DEFAULT_PUPIL_DIAMETER: f64 = 10.0;

/// Confidence substituted when the detector omits it
pub const DEFAULT_CONFIDENCE: f64 = 1.0;

/// Inter-fixation gap counted as a blink (ms)
pub const BLINK_GAP_MS: f64 = 150.0;

/// Pixel error at which calibration accuracy bottoms out
pub const CALIBRATION_ERROR_FLOOR_PX: f64 = 200.0;

/// Number of targets in the calibration grid
pub const CALIBRATION_TARGET_COUNT: usize = 9;

/// Nominal dwell window per calibration target (ms); the caller owns the clock
pub const CALIBRATION_DWELL_MS: f64 = 2000.0;
