//! Gaze-based reading-analytics pipeline.
//!
//! Turns per-frame eye/iris landmark observations into screen-space gaze
//! points, segments the point stream into fixations and saccades, maps
//! fixations onto text lines to classify reading flow, and aggregates
//! everything into concentration and reading-pattern scores. A 9-point
//! calibration procedure corrects the raw projection.
//!
//! ## Modules
//! - `estimator`: 3D gaze vector projection onto the screen plane
//! - `segmenter`: online dispersion-based fixation/saccade segmentation
//! - `lines`: text-line assignment and line-transition classification
//! - `scoring`: concentration metrics and reading-pattern analysis
//! - `calibration`: 9-point calibration and the polynomial correction model
//! - `session`: per-phase session state and the session registry
//!
//! Landmark detection, frame transport, persistence and rendering are the
//! embedding platform's concern; this crate only consumes landmark records
//! and produces plain structured results.

pub mod calibration;
pub mod config;
pub mod constants;
pub mod estimator;
pub mod geometry;
pub mod lines;
pub mod logging;
pub mod scoring;
pub mod segmenter;
pub mod session;
pub mod types;

pub use calibration::{CalibrationModel, CalibrationOutcome, CalibrationRun};
pub use config::{GazeConfig, ScreenDescriptor};
pub use estimator::GazeEstimator;
pub use lines::{TextLayout, TextLine};
pub use segmenter::FixationSegmenter;
pub use session::{FrameOutcome, ReadingSession, SessionError, SessionRegistry, SessionReport};
pub use types::{
    CalibrationPoint, ConcentrationMetrics, FixationPoint, FrameLandmarks, GazePath, GazePoint,
    LineTransition, LineTransitionType, ReadingPattern, Saccade,
};
