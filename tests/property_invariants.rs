use proptest::prelude::*;

use gaze_analytics::calibration::accuracy_score;
use gaze_analytics::config::{GazeConfig, ScoringConfig, SegmenterConfig};
use gaze_analytics::lines::{self, TextLayout};
use gaze_analytics::scoring;
use gaze_analytics::segmenter::FixationSegmenter;
use gaze_analytics::types::{CalibrationPoint, FixationPoint, GazePath, GazePoint};

fn gaze(x: f64, y: f64, timestamp: f64) -> GazePoint {
    GazePoint {
        x,
        y,
        timestamp,
        pupil_diameter: 4.0,
        confidence: 1.0,
    }
}

fn fixation(x: f64, y: f64, timestamp: f64, duration: f64, pupil: f64) -> FixationPoint {
    FixationPoint {
        x,
        y,
        timestamp,
        duration,
        pupil_diameter: pupil,
        confidence: 1.0,
    }
}

fn layout() -> TextLayout {
    let text = (0..12)
        .map(|i| format!("line {i} text"))
        .collect::<Vec<_>>()
        .join("\n");
    TextLayout::from_text(&text, 1920.0, 1080.0, 16.0, 1.5)
}

proptest! {
    /// Points closer than the threshold are absorbed into the active
    /// fixation and never start a new one.
    #[test]
    fn pt_sub_threshold_points_are_absorbed(
        jitters in prop::collection::vec((-0.009_f64..0.009, -0.009_f64..0.009), 3..40),
    ) {
        let mut seg = FixationSegmenter::new(SegmenterConfig::default());
        let mut ts = 0.0;
        let (mut x, mut y) = (0.5, 0.5);

        seg.push(gaze(x, y, ts));
        for (dx, dy) in jitters {
            // Each step stays within the 0.03 threshold of the previous point.
            x = (x + dx).clamp(0.3, 0.7);
            y = (y + dy).clamp(0.3, 0.7);
            ts += 30.0;
            let result = seg.push(gaze(x, y, ts));
            prop_assert!(result.fixation.is_none());
            prop_assert!(result.saccade.is_none());
        }

        // The single closing jump emits at most one fixation.
        let result = seg.push(gaze(0.95, 0.95, ts + 30.0));
        prop_assert!(result.fixation.is_some());
    }

    /// A fixation appears in output iff its closed duration reached the
    /// minimum.
    #[test]
    fn pt_fixation_emitted_iff_duration_reached(dwell_ms in 1.0_f64..400.0) {
        let mut seg = FixationSegmenter::new(SegmenterConfig::default());
        seg.push(gaze(0.4, 0.4, 0.0));
        seg.push(gaze(0.401, 0.4, dwell_ms / 2.0));
        let result = seg.push(gaze(0.9, 0.9, dwell_ms));
        prop_assert_eq!(result.fixation.is_some(), dwell_ms >= 100.0);
    }

    /// classify is pure: identical line pairs always yield identical
    /// labels, and the label matches the diff rule.
    #[test]
    fn pt_classify_is_deterministic(from_y in 0.0_f64..0.25, to_y in 0.0_f64..0.25) {
        let l = layout();
        let a = fixation(0.2, from_y, 0.0, 150.0, 4.0);
        let b = fixation(0.6, to_y, 200.0, 150.0, 4.0);

        let first = lines::classify(&a, &b, &l);
        let second = lines::classify(&a, &b, &l);
        prop_assert_eq!(first.transition_type, second.transition_type);
        prop_assert_eq!(first.lines_skipped, second.lines_skipped);

        let diff = first.to_line as i64 - first.from_line as i64;
        use gaze_analytics::types::LineTransitionType::*;
        let expected = match diff {
            0 | 1 => NormalLineBreak,
            d if d < 0 => Regression,
            d if d <= 3 => Skip,
            _ => Deviation,
        };
        prop_assert_eq!(first.transition_type, expected);
    }

    /// Transition accuracy stays in [0,1] for arbitrary recorded sequences.
    #[test]
    fn pt_transition_accuracy_bounded(line_seq in prop::collection::vec(0_u32..12, 0..30)) {
        let l = layout();
        let fixations: Vec<FixationPoint> = line_seq
            .iter()
            .enumerate()
            .map(|(i, &line)| fixation(0.5, l.lines[line as usize].y, i as f64 * 200.0, 150.0, 4.0))
            .collect();
        let transitions = lines::analyze_transitions(&fixations, &l);
        let metrics = lines::transition_metrics(&transitions);
        prop_assert!((0.0..=1.0).contains(&metrics.line_transition_accuracy));
    }

    /// Concentration score stays within [0,100] for any finite fixation set.
    #[test]
    fn pt_concentration_score_bounded(
        raw in prop::collection::vec(
            (0.0_f64..1.0, 0.0_f64..1.0, 10.0_f64..5000.0, 0.1_f64..40.0),
            0..40,
        ),
    ) {
        let mut ts = 0.0;
        let fixations: Vec<FixationPoint> = raw
            .into_iter()
            .map(|(x, y, duration, pupil)| {
                let f = fixation(x, y, ts, duration, pupil);
                ts += duration + 90.0;
                f
            })
            .collect();

        let end = fixations.last().map(|f| f.timestamp + f.duration).unwrap_or(0.0);
        let start = fixations.first().map(|f| f.timestamp).unwrap_or(0.0);
        let path = GazePath {
            fixations,
            saccades: vec![],
            line_transitions: vec![],
            total_duration: end - start,
            start_time: start,
            end_time: end,
        };

        let metrics = scoring::concentration_metrics(&path, &ScoringConfig::default());
        prop_assert!((0.0..=100.0).contains(&metrics.concentration_score));
        prop_assert!((0.0..=1.0).contains(&metrics.fixation_stability));
    }

    /// Calibration accuracy is bounded regardless of measured error.
    #[test]
    fn pt_calibration_accuracy_bounded(
        offsets in prop::collection::vec((-400.0_f64..400.0, -400.0_f64..400.0), 1..9),
    ) {
        let points: Vec<CalibrationPoint> = offsets
            .iter()
            .enumerate()
            .map(|(i, (dx, dy))| CalibrationPoint {
                screen_x: 200.0 + i as f64 * 150.0,
                screen_y: 300.0,
                gaze_x: 200.0 + i as f64 * 150.0 + dx,
                gaze_y: 300.0 + dy,
                timestamp: i as f64 * 2000.0,
            })
            .collect();
        let accuracy = accuracy_score(&points, 200.0);
        prop_assert!((0.0..=1.0).contains(&accuracy));
    }

    /// Default config stays valid under serde round-trips.
    #[test]
    fn pt_config_roundtrip_is_valid(retention in prop::option::of(1_usize..500)) {
        let mut config = GazeConfig::default();
        config.segmenter.history_retention = retention;
        let encoded = serde_json::to_string(&config).expect("serialize config");
        let decoded: GazeConfig = serde_json::from_str(&encoded).expect("deserialize config");
        prop_assert!(decoded.validate().is_ok());
        prop_assert_eq!(decoded.segmenter.history_retention, retention);
    }
}
