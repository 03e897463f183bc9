//! Concentration and reading-pattern scoring.
//!
//! Works on a finalized gaze path. The positional regression metric here
//! (leftward move within the same visual row) and the line-index regression
//! metric from the transition classifier measure different things and are
//! reported separately, never merged.

use crate::config::ScoringConfig;
use crate::lines::{transition_metrics, TextLayout};
use crate::types::{ConcentrationMetrics, FixationPoint, GazePath, ReadingPattern, SkippedRegion};

const MS_PER_MINUTE: f64 = 60_000.0;

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Fixation pairs forming a leftward move on the same visual row.
fn count_positional_regressions(fixations: &[FixationPoint], row_epsilon: f64) -> u32 {
    fixations
        .windows(2)
        .filter(|pair| {
            pair[1].x < pair[0].x && (pair[1].y - pair[0].y).abs() < row_epsilon
        })
        .count() as u32
}

/// Gaps between the end of one fixation and the start of the next larger
/// than the blink threshold.
fn count_blinks(fixations: &[FixationPoint], gap_ms: f64) -> u32 {
    fixations
        .windows(2)
        .filter(|pair| {
            let gap = pair[1].timestamp - (pair[0].timestamp + pair[0].duration);
            gap > gap_ms
        })
        .count() as u32
}

/// Derive concentration metrics from a finalized path. An empty path yields
/// the all-zero record rather than NaN-poisoned statistics.
pub fn concentration_metrics(path: &GazePath, config: &ScoringConfig) -> ConcentrationMetrics {
    let fixations = &path.fixations;
    if fixations.is_empty() {
        return ConcentrationMetrics::default();
    }

    let pupils: Vec<f64> = fixations.iter().map(|f| f.pupil_diameter).collect();
    let avg_pupil_diameter = mean(&pupils);
    let pupil_variability = population_std_dev(&pupils);

    let durations: Vec<f64> = fixations.iter().map(|f| f.duration).collect();
    let avg_fixation_duration = mean(&durations);
    // The raw ratio can exceed 1 or go negative for pathological inputs;
    // the clamp is part of the definition.
    let fixation_stability = if avg_fixation_duration > 0.0 {
        (1.0 - population_std_dev(&durations) / avg_fixation_duration).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let regression_count =
        count_positional_regressions(fixations, config.regression_row_epsilon);
    let regression_rate = 100.0 * regression_count as f64 / fixations.len() as f64;

    let blink_count = count_blinks(fixations, config.blink_gap_ms);
    let blink_rate = if path.total_duration > 0.0 {
        blink_count as f64 / (path.total_duration / MS_PER_MINUTE)
    } else {
        0.0
    };

    let pupil_score = (1.0 - pupil_variability / config.pupil_variability_scale).clamp(0.0, 1.0);
    let fixation_score = fixation_stability;
    let regression_score =
        (1.0 - regression_rate / config.regression_rate_scale).clamp(0.0, 1.0);
    let blink_score = if (config.normal_blink_rate_min..=config.normal_blink_rate_max)
        .contains(&blink_rate)
    {
        1.0
    } else {
        0.5
    };

    let concentration_score = (100.0
        * (pupil_score * config.pupil_weight
            + fixation_score * config.fixation_weight
            + regression_score * config.regression_weight
            + blink_score * config.blink_weight))
        .round()
        .clamp(0.0, 100.0);

    ConcentrationMetrics {
        avg_pupil_diameter,
        pupil_variability,
        avg_fixation_duration,
        fixation_stability,
        regression_count,
        regression_rate,
        blink_count,
        blink_rate,
        concentration_score,
    }
}

fn speed_difficulty_bucket(words_per_minute: f64) -> f64 {
    if words_per_minute < 100.0 {
        1.0
    } else if words_per_minute < 150.0 {
        0.7
    } else if words_per_minute < 200.0 {
        0.4
    } else {
        0.2
    }
}

/// Derive the reading pattern from a finalized path and the phase layout.
pub fn reading_pattern(
    path: &GazePath,
    layout: &TextLayout,
    config: &ScoringConfig,
) -> ReadingPattern {
    let fixations = &path.fixations;
    let line_metrics = transition_metrics(&path.line_transitions);
    let transition_total = path.line_transitions.len() as f64;

    let minutes = path.total_duration / MS_PER_MINUTE;
    let words_per_minute = if minutes > 0.0 {
        layout.word_count() as f64 / minutes
    } else {
        0.0
    };

    let durations: Vec<f64> = fixations.iter().map(|f| f.duration).collect();
    let avg_duration = mean(&durations);

    let regression_fraction = if fixations.is_empty() {
        0.0
    } else {
        count_positional_regressions(fixations, config.regression_row_epsilon) as f64
            / fixations.len() as f64
    };
    let skip_fraction = if transition_total > 0.0 {
        line_metrics.skipped_lines as f64 / transition_total
    } else {
        0.0
    };
    let duration_optimality = if avg_duration >= config.optimal_fixation_min_ms
        && avg_duration <= config.optimal_fixation_max_ms
    {
        1.0
    } else {
        0.7
    };

    let comprehension_estimate = (0.3 * line_metrics.line_transition_accuracy
        + 0.3 * (1.0 - regression_fraction)
        + 0.2 * (1.0 - skip_fraction)
        + 0.2 * duration_optimality)
        .clamp(0.0, 1.0);

    let line_regression_rate = if transition_total > 0.0 {
        line_metrics.regression_lines as f64 / transition_total
    } else {
        0.0
    };
    let duration_pressure = (avg_duration / 500.0).clamp(0.0, 1.0);
    let difficulty_level = (0.4 * duration_pressure
        + 0.3 * line_regression_rate
        + 0.3 * speed_difficulty_bucket(words_per_minute))
    .clamp(0.0, 1.0);

    let focus_cutoff = avg_duration * config.focus_area_duration_factor;
    let focus_areas: Vec<FixationPoint> = fixations
        .iter()
        .filter(|f| avg_duration > 0.0 && f.duration >= focus_cutoff)
        .copied()
        .collect();

    // A vertical jump larger than two line heights means text in between
    // was never fixated.
    let skip_distance = 2.0 * layout.normalized_line_height();
    let skipped_regions: Vec<SkippedRegion> = fixations
        .windows(2)
        .filter(|pair| (pair[1].y - pair[0].y).abs() > skip_distance)
        .map(|pair| SkippedRegion {
            start: crate::geometry::Point2D::new(pair[0].x, pair[0].y),
            end: crate::geometry::Point2D::new(pair[1].x, pair[1].y),
        })
        .collect();

    ReadingPattern {
        words_per_minute,
        comprehension_estimate,
        difficulty_level,
        focus_areas,
        skipped_regions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lines::TextLayout;
    use crate::types::GazePath;

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

    fn path_of(fixations: Vec<FixationPoint>) -> GazePath {
        let start = fixations.first().map(|f| f.timestamp).unwrap_or(0.0);
        let end = fixations
            .last()
            .map(|f| f.timestamp + f.duration)
            .unwrap_or(0.0);
        GazePath {
            fixations,
            saccades: vec![],
            line_transitions: vec![],
            total_duration: end - start,
            start_time: start,
            end_time: end,
        }
    }

    #[test]
    fn zero_variance_durations_give_full_stability() {
        let path = path_of(vec![
            fixation(0.1, 0.1, 0.0, 200.0, 4.0),
            fixation(0.3, 0.1, 250.0, 200.0, 4.0),
            fixation(0.5, 0.1, 500.0, 200.0, 4.0),
        ]);
        let metrics = concentration_metrics(&path, &ScoringConfig::default());
        assert_eq!(metrics.fixation_stability, 1.0);
    }

    #[test]
    fn leftward_same_row_moves_count_as_regressions() {
        let path = path_of(vec![
            fixation(0.2, 0.5, 0.0, 150.0, 4.0),
            fixation(0.6, 0.5, 200.0, 150.0, 4.0),
            fixation(0.4, 0.52, 400.0, 150.0, 4.0), // leftward, same row
            fixation(0.5, 0.9, 600.0, 150.0, 4.0),  // row changed, not a regression
        ]);
        let metrics = concentration_metrics(&path, &ScoringConfig::default());
        assert_eq!(metrics.regression_count, 1);
        assert_eq!(metrics.regression_rate, 25.0);
    }

    #[test]
    fn gaps_longer_than_threshold_count_as_blinks() {
        let path = path_of(vec![
            fixation(0.2, 0.5, 0.0, 100.0, 4.0),
            // gap = 300 - 100 = 200 ms > 150 ms
            fixation(0.25, 0.5, 300.0, 100.0, 4.0),
            // gap = 420 - 400 = 20 ms
            fixation(0.3, 0.5, 420.0, 100.0, 4.0),
        ]);
        let metrics = concentration_metrics(&path, &ScoringConfig::default());
        assert_eq!(metrics.blink_count, 1);
    }

    #[test]
    fn score_stays_in_bounds_for_degenerate_input() {
        let empty = concentration_metrics(&GazePath::default(), &ScoringConfig::default());
        assert!((0.0..=100.0).contains(&empty.concentration_score));

        let single = concentration_metrics(
            &path_of(vec![fixation(0.5, 0.5, 0.0, 120.0, 3.0)]),
            &ScoringConfig::default(),
        );
        assert!((0.0..=100.0).contains(&single.concentration_score));

        let wild = concentration_metrics(
            &path_of(vec![
                fixation(0.9, 0.5, 0.0, 5000.0, 30.0),
                fixation(0.1, 0.5, 6000.0, 10.0, 0.1),
                fixation(0.8, 0.5, 7000.0, 3000.0, 15.0),
            ]),
            &ScoringConfig::default(),
        );
        assert!((0.0..=100.0).contains(&wild.concentration_score));
    }

    #[test]
    fn words_per_minute_uses_layout_word_count() {
        let layout = TextLayout::from_text(
            "one two three four five\nsix seven eight nine ten",
            1920.0,
            1080.0,
            16.0,
            1.5,
        );
        // 10 words over 6 seconds = 100 wpm
        let mut path = path_of(vec![
            fixation(0.1, 0.01, 0.0, 150.0, 4.0),
            fixation(0.9, 0.01, 5850.0, 150.0, 4.0),
        ]);
        path.total_duration = 6000.0;
        let pattern = reading_pattern(&path, &layout, &ScoringConfig::default());
        assert!((pattern.words_per_minute - 100.0).abs() < 1e-9);
    }

    #[test]
    fn vertical_jumps_flag_skipped_regions() {
        let layout = TextLayout::from_text("a\nb\nc\nd\ne\nf\ng\nh", 1920.0, 1080.0, 16.0, 1.5);
        let line_height = layout.normalized_line_height();
        let path = path_of(vec![
            fixation(0.1, 0.05, 0.0, 150.0, 4.0),
            fixation(0.2, 0.05 + 3.0 * line_height, 200.0, 150.0, 4.0),
            fixation(0.3, 0.05 + 3.5 * line_height, 400.0, 150.0, 4.0),
        ]);
        let pattern = reading_pattern(&path, &layout, &ScoringConfig::default());
        assert_eq!(pattern.skipped_regions.len(), 1);
        assert!((pattern.skipped_regions[0].end.y - pattern.skipped_regions[0].start.y).abs()
            > 2.0 * line_height);
    }

    #[test]
    fn comprehension_estimate_in_unit_range() {
        let layout = TextLayout::from_text("alpha beta\ngamma delta", 1920.0, 1080.0, 16.0, 1.5);
        let path = path_of(vec![
            fixation(0.1, 0.01, 0.0, 250.0, 4.0),
            fixation(0.5, 0.01, 300.0, 250.0, 4.0),
            fixation(0.2, 0.03, 600.0, 250.0, 4.0),
        ]);
        let pattern = reading_pattern(&path, &layout, &ScoringConfig::default());
        assert!((0.0..=1.0).contains(&pattern.comprehension_estimate));
        assert!((0.0..=1.0).contains(&pattern.difficulty_level));
    }
}
