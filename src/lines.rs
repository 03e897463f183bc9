//! Text-line assignment and line-transition classification.
//!
//! Fixations are mapped onto the text layout's y bands; movement between
//! lines is classified as normal progression, regression, skip or
//! deviation. Same-line pairs are never recorded even though the
//! classifier itself labels them.

use serde::{Deserialize, Serialize};

use crate::config::ComprehensionConfig;
use crate::types::{FixationPoint, LineTransition, LineTransitionType};

/// Forward jumps over at most this many lines count as skips; anything
/// larger is a deviation.
const MAX_SKIP_DISTANCE: i64 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLine {
    pub line_number: u32,
    /// Band center (normalized)
    pub y: f64,
    pub y_start: f64,
    pub y_end: f64,
    pub text: String,
}

/// Per-phase layout from the test-content collaborator. Bands are
/// normalized, non-overlapping and monotonically increasing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLayout {
    /// Height of one text line in pixels
    pub line_height: f64,
    pub lines: Vec<TextLine>,
    pub screen_width: f64,
    pub screen_height: f64,
}

impl TextLayout {
    /// Lay out plain text: one band per line, top-down from y = 0.
    pub fn from_text(
        text: &str,
        screen_width: f64,
        screen_height: f64,
        font_size: f64,
        line_height_multiplier: f64,
    ) -> Self {
        let line_height = font_size * line_height_multiplier;
        let normalized_height = line_height / screen_height;

        let lines = text
            .split('\n')
            .enumerate()
            .map(|(index, content)| {
                let y_start = index as f64 * normalized_height;
                TextLine {
                    line_number: index as u32,
                    y: y_start + normalized_height / 2.0,
                    y_start,
                    y_end: y_start + normalized_height,
                    text: content.to_string(),
                }
            })
            .collect();

        Self {
            line_height,
            lines,
            screen_width,
            screen_height,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.lines.is_empty() {
            return Err("layout must contain at least one line".to_string());
        }
        if self.screen_width <= 0.0 || self.screen_height <= 0.0 {
            return Err("layout screen dimensions must be > 0".to_string());
        }
        for window in self.lines.windows(2) {
            if window[1].line_number <= window[0].line_number {
                return Err("line numbers must be strictly increasing".to_string());
            }
            if window[1].y_start < window[0].y_end {
                return Err("line bands must not overlap".to_string());
            }
        }
        for line in &self.lines {
            if line.y_end <= line.y_start {
                return Err(format!("line {} has an empty band", line.line_number));
            }
        }
        Ok(())
    }

    /// Normalized height of one line band.
    pub fn normalized_line_height(&self) -> f64 {
        self.line_height / self.screen_height
    }

    pub fn word_count(&self) -> u32 {
        self.lines
            .iter()
            .map(|l| l.text.split_whitespace().count() as u32)
            .sum()
    }
}

/// Line whose band contains the fixation's y; falls back to the nearest
/// band center. Never an error — peripheral fixations snap to the closest
/// line.
pub fn line_number(fixation: &FixationPoint, layout: &TextLayout) -> u32 {
    for line in &layout.lines {
        if fixation.y >= line.y_start && fixation.y <= line.y_end {
            return line.line_number;
        }
    }

    layout
        .lines
        .iter()
        .min_by(|a, b| {
            let da = (fixation.y - a.y).abs();
            let db = (fixation.y - b.y).abs();
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|l| l.line_number)
        .unwrap_or(0)
}

/// Pure classification of the movement between two fixations. Deterministic
/// in `(from_line, to_line)`; a zero diff still labels as a normal break,
/// the caller is responsible for not recording it.
pub fn classify(
    from: &FixationPoint,
    to: &FixationPoint,
    layout: &TextLayout,
) -> LineTransition {
    let from_line = line_number(from, layout);
    let to_line = line_number(to, layout);
    let diff = to_line as i64 - from_line as i64;

    let (transition_type, lines_skipped) = if diff == 0 || diff == 1 {
        (LineTransitionType::NormalLineBreak, None)
    } else if diff < 0 {
        (LineTransitionType::Regression, Some(diff.unsigned_abs() as u32))
    } else if diff <= MAX_SKIP_DISTANCE {
        (LineTransitionType::Skip, Some((diff - 1) as u32))
    } else {
        (LineTransitionType::Deviation, Some(diff as u32))
    };

    LineTransition {
        transition_type,
        from_line,
        to_line,
        lines_skipped,
        timestamp: to.timestamp,
    }
}

/// Classify and return the transition only when the line actually changed.
pub fn transition_if_line_changed(
    from: &FixationPoint,
    to: &FixationPoint,
    layout: &TextLayout,
) -> Option<LineTransition> {
    let transition = classify(from, to, layout);
    (transition.from_line != transition.to_line).then_some(transition)
}

/// Batch variant over a completed fixation sequence.
pub fn analyze_transitions(
    fixations: &[FixationPoint],
    layout: &TextLayout,
) -> Vec<LineTransition> {
    fixations
        .windows(2)
        .filter_map(|pair| transition_if_line_changed(&pair[0], &pair[1], layout))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineTransitionMetrics {
    pub normal_line_breaks: u32,
    /// Line-index regressions; independent of the positional regression
    /// metric in the concentration scorer.
    pub regression_lines: u32,
    pub skipped_lines: u32,
    pub deviations: u32,
    pub line_transition_accuracy: f64,
}

pub fn transition_metrics(transitions: &[LineTransition]) -> LineTransitionMetrics {
    let mut metrics = LineTransitionMetrics::default();

    for transition in transitions {
        match transition.transition_type {
            LineTransitionType::NormalLineBreak => metrics.normal_line_breaks += 1,
            LineTransitionType::Regression => metrics.regression_lines += 1,
            LineTransitionType::Skip => metrics.skipped_lines += 1,
            LineTransitionType::Deviation => metrics.deviations += 1,
        }
    }

    metrics.line_transition_accuracy = if transitions.is_empty() {
        1.0
    } else {
        metrics.normal_line_breaks as f64 / transitions.len() as f64
    };

    metrics
}

/// Reading-flow problems inferred from the transition sequence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComprehensionAssessment {
    pub has_issues: bool,
    /// 0-1, higher means more problems
    pub issue_score: f64,
    pub reasons: Vec<String>,
}

pub fn assess_comprehension(
    transitions: &[LineTransition],
    config: &ComprehensionConfig,
) -> ComprehensionAssessment {
    if transitions.is_empty() {
        return ComprehensionAssessment::default();
    }

    let metrics = transition_metrics(transitions);
    let total = transitions.len() as f64;
    let mut issue_score: f64 = 0.0;
    let mut reasons = Vec::new();

    let regression_rate = metrics.regression_lines as f64 / total;
    if regression_rate > config.regression_rate_threshold {
        issue_score += 0.3;
        reasons.push(format!(
            "high regression rate: {:.1}%",
            regression_rate * 100.0
        ));
    }

    let skip_rate = metrics.skipped_lines as f64 / total;
    if skip_rate > config.skip_rate_threshold {
        issue_score += 0.25;
        reasons.push(format!("skipping lines: {:.1}%", skip_rate * 100.0));
    }

    let deviation_rate = metrics.deviations as f64 / total;
    if deviation_rate > config.deviation_rate_threshold {
        issue_score += 0.2;
        reasons.push(format!("frequent deviations: {:.1}%", deviation_rate * 100.0));
    }

    if metrics.line_transition_accuracy < config.min_transition_accuracy {
        issue_score += 0.25;
        reasons.push(format!(
            "low line transition accuracy: {:.1}%",
            metrics.line_transition_accuracy * 100.0
        ));
    }

    let issue_score = issue_score.min(1.0);
    ComprehensionAssessment {
        has_issues: issue_score > config.issue_flag_threshold,
        issue_score,
        reasons,
    }
}
