//! Combines similarity scores and style into a percentage and letter grade.

use crate::config::{GradeBand, ScoringConfig};
use crate::feedback::feedback;
use crate::similarity::SimilarityScores;
use crate::style::{Style, StyleLabel};

/// Grade reported when the configuration has no bands at all.
const FLOOR_GRADE: &str = "F";

/// Final grading outcome for one comparison.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GradeResult {
    /// Style-adjusted, clamped and rounded percentage.
    pub percentage: u8,
    pub grade: String,
    /// Display color of the grade band. Presentation only.
    pub color: String,
    pub style_label: StyleLabel,
    pub style_confidence: f64,
    pub feedback: Vec<String>,
}

/// Weighted combination of the three scores, before any adjustment.
#[must_use]
pub fn combined_score(scores: &SimilarityScores, weights: [f64; 3]) -> f64 {
    weights[0] * scores.cosine + weights[1] * scores.structural + weights[2] * scores.statistical
}

/// Turns a combined score into a percentage in [0,100].
///
/// Applies the style multiplier, clamps, then rounds half away from zero.
/// Non-finite input yields 0.
#[must_use]
pub fn adjusted_percentage(combined: f64, multiplier: f64) -> u8 {
    let pct = combined * 100.0 * multiplier;
    if !pct.is_finite() {
        return 0;
    }
    pct.clamp(0.0, 100.0).round() as u8
}

/// Selects the band for `percentage`.
///
/// Bands are checked highest first and the first one whose minimum is met
/// wins. If none match, the last (floor) band is used. Returns `None` only
/// for an empty band list.
///
/// `bands` must be ordered by non-increasing `min_percentage`, as
/// [`ScoringConfig::validate`] enforces. Letters are only monotonic in the
/// percentage for ordered bands.
///
/// # Panics
/// Debug builds panic if `bands` is not ordered highest first.
#[must_use]
pub fn band_for(percentage: f64, bands: &[GradeBand]) -> Option<&GradeBand> {
    debug_assert!(
        bands
            .windows(2)
            .all(|pair| pair[0].min_percentage >= pair[1].min_percentage),
        "grade bands must be ordered highest first"
    );
    bands
        .iter()
        .find(|band| percentage >= band.min_percentage)
        .or_else(|| bands.last())
}

/// Grades one comparison.
///
/// Expects a config that passed [`ScoringConfig::validate`]; see
/// [`band_for`] for the band ordering requirement.
#[must_use]
pub fn grade(scores: &SimilarityScores, style: &Style, config: &ScoringConfig) -> GradeResult {
    let grading = &config.grading;
    let combined = combined_score(scores, grading.weights);
    let percentage = adjusted_percentage(combined, grading.adjustment(style.label));
    let (grade, color) = match band_for(f64::from(percentage), &grading.bands) {
        Some(band) => (band.name.clone(), band.color.clone()),
        None => (FLOOR_GRADE.to_string(), String::new()),
    };

    GradeResult {
        percentage,
        grade,
        color,
        style_label: style.label,
        style_confidence: style.confidence,
        feedback: feedback(scores, style, percentage, &config.feedback),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GradingConfig;

    fn style(label: StyleLabel) -> Style {
        Style::new(label, 0.8)
    }

    #[test]
    fn test_perfect_scores() {
        let scores = SimilarityScores::new(1.0, 1.0, 1.0);
        let result = grade(&scores, &style(StyleLabel::Realistic), &ScoringConfig::default());
        assert_eq!(result.percentage, 100);
        assert_eq!(result.grade, "A+");
        assert_eq!(result.style_label, StyleLabel::Realistic);
    }

    #[test]
    fn test_weighted_combination() {
        let scores = SimilarityScores::new(0.8, 0.6, 0.4);
        let combined = combined_score(&scores, [0.5, 0.35, 0.15]);
        assert!((combined - 0.67).abs() < 1e-12);

        let result = grade(&scores, &style(StyleLabel::Realistic), &ScoringConfig::default());
        assert_eq!(result.percentage, 67);
        assert_eq!(result.grade, "C");
    }

    #[test]
    fn test_style_adjustment() {
        let scores = SimilarityScores::new(0.8, 0.6, 0.4);
        let config = ScoringConfig::default();
        // 67 * 1.05 = 70.35 -> 70
        assert_eq!(grade(&scores, &style(StyleLabel::Cartoon), &config).percentage, 70);
        // 67 * 0.98 = 65.66 -> 66
        assert_eq!(grade(&scores, &style(StyleLabel::Abstract), &config).percentage, 66);
    }

    #[test]
    fn test_clamping() {
        assert_eq!(adjusted_percentage(1.2, 1.05), 100);
        assert_eq!(adjusted_percentage(-0.5, 1.0), 0);
        assert_eq!(adjusted_percentage(f64::NAN, 1.0), 0);
        assert_eq!(adjusted_percentage(f64::INFINITY, 1.0), 0);
    }

    #[test]
    fn test_band_boundaries() {
        let bands = GradingConfig::default().bands;
        assert_eq!(band_for(90.0, &bands).unwrap().name, "A+");
        assert_eq!(band_for(89.0, &bands).unwrap().name, "A");
        assert_eq!(band_for(80.0, &bands).unwrap().name, "A");
        assert_eq!(band_for(50.0, &bands).unwrap().name, "D");
        assert_eq!(band_for(49.0, &bands).unwrap().name, "F");
        assert_eq!(band_for(0.0, &bands).unwrap().name, "F");
    }

    #[test]
    fn test_floor_band_when_nothing_matches() {
        let bands = vec![GradeBand::new("Pass", 50.0, "#0f0"), GradeBand::new("Fail", 10.0, "#f00")];
        assert_eq!(band_for(3.0, &bands).unwrap().name, "Fail");
        assert!(band_for(3.0, &[]).is_none());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "ordered highest first")]
    fn test_unordered_bands_rejected_in_debug() {
        let bands = vec![GradeBand::new("F", 0.0, "#f00"), GradeBand::new("A", 80.0, "#0f0")];
        let _ = band_for(50.0, &bands);
    }

    #[test]
    fn test_zero_thresholds_always_top_grade() {
        let config = ScoringConfig::default()
            .with_grading(GradingConfig::default().with_all_thresholds(0.0));
        let scores = SimilarityScores::new(0.0, 0.0, 0.0);
        let result = grade(&scores, &style(StyleLabel::Abstract), &config);
        assert_eq!(result.percentage, 0);
        assert_eq!(result.grade, "A+");
    }

    #[test]
    fn test_color_follows_band() {
        let scores = SimilarityScores::new(0.0, 0.0, 0.0);
        let result = grade(&scores, &style(StyleLabel::Sketch), &ScoringConfig::default());
        assert_eq!(result.grade, "F");
        assert_eq!(result.color, "#dc2626");
    }
}
