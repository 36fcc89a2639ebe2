//! Human-readable feedback for a graded submission.
//!
//! Output order is fixed: one overall sentence chosen by percentage band,
//! then metric-specific sentences (cosine, structural, statistical) for
//! metrics under their thresholds, then at most one style sentence.

use crate::config::FeedbackThresholds;
use crate::similarity::SimilarityScores;
use crate::style::{Style, StyleLabel};

/// Overall sentences as (minimum percentage, text), highest band first.
const OVERALL: [(u8, &str); 6] = [
    (90, "Outstanding work! Your drawing is a near-perfect match for the reference."),
    (80, "Excellent job! Your drawing captures the reference very closely."),
    (70, "Good work! The main elements of the reference are clearly there."),
    (60, "Fair attempt. The overall idea is recognizable, but several details differ."),
    (50, "Keep practicing. Parts of your drawing resemble the reference, but many differ."),
    (0, "Your drawing differs significantly from the reference. Study it closely and try again."),
];

const COSINE_TIP: &str =
    "The overall content and composition differ from the reference; check which elements are present and where they sit.";
const STRUCTURAL_TIP: &str =
    "Shapes, proportions and light/dark layout could be closer; try blocking in the big forms first.";
const STATISTICAL_TIP: &str =
    "Texture and detail distribution differ; compare how much fine detail each area of the reference carries.";

/// Sentence for the overall percentage band.
#[must_use]
pub fn overall_sentence(percentage: u8) -> &'static str {
    OVERALL
        .iter()
        .find(|(min, _)| percentage >= *min)
        .map_or(OVERALL[OVERALL.len() - 1].1, |&(_, text)| text)
}

fn style_sentence(label: StyleLabel) -> String {
    let description = match label {
        StyleLabel::Cartoon => "a cartoon style with bold shapes and flat areas",
        StyleLabel::Sketch => "a sketch style with light, sparse linework",
        StyleLabel::Realistic => "a realistic style with rich detail",
        StyleLabel::Abstract => "an abstract style",
    };
    format!("Your artwork shows {description}; grading has been adjusted for it.")
}

/// Builds the feedback list. Never empty, never more than one style sentence.
#[must_use]
pub fn feedback(
    scores: &SimilarityScores,
    style: &Style,
    percentage: u8,
    thresholds: &FeedbackThresholds,
) -> Vec<String> {
    let mut lines = vec![overall_sentence(percentage).to_string()];

    let tips = [
        (scores.cosine, thresholds.cosine_min, COSINE_TIP),
        (scores.structural, thresholds.structural_min, STRUCTURAL_TIP),
        (scores.statistical, thresholds.statistical_min, STATISTICAL_TIP),
    ];
    lines.extend(
        tips.iter()
            .filter(|(score, min, _)| score < min)
            .map(|(_, _, tip)| (*tip).to_string()),
    );

    if style.confidence > thresholds.style_confidence {
        lines.push(style_sentence(style.label));
    }

    lines
}
