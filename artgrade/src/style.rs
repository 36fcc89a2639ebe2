//! Heuristic drawing-style classification.
//!
//! A fixed decision list over four statistics of an embedding vector. No
//! model state is involved; the same vector and thresholds always give the
//! same label.

use std::fmt;

use crate::config::StyleThresholds;
use crate::similarity::Moments;

/// Coarse drawing style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum StyleLabel {
    Cartoon,
    Sketch,
    Realistic,
    Abstract,
}

impl StyleLabel {
    /// All labels in declaration order.
    pub const ALL: [StyleLabel; 4] = [
        StyleLabel::Cartoon,
        StyleLabel::Sketch,
        StyleLabel::Realistic,
        StyleLabel::Abstract,
    ];

    /// Lowercase name, e.g. `"sketch"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cartoon => "cartoon",
            Self::Sketch => "sketch",
            Self::Realistic => "realistic",
            Self::Abstract => "abstract",
        }
    }
}

impl fmt::Display for StyleLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A style label with the fixed confidence of the branch that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Style {
    pub label: StyleLabel,
    pub confidence: f64,
}

impl Style {
    #[must_use]
    pub fn new(label: StyleLabel, confidence: f64) -> Self {
        Self { label, confidence }
    }
}

/// Statistics the classifier decides on.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StyleStats {
    /// Fraction of components with |x| below the sparsity epsilon.
    pub sparsity: f64,
    pub variance: f64,
    /// Fraction of components with |x| above the activation threshold.
    pub complexity: f64,
    /// Largest |x|.
    pub max_activation: f64,
}

impl StyleStats {
    /// Computes the statistics of `features`. An empty slice gives all zeros.
    #[must_use]
    pub fn compute(features: &[f32], thresholds: &StyleThresholds) -> Self {
        if features.is_empty() {
            return Self::default();
        }
        let n = features.len() as f64;
        let near_zero = features
            .iter()
            .filter(|v| v.abs() < thresholds.sparsity_epsilon)
            .count();
        let active = features
            .iter()
            .filter(|v| v.abs() > thresholds.complexity_activation)
            .count();
        let max_activation = features.iter().fold(0.0f32, |m, v| m.max(v.abs()));

        Self {
            sparsity: near_zero as f64 / n,
            variance: Moments::of(features).variance,
            complexity: active as f64 / n,
            max_activation: f64::from(max_activation),
        }
    }
}

/// Classifies an embedding vector into a [`Style`].
///
/// Rules are checked in order and the first match wins:
/// sketch, cartoon, realistic, then abstract as the catch-all.
#[must_use]
pub fn classify(features: &[f32], thresholds: &StyleThresholds) -> Style {
    classify_stats(&StyleStats::compute(features, thresholds), thresholds)
}

/// Applies the decision list to precomputed statistics.
#[must_use]
pub fn classify_stats(stats: &StyleStats, t: &StyleThresholds) -> Style {
    if stats.sparsity > t.sketch_min_sparsity
        && stats.variance < t.sketch_max_variance
        && stats.max_activation < t.sketch_max_activation
    {
        return Style::new(StyleLabel::Sketch, t.sketch_confidence);
    }

    let (cartoon_lo, cartoon_hi) = t.cartoon_activation_range;
    if stats.complexity < t.cartoon_max_complexity
        && stats.variance > t.cartoon_min_variance
        && (cartoon_lo..=cartoon_hi).contains(&stats.max_activation)
    {
        return Style::new(StyleLabel::Cartoon, t.cartoon_confidence);
    }

    if stats.complexity > t.realistic_min_complexity
        && stats.variance > t.realistic_min_variance
        && stats.max_activation > t.realistic_min_activation
    {
        return Style::new(StyleLabel::Realistic, t.realistic_confidence);
    }

    Style::new(StyleLabel::Abstract, t.abstract_confidence)
}
