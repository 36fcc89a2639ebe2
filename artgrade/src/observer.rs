//! Optional instrumentation of intermediate pipeline values.
//!
//! Pass an observer to the `*_observed` entry points to see features,
//! scores and style as they are produced. All methods default to no-ops.

use log::{debug, warn};

use crate::features::FeatureSet;
use crate::grade::GradeResult;
use crate::similarity::SimilarityScores;
use crate::style::Style;

/// Which image of a pair a callback refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Reference,
    Submission,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reference => "reference",
            Self::Submission => "submission",
        }
    }
}

/// Receives intermediate values of one comparison.
pub trait ScoreObserver {
    fn on_features(&self, _role: Role, _features: &FeatureSet) {}

    fn on_scores(&self, _scores: &SimilarityScores) {}

    fn on_style(&self, _style: &Style) {}

    fn on_grade(&self, _combined: f64, _result: &GradeResult) {}

    /// A metric degraded to a default value instead of failing.
    fn on_degraded(&self, _metric: &'static str, _reason: &str) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ScoreObserver for NoopObserver {}

/// Observer that forwards every value to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl ScoreObserver for LogObserver {
    fn on_features(&self, role: Role, features: &FeatureSet) {
        debug!(
            "{} features: {} dims, color={:?}, edges={:.4}",
            role.as_str(),
            features.embedding.len(),
            features.color_histogram,
            features.edge_magnitude
        );
    }

    fn on_scores(&self, scores: &SimilarityScores) {
        debug!(
            "scores: cosine={:.4} structural={:.4} statistical={:.4}",
            scores.cosine, scores.structural, scores.statistical
        );
    }

    fn on_style(&self, style: &Style) {
        debug!("style: {} ({:.2})", style.label, style.confidence);
    }

    fn on_grade(&self, combined: f64, result: &GradeResult) {
        debug!(
            "grade: combined={combined:.4} -> {}% {}",
            result.percentage, result.grade
        );
    }

    fn on_degraded(&self, metric: &'static str, reason: &str) {
        warn!("{metric} degraded: {reason}");
    }
}
