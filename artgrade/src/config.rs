//! Tunable configuration for every stage of the grading pipeline.
//!
//! All magic numbers used by the pipeline live here. Defaults come from
//! [`crate::consts`]. Use the builder methods to override individual values:
//!
//! ```rust
//! use artgrade::{GradingConfig, ScoringConfig, SimilarityConfig};
//!
//! let config = ScoringConfig::default()
//!     .with_similarity(SimilarityConfig::default().with_structural_fallback(0.0))
//!     .with_grading(GradingConfig::default().with_weights([0.6, 0.3, 0.1]))
//!     .with_compute_heatmap(true);
//! assert!(config.validate().is_ok());
//! ```

use std::collections::BTreeMap;

use crate::consts;
use crate::style::StyleLabel;
use crate::GradingError;

/// Constants for the three similarity metrics.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimilarityConfig {
    /// Square size both images are resampled to for SSIM.
    pub structural_size: usize,
    /// Returned by the structural metric when an image cannot be resampled.
    pub structural_fallback: f64,
    pub cosine_exponent: f64,
    pub structural_exponent: f64,
    pub statistical_exponent: f64,
    /// `k` for mean, variance and skewness in `1 / (1 + k * |delta|)`.
    pub moment_scales: [f64; 3],
    /// Weights for mean, variance, skewness and correlation.
    pub statistical_weights: [f64; 4],
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            structural_size: consts::STRUCTURAL_SAMPLE_SIZE,
            structural_fallback: consts::STRUCTURAL_FALLBACK,
            cosine_exponent: consts::COSINE_EXPONENT,
            structural_exponent: consts::STRUCTURAL_EXPONENT,
            statistical_exponent: consts::STATISTICAL_EXPONENT,
            moment_scales: consts::MOMENT_SCALES,
            statistical_weights: consts::STATISTICAL_WEIGHTS,
        }
    }
}

impl SimilarityConfig {
    /// Sets the fail-soft structural score used when SSIM cannot be computed.
    #[must_use]
    pub fn with_structural_fallback(mut self, fallback: f64) -> Self {
        self.structural_fallback = fallback;
        self
    }

    /// Sets the SSIM sample size.
    #[must_use]
    pub fn with_structural_size(mut self, size: usize) -> Self {
        self.structural_size = size;
        self
    }

    /// Sets the sharpening exponents for cosine, structural and statistical.
    #[must_use]
    pub fn with_exponents(mut self, cosine: f64, structural: f64, statistical: f64) -> Self {
        self.cosine_exponent = cosine;
        self.structural_exponent = structural;
        self.statistical_exponent = statistical;
        self
    }

    fn validate(&self) -> Result<(), GradingError> {
        if self.structural_size == 0 {
            return Err(invalid("structural_size must be non-zero"));
        }
        if !(0.0..=1.0).contains(&self.structural_fallback) {
            return Err(invalid("structural_fallback must be in [0, 1]"));
        }
        for (name, e) in [
            ("cosine_exponent", self.cosine_exponent),
            ("structural_exponent", self.structural_exponent),
            ("statistical_exponent", self.statistical_exponent),
        ] {
            if !e.is_finite() || e < 1.0 {
                return Err(invalid(format!("{name} must be finite and >= 1, got {e}")));
            }
        }
        check_non_negative("moment_scales", &self.moment_scales)?;
        check_non_negative("statistical_weights", &self.statistical_weights)
    }
}

/// Thresholds and confidences for the heuristic style classifier.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StyleThresholds {
    /// |x| below this counts as a near-zero component.
    pub sparsity_epsilon: f32,
    /// |x| above this counts as a strongly activated component.
    pub complexity_activation: f32,

    pub sketch_min_sparsity: f64,
    pub sketch_max_variance: f64,
    pub sketch_max_activation: f64,
    pub sketch_confidence: f64,

    pub cartoon_max_complexity: f64,
    pub cartoon_min_variance: f64,
    /// Inclusive (min, max) range of max activation for cartoons.
    pub cartoon_activation_range: (f64, f64),
    pub cartoon_confidence: f64,

    pub realistic_min_complexity: f64,
    pub realistic_min_variance: f64,
    pub realistic_min_activation: f64,
    pub realistic_confidence: f64,

    pub abstract_confidence: f64,
}

impl Default for StyleThresholds {
    fn default() -> Self {
        Self {
            sparsity_epsilon: consts::SPARSITY_EPSILON,
            complexity_activation: consts::COMPLEXITY_ACTIVATION,
            sketch_min_sparsity: consts::SKETCH_MIN_SPARSITY,
            sketch_max_variance: consts::SKETCH_MAX_VARIANCE,
            sketch_max_activation: consts::SKETCH_MAX_ACTIVATION,
            sketch_confidence: consts::SKETCH_CONFIDENCE,
            cartoon_max_complexity: consts::CARTOON_MAX_COMPLEXITY,
            cartoon_min_variance: consts::CARTOON_MIN_VARIANCE,
            cartoon_activation_range: consts::CARTOON_ACTIVATION_RANGE,
            cartoon_confidence: consts::CARTOON_CONFIDENCE,
            realistic_min_complexity: consts::REALISTIC_MIN_COMPLEXITY,
            realistic_min_variance: consts::REALISTIC_MIN_VARIANCE,
            realistic_min_activation: consts::REALISTIC_MIN_ACTIVATION,
            realistic_confidence: consts::REALISTIC_CONFIDENCE,
            abstract_confidence: consts::ABSTRACT_CONFIDENCE,
        }
    }
}

impl StyleThresholds {
    fn validate(&self) -> Result<(), GradingError> {
        for (name, c) in [
            ("sketch_confidence", self.sketch_confidence),
            ("cartoon_confidence", self.cartoon_confidence),
            ("realistic_confidence", self.realistic_confidence),
            ("abstract_confidence", self.abstract_confidence),
        ] {
            if !(0.0..=1.0).contains(&c) {
                return Err(invalid(format!("{name} must be in [0, 1], got {c}")));
            }
        }
        Ok(())
    }
}

/// One letter-grade band.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GradeBand {
    pub name: String,
    /// Minimum percentage (inclusive) needed for this grade.
    pub min_percentage: f64,
    /// Display color hint, e.g. `"#22c55e"`.
    pub color: String,
}

impl GradeBand {
    #[must_use]
    pub fn new(name: impl Into<String>, min_percentage: f64, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_percentage,
            color: color.into(),
        }
    }
}

/// Grade thresholds, per-style multipliers and combination weights.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GradingConfig {
    /// Bands ordered from the highest grade to the floor grade.
    pub bands: Vec<GradeBand>,
    pub style_adjustments: BTreeMap<StyleLabel, f64>,
    /// Weights for cosine, structural and statistical scores.
    pub weights: [f64; 3],
}

impl Default for GradingConfig {
    fn default() -> Self {
        let bands = consts::GRADE_BANDS
            .iter()
            .map(|&(name, min, color)| GradeBand::new(name, min, color))
            .collect();
        let style_adjustments = BTreeMap::from([
            (StyleLabel::Cartoon, consts::CARTOON_ADJUSTMENT),
            (StyleLabel::Sketch, consts::SKETCH_ADJUSTMENT),
            (StyleLabel::Realistic, consts::REALISTIC_ADJUSTMENT),
            (StyleLabel::Abstract, consts::ABSTRACT_ADJUSTMENT),
        ]);
        Self {
            bands,
            style_adjustments,
            weights: consts::COMBINATION_WEIGHTS,
        }
    }
}

impl GradingConfig {
    /// Replaces the grade bands. They must be ordered highest first.
    #[must_use]
    pub fn with_bands(mut self, bands: Vec<GradeBand>) -> Self {
        self.bands = bands;
        self
    }

    /// Sets the minimum percentage of every band to `value`.
    #[must_use]
    pub fn with_all_thresholds(mut self, value: f64) -> Self {
        for band in &mut self.bands {
            band.min_percentage = value;
        }
        self
    }

    /// Sets the multiplier applied for `label`.
    #[must_use]
    pub fn with_style_adjustment(mut self, label: StyleLabel, multiplier: f64) -> Self {
        self.style_adjustments.insert(label, multiplier);
        self
    }

    /// Sets the cosine, structural and statistical combination weights.
    #[must_use]
    pub fn with_weights(mut self, weights: [f64; 3]) -> Self {
        self.weights = weights;
        self
    }

    /// Multiplier for `label`, 1.0 when none is configured.
    #[must_use]
    pub fn adjustment(&self, label: StyleLabel) -> f64 {
        self.style_adjustments.get(&label).copied().unwrap_or(1.0)
    }

    fn validate(&self) -> Result<(), GradingError> {
        if self.bands.is_empty() {
            return Err(invalid("at least one grade band is required"));
        }
        for pair in self.bands.windows(2) {
            if pair[0].min_percentage < pair[1].min_percentage {
                return Err(invalid(format!(
                    "grade bands must be ordered highest first: {} ({}) < {} ({})",
                    pair[0].name, pair[0].min_percentage, pair[1].name, pair[1].min_percentage
                )));
            }
        }
        if self.bands.iter().any(|b| b.name.is_empty()) {
            return Err(invalid("grade band names must be non-empty"));
        }
        check_non_negative("weights", &self.weights)?;
        let adjustments: Vec<f64> = self.style_adjustments.values().copied().collect();
        check_non_negative("style_adjustments", &adjustments)
    }
}

/// Thresholds that trigger metric-specific feedback sentences.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FeedbackThresholds {
    pub cosine_min: f64,
    pub structural_min: f64,
    pub statistical_min: f64,
    /// Style sentence is added when confidence is strictly above this.
    pub style_confidence: f64,
}

impl Default for FeedbackThresholds {
    fn default() -> Self {
        Self {
            cosine_min: consts::FEEDBACK_COSINE_MIN,
            structural_min: consts::FEEDBACK_STRUCTURAL_MIN,
            statistical_min: consts::FEEDBACK_STATISTICAL_MIN,
            style_confidence: consts::FEEDBACK_STYLE_CONFIDENCE,
        }
    }
}

/// Which embedding the style classifier looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum StyleSource {
    #[default]
    Reference,
    Submission,
    /// Element-wise mean of both embeddings.
    Combined,
}

/// Complete configuration for one comparison run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScoringConfig {
    /// Square size images are resampled to before embedding.
    pub embedding_size: usize,
    pub similarity: SimilarityConfig,
    pub style: StyleThresholds,
    pub style_source: StyleSource,
    pub grading: GradingConfig,
    pub feedback: FeedbackThresholds,
    pub heatmap_size: usize,
    /// Whether pipeline entry points also render the difference heatmap.
    pub compute_heatmap: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            embedding_size: consts::EMBEDDING_INPUT_SIZE,
            similarity: SimilarityConfig::default(),
            style: StyleThresholds::default(),
            style_source: StyleSource::default(),
            grading: GradingConfig::default(),
            feedback: FeedbackThresholds::default(),
            heatmap_size: consts::HEATMAP_SIZE,
            compute_heatmap: false,
        }
    }
}

impl ScoringConfig {
    /// Creates a `ScoringConfig` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_embedding_size(mut self, size: usize) -> Self {
        self.embedding_size = size;
        self
    }

    #[must_use]
    pub fn with_similarity(mut self, similarity: SimilarityConfig) -> Self {
        self.similarity = similarity;
        self
    }

    #[must_use]
    pub fn with_style_thresholds(mut self, style: StyleThresholds) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn with_style_source(mut self, source: StyleSource) -> Self {
        self.style_source = source;
        self
    }

    #[must_use]
    pub fn with_grading(mut self, grading: GradingConfig) -> Self {
        self.grading = grading;
        self
    }

    #[must_use]
    pub fn with_feedback(mut self, feedback: FeedbackThresholds) -> Self {
        self.feedback = feedback;
        self
    }

    #[must_use]
    pub fn with_heatmap_size(mut self, size: usize) -> Self {
        self.heatmap_size = size;
        self
    }

    /// Sets whether to render the difference heatmap.
    ///
    /// When `false` (default), `Comparison::heatmap` is `None`.
    #[must_use]
    pub fn with_compute_heatmap(mut self, compute_heatmap: bool) -> Self {
        self.compute_heatmap = compute_heatmap;
        self
    }

    /// Checks every section for values the pipeline cannot work with.
    ///
    /// # Errors
    /// Returns [`GradingError::InvalidConfig`] naming the first bad value.
    pub fn validate(&self) -> Result<(), GradingError> {
        if self.embedding_size == 0 {
            return Err(invalid("embedding_size must be non-zero"));
        }
        if self.heatmap_size == 0 {
            return Err(invalid("heatmap_size must be non-zero"));
        }
        self.similarity.validate()?;
        self.style.validate()?;
        self.grading.validate()
    }
}

fn invalid(msg: impl Into<String>) -> GradingError {
    GradingError::InvalidConfig(msg.into())
}

fn check_non_negative(name: &str, values: &[f64]) -> Result<(), GradingError> {
    match values.iter().find(|v| !v.is_finite() || **v < 0.0) {
        Some(v) => Err(invalid(format!(
            "{name} must be finite and non-negative, got {v}"
        ))),
        None => Ok(()),
    }
}
