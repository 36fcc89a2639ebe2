//! Default constants for the grading pipeline.
//!
//! Every value here is only a default: [`crate::ScoringConfig`] carries a copy
//! of each one and all of them can be overridden by the caller.

// ============================================================================
// Sample Sizes
// ============================================================================

/// Square input resolution expected by the embedding provider.
pub const EMBEDDING_INPUT_SIZE: usize = 224;

/// Square resolution both images are resampled to before SSIM.
pub const STRUCTURAL_SAMPLE_SIZE: usize = 128;

/// Square resolution of the difference heatmap.
pub const HEATMAP_SIZE: usize = 256;

// ============================================================================
// Luma Weights (ITU-R BT.601)
// ============================================================================

pub const LUMA_R: f32 = 0.299;
pub const LUMA_G: f32 = 0.587;
pub const LUMA_B: f32 = 0.114;

// ============================================================================
// Similarity Constants
// ============================================================================

/// SSIM luminance stabiliser, (0.01 * 255)^2.
pub const SSIM_C1: f64 = (0.01 * 255.0) * (0.01 * 255.0);
/// SSIM contrast stabiliser, (0.03 * 255)^2.
pub const SSIM_C2: f64 = (0.03 * 255.0) * (0.03 * 255.0);

/// Power applied to the [0,1]-mapped cosine similarity.
pub const COSINE_EXPONENT: f64 = 2.0;
/// Power applied to the clamped SSIM value.
pub const STRUCTURAL_EXPONENT: f64 = 1.5;
/// Power applied to the weighted moment/correlation sum.
pub const STATISTICAL_EXPONENT: f64 = 2.0;

/// Structural score used when either image cannot be resampled for SSIM.
pub const STRUCTURAL_FALLBACK: f64 = 0.1;

/// Scale constants `k` in `1 / (1 + k * |delta|)` for mean, variance, skewness.
pub const MOMENT_SCALES: [f64; 3] = [10.0, 5.0, 1.0];

/// Weights for mean, variance, skewness and Pearson correlation terms.
pub const STATISTICAL_WEIGHTS: [f64; 4] = [0.2, 0.2, 0.2, 0.4];

// ============================================================================
// Grading Constants
// ============================================================================

/// Combination weights for cosine, structural and statistical scores.
pub const COMBINATION_WEIGHTS: [f64; 3] = [0.5, 0.35, 0.15];

pub const CARTOON_ADJUSTMENT: f64 = 1.05;
pub const SKETCH_ADJUSTMENT: f64 = 1.03;
pub const REALISTIC_ADJUSTMENT: f64 = 1.0;
pub const ABSTRACT_ADJUSTMENT: f64 = 0.98;

/// Grade bands as (name, minimum percentage, display color), highest first.
pub const GRADE_BANDS: [(&str, f64, &str); 6] = [
    ("A+", 90.0, "#16a34a"),
    ("A", 80.0, "#22c55e"),
    ("B", 70.0, "#84cc16"),
    ("C", 60.0, "#eab308"),
    ("D", 50.0, "#f97316"),
    ("F", 0.0, "#dc2626"),
];

// ============================================================================
// Style Classifier Constants
// ============================================================================

/// Components with |x| below this count toward sparsity.
pub const SPARSITY_EPSILON: f32 = 0.01;
/// Components with |x| above this count toward complexity.
pub const COMPLEXITY_ACTIVATION: f32 = 0.5;

pub const SKETCH_MIN_SPARSITY: f64 = 0.7;
pub const SKETCH_MAX_VARIANCE: f64 = 0.01;
pub const SKETCH_MAX_ACTIVATION: f64 = 0.1;
pub const SKETCH_CONFIDENCE: f64 = 0.85;

pub const CARTOON_MAX_COMPLEXITY: f64 = 0.2;
pub const CARTOON_MIN_VARIANCE: f64 = 0.02;
pub const CARTOON_ACTIVATION_RANGE: (f64, f64) = (0.1, 1.5);
pub const CARTOON_CONFIDENCE: f64 = 0.78;

pub const REALISTIC_MIN_COMPLEXITY: f64 = 0.3;
pub const REALISTIC_MIN_VARIANCE: f64 = 0.1;
pub const REALISTIC_MIN_ACTIVATION: f64 = 1.0;
pub const REALISTIC_CONFIDENCE: f64 = 0.80;

pub const ABSTRACT_CONFIDENCE: f64 = 0.60;

// ============================================================================
// Feedback Constants
// ============================================================================

/// Cosine score below which composition feedback is added.
pub const FEEDBACK_COSINE_MIN: f64 = 0.7;
/// Structural score below which shape/proportion feedback is added.
pub const FEEDBACK_STRUCTURAL_MIN: f64 = 0.6;
/// Statistical score below which texture/detail feedback is added.
pub const FEEDBACK_STATISTICAL_MIN: f64 = 0.5;
/// Style confidence above which the style is acknowledged.
pub const FEEDBACK_STYLE_CONFIDENCE: f64 = 0.7;

// ============================================================================
// Heatmap Constants
// ============================================================================

/// Raw per-pixel difference (0..=765) to intensity (0..=255) scale.
pub const HEATMAP_INTENSITY_SCALE: f32 = 1.0 / 3.0;
