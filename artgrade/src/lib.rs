//! # artgrade
//!
//! Grades a submitted drawing against a reference image. One comparison
//! yields three similarity scores, a detected drawing style, a bounded
//! percentage with a letter grade, feedback text and, optionally, a
//! per-pixel difference heatmap.
//!
//! The scoring is heuristic and fully deterministic:
//! - Cosine similarity of z-scored embedding vectors
//! - Global single-window SSIM of the grayscale images
//! - Moment and correlation similarity of the embeddings
//!
//! Each score is sharpened by a power law, the three are combined with fixed
//! weights, multiplied by a per-style adjustment and mapped onto grade bands.
//!
//! ## Grade Bands
//!
//! - 90 and above: A+
//! - 80-89: A, 70-79: B, 60-69: C, 50-59: D
//! - Below 50: F
//!
//! ## Example
//!
//! ```rust
//! use artgrade::{grade_images, BlockStatsEmbedding, ImgVec, ScoringConfig, RGBA8};
//!
//! // A 32x32 gradient
//! let (width, height) = (32, 32);
//! let pixels: Vec<RGBA8> = (0..width * height)
//!     .map(|i| {
//!         let (x, y) = (i % width, i / width);
//!         RGBA8::new((x * 8) as u8, (y * 8) as u8, ((x + y) * 4) as u8, 255)
//!     })
//!     .collect();
//! let drawing = ImgVec::new(pixels, width, height);
//!
//! let comparison = grade_images(
//!     drawing.as_ref(),
//!     drawing.as_ref(),
//!     &BlockStatsEmbedding::default(),
//!     &ScoringConfig::default(),
//! )
//! .unwrap();
//!
//! // A drawing compared with itself gets the top grade
//! assert_eq!(comparison.result.grade, "A+");
//! assert!(comparison.result.percentage >= 95);
//! ```
//!
//! ## Features
//!
//! - **`serde`**: `Serialize`/`Deserialize` for configuration and result types

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::float_cmp)]

mod compare;
pub mod config;
pub mod consts;
pub mod diff;
pub mod features;
pub mod feedback;
pub mod grade;
pub mod image;
pub mod observer;
pub mod provider;
pub mod reference;
pub mod similarity;
pub mod style;

pub use compare::Comparison;
pub use config::{
    FeedbackThresholds, GradeBand, GradingConfig, ScoringConfig, SimilarityConfig, StyleSource,
    StyleThresholds,
};
pub use diff::{difference_heatmap, HeatmapImage};
pub use features::FeatureSet;
pub use grade::GradeResult;
pub use image::{ImageSample, PixelSampler, PixelTensor};
pub use observer::{LogObserver, NoopObserver, Role, ScoreObserver};
pub use provider::{BlockStatsEmbedding, EmbeddingProvider};
pub use reference::GradingReference;
pub use similarity::SimilarityScores;
pub use style::{Style, StyleLabel};

// Re-export imgref and rgb types for convenience
pub use imgref::{Img, ImgRef, ImgVec};
pub use rgb::RGBA8;

/// Error type for grading operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum GradingError {
    /// An image could not be decoded or resampled.
    #[error("decode failed: {0}")]
    Decode(String),
    /// The embedding provider failed.
    #[error("embedding inference failed: {0}")]
    Inference(String),
    /// Two vectors that must be compared element-wise differ in length.
    #[error("dimension mismatch: {left} vs {right}")]
    DimensionMismatch {
        /// Length of the first vector.
        left: usize,
        /// Length of the second vector.
        right: usize,
    },
    /// An image or target size has a zero dimension.
    #[error("image too small: {width}x{height}")]
    ImageTooSmall {
        /// Image width.
        width: usize,
        /// Image height.
        height: usize,
    },
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Grades `submission` against `reference`.
///
/// Features of both images are extracted concurrently with `provider`. The
/// similarity scores, style and grade are then computed on the calling
/// thread, and the heatmap is rendered when `config.compute_heatmap` is set.
///
/// # Errors
/// Returns an error if the config is invalid or either extraction fails.
/// A failed extraction aborts the whole comparison. Every later stage
/// degrades instead of failing.
pub fn grade_images<P: EmbeddingProvider + ?Sized>(
    reference: ImgRef<'_, RGBA8>,
    submission: ImgRef<'_, RGBA8>,
    provider: &P,
    config: &ScoringConfig,
) -> Result<Comparison, GradingError> {
    grade_images_observed(reference, submission, provider, config, &NoopObserver)
}

/// [`grade_images`] with an observer for intermediate values.
///
/// # Errors
/// Same as [`grade_images`].
pub fn grade_images_observed<P: EmbeddingProvider + ?Sized>(
    reference: ImgRef<'_, RGBA8>,
    submission: ImgRef<'_, RGBA8>,
    provider: &P,
    config: &ScoringConfig,
    observer: &dyn ScoreObserver,
) -> Result<Comparison, GradingError> {
    config.validate()?;
    log::debug!(
        "grading {}x{} against {}x{} with {}",
        submission.width(),
        submission.height(),
        reference.width(),
        reference.height(),
        provider.name()
    );
    let (ref_features, sub_features) =
        compare::extract_pair(reference, submission, provider, config)?;
    Ok(compare::compare_extracted(
        (reference, &ref_features),
        (submission, &sub_features),
        config,
        observer,
    ))
}
