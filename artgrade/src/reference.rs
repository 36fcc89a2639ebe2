//! Precomputed reference for grading many submissions against one image.
//!
//! Feature extraction dominates a comparison, and half of it is spent on the
//! reference. Build a [`GradingReference`] once and reuse it for every
//! submission.
//!
//! # Example
//!
//! ```
//! use artgrade::{BlockStatsEmbedding, GradingReference, ImgVec, ScoringConfig, RGBA8};
//!
//! let provider = BlockStatsEmbedding::default();
//! let pixels: Vec<RGBA8> = (0..64 * 64)
//!     .map(|i| RGBA8::new((i % 64 * 4) as u8, (i / 64 * 4) as u8, 128, 255))
//!     .collect();
//! let reference_img = ImgVec::new(pixels, 64, 64);
//!
//! let reference = GradingReference::new(reference_img.as_ref(), &provider, ScoringConfig::default())
//!     .expect("valid reference");
//!
//! for shade in [40u8, 120, 200] {
//!     let submission = ImgVec::new(vec![RGBA8::new(shade, shade, shade, 255); 64 * 64], 64, 64);
//!     let comparison = reference.grade(submission.as_ref(), &provider).expect("valid submission");
//!     println!("shade {shade}: {}% {}", comparison.result.percentage, comparison.result.grade);
//! }
//! ```

use imgref::ImgRef;
use rgb::RGBA8;

use crate::compare::{compare_extracted, Comparison};
use crate::features::{extract, FeatureSet};
use crate::image::ImageSample;
use crate::observer::{NoopObserver, ScoreObserver};
use crate::provider::EmbeddingProvider;
use crate::{GradingError, ScoringConfig};

/// A reference image with its features already extracted.
///
/// Grading through it gives exactly the same [`Comparison`] as
/// [`grade_images`](crate::grade_images) with the same provider and config.
#[derive(Debug, Clone)]
pub struct GradingReference {
    image: ImageSample,
    features: FeatureSet,
    config: ScoringConfig,
}

impl GradingReference {
    /// Validates `config` and extracts the reference features.
    ///
    /// # Errors
    /// Returns an error if the config is invalid or extraction fails.
    pub fn new<P: EmbeddingProvider + ?Sized>(
        reference: ImgRef<'_, RGBA8>,
        provider: &P,
        config: ScoringConfig,
    ) -> Result<Self, GradingError> {
        config.validate()?;
        let features = extract(reference, provider, config.embedding_size)?;
        let image = ImageSample::new(
            reference.pixels().collect(),
            reference.width(),
            reference.height(),
        );
        Ok(Self {
            image,
            features,
            config,
        })
    }

    /// Grades `submission` against the stored reference.
    ///
    /// `provider` must be the one the reference was built with, or at least
    /// produce embeddings of the same length.
    ///
    /// # Errors
    /// Returns an error if extracting the submission's features fails.
    pub fn grade<P: EmbeddingProvider + ?Sized>(
        &self,
        submission: ImgRef<'_, RGBA8>,
        provider: &P,
    ) -> Result<Comparison, GradingError> {
        self.grade_observed(submission, provider, &NoopObserver)
    }

    /// [`grade`](Self::grade) with an observer for intermediate values.
    ///
    /// # Errors
    /// Same as [`grade`](Self::grade).
    pub fn grade_observed<P: EmbeddingProvider + ?Sized>(
        &self,
        submission: ImgRef<'_, RGBA8>,
        provider: &P,
        observer: &dyn ScoreObserver,
    ) -> Result<Comparison, GradingError> {
        let sub_features = extract(submission, provider, self.config.embedding_size)?;
        Ok(compare_extracted(
            (self.image.as_ref(), &self.features),
            (submission, &sub_features),
            &self.config,
            observer,
        ))
    }

    /// Features extracted from the reference.
    #[must_use]
    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    /// Configuration every submission is graded with.
    #[must_use]
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Reference width in pixels.
    #[must_use]
    pub fn width(&self) -> usize {
        self.image.width()
    }

    /// Reference height in pixels.
    #[must_use]
    pub fn height(&self) -> usize {
        self.image.height()
    }
}
