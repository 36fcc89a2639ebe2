//! Runs the scoring stages over two extracted feature sets.
//!
//! Extraction is the only fallible stage that aborts a comparison. Everything
//! after it degrades metric by metric and always produces a [`Comparison`].

use imgref::ImgRef;
use log::warn;
use rgb::RGBA8;

use crate::config::{ScoringConfig, StyleSource};
use crate::diff::{difference_heatmap, HeatmapImage};
use crate::features::{extract, FeatureSet};
use crate::grade::{combined_score, grade, GradeResult};
use crate::observer::{Role, ScoreObserver};
use crate::provider::EmbeddingProvider;
use crate::similarity::{
    cosine, ensure_same_length, statistical, structural_checked, SimilarityScores,
};
use crate::style::{classify, Style};
use crate::GradingError;

/// Everything one comparison produces.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub scores: SimilarityScores,
    pub style: Style,
    pub result: GradeResult,
    /// Present only when `compute_heatmap` was set in the config.
    pub heatmap: Option<HeatmapImage>,
}

/// Extracts both feature sets concurrently.
///
/// Both extractions run to completion; the reference error wins if both fail.
pub(crate) fn extract_pair<P: EmbeddingProvider + ?Sized>(
    reference: ImgRef<'_, RGBA8>,
    submission: ImgRef<'_, RGBA8>,
    provider: &P,
    config: &ScoringConfig,
) -> Result<(FeatureSet, FeatureSet), GradingError> {
    let size = config.embedding_size;
    let (ref_features, sub_features) = rayon::join(
        || extract(reference, provider, size),
        || extract(submission, provider, size),
    );
    Ok((ref_features?, sub_features?))
}

/// Scores, classifies and grades two already extracted images.
pub(crate) fn compare_extracted(
    reference: (ImgRef<'_, RGBA8>, &FeatureSet),
    submission: (ImgRef<'_, RGBA8>, &FeatureSet),
    config: &ScoringConfig,
    observer: &dyn ScoreObserver,
) -> Comparison {
    let (ref_img, ref_features) = reference;
    let (sub_img, sub_features) = submission;
    observer.on_features(Role::Reference, ref_features);
    observer.on_features(Role::Submission, sub_features);

    let scores = similarity_scores(reference, submission, config, observer);
    observer.on_scores(&scores);

    let style = classify(&style_input(ref_features, sub_features, config.style_source), &config.style);
    observer.on_style(&style);

    let result = grade(&scores, &style, config);
    observer.on_grade(combined_score(&scores, config.grading.weights), &result);

    let heatmap = if config.compute_heatmap {
        match difference_heatmap(ref_img, sub_img, config.heatmap_size) {
            Ok(heatmap) => Some(heatmap),
            Err(e) => {
                warn!("heatmap skipped: {e}");
                observer.on_degraded("heatmap", &e.to_string());
                None
            }
        }
    } else {
        None
    };

    Comparison {
        scores,
        style,
        result,
        heatmap,
    }
}

fn similarity_scores(
    (ref_img, ref_features): (ImgRef<'_, RGBA8>, &FeatureSet),
    (sub_img, sub_features): (ImgRef<'_, RGBA8>, &FeatureSet),
    config: &ScoringConfig,
    observer: &dyn ScoreObserver,
) -> SimilarityScores {
    let similarity = &config.similarity;
    let (a, b) = (&ref_features.embedding, &sub_features.embedding);

    if let Err(e) = ensure_same_length(a, b) {
        warn!("embedding metrics degraded to 0: {e}");
        let reason = e.to_string();
        observer.on_degraded("cosine", &reason);
        observer.on_degraded("statistical", &reason);
    }

    let structural = structural_checked(ref_img, sub_img, similarity).unwrap_or_else(|e| {
        warn!(
            "structural similarity falls back to {}: {e}",
            similarity.structural_fallback
        );
        observer.on_degraded("structural", &e.to_string());
        similarity.structural_fallback
    });

    SimilarityScores::new(
        cosine(a, b, similarity),
        structural,
        statistical(a, b, similarity),
    )
}

/// The vector the style classifier should see.
fn style_input(reference: &FeatureSet, submission: &FeatureSet, source: StyleSource) -> Vec<f32> {
    let (a, b) = (&reference.embedding, &submission.embedding);
    match source {
        StyleSource::Reference => a.clone(),
        StyleSource::Submission => b.clone(),
        StyleSource::Combined if a.len() == b.len() => {
            a.iter().zip(b).map(|(x, y)| (x + y) / 2.0).collect()
        }
        StyleSource::Combined => a.clone(),
    }
}
