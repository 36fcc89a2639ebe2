//! The three similarity metrics.
//!
//! - [`cosine`]: z-scored cosine similarity of embeddings, mapped to [0,1]
//! - [`structural`]: global single-window SSIM on grayscale resamples
//! - [`statistical`]: moment and correlation agreement of embeddings
//!
//! Every metric returns a finite value in [0,1] and degrades to a constant
//! instead of failing: 0 for mismatched vector lengths or zero magnitudes, and
//! the configured fallback when SSIM input cannot be resampled.
//!
//! Raw similarities of visually distinct images tend to sit close to 1. Each
//! metric therefore raises its result to a power >= 1, which spreads out the
//! high end without changing order or range.

use imgref::ImgRef;
use log::{debug, warn};
use rgb::RGBA8;

use crate::config::SimilarityConfig;
use crate::consts::{SSIM_C1, SSIM_C2};
use crate::image::{luma_plane, resample, GrayImage};
use crate::GradingError;

/// The three metric values for one image pair.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimilarityScores {
    pub cosine: f64,
    pub structural: f64,
    pub statistical: f64,
}

impl SimilarityScores {
    /// Builds scores, forcing each value into [0,1] (NaN becomes 0).
    #[must_use]
    pub fn new(cosine: f64, structural: f64, statistical: f64) -> Self {
        Self {
            cosine: unit(cosine),
            structural: unit(structural),
            statistical: unit(statistical),
        }
    }
}

/// First three moments of a vector.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Moments {
    pub mean: f64,
    /// Population variance.
    pub variance: f64,
    /// Third standardized moment; 0 when the variance is 0.
    pub skewness: f64,
}

impl Moments {
    #[must_use]
    pub fn of(values: &[f32]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let n = values.len() as f64;
        let mean = values.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
        let (mut m2, mut m3) = (0.0, 0.0);
        for &v in values {
            let d = f64::from(v) - mean;
            m2 += d * d;
            m3 += d * d * d;
        }
        let variance = m2 / n;
        let std = variance.sqrt();
        let skewness = if std > 0.0 { (m3 / n) / (std * std * std) } else { 0.0 };
        Self {
            mean,
            variance,
            skewness,
        }
    }
}

/// Fails with [`GradingError::DimensionMismatch`] if the lengths differ.
///
/// # Errors
/// Returns an error describing both lengths.
pub fn ensure_same_length(a: &[f32], b: &[f32]) -> Result<(), GradingError> {
    if a.len() == b.len() {
        Ok(())
    } else {
        Err(GradingError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        })
    }
}

/// Z-score normalizes `values`. A constant vector maps to all zeros.
#[must_use]
pub fn z_score(values: &[f32]) -> Vec<f64> {
    let m = Moments::of(values);
    let std = m.variance.sqrt();
    if std == 0.0 || !std.is_finite() {
        return vec![0.0; values.len()];
    }
    values
        .iter()
        .map(|&v| (f64::from(v) - m.mean) / std)
        .collect()
}

/// Cosine similarity of z-scored embeddings, mapped to [0,1] and sharpened.
///
/// Returns 0 when the lengths differ or either normalized vector has zero
/// magnitude.
#[must_use]
pub fn cosine(a: &[f32], b: &[f32], config: &SimilarityConfig) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let za = z_score(a);
    let zb = z_score(b);

    let (mut dot, mut na, mut nb) = (0.0, 0.0, 0.0);
    for (x, y) in za.iter().zip(&zb) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    let magnitude = na.sqrt() * nb.sqrt();
    if magnitude == 0.0 || !magnitude.is_finite() {
        return 0.0;
    }

    let raw = (dot / magnitude).clamp(-1.0, 1.0);
    let mapped = (raw + 1.0) / 2.0;
    unit(mapped.powf(config.cosine_exponent))
}

/// Single-window SSIM of two equally sized grayscale planes (0..=255 range).
///
/// Uses whole-image mean, variance and covariance. The result is not clamped.
#[must_use]
pub fn ssim_global(a: &GrayImage, b: &GrayImage) -> f64 {
    debug_assert!(a.same_size(b));
    let n = a.data().len().min(b.data().len());
    if n == 0 {
        return 0.0;
    }
    let n_f = n as f64;
    let mu1 = a.mean();
    let mu2 = b.mean();

    let (mut var1, mut var2, mut cov) = (0.0, 0.0, 0.0);
    for (&x, &y) in a.data().iter().zip(b.data()) {
        let dx = f64::from(x) - mu1;
        let dy = f64::from(y) - mu2;
        var1 += dx * dx;
        var2 += dy * dy;
        cov += dx * dy;
    }
    var1 /= n_f;
    var2 /= n_f;
    cov /= n_f;

    ((2.0 * mu1 * mu2 + SSIM_C1) * (2.0 * cov + SSIM_C2))
        / ((mu1 * mu1 + mu2 * mu2 + SSIM_C1) * (var1 + var2 + SSIM_C2))
}

/// Global SSIM of two images after resampling to the configured square size.
///
/// The clamped SSIM is sharpened by the structural exponent. If either image
/// cannot be resampled, `config.structural_fallback` is returned instead of
/// an error.
#[must_use]
pub fn structural(a: ImgRef<'_, RGBA8>, b: ImgRef<'_, RGBA8>, config: &SimilarityConfig) -> f64 {
    structural_checked(a, b, config).unwrap_or_else(|e| {
        warn!(
            "structural similarity unavailable ({e}), using fallback {}",
            config.structural_fallback
        );
        config.structural_fallback
    })
}

/// Like [`structural`], but reports resampling failures instead of
/// substituting the fallback.
///
/// # Errors
/// Returns the resampling error of whichever image failed first.
pub fn structural_checked(
    a: ImgRef<'_, RGBA8>,
    b: ImgRef<'_, RGBA8>,
    config: &SimilarityConfig,
) -> Result<f64, GradingError> {
    let size = config.structural_size;
    let ga = luma_plane(resample(a, size, size)?.as_ref());
    let gb = luma_plane(resample(b, size, size)?.as_ref());
    let raw = ssim_global(&ga, &gb);
    debug!("ssim raw={raw:.6}");
    Ok(unit(unit(raw).powf(config.structural_exponent)))
}

/// Pearson correlation of two equal-length vectors, 0 if either is constant.
#[must_use]
pub fn pearson(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let ma = Moments::of(a).mean;
    let mb = Moments::of(b).mean;
    let (mut cov, mut va, mut vb) = (0.0, 0.0, 0.0);
    for (&x, &y) in a.iter().zip(b) {
        let dx = f64::from(x) - ma;
        let dy = f64::from(y) - mb;
        cov += dx * dy;
        va += dx * dx;
        vb += dy * dy;
    }
    let denom = (va * vb).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return 0.0;
    }
    (cov / denom).clamp(-1.0, 1.0)
}

/// Moment- and correlation-based similarity of two embeddings.
///
/// Each of mean, variance and skewness contributes `1 / (1 + k * |delta|)`.
/// Correlation contributes only when positive. The weighted sum is sharpened
/// by the statistical exponent. Returns 0 when the lengths differ.
#[must_use]
pub fn statistical(a: &[f32], b: &[f32], config: &SimilarityConfig) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let ma = Moments::of(a);
    let mb = Moments::of(b);
    let [k_mean, k_var, k_skew] = config.moment_scales;
    let closeness = |k: f64, x: f64, y: f64| 1.0 / (1.0 + k * (x - y).abs());

    let terms = [
        closeness(k_mean, ma.mean, mb.mean),
        closeness(k_var, ma.variance, mb.variance),
        closeness(k_skew, ma.skewness, mb.skewness),
        pearson(a, b).max(0.0),
    ];
    let combined: f64 = terms
        .iter()
        .zip(config.statistical_weights)
        .map(|(t, w)| t * w)
        .sum();

    unit(unit(combined).powf(config.statistical_exponent))
}

/// Clamps into [0,1], mapping NaN to 0.
#[inline]
pub(crate) fn unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}
