//! Feature extraction: embedding, color signature and edge energy.

use imgref::ImgRef;
use log::debug;
use rgb::RGBA8;

use crate::image::{resample, tensor_luma, GrayImage, PixelTensor};
use crate::provider::EmbeddingProvider;
use crate::GradingError;

/// Horizontal Sobel kernel (row-major 3x3).
const SOBEL_X: [f32; 9] = [-1.0, 0.0, 1.0, -2.0, 0.0, 2.0, -1.0, 0.0, 1.0];
/// Vertical Sobel kernel (row-major 3x3).
const SOBEL_Y: [f32; 9] = [-1.0, -2.0, -1.0, 0.0, 0.0, 0.0, 1.0, 2.0, 1.0];

/// Features of one image, computed once per comparison.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureSet {
    /// Opaque provider output.
    pub embedding: Vec<f32>,
    /// Mean R, G and B over the full image, each in [0,1].
    pub color_histogram: [f32; 3],
    /// Mean Sobel gradient magnitude of the normalized luma plane.
    pub edge_magnitude: f32,
}

/// Extracts the [`FeatureSet`] of `image`.
///
/// The image is resampled to `input_size` x `input_size`, normalized to
/// [0,1] and passed to `provider`. Color means are taken over the
/// original-resolution image, edge magnitude over the resampled one.
///
/// # Errors
/// Returns [`GradingError::Decode`] if the image cannot be resampled and
/// [`GradingError::Inference`] if the provider fails.
pub fn extract<P: EmbeddingProvider + ?Sized>(
    image: ImgRef<'_, RGBA8>,
    provider: &P,
    input_size: usize,
) -> Result<FeatureSet, GradingError> {
    let resized = resample(image, input_size, input_size).map_err(|e| {
        GradingError::Decode(format!("cannot resample to {input_size}x{input_size}: {e}"))
    })?;
    let tensor = PixelTensor::from_image(resized.as_ref());
    drop(resized);

    let embedding = provider.infer(&tensor)?;
    let edge_magnitude = mean_edge_magnitude(&tensor_luma(&tensor));
    let color_histogram = channel_means(image);

    debug!(
        "{}: {} dims, color=[{:.3}, {:.3}, {:.3}], edges={edge_magnitude:.4}",
        provider.name(),
        embedding.len(),
        color_histogram[0],
        color_histogram[1],
        color_histogram[2],
    );

    Ok(FeatureSet {
        embedding,
        color_histogram,
        edge_magnitude,
    })
}

/// Mean R, G and B of `image`, normalized to [0,1].
#[must_use]
pub fn channel_means(image: ImgRef<'_, RGBA8>) -> [f32; 3] {
    let n = image.width() * image.height();
    if n == 0 {
        return [0.0; 3];
    }
    let mut sums = [0u64; 3];
    for px in image.pixels() {
        sums[0] += u64::from(px.r);
        sums[1] += u64::from(px.g);
        sums[2] += u64::from(px.b);
    }
    let denom = n as f64 * 255.0;
    sums.map(|s| (s as f64 / denom) as f32)
}

/// Applies a 3x3 kernel with zero ("same") padding.
fn convolve3x3(input: &GrayImage, kernel: &[f32; 9]) -> GrayImage {
    let (width, height) = (input.width(), input.height());
    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        let row = out.row_mut(y);
        for (x, dst) in row.iter_mut().enumerate() {
            let mut acc = 0.0;
            for ky in 0..3 {
                for kx in 0..3 {
                    let sx = x as isize + kx as isize - 1;
                    let sy = y as isize + ky as isize - 1;
                    acc += kernel[ky * 3 + kx] * input.get_padded(sx, sy);
                }
            }
            *dst = acc;
        }
    }
    out
}

/// Per-pixel Sobel gradient magnitude `sqrt(gx^2 + gy^2)`.
#[must_use]
pub fn sobel_magnitude(gray: &GrayImage) -> GrayImage {
    let gx = convolve3x3(gray, &SOBEL_X);
    let gy = convolve3x3(gray, &SOBEL_Y);
    let data = gx
        .data()
        .iter()
        .zip(gy.data())
        .map(|(x, y)| (x * x + y * y).sqrt())
        .collect();
    GrayImage::from_vec(data, gray.width(), gray.height())
}

/// Mean of [`sobel_magnitude`] over the whole plane.
#[must_use]
pub fn mean_edge_magnitude(gray: &GrayImage) -> f32 {
    sobel_magnitude(gray).mean() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::BlockStatsEmbedding;
    use imgref::ImgVec;

    struct FailingProvider;

    impl EmbeddingProvider for FailingProvider {
        fn infer(&self, _: &PixelTensor) -> Result<Vec<f32>, GradingError> {
            Err(GradingError::Inference("model offline".into()))
        }
    }

    #[test]
    fn test_sobel_flat_interior_is_zero() {
        let gray = GrayImage::from_vec(vec![0.5; 25], 5, 5);
        let mag = sobel_magnitude(&gray);
        assert_eq!(mag.width(), 5);
        assert_eq!(mag.height(), 5);
        assert!(mag.get(2, 2).abs() < 1e-6);
        // Zero padding creates an edge at the border
        assert!(mag.get(0, 2) > 0.0);
    }

    #[test]
    fn test_sobel_vertical_edge() {
        let data = (0..36).map(|i| if i % 6 < 3 { 0.0 } else { 1.0 }).collect();
        let gray = GrayImage::from_vec(data, 6, 6);
        let mag = sobel_magnitude(&gray);
        // Kernel straddling the step sees 1+2+1 = 4
        assert!((mag.get(2, 3) - 4.0).abs() < 1e-5);
        assert!(mag.get(1, 3).abs() < 1e-6);
    }

    #[test]
    fn test_channel_means() {
        let img = ImgVec::new(
            vec![RGBA8::new(255, 0, 0, 255), RGBA8::new(0, 0, 255, 255)],
            2,
            1,
        );
        let means = channel_means(img.as_ref());
        assert!((means[0] - 0.5).abs() < 1e-6);
        assert!(means[1].abs() < 1e-6);
        assert!((means[2] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_extract() {
        let img = ImgVec::new(vec![RGBA8::new(51, 102, 153, 255); 30 * 20], 30, 20);
        let provider = BlockStatsEmbedding::new(4);
        let features = extract(img.as_ref(), &provider, 32).unwrap();
        assert_eq!(features.embedding.len(), provider.dimensions());
        assert!((features.color_histogram[0] - 0.2).abs() < 1e-6);
        assert!((features.color_histogram[2] - 0.6).abs() < 1e-6);
        assert!(features.edge_magnitude > 0.0);
    }

    #[test]
    fn test_extract_provider_failure() {
        let img = ImgVec::new(vec![RGBA8::new(0, 0, 0, 255); 64], 8, 8);
        assert!(matches!(
            extract(img.as_ref(), &FailingProvider, 16),
            Err(GradingError::Inference(_))
        ));
    }

    #[test]
    fn test_extract_bad_input_size() {
        let img = ImgVec::new(vec![RGBA8::new(0, 0, 0, 255); 64], 8, 8);
        assert!(matches!(
            extract(img.as_ref(), &BlockStatsEmbedding::new(2), 0),
            Err(GradingError::Decode(_))
        ));
    }
}
