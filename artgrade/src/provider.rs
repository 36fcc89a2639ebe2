//! Embedding providers.
//!
//! An [`EmbeddingProvider`] maps a normalized pixel tensor to a fixed-length
//! feature vector. Real deployments wrap a pretrained network behind this
//! trait; [`BlockStatsEmbedding`] is a deterministic, model-free provider
//! that keeps the crate usable on its own.

use crate::image::{tensor_luma, PixelTensor};
use crate::GradingError;

/// Maps a normalized pixel tensor to an embedding vector.
///
/// Implementations must return vectors of the same length for every input
/// they accept. They are shared across threads when both images of a pair
/// are extracted concurrently.
pub trait EmbeddingProvider: Send + Sync {
    /// Runs inference on `tensor` (RGB in [0,1], `input_size` square).
    ///
    /// # Errors
    /// Returns [`GradingError::Inference`] if the model fails.
    fn infer(&self, tensor: &PixelTensor) -> Result<Vec<f32>, GradingError>;

    /// Short identifier used in log messages.
    fn name(&self) -> &str {
        "embedding"
    }
}

impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for &P {
    fn infer(&self, tensor: &PixelTensor) -> Result<Vec<f32>, GradingError> {
        (**self).infer(tensor)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for Box<P> {
    fn infer(&self, tensor: &PixelTensor) -> Result<Vec<f32>, GradingError> {
        (**self).infer(tensor)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Hand-crafted embedding from per-cell statistics on a square grid.
///
/// For each of `grid * grid` cells it emits six values: mean R, G and B,
/// luma standard deviation, mean absolute luma gradient, and inverted mean
/// luma. All values are in [0,1], so the vector length is `grid * grid * 6`.
///
/// The inverted luma keeps flat cells from collapsing to a constant vector:
/// black cells emit `1.0` next to zero means, white cells `0.0` next to
/// full ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockStatsEmbedding {
    grid: usize,
}

impl Default for BlockStatsEmbedding {
    fn default() -> Self {
        Self { grid: 8 }
    }
}

impl BlockStatsEmbedding {
    /// Values emitted per grid cell.
    pub const FEATURES_PER_CELL: usize = 6;

    /// Creates a provider with a `grid` x `grid` layout.
    ///
    /// # Panics
    /// Panics if `grid` is zero.
    #[must_use]
    pub fn new(grid: usize) -> Self {
        assert!(grid > 0, "grid must be non-zero");
        Self { grid }
    }

    /// Length of every vector this provider returns.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.grid * self.grid * Self::FEATURES_PER_CELL
    }
}

impl EmbeddingProvider for BlockStatsEmbedding {
    fn infer(&self, tensor: &PixelTensor) -> Result<Vec<f32>, GradingError> {
        let (width, height) = (tensor.width(), tensor.height());
        if width < self.grid || height < self.grid {
            return Err(GradingError::Inference(format!(
                "tensor {width}x{height} is smaller than the {0}x{0} grid",
                self.grid
            )));
        }

        let gray = tensor_luma(tensor);
        let mut out = Vec::with_capacity(self.dimensions());

        for cy in 0..self.grid {
            let (y0, y1) = (cy * height / self.grid, (cy + 1) * height / self.grid);
            for cx in 0..self.grid {
                let (x0, x1) = (cx * width / self.grid, (cx + 1) * width / self.grid);
                let count = ((x1 - x0) * (y1 - y0)) as f32;

                let mut rgb = [0.0f32; 3];
                let (mut sum, mut sum_sq, mut grad) = (0.0f32, 0.0f32, 0.0f32);
                for y in y0..y1 {
                    for x in x0..x1 {
                        let [r, g, b] = tensor.pixel(x, y);
                        rgb[0] += r;
                        rgb[1] += g;
                        rgb[2] += b;
                        let v = gray.get(x, y);
                        sum += v;
                        sum_sq += v * v;
                        if x + 1 < width {
                            grad += (gray.get(x + 1, y) - v).abs();
                        }
                        if y + 1 < height {
                            grad += (gray.get(x, y + 1) - v).abs();
                        }
                    }
                }

                let mean = sum / count;
                let std = (sum_sq / count - mean * mean).max(0.0).sqrt();
                out.extend(rgb.iter().map(|c| c / count));
                out.push(std);
                out.push(grad / count);
                out.push((1.0 - mean).clamp(0.0, 1.0));
            }
        }

        Ok(out)
    }

    fn name(&self) -> &str {
        "block-stats"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgref::ImgVec;
    use rgb::RGBA8;

    fn tensor(width: usize, height: usize, f: impl Fn(usize, usize) -> RGBA8) -> PixelTensor {
        let pixels = (0..width * height).map(|i| f(i % width, i / width)).collect();
        PixelTensor::from_image(ImgVec::new(pixels, width, height).as_ref())
    }

    #[test]
    fn test_dimensions() {
        let provider = BlockStatsEmbedding::new(4);
        let t = tensor(32, 32, |_, _| RGBA8::new(10, 20, 30, 255));
        let v = provider.infer(&t).unwrap();
        assert_eq!(v.len(), provider.dimensions());
        assert_eq!(v.len(), 4 * 4 * 6);
    }

    #[test]
    fn test_uniform_cells() {
        let provider = BlockStatsEmbedding::new(2);
        let t = tensor(16, 16, |_, _| RGBA8::new(255, 0, 0, 255));
        let v = provider.infer(&t).unwrap();
        for cell in v.chunks_exact(BlockStatsEmbedding::FEATURES_PER_CELL) {
            assert!((cell[0] - 1.0).abs() < 1e-6);
            assert!(cell[1].abs() < 1e-6);
            assert!(cell[3].abs() < 1e-3, "flat cell has no contrast");
            assert!(cell[4].abs() < 1e-6, "flat cell has no gradient");
            assert!((cell[5] - (1.0 - 0.299)).abs() < 1e-5);
        }
    }

    #[test]
    fn test_flat_images_are_not_constant() {
        let provider = BlockStatsEmbedding::new(2);
        for v in [0u8, 128, 255] {
            let t = tensor(8, 8, |_, _| RGBA8::new(v, v, v, 255));
            let e = provider.infer(&t).unwrap();
            assert!(
                e.iter().any(|x| (x - e[0]).abs() > 0.1),
                "flat {v} gave a constant embedding: {e:?}"
            );
        }
    }

    #[test]
    fn test_deterministic() {
        let provider = BlockStatsEmbedding::default();
        let t = tensor(64, 48, |x, y| RGBA8::new((x * 4) as u8, (y * 5) as u8, 99, 255));
        assert_eq!(provider.infer(&t).unwrap(), provider.infer(&t).unwrap());
    }

    #[test]
    fn test_too_small_tensor() {
        let provider = BlockStatsEmbedding::new(8);
        let t = tensor(4, 4, |_, _| RGBA8::new(0, 0, 0, 255));
        assert!(matches!(
            provider.infer(&t),
            Err(GradingError::Inference(_))
        ));
    }

    #[test]
    fn test_boxed_provider_delegates() {
        let boxed: Box<dyn EmbeddingProvider> = Box::new(BlockStatsEmbedding::new(2));
        assert_eq!(boxed.name(), "block-stats");
        let t = tensor(8, 8, |_, _| RGBA8::new(1, 2, 3, 255));
        assert_eq!(boxed.infer(&t).unwrap().len(), 24);
    }
}
