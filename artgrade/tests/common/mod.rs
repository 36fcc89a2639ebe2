//! Common test utilities for artgrade integration tests.
//!
//! Everything here is synthetic: no test depends on image files on disk.

pub mod generators;

use artgrade::{EmbeddingProvider, GradingError, PixelTensor};

/// Provider that always fails, for abort-path tests.
pub struct FailingProvider;

impl EmbeddingProvider for FailingProvider {
    fn infer(&self, _tensor: &PixelTensor) -> Result<Vec<f32>, GradingError> {
        Err(GradingError::Inference("provider offline".into()))
    }
}

/// Provider that returns a fixed vector regardless of input.
pub struct FixedProvider(pub Vec<f32>);

impl EmbeddingProvider for FixedProvider {
    fn infer(&self, _tensor: &PixelTensor) -> Result<Vec<f32>, GradingError> {
        Ok(self.0.clone())
    }
}

/// Provider whose output length depends on the mean red value, so two
/// different images get embeddings of different lengths.
pub struct RedLengthProvider;

impl EmbeddingProvider for RedLengthProvider {
    fn infer(&self, tensor: &PixelTensor) -> Result<Vec<f32>, GradingError> {
        let red = tensor.pixel(0, 0)[0];
        let len = if red > 0.5 { 16 } else { 8 };
        Ok((0..len).map(|i| i as f32 / len as f32).collect())
    }
}
