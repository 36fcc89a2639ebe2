//! Per-pixel difference heatmap.
//!
//! Both images are resampled to a square of the configured size. Each output
//! pixel encodes `|dr| + |dg| + |db|` of the inputs: transparent blue for no
//! difference, rising to opaque red for the largest one. The heatmap is for
//! display only and never feeds back into the grade.

use imgref::{ImgRef, ImgVec};
use rgb::RGBA8;

use crate::consts::HEATMAP_INTENSITY_SCALE;
use crate::image::resample;
use crate::GradingError;

/// Heatmap raster, `size` x `size` RGBA8.
pub type HeatmapImage = ImgVec<RGBA8>;

/// Raw channel difference of two pixels, 0..=765. Alpha is ignored.
#[inline]
#[must_use]
pub fn pixel_difference(a: RGBA8, b: RGBA8) -> u16 {
    u16::from(a.r.abs_diff(b.r)) + u16::from(a.g.abs_diff(b.g)) + u16::from(a.b.abs_diff(b.b))
}

/// Maps a raw difference to a displayable intensity, 0..=255.
#[inline]
#[must_use]
pub fn intensity(difference: u16) -> u8 {
    (f32::from(difference) * HEATMAP_INTENSITY_SCALE)
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Heatmap color for an intensity: red and alpha rise, blue falls.
#[inline]
#[must_use]
pub fn heatmap_color(intensity: u8) -> RGBA8 {
    RGBA8::new(intensity, 0, 255 - intensity, intensity)
}

/// Renders the difference heatmap of `a` and `b` at `size` x `size`.
///
/// # Errors
/// Returns [`GradingError::Decode`] if either image cannot be resampled.
pub fn difference_heatmap(
    a: ImgRef<'_, RGBA8>,
    b: ImgRef<'_, RGBA8>,
    size: usize,
) -> Result<HeatmapImage, GradingError> {
    let ra = resample_for_heatmap(a, size)?;
    let rb = resample_for_heatmap(b, size)?;

    let pixels = ra
        .buf()
        .iter()
        .zip(rb.buf())
        .map(|(&pa, &pb)| heatmap_color(intensity(pixel_difference(pa, pb))))
        .collect();

    Ok(ImgVec::new(pixels, size, size))
}

fn resample_for_heatmap(img: ImgRef<'_, RGBA8>, size: usize) -> Result<HeatmapImage, GradingError> {
    resample(img, size, size)
        .map_err(|e| GradingError::Decode(format!("cannot render heatmap: {e}")))
}
