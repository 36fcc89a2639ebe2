//! Pixel grid types and resampling for the grading pipeline.
//!
//! Decoded images arrive as [`ImageSample`] (RGBA8 in an `imgref` buffer).
//! Intermediate grayscale data is held in [`GrayImage`], a single-channel
//! `f32` plane.

use std::ops::{Index, IndexMut};

use imgref::{ImgRef, ImgVec};
use rgb::RGBA8;

use crate::consts::{LUMA_B, LUMA_G, LUMA_R};
use crate::GradingError;

/// An RGBA pixel grid as produced by a [`PixelSampler`].
pub type ImageSample = ImgVec<RGBA8>;

/// Decodes an image reference into an [`ImageSample`].
///
/// Implementations own acquisition (files, URLs, in-memory blobs) and
/// decoding. Failures surface as [`GradingError::Decode`].
pub trait PixelSampler {
    /// Loads `source` and returns its pixels.
    ///
    /// # Errors
    /// Returns [`GradingError::Decode`] if the source cannot be read or decoded.
    fn load(&self, source: &str) -> Result<ImageSample, GradingError>;
}

/// Single-channel floating point image.
#[derive(Debug, Clone, PartialEq)]
pub struct GrayImage {
    data: Vec<f32>,
    width: usize,
    height: usize,
}

impl GrayImage {
    /// Creates a new image filled with zeros.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: vec![0.0; width * height],
            width,
            height,
        }
    }

    /// Creates an image from existing row-major data.
    ///
    /// # Panics
    /// Panics if data length doesn't match width * height.
    #[must_use]
    pub fn from_vec(data: Vec<f32>, width: usize, height: usize) -> Self {
        assert_eq!(data.len(), width * height);
        Self {
            data,
            width,
            height,
        }
    }

    /// Image width in pixels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns a reference to a row.
    #[inline]
    #[must_use]
    pub fn row(&self, y: usize) -> &[f32] {
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    /// Returns a mutable reference to a row.
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let start = y * self.width;
        &mut self.data[start..start + self.width]
    }

    /// Gets a pixel value.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    /// Pixel value with zero padding outside the image.
    #[inline]
    #[must_use]
    pub fn get_padded(&self, x: isize, y: isize) -> f32 {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            0.0
        } else {
            self.data[y as usize * self.width + x as usize]
        }
    }

    /// Returns the raw data as a slice.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mean of all pixel values, 0 for an empty image.
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().map(|&v| f64::from(v)).sum::<f64>() / self.data.len() as f64
    }

    /// Checks if two images have the same dimensions.
    #[must_use]
    pub fn same_size(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height
    }
}

impl Index<(usize, usize)> for GrayImage {
    type Output = f32;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        &self.data[y * self.width + x]
    }
}

impl IndexMut<(usize, usize)> for GrayImage {
    #[inline]
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut Self::Output {
        &mut self.data[y * self.width + x]
    }
}

/// Normalized RGB tensor handed to an embedding provider.
///
/// Values are in [0,1], interleaved row-major (HWC) with 3 channels.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelTensor {
    data: Vec<f32>,
    width: usize,
    height: usize,
}

impl PixelTensor {
    /// Channels per pixel.
    pub const CHANNELS: usize = 3;

    /// Builds a tensor from an RGBA image, dropping alpha and dividing by 255.
    #[must_use]
    pub fn from_image(img: ImgRef<'_, RGBA8>) -> Self {
        let mut data = Vec::with_capacity(img.width() * img.height() * Self::CHANNELS);
        for px in img.pixels() {
            data.push(f32::from(px.r) / 255.0);
            data.push(f32::from(px.g) / 255.0);
            data.push(f32::from(px.b) / 255.0);
        }
        Self {
            data,
            width: img.width(),
            height: img.height(),
        }
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Interleaved RGB data.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// The (r, g, b) triple at `(x, y)`.
    #[inline]
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> [f32; 3] {
        let i = (y * self.width + x) * Self::CHANNELS;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}

/// Luma of one pixel using BT.601 weights, in the input's value range.
#[inline]
#[must_use]
pub fn luma(r: f32, g: f32, b: f32) -> f32 {
    LUMA_R * r + LUMA_G * g + LUMA_B * b
}

/// Converts an RGBA image to a grayscale plane in the 0..=255 range.
#[must_use]
pub fn luma_plane(img: ImgRef<'_, RGBA8>) -> GrayImage {
    let data = img
        .pixels()
        .map(|px| luma(f32::from(px.r), f32::from(px.g), f32::from(px.b)))
        .collect();
    GrayImage::from_vec(data, img.width(), img.height())
}

/// Converts a normalized tensor to a grayscale plane in the 0..=1 range.
#[must_use]
pub fn tensor_luma(tensor: &PixelTensor) -> GrayImage {
    let data = tensor
        .data()
        .chunks_exact(PixelTensor::CHANNELS)
        .map(|c| luma(c[0], c[1], c[2]))
        .collect();
    GrayImage::from_vec(data, tensor.width(), tensor.height())
}

/// Bilinearly resamples an RGBA image to `width` x `height`.
///
/// Uses pixel-center alignment with edge clamping. Output is fully
/// determined by the input; identical inputs always give identical output.
///
/// # Errors
/// Returns [`GradingError::ImageTooSmall`] if the source or target has a zero
/// dimension.
pub fn resample(
    img: ImgRef<'_, RGBA8>,
    width: usize,
    height: usize,
) -> Result<ImageSample, GradingError> {
    let (src_w, src_h) = (img.width(), img.height());
    if src_w == 0 || src_h == 0 {
        return Err(GradingError::ImageTooSmall {
            width: src_w,
            height: src_h,
        });
    }
    if width == 0 || height == 0 {
        return Err(GradingError::ImageTooSmall { width, height });
    }

    if src_w == width && src_h == height {
        return Ok(ImgVec::new(img.pixels().collect(), width, height));
    }

    let scale_x = src_w as f32 / width as f32;
    let scale_y = src_h as f32 / height as f32;
    let stride = img.stride();
    let buf = img.buf();
    let mut out = Vec::with_capacity(width * height);

    for oy in 0..height {
        let (y0, y1, ty) = sample_coords(oy, scale_y, src_h);
        let row0 = &buf[y0 * stride..y0 * stride + src_w];
        let row1 = &buf[y1 * stride..y1 * stride + src_w];
        for ox in 0..width {
            let (x0, x1, tx) = sample_coords(ox, scale_x, src_w);
            let top = lerp_px(row0[x0], row0[x1], tx);
            let bottom = lerp_px(row1[x0], row1[x1], tx);
            out.push(to_rgba8(lerp4(top, bottom, ty)));
        }
    }

    Ok(ImgVec::new(out, width, height))
}

/// Source indices and interpolation weight for output coordinate `o`.
#[inline]
fn sample_coords(o: usize, scale: f32, src_len: usize) -> (usize, usize, f32) {
    let pos = ((o as f32 + 0.5) * scale - 0.5).max(0.0);
    let i0 = (pos.floor() as usize).min(src_len - 1);
    let i1 = (i0 + 1).min(src_len - 1);
    (i0, i1, pos - i0 as f32)
}

#[inline]
fn lerp_px(a: RGBA8, b: RGBA8, t: f32) -> [f32; 4] {
    lerp4(
        [
            f32::from(a.r),
            f32::from(a.g),
            f32::from(a.b),
            f32::from(a.a),
        ],
        [
            f32::from(b.r),
            f32::from(b.g),
            f32::from(b.b),
            f32::from(b.a),
        ],
        t,
    )
}

#[inline]
fn lerp4(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
        a[3] + (b[3] - a[3]) * t,
    ]
}

#[inline]
fn to_rgba8(v: [f32; 4]) -> RGBA8 {
    let c = |x: f32| x.round().clamp(0.0, 255.0) as u8;
    RGBA8::new(c(v[0]), c(v[1]), c(v[2]), c(v[3]))
}
