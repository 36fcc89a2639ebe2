//! Deterministic synthetic drawings.
//!
//! These use an LCG PRNG so every platform sees identical inputs.

use artgrade::{ImgVec, RGBA8};

// ============================================================================
// LCG PRNG
// ============================================================================

/// LCG pseudo-random number generator (deterministic)
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u8(&mut self) -> u8 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.state >> 33) & 0xFF) as u8
    }
}

// ============================================================================
// Image Generation Functions
// ============================================================================

/// Uniform opaque color.
pub fn gen_uniform(width: usize, height: usize, r: u8, g: u8, b: u8) -> ImgVec<RGBA8> {
    ImgVec::new(vec![RGBA8::new(r, g, b, 255); width * height], width, height)
}

/// Diagonal color gradient.
pub fn gen_gradient(width: usize, height: usize) -> ImgVec<RGBA8> {
    let max_dist = (width + height).saturating_sub(2).max(1);
    let pixels = (0..height)
        .flat_map(|y| {
            (0..width).map(move |x| {
                let v = ((x + y) * 255 / max_dist) as u8;
                RGBA8::new(v, 255 - v, (x * 255 / width.max(1)) as u8, 255)
            })
        })
        .collect();
    ImgVec::new(pixels, width, height)
}

/// Random noise.
pub fn gen_noise(width: usize, height: usize, seed: u64) -> ImgVec<RGBA8> {
    let mut lcg = Lcg::new(seed);
    let pixels = (0..width * height)
        .map(|_| RGBA8::new(lcg.next_u8(), lcg.next_u8(), lcg.next_u8(), 255))
        .collect();
    ImgVec::new(pixels, width, height)
}

/// Black strokes on white paper: a few horizontal and vertical lines.
pub fn gen_line_drawing(width: usize, height: usize) -> ImgVec<RGBA8> {
    let pixels = (0..height)
        .flat_map(|y| {
            (0..width).map(move |x| {
                let on_line = x % 16 == 0 || y % 16 == 0;
                let v = if on_line { 0 } else { 255 };
                RGBA8::new(v, v, v, 255)
            })
        })
        .collect();
    ImgVec::new(pixels, width, height)
}

/// Inverts every color channel, keeping alpha.
pub fn invert(img: &ImgVec<RGBA8>) -> ImgVec<RGBA8> {
    let pixels = img
        .buf()
        .iter()
        .map(|p| RGBA8::new(255 - p.r, 255 - p.g, 255 - p.b, p.a))
        .collect();
    ImgVec::new(pixels, img.width(), img.height())
}
