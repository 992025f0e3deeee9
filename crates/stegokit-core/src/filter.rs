//! Point selection: which carrier positions may be modified at all.
//!
//! Selection is a pure function of carrier content. Extraction recomputes
//! it independently, so a filter must never look at the key or the
//! payload, and its score must be invariant under the modifications the
//! embedding itself makes (the coefficient filter therefore only reads DC
//! terms, which no method ever changes).

use crate::carrier::{Carrier, CoefficientImage, PaletteImage, BLOCK_LEN};
use crate::color::redmean_distance;

/// Pixels whose closest neighbor color is nearer than this count as part
/// of a flat region (redmean units, roughly a 15-per-channel difference).
const PALETTE_FLATNESS_THRESHOLD: u32 = 2000;

/// Blocks whose DC term differs from every scan-order neighbor by at most
/// this are considered flat and excluded.
const DC_FLATNESS_THRESHOLD: i32 = 1;

/// Ordered carrier positions eligible for modification. Computed once per
/// operation and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointSelection(Vec<usize>);

impl PointSelection {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn into_indices(self) -> Vec<usize> {
        self.0
    }
}

/// Policy deciding which carrier positions are eligible for embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointFilter {
    /// Every position, in the carrier's natural order.
    #[default]
    PassThrough,
    /// Excludes positions in near-homogeneous regions, where a single
    /// flipped bit is easiest to flag statistically.
    NoiseAware,
}

impl PointFilter {
    pub fn from_flag(noise_filter: bool) -> Self {
        if noise_filter {
            Self::NoiseAware
        } else {
            Self::PassThrough
        }
    }

    pub fn select(&self, carrier: &Carrier) -> PointSelection {
        match carrier {
            Carrier::Palette(image) => self.select_pixels(image),
            Carrier::Coefficients(image) => self.select_coefficients(image),
        }
    }

    /// Pixel positions of a palette image. The noise-aware variant drops
    /// pixels whose 4-neighborhood contains a color closer than the
    /// flatness threshold.
    pub fn select_pixels(&self, image: &PaletteImage) -> PointSelection {
        let pixels = image.pixels();
        match self {
            Self::PassThrough => PointSelection((0..pixels.len()).collect()),
            Self::NoiseAware => {
                let width = image.width() as usize;
                let height = image.height() as usize;
                let color_at = |x: usize, y: usize| image.palette()[pixels[y * width + x] as usize];

                let mut selected = Vec::with_capacity(pixels.len());
                for y in 0..height {
                    for x in 0..width {
                        let own = color_at(x, y);
                        let mut min_distance = u32::MAX;
                        if x > 0 {
                            min_distance = min_distance.min(redmean_distance(own, color_at(x - 1, y)));
                        }
                        if x + 1 < width {
                            min_distance = min_distance.min(redmean_distance(own, color_at(x + 1, y)));
                        }
                        if y > 0 {
                            min_distance = min_distance.min(redmean_distance(own, color_at(x, y - 1)));
                        }
                        if y + 1 < height {
                            min_distance = min_distance.min(redmean_distance(own, color_at(x, y + 1)));
                        }
                        if min_distance >= PALETTE_FLATNESS_THRESHOLD {
                            selected.push(y * width + x);
                        }
                    }
                }
                PointSelection(selected)
            }
        }
    }

    /// Coefficient positions. The noise-aware variant drops whole blocks
    /// whose DC term is flat against its scan-order neighbors; DC terms
    /// are never modified by embedding, so this score survives a
    /// round trip unchanged.
    pub fn select_coefficients(&self, image: &CoefficientImage) -> PointSelection {
        let len = image.coefficients().len();
        match self {
            Self::PassThrough => PointSelection((0..len).collect()),
            Self::NoiseAware => {
                let blocks = image.block_count();
                let mut selected = Vec::with_capacity(len);
                for block in 0..blocks {
                    // Deltas in i32: two i16 DC terms can be a full type
                    // range apart.
                    let dc = image.dc(block) as i32;
                    let mut max_delta = 0i32;
                    if block > 0 {
                        max_delta = max_delta.max((dc - image.dc(block - 1) as i32).abs());
                    }
                    if block + 1 < blocks {
                        max_delta = max_delta.max((dc - image.dc(block + 1) as i32).abs());
                    }
                    if max_delta > DC_FLATNESS_THRESHOLD {
                        selected.extend(block * BLOCK_LEN..(block + 1) * BLOCK_LEN);
                    }
                }
                PointSelection(selected)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;

    fn checkerboard() -> PaletteImage {
        let palette = vec![Rgb::new(0, 0, 0), Rgb::new(255, 255, 255)];
        let pixels: Vec<u8> = (0..64u32).map(|i| ((i / 8 + i % 8) % 2) as u8).collect();
        PaletteImage::new(8, 8, palette, pixels).unwrap()
    }

    fn flat_image() -> PaletteImage {
        let palette = vec![Rgb::new(10, 10, 10), Rgb::new(11, 10, 10)];
        PaletteImage::new(8, 8, palette, vec![0u8; 64]).unwrap()
    }

    #[test]
    fn pass_through_selects_every_pixel() {
        let selection = PointFilter::PassThrough.select_pixels(&checkerboard());
        assert_eq!(selection.len(), 64);
        assert_eq!(selection.indices()[0], 0);
        assert_eq!(selection.indices()[63], 63);
    }

    #[test]
    fn noise_aware_keeps_contrasty_pixels() {
        let selection = PointFilter::NoiseAware.select_pixels(&checkerboard());
        assert_eq!(selection.len(), 64);
    }

    #[test]
    fn noise_aware_drops_flat_regions() {
        let selection = PointFilter::NoiseAware.select_pixels(&flat_image());
        assert!(selection.is_empty());
    }

    #[test]
    fn selection_is_deterministic() {
        let image = checkerboard();
        let first = PointFilter::NoiseAware.select_pixels(&image);
        let second = PointFilter::NoiseAware.select_pixels(&image);
        assert_eq!(first, second);
    }

    #[test]
    fn coefficient_filter_handles_extreme_dc_terms() {
        // Neighboring DC terms a full i16 range apart must score as
        // maximally contrasty, not overflow.
        let mut coefficients = vec![1i16; 128];
        coefficients[0] = i16::MAX;
        coefficients[64] = i16::MIN;
        let image = CoefficientImage::new(coefficients).unwrap();

        let selection = PointFilter::NoiseAware.select_coefficients(&image);
        assert_eq!(selection.len(), 128);
    }

    #[test]
    fn coefficient_filter_drops_flat_blocks() {
        // Three blocks: DC 100, 100, 140 -- the first two are flat
        // against each other but the third stands out.
        let mut coefficients = vec![1i16; 192];
        coefficients[0] = 100;
        coefficients[64] = 100;
        coefficients[128] = 140;
        let image = CoefficientImage::new(coefficients).unwrap();

        let selection = PointFilter::NoiseAware.select_coefficients(&image);
        assert_eq!(selection.len(), 128);
        assert_eq!(selection.indices()[0], 64);

        let all = PointFilter::PassThrough.select_coefficients(&image);
        assert_eq!(all.len(), 192);
    }
}
