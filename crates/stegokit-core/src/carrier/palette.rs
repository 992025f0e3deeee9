//! Palette-indexed carrier, decoded from and encoded to GIF.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::io;

use crate::color::Rgb;
use crate::error::{Result, StegoError};

/// Largest color table a GIF can carry.
pub const MAX_PALETTE_LEN: usize = 256;

/// An indexed-color image: an explicit, reorderable color table plus a
/// pixel array of indices into it. Palette colors are unique and every
/// pixel index is in range; both invariants are checked on construction
/// and preserved by [`PaletteImage::apply_palette`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteImage {
    width: u16,
    height: u16,
    palette: Vec<Rgb>,
    pixels: Vec<u8>,
    transparent: Option<u8>,
}

impl PaletteImage {
    pub fn new(width: u16, height: u16, palette: Vec<Rgb>, pixels: Vec<u8>) -> Result<Self> {
        Self::with_transparency(width, height, palette, pixels, None)
    }

    pub fn with_transparency(
        width: u16,
        height: u16,
        palette: Vec<Rgb>,
        pixels: Vec<u8>,
        transparent: Option<u8>,
    ) -> Result<Self> {
        if palette.len() > MAX_PALETTE_LEN || palette.len() < 2 {
            return Err(StegoError::UnsupportedFormat);
        }
        let unique: HashSet<Rgb> = palette.iter().copied().collect();
        if unique.len() != palette.len() {
            // Palette permutation encoding needs a bijection color <-> slot.
            return Err(StegoError::UnsupportedFormat);
        }
        if pixels.len() != width as usize * height as usize {
            return Err(StegoError::UnsupportedFormat);
        }
        if pixels.iter().any(|&p| p as usize >= palette.len()) {
            return Err(StegoError::UnsupportedFormat);
        }
        if let Some(t) = transparent {
            if t as usize >= palette.len() {
                return Err(StegoError::UnsupportedFormat);
            }
        }

        Ok(Self {
            width,
            height,
            palette,
            pixels,
            transparent,
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn palette(&self) -> &[Rgb] {
        &self.palette
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Replaces the color table with a permutation of itself and re-points
    /// every pixel (and the transparency slot) at its color's new position.
    pub fn apply_palette(&mut self, new_palette: Vec<Rgb>) -> Result<()> {
        if new_palette.len() != self.palette.len() {
            return Err(StegoError::UnsupportedFormat);
        }
        let slot_of: HashMap<Rgb, u8> = new_palette
            .iter()
            .enumerate()
            .map(|(i, &c)| (c, i as u8))
            .collect();
        if slot_of.len() != self.palette.len() {
            return Err(StegoError::UnsupportedFormat);
        }

        let mut remap = vec![0u8; self.palette.len()];
        for (old_slot, color) in self.palette.iter().enumerate() {
            remap[old_slot] = *slot_of.get(color).ok_or(StegoError::UnsupportedFormat)?;
        }

        for pixel in &mut self.pixels {
            *pixel = remap[*pixel as usize];
        }
        if let Some(t) = self.transparent {
            self.transparent = Some(remap[t as usize]);
        }
        self.palette = new_palette;

        Ok(())
    }

    /// Decodes the first frame of a GIF. Animated GIFs, frames smaller
    /// than the logical screen and palette-less files are rejected.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::Indexed);
        let mut decoder = options
            .read_info(io::Cursor::new(data))
            .map_err(|_| StegoError::UnsupportedFormat)?;

        let width = decoder.width();
        let height = decoder.height();
        let global_palette = decoder.global_palette().map(<[u8]>::to_vec);

        let frame = decoder
            .read_next_frame()
            .map_err(|_| StegoError::UnsupportedFormat)?
            .ok_or(StegoError::UnsupportedFormat)?;

        if frame.width != width || frame.height != height || frame.top != 0 || frame.left != 0 {
            return Err(StegoError::UnsupportedFormat);
        }

        let raw_palette = frame
            .palette
            .clone()
            .or(global_palette)
            .ok_or(StegoError::UnsupportedFormat)?;
        let palette: Vec<Rgb> = raw_palette
            .chunks_exact(3)
            .map(|c| Rgb::new(c[0], c[1], c[2]))
            .collect();
        let pixels = frame.buffer.to_vec();
        let transparent = frame.transparent;

        let image = Self::with_transparency(width, height, palette, pixels, transparent)?;

        if decoder
            .read_next_frame()
            .map_err(|_| StegoError::UnsupportedFormat)?
            .is_some()
        {
            return Err(StegoError::UnsupportedFormat);
        }

        Ok(image)
    }

    /// Encodes as a single-frame GIF with a global color table.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let flat: Vec<u8> = self
            .palette
            .iter()
            .flat_map(|c| [c.r, c.g, c.b])
            .collect();

        let mut out = Vec::new();
        {
            let mut encoder = gif::Encoder::new(&mut out, self.width, self.height, &flat)
                .map_err(encoding_error)?;
            let frame = gif::Frame {
                width: self.width,
                height: self.height,
                buffer: Cow::Borrowed(&self.pixels),
                transparent: self.transparent,
                ..Default::default()
            };
            encoder.write_frame(&frame).map_err(encoding_error)?;
        }

        Ok(out)
    }
}

fn encoding_error(e: gif::EncodingError) -> StegoError {
    StegoError::WriteError {
        source: io::Error::new(io::ErrorKind::Other, e),
    }
}
