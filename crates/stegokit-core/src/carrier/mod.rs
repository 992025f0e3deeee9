//! Carrier containers, one variant per embedding family.

mod coefficients;
mod palette;

use std::fs;
use std::path::Path;

pub use coefficients::{is_dc_position, CoefficientCodec, CoefficientImage, BLOCK_LEN};
pub use palette::{PaletteImage, MAX_PALETTE_LEN};

use crate::error::{Result, StegoError};

/// In-memory decoded carrier. Owned exclusively by one operation at a
/// time; embedding works on a clone and hands the modified clone back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Carrier {
    Palette(PaletteImage),
    Coefficients(CoefficientImage),
}

impl Carrier {
    /// Loads a carrier from disk, choosing the family by file extension.
    ///
    /// Transform-coded carriers need an external [`CoefficientCodec`] and
    /// therefore cannot be loaded through this path-only entry.
    pub fn from_file(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or(StegoError::UnsupportedFormat)?;

        match ext.as_str() {
            "gif" => {
                let data = fs::read(path).map_err(|source| StegoError::ReadError { source })?;
                Ok(Self::Palette(PaletteImage::from_bytes(&data)?))
            }
            _ => Err(StegoError::UnsupportedFormat),
        }
    }

    /// Re-encoded carrier bytes, buffered fully in memory so that a
    /// failing operation never leaves a partial file behind.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Self::Palette(image) => image.to_bytes(),
            // The entropy codec lives outside this crate; callers holding
            // a coefficient carrier also hold the codec that decoded it.
            Self::Coefficients(_) => Err(StegoError::UnsupportedFormat),
        }
    }

    pub fn save_as(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        fs::write(path, bytes).map_err(|source| StegoError::WriteError { source })
    }
}
