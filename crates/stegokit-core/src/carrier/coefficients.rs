//! Transform-coefficient carrier.
//!
//! The entropy-coded wire form of DCT-based formats is an external
//! collaborator: a [`CoefficientCodec`] turns carrier bytes into the flat
//! quantized coefficient sequence and back. This crate only ever sees the
//! decoded sequence.

use crate::error::{Result, StegoError};

/// Coefficients per transform block; the DC term sits at block offset 0.
pub const BLOCK_LEN: usize = 64;

/// Entropy decode/encode boundary, implemented outside this crate.
///
/// `encode(decode(bytes))` must reproduce an equivalent coefficient
/// sequence; the embedding methods rely on nothing else.
pub trait CoefficientCodec {
    fn decode(&self, data: &[u8]) -> Result<Vec<i16>>;
    fn encode(&self, coefficients: &[i16]) -> Result<Vec<u8>>;
}

/// A decoded transform-coded image: quantized coefficients in natural
/// block order, length a multiple of [`BLOCK_LEN`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoefficientImage {
    coefficients: Vec<i16>,
}

impl CoefficientImage {
    pub fn new(coefficients: Vec<i16>) -> Result<Self> {
        if coefficients.is_empty() || coefficients.len() % BLOCK_LEN != 0 {
            return Err(StegoError::UnsupportedFormat);
        }
        Ok(Self { coefficients })
    }

    pub fn from_bytes(codec: &dyn CoefficientCodec, data: &[u8]) -> Result<Self> {
        Self::new(codec.decode(data)?)
    }

    pub fn to_bytes(&self, codec: &dyn CoefficientCodec) -> Result<Vec<u8>> {
        codec.encode(&self.coefficients)
    }

    pub fn coefficients(&self) -> &[i16] {
        &self.coefficients
    }

    pub(crate) fn coefficients_mut(&mut self) -> &mut [i16] {
        &mut self.coefficients
    }

    pub fn block_count(&self) -> usize {
        self.coefficients.len() / BLOCK_LEN
    }

    /// DC term of the given block; never touched by embedding.
    pub fn dc(&self, block: usize) -> i16 {
        self.coefficients[block * BLOCK_LEN]
    }
}

/// True for the first (zero-frequency) position of each block.
#[inline]
pub fn is_dc_position(index: usize) -> bool {
    index % BLOCK_LEN == 0
}
