//! Embedding methods and their dispatch over the carrier families.

mod coefficient_matrix;
mod palette_shuffle;

pub use coefficient_matrix::CoefficientMatrix;
pub use palette_shuffle::PaletteShuffle;

use crate::carrier::Carrier;
use crate::error::Result;
use crate::filter::PointFilter;
use crate::payload::Payload;
use crate::progress::Monitor;

/// Caller-tunable knobs shared by every method.
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodOptions {
    /// Restrict embedding to noisy carrier regions.
    pub noise_filter: bool,
}

impl MethodOptions {
    pub(crate) fn filter(&self) -> PointFilter {
        PointFilter::from_flag(self.noise_filter)
    }
}

/// One embedding algorithm over one carrier family.
///
/// `embed` never mutates its input: it works on a copy and returns the
/// modified carrier only after the whole payload went in, so a capacity
/// error or cancellation midway leaves nothing half-written.
pub trait EmbeddingMethod {
    type Carrier;

    /// Payload bytes this carrier can hold. Pure in carrier and filter.
    fn capacity(&self, carrier: &Self::Carrier, filter: PointFilter) -> usize;

    fn embed(
        &self,
        carrier: &Self::Carrier,
        payload: &Payload,
        passphrase: &str,
        filter: PointFilter,
        monitor: &Monitor,
    ) -> Result<Self::Carrier>;

    fn extract(
        &self,
        carrier: &Self::Carrier,
        passphrase: &str,
        filter: PointFilter,
        monitor: &Monitor,
    ) -> Result<Payload>;
}

pub fn capacity(carrier: &Carrier, options: &MethodOptions) -> usize {
    let capacity = match carrier {
        Carrier::Palette(image) => PaletteShuffle.capacity(image, options.filter()),
        Carrier::Coefficients(image) => CoefficientMatrix.capacity(image, options.filter()),
    };
    log::debug!("carrier capacity: {capacity} bytes");
    capacity
}

pub fn embed(
    carrier: &Carrier,
    payload: &Payload,
    passphrase: &str,
    options: &MethodOptions,
    monitor: &Monitor,
) -> Result<Carrier> {
    match carrier {
        Carrier::Palette(image) => PaletteShuffle
            .embed(image, payload, passphrase, options.filter(), monitor)
            .map(Carrier::Palette),
        Carrier::Coefficients(image) => CoefficientMatrix
            .embed(image, payload, passphrase, options.filter(), monitor)
            .map(Carrier::Coefficients),
    }
}

pub fn extract(
    carrier: &Carrier,
    passphrase: &str,
    options: &MethodOptions,
    monitor: &Monitor,
) -> Result<Payload> {
    match carrier {
        Carrier::Palette(image) => {
            PaletteShuffle.extract(image, passphrase, options.filter(), monitor)
        }
        Carrier::Coefficients(image) => {
            CoefficientMatrix.extract(image, passphrase, options.filter(), monitor)
        }
    }
}
