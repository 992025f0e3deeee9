//! Matrix encoding over quantized transform coefficients.
//!
//! An F5-style (1, n, k) syndrome code: each window of n = 2^k - 1 usable
//! coefficients carries k payload bits in its parity syndrome and needs at
//! most one coefficient change. Changes always decrement the coefficient's
//! magnitude; a coefficient shrinking to zero is re-embedded over the next
//! window positions because the extractor cannot tell a shrunk zero from a
//! native one. DC terms and zeros never carry bits.

use stegokit_crypto::{ShuffleSource, ENCRYPTION_OVERHEAD};

use crate::carrier::{is_dc_position, CoefficientImage};
use crate::error::{Result, StegoError};
use crate::filter::PointFilter;
use crate::method::EmbeddingMethod;
use crate::payload::{Payload, PayloadEmbedder, PayloadExtractor};
use crate::progress::Monitor;

/// Status field width: top byte k, low 23 bits payload byte count.
const STATUS_BITS: usize = 32;
const LENGTH_MASK: u32 = 0x007f_ffff;
const MAX_K: u8 = 9;

/// Smallest frame any payload can produce; a recovered length below it is
/// necessarily garbage.
const MIN_FRAME_LEN: usize = 4 + ENCRYPTION_OVERHEAD;

/// Keyed traversal over the usable coefficient positions: the filtered
/// selection, shuffled once, DC terms dropped, zeros skipped at visit time
/// (a coefficient shrunk to zero mid-embed disappears for both sides).
struct CoefficientWalk {
    order: Vec<usize>,
    cursor: usize,
}

impl CoefficientWalk {
    fn new(image: &CoefficientImage, filter: PointFilter, source: &mut ShuffleSource) -> Self {
        let mut order = filter.select_coefficients(image).into_indices();
        source.shuffle(&mut order);
        order.retain(|&idx| !is_dc_position(idx));
        Self { order, cursor: 0 }
    }

    fn usable_count(&self, coefficients: &[i16]) -> usize {
        self.order.iter().filter(|&&idx| coefficients[idx] != 0).count()
    }

    fn next_usable(&mut self, coefficients: &[i16]) -> Option<usize> {
        while self.cursor < self.order.len() {
            let idx = self.order[self.cursor];
            self.cursor += 1;
            if coefficients[idx] != 0 {
                return Some(idx);
            }
        }
        None
    }

    fn mark(&self) -> usize {
        self.cursor
    }

    fn rewind(&mut self, mark: usize) {
        self.cursor = mark;
    }
}

#[inline]
fn parity(coefficient: i16) -> u8 {
    (coefficient.unsigned_abs() & 1) as u8
}

/// One magnitude step toward zero, sign preserved.
#[inline]
fn shrink(coefficient: &mut i16) {
    if *coefficient > 0 {
        *coefficient -= 1;
    } else {
        *coefficient += 1;
    }
}

/// Largest k in 2..=9 whose (1, 2^k - 1, k) code still fits the payload
/// into the usable coefficients, falling back to one bit per coefficient.
fn select_k(usable: usize, payload_bits: usize) -> u8 {
    for k in (2..=MAX_K).rev() {
        let n = (1usize << k) - 1;
        if (usable / n) * k as usize >= payload_bits {
            return k;
        }
    }
    0
}

/// Writes one bit into the next usable coefficient's parity, retrying past
/// shrinkage. `None` means the walk is exhausted.
fn embed_direct_bit(
    coefficients: &mut [i16],
    walk: &mut CoefficientWalk,
    bit: u8,
) -> Option<()> {
    loop {
        let idx = walk.next_usable(coefficients)?;
        if parity(coefficients[idx]) == bit {
            return Some(());
        }
        shrink(&mut coefficients[idx]);
        if coefficients[idx] != 0 {
            return Some(());
        }
    }
}

/// Accumulates extracted bits LSB-first into bytes.
#[derive(Default)]
struct ByteAssembler {
    current: u8,
    filled: u8,
}

impl ByteAssembler {
    fn push(&mut self, bit: u8) -> Option<u8> {
        self.current |= bit << self.filled;
        self.filled += 1;
        if self.filled == 8 {
            let byte = self.current;
            self.current = 0;
            self.filled = 0;
            Some(byte)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CoefficientMatrix;

impl EmbeddingMethod for CoefficientMatrix {
    type Carrier = CoefficientImage;

    /// One-bit-per-coefficient estimate minus the status field, with the
    /// usual discount for coefficients at |1| that embedding may destroy.
    fn capacity(&self, carrier: &CoefficientImage, filter: PointFilter) -> usize {
        let coefficients = carrier.coefficients();
        let mut usable = 0usize;
        let mut shrinkable = 0usize;
        for &idx in filter.select_coefficients(carrier).indices() {
            if is_dc_position(idx) || coefficients[idx] == 0 {
                continue;
            }
            usable += 1;
            if coefficients[idx].unsigned_abs() == 1 {
                shrinkable += 1;
            }
        }
        let effective = usable.saturating_sub(shrinkable * 51 / 100);
        effective.saturating_sub(STATUS_BITS) / 8
    }

    fn embed(
        &self,
        carrier: &CoefficientImage,
        payload: &Payload,
        passphrase: &str,
        filter: PointFilter,
        monitor: &Monitor,
    ) -> Result<CoefficientImage> {
        let capacity = self.capacity(carrier, filter);
        let mut embedder = PayloadEmbedder::new(payload, passphrase, capacity)?;
        if embedder.len() > LENGTH_MASK as usize {
            return Err(StegoError::InsufficientCapacity {
                required: embedder.len(),
                available: LENGTH_MASK as usize,
            });
        }
        let frame_len = embedder.len();
        let payload_bits = frame_len * 8;
        let exhausted = || StegoError::InsufficientCapacity {
            required: frame_len,
            available: capacity,
        };

        let mut source = ShuffleSource::from_passphrase(passphrase);
        let mut result = carrier.clone();
        let mut walk = CoefficientWalk::new(carrier, filter, &mut source);
        let coefficients = result.coefficients_mut();

        let usable = walk.usable_count(coefficients);
        let k = select_k(usable.saturating_sub(STATUS_BITS), payload_bits);

        let field = ((k as u32) << 24) | (frame_len as u32 & LENGTH_MASK);
        let masked_field = field ^ source.next_u32();
        for bit_index in 0..STATUS_BITS {
            let bit = ((masked_field >> bit_index) & 1) as u8;
            embed_direct_bit(coefficients, &mut walk, bit).ok_or_else(exhausted)?;
        }

        // Keystream drawn per payload byte, in frame order.
        let mut masked = Vec::with_capacity(frame_len);
        while let Some(byte) = embedder.next_byte() {
            masked.push(byte ^ source.next_byte());
        }
        let bit_at = |i: usize| (masked[i / 8] >> (i % 8)) & 1;

        if k == 0 {
            for bit_index in 0..payload_bits {
                if bit_index % 8 == 0 {
                    monitor.ensure_active()?;
                }
                embed_direct_bit(coefficients, &mut walk, bit_at(bit_index))
                    .ok_or_else(exhausted)?;
                monitor.report(bit_index + 1, payload_bits);
            }
            return Ok(result);
        }

        let n = (1usize << k) - 1;
        let windows = payload_bits.div_ceil(k as usize);
        for window in 0..windows {
            monitor.ensure_active()?;

            // Bits past the end of the last window pad with zeros.
            let mut target = 0usize;
            for t in 0..k as usize {
                let i = window * k as usize + t;
                if i < payload_bits {
                    target |= (bit_at(i) as usize) << t;
                }
            }

            loop {
                let mark = walk.mark();
                let mut group = Vec::with_capacity(n);
                while group.len() < n {
                    group.push(walk.next_usable(coefficients).ok_or_else(exhausted)?);
                }

                let syndrome = group.iter().enumerate().fold(0usize, |acc, (j, &idx)| {
                    if parity(coefficients[idx]) == 1 {
                        acc ^ (j + 1)
                    } else {
                        acc
                    }
                });

                let flip = syndrome ^ target;
                if flip == 0 {
                    break;
                }
                let idx = group[flip - 1];
                shrink(&mut coefficients[idx]);
                if coefficients[idx] == 0 {
                    // Shrinkage: the same bits go again over the window
                    // re-collected without the now-zero coefficient.
                    walk.rewind(mark);
                    continue;
                }
                break;
            }

            let done_bits = ((window + 1) * k as usize).min(payload_bits);
            monitor.report(done_bits, payload_bits);
        }

        Ok(result)
    }

    fn extract(
        &self,
        carrier: &CoefficientImage,
        passphrase: &str,
        filter: PointFilter,
        monitor: &Monitor,
    ) -> Result<Payload> {
        let mut source = ShuffleSource::from_passphrase(passphrase);
        let mut walk = CoefficientWalk::new(carrier, filter, &mut source);
        let coefficients = carrier.coefficients();

        let mut masked_field = 0u32;
        for bit_index in 0..STATUS_BITS {
            let idx = walk
                .next_usable(coefficients)
                .ok_or(StegoError::KeyOrCorruption)?;
            masked_field |= (parity(coefficients[idx]) as u32) << bit_index;
        }
        let field = masked_field ^ source.next_u32();
        let k = (field >> 24) as u8;
        let frame_len = (field & LENGTH_MASK) as usize;
        if k == 1 || k > MAX_K || field & 0x0080_0000 != 0 || frame_len < MIN_FRAME_LEN {
            return Err(StegoError::KeyOrCorruption);
        }

        let payload_bits = frame_len * 8;
        let mut extractor = PayloadExtractor::new(passphrase);
        let mut assembler = ByteAssembler::default();
        let mut bytes_done = 0usize;

        let feed = |bit: u8,
                        assembler: &mut ByteAssembler,
                        extractor: &mut PayloadExtractor,
                        source: &mut ShuffleSource,
                        bytes_done: &mut usize|
         -> Result<()> {
            if let Some(byte) = assembler.push(bit) {
                extractor.process_byte(byte ^ source.next_byte())?;
                *bytes_done += 1;
                monitor.report(*bytes_done, frame_len);
            }
            Ok(())
        };

        if k == 0 {
            for bit_index in 0..payload_bits {
                if bit_index % 8 == 0 {
                    monitor.ensure_active()?;
                }
                let idx = walk
                    .next_usable(coefficients)
                    .ok_or(StegoError::KeyOrCorruption)?;
                feed(
                    parity(coefficients[idx]),
                    &mut assembler,
                    &mut extractor,
                    &mut source,
                    &mut bytes_done,
                )?;
                if extractor.finished() {
                    break;
                }
            }
            return extractor.into_payload();
        }

        let n = (1usize << k) - 1;
        let windows = payload_bits.div_ceil(k as usize);
        'windows: for window in 0..windows {
            monitor.ensure_active()?;

            let mut group = Vec::with_capacity(n);
            while group.len() < n {
                group.push(
                    walk.next_usable(coefficients)
                        .ok_or(StegoError::KeyOrCorruption)?,
                );
            }
            let syndrome = group.iter().enumerate().fold(0usize, |acc, (j, &idx)| {
                if parity(coefficients[idx]) == 1 {
                    acc ^ (j + 1)
                } else {
                    acc
                }
            });

            for t in 0..k as usize {
                let i = window * k as usize + t;
                if i >= payload_bits {
                    break;
                }
                feed(
                    ((syndrome >> t) & 1) as u8,
                    &mut assembler,
                    &mut extractor,
                    &mut source,
                    &mut bytes_done,
                )?;
                if extractor.finished() {
                    break 'windows;
                }
            }
        }

        extractor.into_payload()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Typical quantized-coefficient statistics: large DC terms, AC mostly
    /// zero with a small-magnitude tail.
    fn synthetic_coefficients(block_count: usize, seed: u64) -> CoefficientImage {
        let mut rng = fastrand::Rng::with_seed(seed);
        let mut coefficients = Vec::with_capacity(block_count * 64);
        for _ in 0..block_count {
            coefficients.push(rng.i16(-500..500));
            for _ in 1..64 {
                let value = match rng.usize(0..10) {
                    0..=5 => 0,
                    6..=7 => rng.i16(-2..=2),
                    8 => rng.i16(-10..=10),
                    _ => rng.i16(-50..=50),
                };
                coefficients.push(value);
            }
        }
        CoefficientImage::new(coefficients).unwrap()
    }

    fn sample_payload() -> Payload {
        let mut payload = Payload::with_text("coefficient domain");
        payload.add_file_data("data.bin", vec![0xA5; 64]).unwrap();
        payload
    }

    #[test]
    fn selects_largest_fitting_k() {
        // 511-coefficient windows carry 9 bits each.
        assert_eq!(select_k(10_000, 80), 9);
        assert_eq!(select_k(1_000, 900), 0);
        assert_eq!(select_k(700, 18), 9);
        assert_eq!(select_k(0, 8), 0);
    }

    #[test]
    fn capacity_is_monotone_in_carrier_size() {
        // Growing prefixes of one coefficient sequence: more blocks can
        // only add room.
        let base = synthetic_coefficients(400, 17);
        let mut last = 0usize;
        for blocks in [25, 50, 100, 200, 400] {
            let image =
                CoefficientImage::new(base.coefficients()[..blocks * 64].to_vec()).unwrap();
            let capacity = CoefficientMatrix.capacity(&image, PointFilter::PassThrough);
            assert!(capacity >= last, "capacity dropped at {blocks} blocks");
            last = capacity;
        }
        assert!(last > 0);
    }

    #[test]
    fn round_trip() {
        let image = synthetic_coefficients(400, 7);
        let payload = sample_payload();

        let method = CoefficientMatrix;
        let stego = method
            .embed(&image, &payload, "password", PointFilter::PassThrough, &Monitor::new())
            .unwrap();
        let recovered = method
            .extract(&stego, "password", PointFilter::PassThrough, &Monitor::new())
            .unwrap();

        assert_eq!(recovered, payload);
    }

    #[test]
    fn round_trip_with_noise_filter() {
        let image = synthetic_coefficients(600, 21);
        let payload = Payload::with_text("filtered");

        let method = CoefficientMatrix;
        let stego = method
            .embed(&image, &payload, "pw", PointFilter::NoiseAware, &Monitor::new())
            .unwrap();
        let recovered = method
            .extract(&stego, "pw", PointFilter::NoiseAware, &Monitor::new())
            .unwrap();

        assert_eq!(recovered, payload);
    }

    #[test]
    fn wrong_passphrase_fails_indistinctly() {
        let image = synthetic_coefficients(400, 7);
        let stego = CoefficientMatrix
            .embed(
                &image,
                &Payload::with_text("hidden"),
                "password",
                PointFilter::PassThrough,
                &Monitor::new(),
            )
            .unwrap();

        let result =
            CoefficientMatrix.extract(&stego, "guess", PointFilter::PassThrough, &Monitor::new());
        assert!(matches!(result, Err(StegoError::KeyOrCorruption)));
    }

    #[test]
    fn dc_terms_are_never_modified() {
        let image = synthetic_coefficients(300, 3);
        let stego = CoefficientMatrix
            .embed(
                &image,
                &sample_payload(),
                "pw",
                PointFilter::PassThrough,
                &Monitor::new(),
            )
            .unwrap();

        for block in 0..image.block_count() {
            assert_eq!(image.dc(block), stego.dc(block));
        }
    }

    #[test]
    fn changes_are_single_magnitude_decrements() {
        let image = synthetic_coefficients(300, 11);
        let stego = CoefficientMatrix
            .embed(
                &image,
                &sample_payload(),
                "pw",
                PointFilter::PassThrough,
                &Monitor::new(),
            )
            .unwrap();

        for (before, after) in image.coefficients().iter().zip(stego.coefficients()) {
            if before != after {
                assert_eq!(after.unsigned_abs() + 1, before.unsigned_abs());
            }
        }
    }

    #[test]
    fn matrix_encoding_changes_at_most_one_coefficient_per_window() {
        // No |1| coefficients, so shrinkage cannot add extra changes and
        // the bound is exact: 32 status bits + one change per window.
        let mut rng = fastrand::Rng::with_seed(99);
        let mut coefficients = Vec::with_capacity(400 * 64);
        for _ in 0..400 {
            coefficients.push(rng.i16(-500..500));
            for _ in 1..64 {
                let value = if rng.usize(0..10) < 6 {
                    0
                } else {
                    let magnitude = rng.i16(2..=50);
                    if rng.bool() {
                        magnitude
                    } else {
                        -magnitude
                    }
                };
                coefficients.push(value);
            }
        }
        let image = CoefficientImage::new(coefficients).unwrap();
        let payload = Payload::with_text("hi");

        let capacity = CoefficientMatrix.capacity(&image, PointFilter::PassThrough);
        let frame_len = PayloadEmbedder::new(&payload, "pw", capacity).unwrap().len();
        let payload_bits = frame_len * 8;

        let usable: usize = image
            .coefficients()
            .iter()
            .enumerate()
            .filter(|(i, &c)| !is_dc_position(*i) && c != 0)
            .count();
        let k = select_k(usable - STATUS_BITS, payload_bits);
        assert!(k >= 2, "fixture should leave room for matrix encoding");
        let windows = payload_bits.div_ceil(k as usize);

        let stego = CoefficientMatrix
            .embed(&image, &payload, "pw", PointFilter::PassThrough, &Monitor::new())
            .unwrap();

        let changed = image
            .coefficients()
            .iter()
            .zip(stego.coefficients())
            .filter(|(a, b)| a != b)
            .count();
        assert!(
            changed <= STATUS_BITS + windows,
            "{changed} changes for {windows} windows"
        );
    }

    #[test]
    fn shrinkage_heavy_carrier_still_round_trips() {
        // Almost every usable coefficient sits at |1| and shrinks on the
        // first flip.
        let mut rng = fastrand::Rng::with_seed(5);
        let mut coefficients = Vec::with_capacity(800 * 64);
        for _ in 0..800 {
            coefficients.push(rng.i16(-500..500));
            for _ in 1..64 {
                coefficients.push(match rng.usize(0..4) {
                    0 => 0,
                    1 => -1,
                    _ => 1,
                });
            }
        }
        let image = CoefficientImage::new(coefficients).unwrap();
        let payload = Payload::with_text("survives shrinkage");

        let stego = CoefficientMatrix
            .embed(&image, &payload, "pw", PointFilter::PassThrough, &Monitor::new())
            .unwrap();
        let recovered = CoefficientMatrix
            .extract(&stego, "pw", PointFilter::PassThrough, &Monitor::new())
            .unwrap();

        assert_eq!(recovered, payload);
    }

    #[test]
    fn zero_capacity_without_usable_coefficients() {
        let mut coefficients = vec![0i16; 128];
        coefficients[0] = 100;
        coefficients[64] = 120;
        let image = CoefficientImage::new(coefficients).unwrap();

        assert_eq!(CoefficientMatrix.capacity(&image, PointFilter::PassThrough), 0);
        let result = CoefficientMatrix.embed(
            &image,
            &Payload::with_text("x"),
            "pw",
            PointFilter::PassThrough,
            &Monitor::new(),
        );
        assert!(matches!(
            result,
            Err(StegoError::InsufficientCapacity { available: 0, .. })
        ));
    }

    #[test]
    fn cancellation_aborts() {
        let image = synthetic_coefficients(400, 13);
        let monitor = Monitor::new();
        monitor.cancel_token().cancel();

        let result = CoefficientMatrix.embed(
            &image,
            &sample_payload(),
            "pw",
            PointFilter::PassThrough,
            &monitor,
        );
        assert!(matches!(result, Err(StegoError::Cancelled)));
    }
}
