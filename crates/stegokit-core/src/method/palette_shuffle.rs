//! Palette permutation encoding for indexed-color carriers.
//!
//! The payload is not written into pixels at all: it becomes the ORDER of
//! the color table. Both sides derive the same keyed reference ordering of
//! the palette, so the permutation actually stored in the file is readable
//! only with the passphrase. Pixel data is re-pointed, never changed, which
//! makes the rendered image bit-identical to the original.

use std::collections::HashMap;

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use stegokit_crypto::ShuffleSource;

use crate::carrier::PaletteImage;
use crate::color::{canonical_order, Rgb};
use crate::error::{Result, StegoError};
use crate::filter::PointFilter;
use crate::method::EmbeddingMethod;
use crate::payload::{Payload, PayloadEmbedder, PayloadExtractor};
use crate::progress::Monitor;

/// Leading byte of the embedded value. Guards against leading-zero
/// truncation in the big-integer representation and doubles as a cheap
/// wrong-key check on extraction.
const SENTINEL: u8 = 0x01;

/// A palette of N colors has N! distinguishable orderings, so it holds
/// log2(N!) bits. One byte is reserved for the sentinel.
fn palette_capacity(palette_len: usize) -> usize {
    if palette_len < 2 {
        return 0;
    }
    let bits: f64 = (2..=palette_len).map(|i| (i as f64).log2()).sum();
    ((bits / 8.0) as usize).saturating_sub(1)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PaletteShuffle;

impl EmbeddingMethod for PaletteShuffle {
    type Carrier = PaletteImage;

    fn capacity(&self, carrier: &PaletteImage, filter: PointFilter) -> usize {
        if filter.select_pixels(carrier).is_empty() {
            return 0;
        }
        palette_capacity(carrier.palette().len())
    }

    fn embed(
        &self,
        carrier: &PaletteImage,
        payload: &Payload,
        passphrase: &str,
        filter: PointFilter,
        monitor: &Monitor,
    ) -> Result<PaletteImage> {
        let capacity = self.capacity(carrier, filter);
        let embedder = PayloadEmbedder::new(payload, passphrase, capacity)?;

        let mut bytes = Vec::with_capacity(embedder.len() + 1);
        bytes.push(SENTINEL);
        bytes.extend_from_slice(embedder.frame_bytes());
        let mut value = BigUint::from_bytes_be(&bytes);

        let mut target = canonical_order(carrier.palette());
        let mut source = ShuffleSource::from_passphrase(passphrase);
        source.shuffle(&mut target);

        // Factorial number system: step i consumes the digit value % (i+1)
        // and spends it as the insertion position of the next target color.
        // The capacity bound guarantees the value is fully consumed.
        let n = target.len();
        let mut new_palette: Vec<Rgb> = Vec::with_capacity(n);
        for i in 0..n {
            monitor.ensure_active()?;
            let modulus = BigUint::from(i as u64 + 1);
            let digit = (&value % &modulus).to_usize().unwrap_or(0);
            value /= &modulus;
            new_palette.insert(digit, target[n - 1 - i]);
            monitor.report(i + 1, n);
        }

        let mut result = carrier.clone();
        result.apply_palette(new_palette)?;
        Ok(result)
    }

    fn extract(
        &self,
        carrier: &PaletteImage,
        passphrase: &str,
        filter: PointFilter,
        monitor: &Monitor,
    ) -> Result<Payload> {
        if self.capacity(carrier, filter) == 0 {
            return Err(StegoError::KeyOrCorruption);
        }

        let mut target = canonical_order(carrier.palette());
        let mut source = ShuffleSource::from_passphrase(passphrase);
        source.shuffle(&mut target);

        // Invert the insertion walk: removing target colors in reverse
        // insertion order reads the digits back out of the stored palette.
        // Ranks of the remaining colors shift down past each removal.
        let n = target.len();
        let mut rank: HashMap<Rgb, usize> = carrier
            .palette()
            .iter()
            .enumerate()
            .map(|(i, &c)| (c, i))
            .collect();

        let mut digits = vec![0usize; n];
        for (step, color) in target.iter().enumerate() {
            monitor.ensure_active()?;
            let pos = rank.remove(color).ok_or(StegoError::KeyOrCorruption)?;
            digits[n - 1 - step] = pos;
            for r in rank.values_mut() {
                if *r > pos {
                    *r -= 1;
                }
            }
            monitor.report(step + 1, n);
        }

        let mut value = BigUint::zero();
        for i in (0..n).rev() {
            value = value * (i as u64 + 1) + digits[i] as u64;
        }

        let bytes = value.to_bytes_be();
        if bytes.first() != Some(&SENTINEL) {
            return Err(StegoError::KeyOrCorruption);
        }

        let mut extractor = PayloadExtractor::new(passphrase);
        for &byte in &bytes[1..] {
            extractor.process_byte(byte)?;
            if extractor.finished() {
                break;
            }
        }
        extractor.into_payload()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_palette(len: usize) -> Vec<Rgb> {
        (0..len)
            .map(|i| Rgb::new(i as u8, (i as u8).wrapping_mul(3), 255 - i as u8))
            .collect()
    }

    fn fixture(palette_len: usize) -> PaletteImage {
        let pixels: Vec<u8> = (0..64 * 64u32)
            .map(|i| (i % palette_len as u32) as u8)
            .collect();
        PaletteImage::new(64, 64, gradient_palette(palette_len), pixels).unwrap()
    }

    #[test]
    fn capacity_by_palette_size() {
        assert_eq!(palette_capacity(1), 0);
        assert_eq!(palette_capacity(2), 0);
        assert_eq!(palette_capacity(8), 0);
        assert_eq!(palette_capacity(16), 4);
        assert_eq!(palette_capacity(64), 35);
        assert_eq!(palette_capacity(256), 209);
    }

    #[test]
    fn capacity_grows_with_palette_size() {
        let capacities: Vec<usize> = (2..=256).map(palette_capacity).collect();
        assert!(capacities.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn full_palette_round_trip() {
        let image = fixture(256);
        let mut payload = Payload::with_text("hi");
        payload.add_file_data("note.txt", b"small cargo".to_vec()).unwrap();

        let method = PaletteShuffle;
        let stego = method
            .embed(&image, &payload, "password", PointFilter::PassThrough, &Monitor::new())
            .unwrap();
        let recovered = method
            .extract(&stego, "password", PointFilter::PassThrough, &Monitor::new())
            .unwrap();

        assert_eq!(recovered, payload);
    }

    #[test]
    fn wrong_passphrase_fails_indistinctly() {
        let image = fixture(256);
        let payload = Payload::with_text("hi");

        let method = PaletteShuffle;
        let stego = method
            .embed(&image, &payload, "password", PointFilter::PassThrough, &Monitor::new())
            .unwrap();
        let result = method.extract(&stego, "letmein", PointFilter::PassThrough, &Monitor::new());

        assert!(matches!(result, Err(StegoError::KeyOrCorruption)));
    }

    #[test]
    fn embedding_only_permutes_the_palette() {
        let image = fixture(256);
        let payload = Payload::with_text("permutation check");

        let stego = PaletteShuffle
            .embed(&image, &payload, "pw", PointFilter::PassThrough, &Monitor::new())
            .unwrap();

        let mut before = image.palette().to_vec();
        let mut after = stego.palette().to_vec();
        before.sort();
        after.sort();
        assert_eq!(before, after);
        assert_ne!(image.palette(), stego.palette());

        // Rendered colors are untouched.
        let colors = |img: &PaletteImage| -> Vec<Rgb> {
            img.pixels().iter().map(|&p| img.palette()[p as usize]).collect()
        };
        assert_eq!(colors(&image), colors(&stego));
    }

    #[test]
    fn small_palette_has_no_room() {
        let image = fixture(16);
        let result = PaletteShuffle.embed(
            &image,
            &Payload::with_text("x"),
            "pw",
            PointFilter::PassThrough,
            &Monitor::new(),
        );
        assert!(matches!(
            result,
            Err(StegoError::InsufficientCapacity { available: 4, .. })
        ));
    }

    #[test]
    fn cancellation_aborts_before_commit() {
        let image = fixture(256);
        let monitor = Monitor::new();
        monitor.cancel_token().cancel();

        let result = PaletteShuffle.embed(
            &image,
            &Payload::with_text("hi"),
            "pw",
            PointFilter::PassThrough,
            &monitor,
        );
        assert!(matches!(result, Err(StegoError::Cancelled)));
    }

    #[test]
    fn progress_reaches_completion() {
        use std::sync::{Arc, Mutex};

        let image = fixture(256);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let monitor = Monitor::with_progress(move |p| sink.lock().unwrap().push(p));

        PaletteShuffle
            .embed(&image, &Payload::with_text("hi"), "pw", PointFilter::PassThrough, &monitor)
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.last().copied(), Some(100));
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
    }
}
