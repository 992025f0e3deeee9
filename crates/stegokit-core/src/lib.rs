//! # Stegokit Core API
//!
//! Hides an encrypted payload (a text message and/or files) inside a
//! carrier image, recoverable only with the correct passphrase. Two
//! embedding methods are provided and dispatched by carrier family:
//!
//! - [`PaletteShuffle`] stores the payload in the ordering of an
//!   indexed-color image's palette (GIF); the rendered pixels never change.
//! - [`CoefficientMatrix`] stores the payload in the parities of quantized
//!   transform coefficients via matrix encoding, at most one magnitude
//!   decrement per coefficient window.
//!
//! # Usage example
//!
//! ```rust
//! use stegokit_core::carrier::PaletteImage;
//! use stegokit_core::color::Rgb;
//! use stegokit_core::{embed, extract, Carrier, MethodOptions, Monitor, Payload};
//!
//! let palette: Vec<Rgb> = (0..=255u8)
//!     .map(|i| Rgb::new(i, i.wrapping_mul(3), 255 - i))
//!     .collect();
//! let pixels: Vec<u8> = (0..64 * 64u32).map(|i| (i % 256) as u8).collect();
//! let image = PaletteImage::new(64, 64, palette, pixels)?;
//! let carrier = Carrier::Palette(image);
//!
//! let payload = Payload::with_text("Hello, World!");
//! let options = MethodOptions::default();
//!
//! let stego = embed(&carrier, &payload, "SuperSecret42", &options, &Monitor::new())?;
//! let recovered = extract(&stego, "SuperSecret42", &options, &Monitor::new())?;
//! assert_eq!(recovered.text.as_deref(), Some("Hello, World!"));
//! # Ok::<(), stegokit_core::StegoError>(())
//! ```

#![warn(clippy::redundant_else)]

pub mod carrier;
pub mod color;
pub mod commands;
pub mod error;
pub mod filter;
pub mod method;
pub mod payload;
pub mod progress;

pub use carrier::{Carrier, CoefficientCodec, CoefficientImage, PaletteImage};
pub use error::{Result, StegoError};
pub use filter::{PointFilter, PointSelection};
pub use method::{CoefficientMatrix, EmbeddingMethod, MethodOptions, PaletteShuffle};
pub use payload::{FileEntry, Payload};
pub use progress::{CancelToken, Monitor};

/// Payload bytes the carrier can hold under the given options. Pure in its
/// inputs; embedding the result is guaranteed to fit barring shrinkage.
pub fn capacity(carrier: &Carrier, options: &MethodOptions) -> usize {
    method::capacity(carrier, options)
}

/// Embeds the payload and returns the modified carrier. The input carrier
/// is never touched, so any error leaves the caller's data as it was.
pub fn embed(
    carrier: &Carrier,
    payload: &Payload,
    passphrase: &str,
    options: &MethodOptions,
    monitor: &Monitor,
) -> Result<Carrier> {
    method::embed(carrier, payload, passphrase, options, monitor)
}

/// Recovers the payload embedded under the same passphrase and options.
pub fn extract(
    carrier: &Carrier,
    passphrase: &str,
    options: &MethodOptions,
    monitor: &Monitor,
) -> Result<Payload> {
    method::extract(carrier, passphrase, options, monitor)
}
