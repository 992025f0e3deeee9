//! Palette color type and the perceptual distance used to order it.

/// One palette entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Squared "redmean" distance, an integer approximation of perceptual
/// color difference. Good enough to produce a stable reference ordering
/// and to score local homogeneity; exact perceptual accuracy is not
/// required anywhere.
pub fn redmean_distance(a: Rgb, b: Rgb) -> u32 {
    let rmean = (a.r as i32 + b.r as i32) / 2;
    let dr = a.r as i32 - b.r as i32;
    let dg = a.g as i32 - b.g as i32;
    let db = a.b as i32 - b.b as i32;

    let weighted = (512 + rmean) * dr * dr + 1024 * dg * dg + (767 - rmean) * db * db;
    (weighted >> 8) as u32
}

/// Canonical ordering of a palette: by distance from black, ties broken by
/// channel values. Depends only on the color multiset, never on the
/// palette's stored order, so embedder and extractor always agree on it.
pub fn canonical_order(palette: &[Rgb]) -> Vec<Rgb> {
    let mut ordered = palette.to_vec();
    ordered.sort_by_key(|&c| (redmean_distance(c, Rgb::BLACK), c.r, c.g, c.b));
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let a = Rgb::new(12, 200, 33);
        let b = Rgb::new(250, 7, 99);
        assert_eq!(redmean_distance(a, b), redmean_distance(b, a));
        assert_eq!(redmean_distance(a, a), 0);
    }

    #[test]
    fn canonical_order_ignores_input_order() {
        let palette = vec![
            Rgb::new(255, 255, 255),
            Rgb::new(0, 0, 0),
            Rgb::new(128, 0, 0),
            Rgb::new(0, 128, 0),
        ];
        let mut reversed = palette.clone();
        reversed.reverse();

        assert_eq!(canonical_order(&palette), canonical_order(&reversed));
        assert_eq!(canonical_order(&palette)[0], Rgb::BLACK);
    }
}
