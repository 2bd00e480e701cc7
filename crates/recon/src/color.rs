use pricegrid_engine::cell::Rgb;
use rand::Rng;

/// Channel floor for generated fills. Keeps black text readable.
pub const PASTEL_MIN: u8 = 200;

/// A light color with every channel in `200..=255`.
pub fn random_pastel<R: Rng + ?Sized>(rng: &mut R) -> Rgb {
    Rgb(
        rng.gen_range(PASTEL_MIN..=u8::MAX),
        rng.gen_range(PASTEL_MIN..=u8::MAX),
        rng.gen_range(PASTEL_MIN..=u8::MAX),
    )
}
