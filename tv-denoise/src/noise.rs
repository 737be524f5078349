//! Additive Gaussian noise.

use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::StandardNormal;

use crate::{Error, Image, InvalidInput, image::clip_unit};

/// Corrupt `clean` with zero-mean Gaussian noise of standard deviation `sigma`,
/// then clip to [0, 1].
///
/// With `Some(seed)` the output is reproducible bit-for-bit.
/// With `None` the generator is seeded from the operating system.
pub fn add_gaussian_noise(clean: &Image, sigma: f64, seed: Option<u64>) -> Result<Image, Error> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    add_gaussian_noise_with_rng(clean, sigma, &mut rng)
}

/// Like [`add_gaussian_noise`] but draws from a caller-owned generator.
/// Samples are drawn in row-major pixel order.
pub fn add_gaussian_noise_with_rng<R: Rng>(
    clean: &Image,
    sigma: f64,
    rng: &mut R,
) -> Result<Image, Error> {
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(InvalidInput::BadSigma(sigma).into());
    }
    let noisy: Vec<f64> = clean
        .iter()
        .map(|v| {
            let sample: f64 = rng.sample(StandardNormal);
            clip_unit(v + sigma * sample)
        })
        .collect();
    Image::new(clean.rows(), clean.cols(), noisy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Image {
        Image::from_fn(12, 9, |r, c| (r + c) as f64 / 20.0).unwrap()
    }

    #[test]
    fn same_seed_same_noise() {
        let clean = ramp();
        let a = add_gaussian_noise(&clean, 0.1, Some(42)).unwrap();
        let b = add_gaussian_noise(&clean, 0.1, Some(42)).unwrap();
        assert_eq!(a, b);
        let c = add_gaussian_noise(&clean, 0.1, Some(43)).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn output_is_clipped() {
        let clean = ramp();
        let noisy = add_gaussian_noise(&clean, 2.0, Some(7)).unwrap();
        assert_eq!(noisy.shape(), clean.shape());
        let (lo, hi) = noisy.min_max();
        assert!(lo >= 0.0 && hi <= 1.0);
    }

    #[test]
    fn zero_sigma_is_identity_on_valid_images() {
        let clean = ramp();
        let noisy = add_gaussian_noise(&clean, 0.0, Some(0)).unwrap();
        assert_eq!(noisy, clean);
    }

    #[test]
    fn caller_owned_rng_advances() {
        let clean = ramp();
        let mut rng = StdRng::seed_from_u64(5);
        let first = add_gaussian_noise_with_rng(&clean, 0.1, &mut rng).unwrap();
        let second = add_gaussian_noise_with_rng(&clean, 0.1, &mut rng).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn rejects_bad_sigma() {
        let clean = ramp();
        for sigma in [-0.1, f64::NAN, f64::INFINITY] {
            let err = add_gaussian_noise(&clean, sigma, Some(0)).unwrap_err();
            assert!(err.is_invalid_input());
        }
    }
}
