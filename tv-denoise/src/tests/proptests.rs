use proptest::prelude::*;

use crate::{
    Config, Error, Image, add_gaussian_noise, denoise,
    metrics::{psnr, ssim},
    tests::assert_nearly_eq,
};

/// Small images with arbitrary (possibly out of range) intensities.
fn any_image(range: std::ops::Range<f64>) -> impl Strategy<Value = Image> {
    (1usize..8, 1usize..8).prop_flat_map(move |(rows, cols)| {
        prop::collection::vec(range.clone(), rows * cols)
            .prop_map(move |pixels| Image::new(rows, cols, pixels).unwrap())
    })
}

/// A pair of same-shaped images big enough for the SSIM window.
fn windowed_pair() -> impl Strategy<Value = (Image, Image)> {
    (7usize..12, 7usize..12).prop_flat_map(|(rows, cols)| {
        let n = rows * cols;
        (
            prop::collection::vec(0.0..=1.0, n),
            prop::collection::vec(0.0..=1.0, n),
        )
            .prop_map(move |(a, b)| {
                (
                    Image::new(rows, cols, a).unwrap(),
                    Image::new(rows, cols, b).unwrap(),
                )
            })
    })
}

proptest! {
    #[test]
    fn noise_is_reproducible(
        clean in any_image(0.0..1.0),
        sigma in 0.0..0.5f64,
        seed in any::<u64>(),
    ) {
        let a = add_gaussian_noise(&clean, sigma, Some(seed)).unwrap();
        let b = add_gaussian_noise(&clean, sigma, Some(seed)).unwrap();
        prop_assert_eq!(a.shape(), clean.shape());
        prop_assert_eq!(&a, &b);
        let (lo, hi) = a.min_max();
        prop_assert!(lo >= 0.0 && hi <= 1.0);
    }

    #[test]
    fn zero_lambda_clips(noisy in any_image(-0.5..1.5)) {
        let outcome = denoise(&noisy, 0.0, Config::default()).unwrap();
        prop_assert_eq!(outcome.image(), &noisy.clipped());
    }

    #[test]
    fn every_iterate_is_in_the_box(
        noisy in any_image(-0.5..1.5),
        lambda in 0.0..1.0f64,
        max_iterations in 0usize..50,
    ) {
        let config = Config::default().with_max_iterations(max_iterations);
        let image = match denoise(&noisy, lambda, config) {
            Ok(outcome) => outcome.into_image(),
            Err(failure) => {
                prop_assert!(
                    matches!(failure.error, Error::NonConvergence { .. }),
                    "unexpected error {}",
                    failure.error
                );
                failure.last_iterate.unwrap()
            }
        };
        prop_assert_eq!(image.shape(), noisy.shape());
        let (lo, hi) = image.min_max();
        prop_assert!(lo >= 0.0 && hi <= 1.0);
    }

    #[test]
    fn ssim_is_symmetric_and_bounded((a, b) in windowed_pair()) {
        let ab = ssim(&a, &b, 1.0).unwrap();
        let ba = ssim(&b, &a, 1.0).unwrap();
        assert_nearly_eq(ab, ba);
        prop_assert!(ab <= 1.0 + 1e-9);
        assert_nearly_eq(ssim(&a, &a, 1.0).unwrap(), 1.0);
    }

    #[test]
    fn psnr_is_symmetric(a in any_image(0.0..1.0), offset in 0.01..0.5f64) {
        let b = a.map(|v| v + offset);
        let ab = psnr(&a, &b, 1.0).unwrap();
        prop_assert_eq!(ab, psnr(&b, &a, 1.0).unwrap());
        prop_assert!(ab.is_finite());
        prop_assert_eq!(psnr(&a, &a, 1.0).unwrap(), f64::INFINITY);
    }
}
