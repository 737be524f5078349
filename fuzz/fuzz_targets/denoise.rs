#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tv_denoise::{Config, Image, compute_metrics, denoise};

fuzz_target!(|setup: Setup| {
    let rows = usize::from(setup.rows % 16) + 1;
    let cols = usize::from(setup.cols % 16) + 1;
    let mut pixels = setup.pixels;
    pixels.resize(rows * cols, 0.5);
    let Ok(noisy) = Image::new(rows, cols, pixels) else {
        return;
    };
    let config = Config::default().with_max_iterations(usize::from(setup.max_iterations));
    let denoised = match denoise(&noisy, setup.lambda, config) {
        Ok(outcome) => outcome.into_image(),
        Err(failure) => match failure.last_iterate {
            Some(last_iterate) => last_iterate,
            None => return,
        },
    };
    assert_eq!(denoised.shape(), noisy.shape());
    let (lo, hi) = denoised.min_max();
    assert!(lo >= 0.0 && hi <= 1.0, "iterate left the box: [{lo}, {hi}]");
    // Only errors for images smaller than the SSIM window.
    let _ = compute_metrics(&noisy.clipped(), &denoised);
});

#[derive(Debug, Arbitrary)]
struct Setup {
    rows: u8,
    cols: u8,
    pixels: Vec<f64>,
    lambda: f64,
    max_iterations: u8,
}
