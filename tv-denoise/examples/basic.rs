//! A basic example for how to use the denoiser.
use tv_denoise::{Config, Image, add_gaussian_noise, compute_metrics, denoise};

fn main() {
    // A synthetic 64x64 image with flat regions and sharp edges.
    let clean = Image::phantom(64, 64).unwrap();

    // Corrupt it with seeded Gaussian noise, so every run sees the same input.
    let noisy = add_gaussian_noise(&clean, 0.1, Some(0)).unwrap();

    // Run the solver!
    let outcome = denoise(&noisy, 0.1, Config::default());

    // Check the outcome.
    match outcome {
        Ok(solution) => {
            let before = compute_metrics(&clean, &noisy).unwrap();
            let after = compute_metrics(&clean, solution.image()).unwrap();
            println!(
                "Converged in {} iterations (duality gap {:.2e})",
                solution.iterations(),
                solution.duality_gap()
            );
            println!("noisy:    PSNR={:.2} SSIM={:.3}", before.psnr, before.ssim);
            println!("denoised: PSNR={:.2} SSIM={:.3}", after.psnr, after.ssim);
        }
        Err(e) => {
            eprintln!("could not denoise this image: {}", e.error);
        }
    }
}
