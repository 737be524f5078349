//! Find a good regularization weight for an image by sweeping over several.
use tv_denoise::{Config, Image, add_gaussian_noise, linspace, sweep_lambda_parallel};

fn main() {
    let clean = Image::phantom(96, 96).unwrap();
    let noisy = add_gaussian_noise(&clean, 0.15, Some(7)).unwrap();

    let lambdas = linspace(0.02, 0.3, 8);
    let result = sweep_lambda_parallel(&noisy, &clean, &lambdas, Config::default()).unwrap();
    for entry in &result.entries {
        let note = if entry.converged { "" } else { " (not converged)" };
        println!(
            "lambda={:.3} PSNR={:.2} SSIM={:.3}{note}",
            entry.lambda, entry.psnr, entry.ssim
        );
    }
    if let Some(best) = result.best_by_psnr() {
        println!("Best lambda by PSNR: {:.3}", best.lambda);
    }
}
