//! Total variation image denoising.
//!
//! Solves the convex program
//!
//! ```text
//! minimize    0.5 * Σ (u[i,j] - noisy[i,j])²  +  λ * TV(u)
//! subject to  0 <= u[i,j] <= 1
//! ```
//!
//! with a first-order primal-dual method, and measures the result with PSNR and SSIM.

pub use crate::error::{Error, InvalidInput};
pub use crate::image::Image;
pub use crate::metrics::{MetricPair, compute_metrics};
pub use crate::noise::{add_gaussian_noise, add_gaussian_noise_with_rng};
pub use crate::solve_outcome::{DenoiseOutcome, FailureOutcome};
pub use crate::solver::{Boundary, Config, DEFAULT_MAX_ITERATIONS, objective, total_variation};
pub use crate::sweep::{SweepEntry, SweepResult, linspace, sweep_lambda, sweep_lambda_parallel};
pub use crate::warnings::{Warning, WarningContent};
use crate::solver::{Model, validate_lambda};

/// Errors from every part of the crate.
mod error;
/// 2D grids of grayscale intensities.
mod image;
/// PSNR and SSIM.
pub mod metrics;
/// Gaussian noise injection.
pub mod noise;
/// Results of solving.
mod solve_outcome;
/// The primal-dual convex solver.
mod solver;
/// Lambda sweeps.
pub mod sweep;
/// Non-fatal problems with the input.
mod warnings;

/// Denoise `noisy` by minimizing `0.5 * ||u - noisy||² + lambda * TV(u)` over `0 <= u <= 1`.
///
/// Fails with [`Error::NonConvergence`] if the duality gap doesn't reach
/// [`Config::gap_tolerance`] within [`Config::max_iterations`]; the failure still carries
/// the last iterate for callers who want to use it anyway.
pub fn denoise(
    noisy: &Image,
    lambda: f64,
    config: Config,
) -> Result<DenoiseOutcome, FailureOutcome> {
    let warnings = warnings::lint(noisy, lambda);
    if let Err(e) = validate_lambda(lambda)
        .and_then(|_| config.validate())
        .map_err(Error::from)
        .and_then(|_| noisy.ensure_finite())
    {
        return Err(FailureOutcome::rejected(e, warnings));
    }

    let mut model = Model::new(noisy, lambda, config);
    let report = model.solve_primal_dual();
    let image = model.into_image();
    if !report.converged {
        log::warn!(
            "TV solve (lambda={lambda}) stopped after {} iterations with duality gap {:.3e}",
            report.iterations,
            report.gap
        );
        return Err(FailureOutcome {
            error: Error::NonConvergence {
                iterations: report.iterations,
                gap: report.gap,
            },
            last_iterate: Some(image),
            iterations: report.iterations,
            warnings,
        });
    }
    log::info!(
        "TV solve (lambda={lambda}) converged in {} iterations, objective {:.6e}",
        report.iterations,
        report.objective
    );
    Ok(DenoiseOutcome {
        image,
        iterations: report.iterations,
        objective: report.objective,
        gap: report.gap,
        warnings,
    })
}

/// Denoise with the default [`Config`] but a custom iteration budget
/// ([`DEFAULT_MAX_ITERATIONS`] is the usual choice).
/// Returns just the image.
pub fn tv_denoise(noisy: &Image, lambda: f64, max_iter: usize) -> Result<Image, Error> {
    let config = Config::default().with_max_iterations(max_iter);
    Ok(denoise(noisy, lambda, config)?.into_image())
}
