//! Evaluate the denoiser across many regularization weights.

use rayon::prelude::*;

use crate::{
    Config, Error, FailureOutcome, Image, MetricPair, compute_metrics, denoise,
    solver::validate_lambda,
};

/// Metrics for one regularization weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepEntry {
    /// The regularization weight that was solved for.
    pub lambda: f64,
    /// PSNR of the denoised image against the clean reference.
    pub psnr: f64,
    /// SSIM of the denoised image against the clean reference.
    pub ssim: f64,
    /// False if the solver ran out of iterations and these metrics
    /// describe its last iterate instead of a converged solution.
    pub converged: bool,
    /// Iterations the solve used.
    pub iterations: usize,
}

/// One [`SweepEntry`] per requested lambda, in the order they were requested.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SweepResult {
    /// Per-lambda results.
    pub entries: Vec<SweepEntry>,
}

impl SweepResult {
    /// The entry with the highest PSNR, if any.
    pub fn best_by_psnr(&self) -> Option<&SweepEntry> {
        self.entries.iter().max_by(|a, b| a.psnr.total_cmp(&b.psnr))
    }

    /// The entry with the highest SSIM, if any.
    pub fn best_by_ssim(&self) -> Option<&SweepEntry> {
        self.entries.iter().max_by(|a, b| a.ssim.total_cmp(&b.ssim))
    }

    /// The swept lambdas, in order.
    pub fn lambdas(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.lambda).collect()
    }

    /// Did every solve converge?
    pub fn all_converged(&self) -> bool {
        self.entries.iter().all(|e| e.converged)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no lambdas were swept.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for SweepResult {
    type Item = SweepEntry;
    type IntoIter = std::vec::IntoIter<SweepEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Denoise `noisy` once per lambda and score each result against `clean`.
///
/// Each solve is independent. Bad inputs (shape mismatch, a negative lambda) abort
/// the whole sweep before any solving. A solve that runs out of iterations does not:
/// its last iterate is scored and the entry is marked as not converged.
pub fn sweep_lambda(
    noisy: &Image,
    clean: &Image,
    lambdas: &[f64],
    config: Config,
) -> Result<SweepResult, Error> {
    check_sweep(noisy, clean, lambdas)?;
    let entries = lambdas
        .iter()
        .map(|&lambda| evaluate(noisy, clean, lambda, config))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SweepResult { entries })
}

/// Like [`sweep_lambda`], but the solves run concurrently on the rayon thread pool.
/// Results are still in the order the lambdas were given.
pub fn sweep_lambda_parallel(
    noisy: &Image,
    clean: &Image,
    lambdas: &[f64],
    config: Config,
) -> Result<SweepResult, Error> {
    check_sweep(noisy, clean, lambdas)?;
    let entries = lambdas
        .par_iter()
        .map(|&lambda| evaluate(noisy, clean, lambda, config))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SweepResult { entries })
}

/// `count` evenly spaced values from `start` to `end`, both included.
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count)
                .map(|i| {
                    if i == count - 1 {
                        end
                    } else {
                        start + step * i as f64
                    }
                })
                .collect()
        }
    }
}

fn check_sweep(noisy: &Image, clean: &Image, lambdas: &[f64]) -> Result<(), Error> {
    noisy.ensure_same_shape(clean)?;
    for &lambda in lambdas {
        validate_lambda(lambda)?;
    }
    Ok(())
}

fn evaluate(noisy: &Image, clean: &Image, lambda: f64, config: Config) -> Result<SweepEntry, Error> {
    let (denoised, converged, iterations) = match denoise(noisy, lambda, config) {
        Ok(outcome) => {
            let iterations = outcome.iterations();
            (outcome.into_image(), true, iterations)
        }
        Err(FailureOutcome {
            error: error @ Error::NonConvergence { .. },
            last_iterate,
            iterations,
            ..
        }) => {
            log::warn!("lambda={lambda}: {error}, scoring the last iterate");
            let Some(last_iterate) = last_iterate else {
                return Err(error);
            };
            (last_iterate, false, iterations)
        }
        Err(failure) => return Err(failure.into()),
    };
    let MetricPair { psnr, ssim } = compute_metrics(clean, &denoised)?;
    log::info!("lambda={lambda}: PSNR {psnr:.2}, SSIM {ssim:.3}");
    Ok(SweepEntry {
        lambda,
        psnr,
        ssim,
        converged,
        iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_includes_both_ends() {
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(0.01, 0.2, 5).last().copied(), Some(0.2));
        assert_eq!(linspace(3.0, 4.0, 1), vec![3.0]);
        assert!(linspace(3.0, 4.0, 0).is_empty());
    }

    #[test]
    fn best_entries() {
        let entry = |lambda, psnr, ssim| SweepEntry {
            lambda,
            psnr,
            ssim,
            converged: true,
            iterations: 1,
        };
        let result = SweepResult {
            entries: vec![
                entry(0.01, 20.0, 0.7),
                entry(0.05, 25.0, 0.6),
                entry(0.1, 22.0, 0.8),
            ],
        };
        assert_eq!(result.best_by_psnr().map(|e| e.lambda), Some(0.05));
        assert_eq!(result.best_by_ssim().map(|e| e.lambda), Some(0.1));
        assert!(SweepResult::default().best_by_psnr().is_none());
    }

    #[test]
    fn rejects_mismatched_reference() {
        let noisy = Image::filled(8, 8, 0.5).unwrap();
        let clean = Image::filled(8, 9, 0.5).unwrap();
        let err = sweep_lambda(&noisy, &clean, &[0.1], Config::default()).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn rejects_bad_lambda_before_solving() {
        let img = Image::filled(8, 8, 0.5).unwrap();
        let err = sweep_lambda_parallel(&img, &img, &[0.1, -1.0], Config::default()).unwrap_err();
        assert!(err.is_invalid_input());
    }
}
