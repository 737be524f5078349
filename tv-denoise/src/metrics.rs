//! Image similarity metrics.
//!
//! Both metrics assume images normalized to a known data range,
//! which is 1.0 for everything this crate produces.

use crate::{Error, Image, InvalidInput};

/// Data range of the normalized floating-point images in this crate.
pub const DATA_RANGE: f64 = 1.0;

/// PSNR and SSIM of a candidate image against a clean reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricPair {
    /// Peak signal-to-noise ratio, in decibels.
    /// Infinite when the images are identical.
    pub psnr: f64,
    /// Mean structural similarity, at most 1.
    pub ssim: f64,
}

/// Compare `candidate` against `clean` with [`DATA_RANGE`] and the default SSIM window.
pub fn compute_metrics(clean: &Image, candidate: &Image) -> Result<MetricPair, Error> {
    Ok(MetricPair {
        psnr: psnr(clean, candidate, DATA_RANGE)?,
        ssim: ssim(clean, candidate, DATA_RANGE)?,
    })
}

/// Mean squared elementwise difference.
pub fn mean_squared_error(a: &Image, b: &Image) -> Result<f64, Error> {
    a.ensure_same_shape(b)?;
    let sum: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum();
    Ok(sum / a.len() as f64)
}

/// Peak signal-to-noise ratio: `10 * log10(data_range^2 / MSE)`.
///
/// Identical images have an MSE of exactly zero; that returns `f64::INFINITY`
/// rather than an error.
pub fn psnr(reference: &Image, candidate: &Image, data_range: f64) -> Result<f64, Error> {
    check_data_range(data_range)?;
    let mse = mean_squared_error(reference, candidate)?;
    if mse == 0.0 {
        return Ok(f64::INFINITY);
    }
    Ok(10.0 * libm::log10(data_range * data_range / mse))
}

/// Settings for [`ssim_with`].
#[derive(Debug, Clone, Copy)]
pub struct SsimConfig {
    /// Side length of the square uniform window. Must be odd and >= 3.
    pub window: usize,
    /// Stabilizes the luminance term.
    pub k1: f64,
    /// Stabilizes the contrast/structure term.
    pub k2: f64,
    /// Dynamic range of the pixel values.
    pub data_range: f64,
    /// Normalize window variances by N-1 instead of N.
    pub sample_covariance: bool,
}

impl Default for SsimConfig {
    fn default() -> Self {
        Self {
            window: 7,
            k1: 0.01,
            k2: 0.03,
            data_range: DATA_RANGE,
            sample_covariance: true,
        }
    }
}

/// Mean structural similarity with a 7x7 uniform window and standard constants.
pub fn ssim(a: &Image, b: &Image, data_range: f64) -> Result<f64, Error> {
    ssim_with(
        a,
        b,
        &SsimConfig {
            data_range,
            ..Default::default()
        },
    )
}

/// Mean structural similarity over every window that fits entirely inside the image.
/// Symmetric in `a` and `b`.
pub fn ssim_with(a: &Image, b: &Image, config: &SsimConfig) -> Result<f64, Error> {
    check_data_range(config.data_range)?;
    let win = config.window;
    if win < 3 || win % 2 == 0 {
        return Err(InvalidInput::BadWindowSize(win).into());
    }
    a.ensure_same_shape(b)?;
    let (rows, cols) = a.shape();
    if rows < win || cols < win {
        return Err(InvalidInput::SmallerThanWindow {
            rows,
            cols,
            window: win,
        }
        .into());
    }

    let sums = WindowSums::new(a, b);
    let n = (win * win) as f64;
    let cov_norm = if config.sample_covariance {
        n / (n - 1.0)
    } else {
        1.0
    };
    let c1 = (config.k1 * config.data_range).powi(2);
    let c2 = (config.k2 * config.data_range).powi(2);

    let mut total = 0.0;
    let mut count = 0usize;
    for top in 0..=(rows - win) {
        for left in 0..=(cols - win) {
            let [sx, sy, sxx, syy, sxy] = sums.window(top, left, win);
            let ux = sx / n;
            let uy = sy / n;
            let vx = cov_norm * (sxx / n - ux * ux);
            let vy = cov_norm * (syy / n - uy * uy);
            let vxy = cov_norm * (sxy / n - ux * uy);
            let numerator = (2.0 * ux * uy + c1) * (2.0 * vxy + c2);
            let denominator = (ux * ux + uy * uy + c1) * (vx + vy + c2);
            total += numerator / denominator;
            count += 1;
        }
    }
    Ok(total / count as f64)
}

fn check_data_range(data_range: f64) -> Result<(), Error> {
    if !data_range.is_finite() || data_range <= 0.0 {
        return Err(InvalidInput::BadDataRange(data_range).into());
    }
    Ok(())
}

/// Summed-area tables of x, y, x², y² and xy,
/// so any window's sums cost O(1).
struct WindowSums {
    /// Row stride of each table, i.e. image cols + 1.
    stride: usize,
    /// One table per moment, each (rows + 1) * (cols + 1) with a zero first row and column.
    tables: [Vec<f64>; 5],
}

impl WindowSums {
    fn new(a: &Image, b: &Image) -> Self {
        let (rows, cols) = a.shape();
        let stride = cols + 1;
        let mut tables: [Vec<f64>; 5] = std::array::from_fn(|_| vec![0.0; (rows + 1) * stride]);
        for row in 0..rows {
            for col in 0..cols {
                let x = a.get(row, col);
                let y = b.get(row, col);
                let moments = [x, y, x * x, y * y, x * y];
                let here = (row + 1) * stride + (col + 1);
                let up = row * stride + (col + 1);
                let left = (row + 1) * stride + col;
                let diag = row * stride + col;
                for (table, moment) in tables.iter_mut().zip(moments) {
                    table[here] = moment + table[up] + table[left] - table[diag];
                }
            }
        }
        Self { stride, tables }
    }

    /// Sums of each moment over the `win`x`win` window whose top-left pixel is (top, left).
    fn window(&self, top: usize, left: usize, win: usize) -> [f64; 5] {
        let bottom = top + win;
        let right = left + win;
        let s = self.stride;
        std::array::from_fn(|i| {
            let t = &self.tables[i];
            t[bottom * s + right] - t[top * s + right] - t[bottom * s + left] + t[top * s + left]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(rows: usize, cols: usize) -> Image {
        Image::from_fn(rows, cols, |r, c| if (r + c) % 2 == 0 { 0.2 } else { 0.8 }).unwrap()
    }

    /// Direct windowed computation, without summed-area tables.
    fn ssim_naive(a: &Image, b: &Image, win: usize) -> f64 {
        let n = (win * win) as f64;
        let cov_norm = n / (n - 1.0);
        let c1 = (0.01f64).powi(2);
        let c2 = (0.03f64).powi(2);
        let mut total = 0.0;
        let mut count = 0;
        for top in 0..=(a.rows() - win) {
            for left in 0..=(a.cols() - win) {
                let px: Vec<(f64, f64)> = (top..top + win)
                    .flat_map(|r| (left..left + win).map(move |c| (r, c)))
                    .map(|(r, c)| (a.get(r, c), b.get(r, c)))
                    .collect();
                let ux = px.iter().map(|p| p.0).sum::<f64>() / n;
                let uy = px.iter().map(|p| p.1).sum::<f64>() / n;
                let vx = px.iter().map(|p| (p.0 - ux).powi(2)).sum::<f64>() / n * cov_norm;
                let vy = px.iter().map(|p| (p.1 - uy).powi(2)).sum::<f64>() / n * cov_norm;
                let vxy = px.iter().map(|p| (p.0 - ux) * (p.1 - uy)).sum::<f64>() / n * cov_norm;
                total += ((2.0 * ux * uy + c1) * (2.0 * vxy + c2))
                    / ((ux * ux + uy * uy + c1) * (vx + vy + c2));
                count += 1;
            }
        }
        total / count as f64
    }

    #[test]
    fn psnr_of_identical_images_is_infinite() {
        let img = checkerboard(8, 8);
        assert_eq!(psnr(&img, &img, 1.0).unwrap(), f64::INFINITY);
    }

    #[test]
    fn psnr_known_value() {
        // Constant offset of 0.1 gives MSE 0.01, so PSNR = 10 * log10(100) = 20.
        let a = Image::filled(4, 4, 0.5).unwrap();
        let b = Image::filled(4, 4, 0.6).unwrap();
        let p = psnr(&a, &b, 1.0).unwrap();
        assert!((p - 20.0).abs() < 1e-9, "got {p}");
        assert!((psnr(&b, &a, 1.0).unwrap() - p).abs() < 1e-12);
    }

    #[test]
    fn ssim_of_identical_images_is_one() {
        let img = checkerboard(10, 12);
        let s = ssim(&img, &img, 1.0).unwrap();
        assert!((s - 1.0).abs() < 1e-12, "got {s}");
    }

    #[test]
    fn ssim_matches_naive_windows() {
        let a = Image::from_fn(11, 9, |r, c| ((r * 7 + c * 3) % 10) as f64 / 10.0).unwrap();
        let b = Image::from_fn(11, 9, |r, c| ((r * 2 + c * 5) % 9) as f64 / 9.0).unwrap();
        let fast = ssim(&a, &b, 1.0).unwrap();
        let slow = ssim_naive(&a, &b, 7);
        assert!((fast - slow).abs() < 1e-9, "fast {fast}, slow {slow}");
    }

    #[test]
    fn ssim_is_symmetric() {
        let a = checkerboard(9, 9);
        let b = Image::from_fn(9, 9, |r, _| r as f64 / 8.0).unwrap();
        let ab = ssim(&a, &b, 1.0).unwrap();
        let ba = ssim(&b, &a, 1.0).unwrap();
        assert!((ab - ba).abs() < 1e-12);
        assert!(ab < 1.0);
    }

    #[test]
    fn ssim_rejects_small_images() {
        let img = checkerboard(6, 20);
        let err = ssim(&img, &img, 1.0).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidInput(InvalidInput::SmallerThanWindow {
                rows: 6,
                cols: 20,
                window: 7
            })
        );
    }

    #[test]
    fn ssim_rejects_even_windows() {
        let img = checkerboard(16, 16);
        let config = SsimConfig {
            window: 8,
            ..Default::default()
        };
        assert_eq!(
            ssim_with(&img, &img, &config).unwrap_err(),
            Error::InvalidInput(InvalidInput::BadWindowSize(8))
        );
    }

    #[test]
    fn metrics_reject_shape_mismatch() {
        let a = checkerboard(8, 8);
        let b = checkerboard(8, 9);
        assert!(psnr(&a, &b, 1.0).unwrap_err().is_invalid_input());
        assert!(ssim(&a, &b, 1.0).unwrap_err().is_invalid_input());
        assert!(compute_metrics(&a, &b).unwrap_err().is_invalid_input());
    }

    #[test]
    fn bad_data_range() {
        let a = checkerboard(8, 8);
        assert_eq!(
            psnr(&a, &a, 0.0).unwrap_err(),
            Error::InvalidInput(InvalidInput::BadDataRange(0.0))
        );
    }
}
