//! Grayscale image grids.

use faer::Mat;

use crate::{Error, InvalidInput};

/// A 2D grid of grayscale intensities.
/// Values are conventionally in [0, 1] but that isn't enforced here,
/// because noise injection legitimately overshoots before clipping.
///
/// Every stage of the pipeline returns a new `Image` instead of mutating one.
#[derive(Clone, Debug)]
pub struct Image {
    pixels: Mat<f64>,
}

impl Image {
    /// Build an image from row-major pixel values.
    pub fn new(rows: usize, cols: usize, row_major: Vec<f64>) -> Result<Self, Error> {
        check_dims(rows, cols)?;
        if row_major.len() != rows * cols {
            return Err(InvalidInput::WrongNumberOfPixels {
                rows,
                cols,
                len: row_major.len(),
            }
            .into());
        }
        Ok(Self::from_fn_unchecked(rows, cols, |row, col| {
            row_major[row * cols + col]
        }))
    }

    /// Build an image by evaluating `f(row, col)` at every pixel.
    pub fn from_fn<F>(rows: usize, cols: usize, f: F) -> Result<Self, Error>
    where
        F: FnMut(usize, usize) -> f64,
    {
        check_dims(rows, cols)?;
        Ok(Self::from_fn_unchecked(rows, cols, f))
    }

    /// An image where every pixel has the same value.
    pub fn filled(rows: usize, cols: usize, value: f64) -> Result<Self, Error> {
        Self::from_fn(rows, cols, |_, _| value)
    }

    /// A deterministic synthetic test image: a gentle horizontal ramp with a bright disc,
    /// a dark square and a mid-gray bar on top. Piecewise smooth with sharp edges,
    /// which is what TV denoising is good at.
    pub fn phantom(rows: usize, cols: usize) -> Result<Self, Error> {
        Self::from_fn(rows, cols, |row, col| {
            let y = (row as f64 + 0.5) / rows as f64;
            let x = (col as f64 + 0.5) / cols as f64;
            let in_disc = (x - 0.35).powi(2) + (y - 0.35).powi(2) < 0.2f64.powi(2);
            let in_square = (0.55..0.85).contains(&x) && (0.55..0.85).contains(&y);
            let in_bar = (0.6..0.9).contains(&x) && (0.15..0.25).contains(&y);
            if in_disc {
                0.85
            } else if in_square {
                0.1
            } else if in_bar {
                0.6
            } else {
                0.25 + 0.2 * x
            }
        })
    }

    pub(crate) fn from_fn_unchecked<F>(rows: usize, cols: usize, f: F) -> Self
    where
        F: FnMut(usize, usize) -> f64,
    {
        Self {
            pixels: Mat::from_fn(rows, cols, f),
        }
    }

    pub(crate) fn from_mat(pixels: Mat<f64>) -> Self {
        Self { pixels }
    }

    /// Number of rows (image height).
    pub fn rows(&self) -> usize {
        self.pixels.nrows()
    }

    /// Number of columns (image width).
    pub fn cols(&self) -> usize {
        self.pixels.ncols()
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }

    /// Total number of pixels.
    pub fn len(&self) -> usize {
        self.rows() * self.cols()
    }

    /// Images always have at least one pixel, so this is always false.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Intensity at (row, col).
    /// Panics if out of bounds.
    #[inline(always)]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.pixels[(row, col)]
    }

    /// Read-only view of the underlying matrix.
    pub fn as_mat(&self) -> &Mat<f64> {
        &self.pixels
    }

    /// All pixels in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.rows()).flat_map(move |row| (0..self.cols()).map(move |col| self.get(row, col)))
    }

    /// Copy the pixels out in row-major order.
    pub fn to_row_major(&self) -> Vec<f64> {
        self.iter().collect()
    }

    /// Apply `f` to every pixel, giving a new image of the same shape.
    pub fn map<F>(&self, mut f: F) -> Self
    where
        F: FnMut(f64) -> f64,
    {
        Self::from_fn_unchecked(self.rows(), self.cols(), |row, col| f(self.get(row, col)))
    }

    /// Clamp every pixel into [0, 1].
    pub fn clipped(&self) -> Self {
        self.map(clip_unit)
    }

    /// Keep every `stride`-th row and column, starting from the first.
    pub fn downsampled(&self, stride: usize) -> Result<Self, Error> {
        if stride == 0 {
            return Err(InvalidInput::ZeroStride.into());
        }
        let rows = self.rows().div_ceil(stride);
        let cols = self.cols().div_ceil(stride);
        Ok(Self::from_fn_unchecked(rows, cols, |row, col| {
            self.get(row * stride, col * stride)
        }))
    }

    /// Mean intensity.
    pub fn mean(&self) -> f64 {
        self.iter().sum::<f64>() / self.len() as f64
    }

    /// Population variance of the intensities.
    pub fn variance(&self) -> f64 {
        let mean = self.mean();
        self.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / self.len() as f64
    }

    /// Smallest and largest intensity.
    pub fn min_max(&self) -> (f64, f64) {
        self.iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (libm::fmin(lo, v), libm::fmax(hi, v))
            })
    }

    /// Fail unless `other` has the same shape as `self`.
    pub fn ensure_same_shape(&self, other: &Self) -> Result<(), Error> {
        if self.shape() != other.shape() {
            return Err(InvalidInput::ShapeMismatch {
                expected: self.shape(),
                actual: other.shape(),
            }
            .into());
        }
        Ok(())
    }

    /// Fail if any pixel is NaN or infinite.
    pub fn ensure_finite(&self) -> Result<(), Error> {
        for row in 0..self.rows() {
            for col in 0..self.cols() {
                if !self.get(row, col).is_finite() {
                    return Err(InvalidInput::NonFinitePixel { row, col }.into());
                }
            }
        }
        Ok(())
    }
}

/// Images are equal when they have the same shape and identical pixels.
impl PartialEq for Image {
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

#[inline(always)]
pub(crate) fn clip_unit(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

fn check_dims(rows: usize, cols: usize) -> Result<(), Error> {
    if rows == 0 || cols == 0 {
        return Err(InvalidInput::EmptyImage { rows, cols }.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_major_round_trip() {
        let img = Image::new(2, 3, vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5]).unwrap();
        assert_eq!(img.shape(), (2, 3));
        assert_eq!(img.get(1, 0), 0.3);
        assert_eq!(img.to_row_major(), vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5]);
    }

    #[test]
    fn rejects_bad_dimensions() {
        let err = Image::new(2, 2, vec![0.0; 3]).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidInput(InvalidInput::WrongNumberOfPixels {
                rows: 2,
                cols: 2,
                len: 3
            })
        );
        assert!(Image::filled(0, 4, 0.5).unwrap_err().is_invalid_input());
    }

    #[test]
    fn clipping() {
        let img = Image::new(1, 4, vec![-0.5, 0.25, 1.0, 1.7]).unwrap();
        assert_eq!(img.clipped().to_row_major(), vec![0.0, 0.25, 1.0, 1.0]);
        assert_eq!(img.min_max(), (-0.5, 1.7));
    }

    #[test]
    fn downsample_keeps_every_kth() {
        let img = Image::from_fn(5, 4, |r, c| (r * 10 + c) as f64).unwrap();
        let small = img.downsampled(2).unwrap();
        assert_eq!(small.shape(), (3, 2));
        assert_eq!(small.to_row_major(), vec![0.0, 2.0, 20.0, 22.0, 40.0, 42.0]);
        assert!(img.downsampled(0).is_err());
    }

    #[test]
    fn statistics() {
        let img = Image::new(2, 2, vec![0.0, 1.0, 0.0, 1.0]).unwrap();
        assert_eq!(img.mean(), 0.5);
        assert_eq!(img.variance(), 0.25);
        assert_eq!(Image::filled(3, 3, 0.5).unwrap().variance(), 0.0);
    }

    #[test]
    fn phantom_is_in_range_and_not_flat() {
        let img = Image::phantom(64, 48).unwrap();
        assert_eq!(img.shape(), (64, 48));
        let (lo, hi) = img.min_max();
        assert_eq!((lo, hi), (0.1, 0.85));
        assert!(img.variance() > 0.01);
    }

    #[test]
    fn finiteness() {
        let img = Image::new(1, 3, vec![0.0, f64::NAN, 1.0]).unwrap();
        assert_eq!(
            img.ensure_finite().unwrap_err(),
            Error::InvalidInput(InvalidInput::NonFinitePixel { row: 0, col: 1 })
        );
    }
}
