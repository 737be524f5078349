/// Errors from denoising, noise injection, metrics or sweeps.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[cfg_attr(not(feature = "unstable-exhaustive"), non_exhaustive)]
pub enum Error {
    /// The caller gave inputs which can never produce a result.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),
    /// The primal-dual solver did not close its duality gap within the allowed number of iterations.
    /// Consider raising the iterations, or loosening the gap tolerance.
    #[error(
        "Could not reach the gap tolerance in {iterations} iterations (final duality gap {gap:e})"
    )]
    NonConvergence {
        /// How many iterations were run.
        iterations: usize,
        /// Duality gap of the last iterate.
        gap: f64,
    },
}

impl Error {
    /// Was this error caused by bad caller input?
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Did the solver run out of iterations?
    pub fn is_non_convergence(&self) -> bool {
        matches!(self, Self::NonConvergence { .. })
    }
}

/// Ways that inputs can be rejected before any numeric work happens.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[cfg_attr(not(feature = "unstable-exhaustive"), non_exhaustive)]
pub enum InvalidInput {
    /// Two images which must be compared or combined have different shapes.
    #[error("Image shapes differ: expected {expected:?} (rows, cols) but got {actual:?}")]
    ShapeMismatch {
        /// Shape of the first (reference) image.
        expected: (usize, usize),
        /// Shape of the other image.
        actual: (usize, usize),
    },
    /// The pixel buffer doesn't hold exactly `rows * cols` values.
    #[error("A {rows}x{cols} image needs {} pixels, but {len} were given", rows * cols)]
    WrongNumberOfPixels {
        /// Requested rows.
        rows: usize,
        /// Requested columns.
        cols: usize,
        /// Length of the pixel buffer.
        len: usize,
    },
    /// Images must have at least one row and one column.
    #[error("Images must not be empty, but got {rows}x{cols}")]
    EmptyImage {
        /// Requested rows.
        rows: usize,
        /// Requested columns.
        cols: usize,
    },
    /// Image is too small for the SSIM window.
    #[error("A {rows}x{cols} image is smaller than the {window}x{window} SSIM window")]
    SmallerThanWindow {
        /// Image rows.
        rows: usize,
        /// Image columns.
        cols: usize,
        /// Side length of the window.
        window: usize,
    },
    /// SSIM windows must be odd and at least 3 pixels wide.
    #[error("SSIM window size must be odd and at least 3, but got {0}")]
    BadWindowSize(usize),
    /// Data range for PSNR/SSIM must be positive and finite.
    #[error("Data range must be positive and finite, but got {0}")]
    BadDataRange(f64),
    /// Regularization weight must be finite and non-negative.
    #[error("Regularization weight lambda must be finite and >= 0, but got {0}")]
    BadLambda(f64),
    /// Noise standard deviation must be finite and non-negative.
    #[error("Noise standard deviation sigma must be finite and >= 0, but got {0}")]
    BadSigma(f64),
    /// A pixel was NaN or infinite.
    #[error("Pixel ({row}, {col}) is not finite")]
    NonFinitePixel {
        /// Row of the offending pixel.
        row: usize,
        /// Column of the offending pixel.
        col: usize,
    },
    /// A solver setting is out of its allowed range.
    #[error("Solver setting {field} is out of range: {value}")]
    BadConfig {
        /// Which setting.
        field: &'static str,
        /// The value it was given.
        value: f64,
    },
    /// Downsampling needs a stride of at least 1.
    #[error("Downsample stride must be at least 1")]
    ZeroStride,
}
