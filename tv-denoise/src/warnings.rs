use crate::Image;

/// Something about a denoise problem that is legal but probably unintended.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(PartialEq))]
pub struct Warning {
    /// The first pixel this is about, if it's about specific pixels.
    pub about_pixel: Option<(usize, usize)>,
    /// What's wrong.
    pub content: WarningContent,
}

/// The kinds of [`Warning`].
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(PartialEq))]
#[non_exhaustive]
pub enum WarningContent {
    /// Some noisy pixels are outside [0, 1] and will be clipped by the box constraint.
    OutOfRange {
        /// How many pixels.
        count: usize,
    },
    /// Lambda is zero, so the solve is just clipping.
    ZeroLambda,
    /// Every pixel is already equal, there's nothing to smooth.
    ConstantInput,
}

pub(crate) fn lint(noisy: &Image, lambda: f64) -> Vec<Warning> {
    let mut warnings = Vec::default();

    let mut first_out_of_range = None;
    let mut count = 0;
    for row in 0..noisy.rows() {
        for col in 0..noisy.cols() {
            if !(0.0..=1.0).contains(&noisy.get(row, col)) {
                first_out_of_range.get_or_insert((row, col));
                count += 1;
            }
        }
    }
    if count > 0 {
        warnings.push(Warning {
            about_pixel: first_out_of_range,
            content: WarningContent::OutOfRange { count },
        });
    }

    if lambda == 0.0 {
        warnings.push(Warning {
            about_pixel: None,
            content: WarningContent::ZeroLambda,
        });
    }

    let (lo, hi) = noisy.min_max();
    if hi - lo <= 0.0 {
        warnings.push(Warning {
            about_pixel: None,
            content: WarningContent::ConstantInput,
        });
    }
    warnings
}

impl std::fmt::Display for WarningContent {
    #[mutants::skip]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarningContent::OutOfRange { count } => write!(
                f,
                "{count} pixels are outside [0, 1]. They will be clipped, so the result can't match them exactly."
            ),
            WarningContent::ZeroLambda => write!(
                f,
                "Lambda is 0, so there is no smoothing and the result is just the input clipped to [0, 1]"
            ),
            WarningContent::ConstantInput => write!(
                f,
                "The input is a constant image, it has no variation to remove"
            ),
        }
    }
}
