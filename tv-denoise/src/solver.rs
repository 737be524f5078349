use faer::Mat;

use crate::{Error, Image, InvalidInput, image::clip_unit};

use self::operator::Gradient;

mod operator;
mod primal_dual;

/// How the forward differences treat the last row and column of the image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Boundary {
    /// Differences that would step off the image are zero, so every pixel contributes
    /// `sqrt(dx² + dy²)` with whichever components exist.
    #[default]
    Neumann,
    /// Only pixels with both a lower and a right neighbour contribute,
    /// i.e. the last row and column carry no gradient at all.
    /// This matches the TV atom of common convex modelling tools.
    Interior,
}

/// Tunable settings for the solver.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Upper bound on primal-dual iterations.
    pub max_iterations: usize,
    /// The solve has converged once the duality gap is at most this much per pixel,
    /// i.e. `gap <= gap_tolerance * rows * cols`.
    pub gap_tolerance: f64,
    /// Treatment of the image edges in the TV term.
    pub boundary: Boundary,
    /// Fraction (in [0, 1]) of the fidelity term's strong convexity used to accelerate step sizes.
    /// 0 disables acceleration and keeps the step sizes fixed.
    pub strong_convexity_damping: f64,
}

/// Iteration budget used when the caller doesn't give one.
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

impl Default for Config {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            gap_tolerance: 1e-6,
            boundary: Boundary::Neumann,
            strong_convexity_damping: 0.7,
        }
    }
}

impl Config {
    /// Set the iteration budget.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the per-pixel duality gap tolerance.
    pub fn with_gap_tolerance(mut self, gap_tolerance: f64) -> Self {
        self.gap_tolerance = gap_tolerance;
        self
    }

    /// Set the TV boundary treatment.
    pub fn with_boundary(mut self, boundary: Boundary) -> Self {
        self.boundary = boundary;
        self
    }

    /// Set how aggressively step sizes are accelerated.
    pub fn with_strong_convexity_damping(mut self, damping: f64) -> Self {
        self.strong_convexity_damping = damping;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), InvalidInput> {
        if !self.gap_tolerance.is_finite() || self.gap_tolerance < 0.0 {
            return Err(InvalidInput::BadConfig {
                field: "gap_tolerance",
                value: self.gap_tolerance,
            });
        }
        if !(0.0..=1.0).contains(&self.strong_convexity_damping) {
            return Err(InvalidInput::BadConfig {
                field: "strong_convexity_damping",
                value: self.strong_convexity_damping,
            });
        }
        Ok(())
    }
}

/// Fail unless `lambda` is a usable regularization weight.
pub(crate) fn validate_lambda(lambda: f64) -> Result<(), InvalidInput> {
    if !lambda.is_finite() || lambda < 0.0 {
        return Err(InvalidInput::BadLambda(lambda));
    }
    Ok(())
}

/// Isotropic total variation of an image.
pub fn total_variation(image: &Image, boundary: Boundary) -> f64 {
    Gradient::new(image.rows(), image.cols(), boundary).total_variation(image.as_mat())
}

/// The TV-denoising objective `0.5 * ||u - noisy||² + lambda * TV(u)` evaluated at `candidate`.
/// The box constraint isn't checked here.
pub fn objective(
    noisy: &Image,
    candidate: &Image,
    lambda: f64,
    boundary: Boundary,
) -> Result<f64, Error> {
    noisy.ensure_same_shape(candidate)?;
    validate_lambda(lambda)?;
    let fidelity: f64 = noisy
        .iter()
        .zip(candidate.iter())
        .map(|(f, u)| 0.5 * (u - f).powi(2))
        .sum();
    Ok(fidelity + lambda * total_variation(candidate, boundary))
}

/// The optimization problem for one solve.
/// Owns every buffer it writes to, so the caller's image is never aliased.
pub(crate) struct Model<'a> {
    noisy: &'a Image,
    lambda: f64,
    config: Config,
    gradient: Gradient,
    /// Current primal iterate, always inside the box [0, 1].
    u: Mat<f64>,
    /// Previous primal iterate.
    u_prev: Mat<f64>,
    /// Extrapolated primal point the dual step is taken from.
    u_bar: Mat<f64>,
    /// Dual field, one 2D vector per pixel, each with magnitude at most lambda.
    px: Mat<f64>,
    py: Mat<f64>,
    /// Scratch for ∇u.
    gx: Mat<f64>,
    gy: Mat<f64>,
    /// Scratch for ∇ᵀp.
    kt_p: Mat<f64>,
}

impl<'a> Model<'a> {
    /// Start from the box projection of the noisy image and a zero dual field.
    pub fn new(noisy: &'a Image, lambda: f64, config: Config) -> Self {
        let (rows, cols) = noisy.shape();
        let u = Mat::from_fn(rows, cols, |i, j| clip_unit(noisy.get(i, j)));
        Self {
            noisy,
            lambda,
            config,
            gradient: Gradient::new(rows, cols, config.boundary),
            u_prev: u.clone(),
            u_bar: u.clone(),
            u,
            px: Mat::zeros(rows, cols),
            py: Mat::zeros(rows, cols),
            gx: Mat::zeros(rows, cols),
            gy: Mat::zeros(rows, cols),
            kt_p: Mat::zeros(rows, cols),
        }
    }

    pub fn rows(&self) -> usize {
        self.noisy.rows()
    }

    pub fn cols(&self) -> usize {
        self.noisy.cols()
    }

    /// Hand back the current primal iterate.
    pub fn into_image(self) -> Image {
        Image::from_mat(self.u)
    }
}
