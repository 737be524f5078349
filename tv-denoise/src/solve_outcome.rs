use crate::{Error, Image, Warning};

/// Data from a successful (converged) denoise.
#[derive(Debug, Clone)]
#[cfg_attr(not(feature = "unstable-exhaustive"), non_exhaustive)]
pub struct DenoiseOutcome {
    /// The denoised image, same shape as the input.
    pub(crate) image: Image,
    /// How many primal-dual iterations were required?
    pub(crate) iterations: usize,
    /// Objective value of the returned image.
    pub(crate) objective: f64,
    /// Duality gap of the returned image.
    pub(crate) gap: f64,
    /// Anything suspicious about the problem definition.
    pub(crate) warnings: Vec<Warning>,
}

impl DenoiseOutcome {
    /// The denoised image, same shape as the input.
    pub fn image(&self) -> &Image {
        &self.image
    }

    /// Take ownership of the denoised image.
    pub fn into_image(self) -> Image {
        self.image
    }

    /// How many primal-dual iterations were required?
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Objective value `0.5 * ||u - noisy||² + lambda * TV(u)` of the returned image.
    pub fn objective(&self) -> f64 {
        self.objective
    }

    /// Duality gap of the returned image.
    /// The true optimum is at most this much below [`Self::objective`].
    pub fn duality_gap(&self) -> f64 {
        self.gap
    }

    /// Anything suspicious about the problem definition.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

/// Returned when the solver could not produce a converged image.
#[derive(Debug, Clone)]
#[cfg_attr(not(feature = "unstable-exhaustive"), non_exhaustive)]
pub struct FailureOutcome {
    /// The error that stopped the solve.
    pub error: Error,
    /// For [`Error::NonConvergence`], the last primal iterate.
    /// It always satisfies the box constraint, it just isn't proven optimal.
    /// `None` when the inputs were rejected before solving.
    pub last_iterate: Option<Image>,
    /// Iterations run before giving up.
    pub iterations: usize,
    /// Other warnings which might have contributed.
    pub warnings: Vec<Warning>,
}

impl FailureOutcome {
    pub(crate) fn rejected(error: impl Into<Error>, warnings: Vec<Warning>) -> Self {
        Self {
            error: error.into(),
            last_iterate: None,
            iterations: 0,
            warnings,
        }
    }

    /// The error that stopped the solve.
    pub fn error(&self) -> &Error {
        &self.error
    }

    /// The last primal iterate, if the solver ran at all.
    pub fn last_iterate(&self) -> Option<&Image> {
        self.last_iterate.as_ref()
    }

    /// Iterations run before giving up.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Other warnings which might have contributed.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

impl From<FailureOutcome> for Error {
    fn from(value: FailureOutcome) -> Self {
        value.error
    }
}
