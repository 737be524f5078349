use faer::Mat;

use super::Boundary;

/// Upper bound on the squared operator norm of the 2D forward-difference gradient.
/// Each pixel takes part in at most 4 differences, each of which has coefficients ±1.
pub(crate) const GRADIENT_NORM_SQUARED: f64 = 8.0;

/// Forward-difference gradient on a fixed grid, and its adjoint.
/// All matrices passed in must be `rows x cols`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Gradient {
    rows: usize,
    cols: usize,
    boundary: Boundary,
}

impl Gradient {
    pub fn new(rows: usize, cols: usize, boundary: Boundary) -> Self {
        Self {
            rows,
            cols,
            boundary,
        }
    }

    /// Does pixel (i, j) have a difference along the row axis, i.e. with (i+1, j)?
    #[inline(always)]
    fn x_active(&self, i: usize, j: usize) -> bool {
        match self.boundary {
            Boundary::Neumann => i + 1 < self.rows,
            Boundary::Interior => i + 1 < self.rows && j + 1 < self.cols,
        }
    }

    /// Does pixel (i, j) have a difference along the column axis, i.e. with (i, j+1)?
    #[inline(always)]
    fn y_active(&self, i: usize, j: usize) -> bool {
        match self.boundary {
            Boundary::Neumann => j + 1 < self.cols,
            Boundary::Interior => i + 1 < self.rows && j + 1 < self.cols,
        }
    }

    /// Writes ∇u into (gx, gy). Inactive differences are written as 0.
    pub fn apply(&self, u: &Mat<f64>, gx: &mut Mat<f64>, gy: &mut Mat<f64>) {
        // faer is column-major, so walk down columns in the inner loop.
        for j in 0..self.cols {
            for i in 0..self.rows {
                let here = u[(i, j)];
                gx[(i, j)] = if self.x_active(i, j) {
                    u[(i + 1, j)] - here
                } else {
                    0.0
                };
                gy[(i, j)] = if self.y_active(i, j) {
                    u[(i, j + 1)] - here
                } else {
                    0.0
                };
            }
        }
    }

    /// Writes ∇ᵀp into `out`. This is minus the discrete divergence.
    /// Entries of p at inactive differences are ignored.
    pub fn apply_adjoint(&self, px: &Mat<f64>, py: &Mat<f64>, out: &mut Mat<f64>) {
        for j in 0..self.cols {
            for i in 0..self.rows {
                out[(i, j)] = 0.0;
            }
        }
        for j in 0..self.cols {
            for i in 0..self.rows {
                if self.x_active(i, j) {
                    let p = px[(i, j)];
                    out[(i, j)] -= p;
                    out[(i + 1, j)] += p;
                }
                if self.y_active(i, j) {
                    let p = py[(i, j)];
                    out[(i, j)] -= p;
                    out[(i, j + 1)] += p;
                }
            }
        }
    }

    /// Isotropic total variation: Σ |∇u| over every pixel.
    pub fn total_variation(&self, u: &Mat<f64>) -> f64 {
        let mut tv = 0.0;
        for j in 0..self.cols {
            for i in 0..self.rows {
                let here = u[(i, j)];
                let dx = if self.x_active(i, j) {
                    u[(i + 1, j)] - here
                } else {
                    0.0
                };
                let dy = if self.y_active(i, j) {
                    u[(i, j + 1)] - here
                } else {
                    0.0
                };
                tv += libm::sqrt(dx * dx + dy * dy);
            }
        }
        tv
    }
}
