//! Accelerated first-order primal-dual iteration (Chambolle & Pock 2011, algorithm 2)
//! for
//!
//! ```text
//! min_u  0.5 * ||u - f||²  +  ι_[0,1](u)  +  λ * Σ |(∇u)_ij|
//! ```
//!
//! Written as `min_u G(u) + F(∇u)`, where G is the fidelity term plus the box indicator,
//! and F is λ times the sum of pointwise 2-norms.

use crate::image::clip_unit;

use super::{Model, operator::GRADIENT_NORM_SQUARED};

/// Only log every this many iterations, the loop is hot.
const LOG_EVERY: usize = 100;

/// How the primal-dual loop ended.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PrimalDualReport {
    /// Did the duality gap fall below tolerance?
    pub converged: bool,
    /// Iterations run before the final gap check.
    pub iterations: usize,
    /// Primal objective of the final iterate.
    pub objective: f64,
    /// Duality gap of the final iterate. An upper bound on its sub-optimality.
    pub gap: f64,
}

/// Primal and dual objectives at the current iterate.
#[derive(Debug, Clone, Copy)]
struct Gap {
    primal: f64,
    dual: f64,
}

impl Gap {
    fn value(&self) -> f64 {
        let gap = self.primal - self.dual;
        // Overflowing objectives give inf - inf. That must never count as converged.
        if gap.is_nan() {
            f64::INFINITY
        } else {
            libm::fmax(gap, 0.0)
        }
    }
}

impl Model<'_> {
    #[inline(never)]
    pub fn solve_primal_dual(&mut self) -> PrimalDualReport {
        let threshold = self.config.gap_tolerance * (self.rows() * self.cols()) as f64;
        // The fidelity term is 1-strongly convex.
        let gamma = self.config.strong_convexity_damping;
        let mut tau = 1.0 / libm::sqrt(GRADIENT_NORM_SQUARED);
        let mut sigma = tau;

        let mut this_iteration = 0;
        loop {
            // Convergence check: the gap bounds how far the primal objective is from optimal,
            // and it's exactly 0 for problems which start solved (lambda = 0, flat images).
            let gap = self.gap();
            if this_iteration % LOG_EVERY == 0 {
                log::debug!(
                    "iteration {this_iteration}: primal {:.6e}, dual {:.6e}, gap {:.3e}",
                    gap.primal,
                    gap.dual,
                    gap.value()
                );
            }
            if gap.value() <= threshold || this_iteration >= self.config.max_iterations {
                return PrimalDualReport {
                    converged: gap.value() <= threshold,
                    iterations: this_iteration,
                    objective: gap.primal,
                    gap: gap.value(),
                };
            }

            self.dual_step(sigma);
            self.primal_step(tau);

            // Shrink the primal step and grow the dual step, keeping tau * sigma * L² = 1.
            let theta = 1.0 / libm::sqrt(1.0 + 2.0 * gamma * tau);
            tau *= theta;
            sigma /= theta;
            self.extrapolate(theta);

            this_iteration += 1;
        }
    }

    /// p ← proj_{|p_ij| <= λ}(p + σ ∇ū)
    fn dual_step(&mut self, sigma: f64) {
        self.gradient.apply(&self.u_bar, &mut self.gx, &mut self.gy);
        let lambda = self.lambda;
        for j in 0..self.cols() {
            for i in 0..self.rows() {
                let qx = self.px[(i, j)] + sigma * self.gx[(i, j)];
                let qy = self.py[(i, j)] + sigma * self.gy[(i, j)];
                let norm = libm::sqrt(qx * qx + qy * qy);
                let scale = if norm > lambda { lambda / norm } else { 1.0 };
                self.px[(i, j)] = qx * scale;
                self.py[(i, j)] = qy * scale;
            }
        }
    }

    /// u ← prox_τG(u - τ ∇ᵀp)
    ///
    /// G is separable, and each 1D piece is a parabola restricted to [0, 1],
    /// so the prox is the unconstrained minimizer clipped into the box.
    fn primal_step(&mut self, tau: f64) {
        self.gradient
            .apply_adjoint(&self.px, &self.py, &mut self.kt_p);
        std::mem::swap(&mut self.u, &mut self.u_prev);
        for j in 0..self.cols() {
            for i in 0..self.rows() {
                let v = self.u_prev[(i, j)] - tau * self.kt_p[(i, j)];
                let f = self.noisy.get(i, j);
                self.u[(i, j)] = clip_unit((v + tau * f) / (1.0 + tau));
            }
        }
    }

    /// ū ← u + θ(u - u_prev)
    fn extrapolate(&mut self, theta: f64) {
        for j in 0..self.cols() {
            for i in 0..self.rows() {
                let u = self.u[(i, j)];
                self.u_bar[(i, j)] = u + theta * (u - self.u_prev[(i, j)]);
            }
        }
    }

    /// Evaluate the primal objective at u and the dual objective at p.
    ///
    /// The dual is `D(p) = -Σ g*(-(∇ᵀp)_ij)`, where g* is the convex conjugate of
    /// one pixel's `0.5 * (u - f)²` restricted to [0, 1]:
    /// `g*(w) = w·c - 0.5 * (c - f)²` with `c = clip(w + f)`.
    fn gap(&mut self) -> Gap {
        let fidelity: f64 = self.fidelity();
        let tv = self.gradient.total_variation(&self.u);
        let primal = fidelity + self.lambda * tv;

        self.gradient
            .apply_adjoint(&self.px, &self.py, &mut self.kt_p);
        let mut dual = 0.0;
        for j in 0..self.cols() {
            for i in 0..self.rows() {
                let w = -self.kt_p[(i, j)];
                let f = self.noisy.get(i, j);
                let c = clip_unit(w + f);
                dual -= w * c - 0.5 * (c - f) * (c - f);
            }
        }
        Gap { primal, dual }
    }

    fn fidelity(&self) -> f64 {
        let mut total = 0.0;
        for j in 0..self.cols() {
            for i in 0..self.rows() {
                let d = self.u[(i, j)] - self.noisy.get(i, j);
                total += 0.5 * d * d;
            }
        }
        total
    }
}
