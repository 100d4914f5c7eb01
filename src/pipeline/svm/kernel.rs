//! Kernel resolution and its mapping onto linfa's parameterisation

use linfa::dataset::Pr;
use linfa_svm::{Svm, SvmParams as LinfaParams};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use super::params::{Gamma, GammaRule, KernelType, SvmParams};

/// A kernel with every coefficient resolved to a number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Kernel {
    Linear,
    /// `exp(-gamma * |a - b|^2)`
    Rbf { gamma: f64 },
    /// `(gamma * <a, b> + coef0)^degree`
    Poly { gamma: f64, coef0: f64, degree: u32 },
}

impl Kernel {
    /// Resolve the configured kernel against the training matrix `x`.
    pub fn resolve(params: &SvmParams, x: ArrayView2<'_, f64>) -> Self {
        let gamma = resolve_gamma(params.gamma, x);
        match params.kernel {
            KernelType::Linear => Kernel::Linear,
            KernelType::Rbf => Kernel::Rbf { gamma },
            KernelType::Poly => Kernel::Poly {
                gamma,
                coef0: params.coef0,
                degree: params.degree,
            },
        }
    }

    /// Solver parameters for per-class costs `(c_neg, c_pos)`.
    ///
    /// linfa's gaussian kernel divides the squared distance by `eps`, so
    /// `eps = 1 / gamma`. Its polynomial kernel has no gamma: since
    /// `(g<a,b> + r)^d = g^d (<a,b> + r/g)^d`, the kernel is rewritten with
    /// constant `r / g` and the `g^d` factor is folded into both costs, which
    /// leaves the decision function unchanged.
    pub(super) fn solver_params(&self, costs: (f64, f64), tol: f64) -> LinfaParams<f64, Pr> {
        let (c_neg, c_pos) = costs;
        let base = |scale: f64| {
            Svm::<f64, Pr>::params()
                .eps(tol)
                .pos_neg_weights(c_pos * scale, c_neg * scale)
        };

        match *self {
            Kernel::Linear => base(1.0).linear_kernel(),
            Kernel::Rbf { gamma } => base(1.0).gaussian_kernel(1.0 / gamma),
            Kernel::Poly { gamma, coef0, degree } => base(gamma.powi(degree as i32))
                .polynomial_kernel(coef0 / gamma, f64::from(degree)),
        }
    }
}

fn resolve_gamma(gamma: Gamma, x: ArrayView2<'_, f64>) -> f64 {
    let n_features = x.ncols().max(1) as f64;
    match gamma {
        Gamma::Value(g) => g,
        Gamma::Rule(GammaRule::Auto) => 1.0 / n_features,
        Gamma::Rule(GammaRule::Scale) => {
            if x.is_empty() {
                return 1.0 / n_features;
            }
            let count = x.len() as f64;
            let mean = x.sum() / count;
            let var = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;

            if var > 0.0 {
                1.0 / (n_features * var)
            } else {
                1.0 / n_features
            }
        }
    }
}
