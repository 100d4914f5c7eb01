//! Kernel support vector classifier with calibrated probabilities
//!
//! Wraps linfa's C-SVC. The solver fits a Platt sigmoid on the training
//! decision values, so every prediction carries a positive-class probability
//! and the hard label is that probability thresholded at 0.5.

mod kernel;
mod params;

pub use kernel::Kernel;
pub use params::{ClassWeight, ClassWeightMode, Gamma, GammaRule, KernelType, SvmParams};

use linfa::dataset::Pr;
use linfa::traits::{Fit, Predict};
use linfa::Dataset;
use linfa_svm::{Svm, SvmError, SvmParams as LinfaParams};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::target::class_counts;
use crate::error::{PipelineError, Result};

/// Fitted binary classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvmClassifier {
    kernel: Kernel,
    n_features: usize,
    model: Svm<f64, Pr>,
}

impl SvmClassifier {
    /// Fit on a design matrix (rows are samples) and 0/1 labels.
    pub fn fit(x: &Array2<f64>, labels: &[u8], params: &SvmParams) -> Result<Self> {
        params.validate()?;
        if x.nrows() != labels.len() {
            return Err(PipelineError::invalid(format!(
                "Design matrix has {} rows but {} labels were given",
                x.nrows(),
                labels.len()
            )));
        }
        let (n_neg, n_pos) = class_counts(labels);
        if n_neg == 0 || n_pos == 0 {
            return Err(PipelineError::invalid(
                "Training labels must contain both classes",
            ));
        }
        if params.max_iter > 0 || params.random_state.is_some() {
            log::debug!("max_iter and random_state have no effect on the SVM solver");
        }

        let kernel = Kernel::resolve(params, x.view());
        let (w_neg, w_pos) = params
            .class_weight
            .as_ref()
            .map(|w| w.resolve(n_neg, n_pos))
            .unwrap_or((1.0, 1.0));
        let solver = kernel.solver_params((params.c * w_neg, params.c * w_pos), params.tol);

        let targets: Array1<bool> = labels.iter().map(|&y| y == 1).collect();
        let dataset = Dataset::new(x.clone(), targets);
        let model =
            <LinfaParams<f64, Pr> as Fit<Array2<f64>, Array1<bool>, SvmError>>::fit(&solver, &dataset)?;

        log::info!(
            "Fitted {} SVM: {} support vectors",
            params.kernel,
            model.nsupport()
        );

        Ok(Self {
            kernel,
            n_features: x.ncols(),
            model,
        })
    }

    /// Hard 0/1 predictions: positive when the calibrated probability exceeds 0.5.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>> {
        Ok(label_probabilities(&self.predict_proba(x)?))
    }

    /// Calibrated probability of class 1 for each row.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        self.check_width(x)?;
        if x.nrows() == 0 {
            return Ok(Vec::new());
        }
        let probabilities: Array1<Pr> = self.model.predict(x);
        Ok(probabilities.iter().map(|p| f64::from(**p)).collect())
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_support(&self) -> usize {
        self.model.nsupport()
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    fn check_width(&self, x: &Array2<f64>) -> Result<()> {
        if x.ncols() != self.n_features {
            return Err(PipelineError::invalid(format!(
                "Classifier expects {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }
        Ok(())
    }
}

/// Threshold positive-class probabilities at 0.5.
pub fn label_probabilities(proba: &[f64]) -> Vec<u8> {
    proba.iter().map(|&p| u8::from(p > 0.5)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two well separated clusters in 2D.
    fn clusters() -> (Array2<f64>, Vec<u8>) {
        let points: Vec<(f64, f64, u8)> = (0..40)
            .map(|i| {
                let jitter = (i as f64 * 0.37).sin() * 0.3;
                if i % 2 == 0 {
                    (-2.0 + jitter, -1.5 - jitter, 0)
                } else {
                    (2.0 - jitter, 1.5 + jitter, 1)
                }
            })
            .collect();
        let x = Array2::from_shape_fn((points.len(), 2), |(i, j)| {
            if j == 0 { points[i].0 } else { points[i].1 }
        });
        let y = points.iter().map(|p| p.2).collect();
        (x, y)
    }

    #[test]
    fn test_separable_clusters_are_classified() {
        let (x, y) = clusters();
        for kernel in [KernelType::Linear, KernelType::Rbf, KernelType::Poly] {
            let params = SvmParams { kernel, ..SvmParams::default() };
            let model = SvmClassifier::fit(&x, &y, &params).unwrap();
            assert_eq!(model.predict(&x).unwrap(), y, "kernel {}", kernel);
            assert!(model.n_support() > 0);
        }
    }

    #[test]
    fn test_probabilities_follow_classes() {
        let (x, y) = clusters();
        let model = SvmClassifier::fit(&x, &y, &SvmParams::default()).unwrap();
        let proba = model.predict_proba(&x).unwrap();

        for (p, label) in proba.iter().zip(&y) {
            assert!((0.0..=1.0).contains(p));
            if *label == 1 {
                assert!(*p > 0.5);
            } else {
                assert!(*p < 0.5);
            }
        }
    }

    #[test]
    fn test_predict_agrees_with_probabilities() {
        let (x, y) = clusters();
        let model = SvmClassifier::fit(&x, &y, &SvmParams::default()).unwrap();
        let expected = label_probabilities(&model.predict_proba(&x).unwrap());
        assert_eq!(model.predict(&x).unwrap(), expected);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (x, y) = clusters();
        let a = SvmClassifier::fit(&x, &y, &SvmParams::default()).unwrap();
        let b = SvmClassifier::fit(&x, &y, &SvmParams::default()).unwrap();
        assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
        assert_eq!(a.n_support(), b.n_support());
    }

    #[test]
    fn test_single_class_is_rejected() {
        let x = Array2::from_shape_fn((4, 1), |(i, _)| i as f64);
        let result = SvmClassifier::fit(&x, &[1, 1, 1, 1], &SvmParams::default());
        assert!(matches!(result, Err(PipelineError::InvalidData(_))));
    }

    #[test]
    fn test_width_mismatch_is_rejected() {
        let (x, y) = clusters();
        let model = SvmClassifier::fit(&x, &y, &SvmParams::default()).unwrap();
        let narrow = Array2::zeros((2, 1));
        assert!(model.predict(&narrow).is_err());
    }

    #[test]
    fn test_zero_rows_predict_nothing() {
        let (x, y) = clusters();
        let model = SvmClassifier::fit(&x, &y, &SvmParams::default()).unwrap();
        assert!(model.predict(&Array2::zeros((0, 2))).unwrap().is_empty());
    }

    #[test]
    fn test_balanced_weights_fit_imbalanced_data() {
        let x = Array2::from_shape_fn((20, 1), |(i, _)| {
            if i < 16 { -1.0 - i as f64 * 0.1 } else { 1.0 + i as f64 * 0.1 }
        });
        let y: Vec<u8> = (0..20).map(|i| u8::from(i >= 16)).collect();
        let params = SvmParams {
            kernel: KernelType::Linear,
            class_weight: Some(ClassWeight::Mode(ClassWeightMode::Balanced)),
            ..SvmParams::default()
        };
        let model = SvmClassifier::fit(&x, &y, &params).unwrap();
        assert_eq!(model.predict(&x).unwrap(), y);
    }
}
