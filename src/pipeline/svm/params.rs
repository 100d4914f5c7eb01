//! Hyperparameters of the C-SVC classifier
//!
//! The tuned parameter set is read from a JSON document whose keys follow the
//! usual SVC naming (`C`, `kernel`, `gamma`, ...). Unknown keys are ignored so
//! documents produced by an offline search can be used as-is.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{PipelineError, Result};

/// Kernel family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelType {
    Linear,
    #[default]
    Rbf,
    Poly,
}

impl std::fmt::Display for KernelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KernelType::Linear => write!(f, "linear"),
            KernelType::Rbf => write!(f, "rbf"),
            KernelType::Poly => write!(f, "poly"),
        }
    }
}

/// Named gamma heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GammaRule {
    /// `1 / (n_features * X.var())`
    Scale,
    /// `1 / n_features`
    Auto,
}

/// Kernel coefficient: a heuristic or an explicit value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Gamma {
    Rule(GammaRule),
    Value(f64),
}

impl Default for Gamma {
    fn default() -> Self {
        Gamma::Rule(GammaRule::Scale)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassWeightMode {
    Balanced,
}

/// Per-class multipliers of `C`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassWeight {
    Mode(ClassWeightMode),
    /// Explicit weights keyed by class label (`"0"`, `"1"`)
    Explicit(BTreeMap<String, f64>),
}

impl ClassWeight {
    /// Weights for (negative, positive) given the class counts.
    pub fn resolve(&self, n_neg: usize, n_pos: usize) -> (f64, f64) {
        match self {
            ClassWeight::Mode(ClassWeightMode::Balanced) => {
                let n = (n_neg + n_pos) as f64;
                (n / (2.0 * n_neg as f64), n / (2.0 * n_pos as f64))
            }
            ClassWeight::Explicit(weights) => (
                weights.get("0").copied().unwrap_or(1.0),
                weights.get("1").copied().unwrap_or(1.0),
            ),
        }
    }
}

/// Tuned C-SVC hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvmParams {
    /// Regularisation strength
    #[serde(rename = "C")]
    pub c: f64,
    pub kernel: KernelType,
    pub gamma: Gamma,
    /// Polynomial degree (poly kernel only)
    pub degree: u32,
    /// Independent term (poly kernel only)
    pub coef0: f64,
    /// Stopping tolerance of the solver
    pub tol: f64,
    /// Accepted for compatibility with tuned documents; the solver runs to `tol`
    pub max_iter: i64,
    pub class_weight: Option<ClassWeight>,
    /// Accepted for compatibility with tuned documents; fitting is deterministic
    pub random_state: Option<u64>,
}

impl Default for SvmParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            kernel: KernelType::Rbf,
            gamma: Gamma::default(),
            degree: 3,
            coef0: 0.0,
            tol: 1e-3,
            max_iter: -1,
            class_weight: None,
            random_state: None,
        }
    }
}

impl SvmParams {
    /// Read and validate the hyperparameter document at `path`.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::ConfigValidation(vec![format!(
                "cannot read hyperparameters at {}: {}",
                path.display(),
                e
            )])
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let params: SvmParams = serde_json::from_str(text).map_err(|e| {
            PipelineError::ConfigValidation(vec![format!("malformed hyperparameters: {}", e)])
        })?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        if !(self.c > 0.0) {
            problems.push(format!("`C` must be positive, got {}", self.c));
        }
        if !(self.tol > 0.0) {
            problems.push(format!("`tol` must be positive, got {}", self.tol));
        }
        if let Gamma::Value(g) = self.gamma {
            if !(g > 0.0) {
                problems.push(format!("`gamma` must be positive, got {}", g));
            }
        }
        if self.kernel == KernelType::Poly && self.degree == 0 {
            problems.push("`degree` must be at least 1 for the poly kernel".to_string());
        }
        if let Some(ClassWeight::Explicit(weights)) = &self.class_weight {
            if weights.values().any(|w| !(*w > 0.0)) {
                problems.push("`class_weight` values must be positive".to_string());
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::ConfigValidation(problems))
        }
    }
}
