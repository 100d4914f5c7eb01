//! Training summary report

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};

use crate::pipeline::svm::Kernel;
use crate::pipeline::TrainingOutcome;
use crate::utils::{print_indented, print_section};

/// Summary of a finished training run
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub train_rows: usize,
    pub test_rows: usize,
    pub features: usize,
    pub support_vectors: usize,
    pub kernel: Kernel,
    pub roc_auc: f64,
    pub f1: f64,
}

impl TrainingSummary {
    pub fn from_outcome(outcome: &TrainingOutcome) -> Self {
        let classifier = outcome.model.classifier();
        Self {
            train_rows: outcome.train_rows,
            test_rows: outcome.test_rows,
            features: outcome.model.feature_names().len(),
            support_vectors: classifier.n_support(),
            kernel: *classifier.kernel(),
            roc_auc: outcome.metrics.roc_auc,
            f1: outcome.metrics.f1,
        }
    }

    pub fn display(&self) {
        print_section("📋", "TRAINING SUMMARY");

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![Cell::new("Train Rows"), Cell::new(self.train_rows)]);
        table.add_row(vec![Cell::new("Holdout Rows"), Cell::new(self.test_rows)]);
        table.add_row(vec![Cell::new("Model Features"), Cell::new(self.features)]);
        table.add_row(vec![Cell::new("Kernel"), Cell::new(describe_kernel(&self.kernel))]);
        table.add_row(vec![
            Cell::new("Support Vectors"),
            Cell::new(self.support_vectors),
        ]);
        table.add_row(vec![
            Cell::new("Holdout ROC AUC"),
            Cell::new(format!("{:.3}", self.roc_auc))
                .fg(score_color(self.roc_auc))
                .add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![
            Cell::new("Holdout F1"),
            Cell::new(format!("{:.3}", self.f1)).fg(score_color(self.f1)),
        ]);

        print_indented(&table.to_string());
    }
}

/// Kernel name with its resolved coefficients.
pub fn describe_kernel(kernel: &Kernel) -> String {
    match *kernel {
        Kernel::Linear => "linear".to_string(),
        Kernel::Rbf { gamma } => format!("rbf (gamma={:.4})", gamma),
        Kernel::Poly {
            gamma,
            coef0,
            degree,
        } => format!("poly (degree={}, gamma={:.4}, coef0={})", degree, gamma, coef0),
    }
}

fn score_color(value: f64) -> Color {
    if value >= 0.8 {
        Color::Green
    } else if value >= 0.6 {
        Color::Yellow
    } else {
        Color::Red
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_kernel() {
        assert_eq!(describe_kernel(&Kernel::Linear), "linear");
        assert_eq!(
            describe_kernel(&Kernel::Rbf { gamma: 0.25 }),
            "rbf (gamma=0.2500)"
        );
    }
}
