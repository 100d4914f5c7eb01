//! Holdout metrics and permutation importance tables

use chrono::{DateTime, Local};
use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;
use std::time::SystemTime;

use crate::pipeline::{ImportanceTable, MetricsRecord};
use crate::utils::{print_indented, print_info, print_section};

/// Render the metrics record as a two-column table.
pub fn metrics_table(metrics: &MetricsRecord) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Metric").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);

    for (name, value) in metrics.entries() {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(format!("{:.3}", value)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// Render the `top` most important features, highest first.
pub fn importance_table(importances: &ImportanceTable, top: usize) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("Feature").add_attribute(Attribute::Bold),
        Cell::new("Importance").add_attribute(Attribute::Bold),
    ]);

    for (rank, entry) in importances.top(top).iter().enumerate() {
        let color = if entry.value > 0.0 {
            Color::Green
        } else if entry.value < 0.0 {
            Color::Red
        } else {
            Color::White
        };
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(&entry.feature),
            Cell::new(format!("{:.4}", entry.value))
                .fg(color)
                .set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// Print the persisted metrics, the model timestamp and the top importances.
pub fn display_metrics(
    metrics: &MetricsRecord,
    importances: Option<&ImportanceTable>,
    trained_at: Option<SystemTime>,
    top: usize,
) {
    print_section("📊", "HOLDOUT METRICS");
    if let Some(time) = trained_at {
        let local: DateTime<Local> = time.into();
        print_info(&format!(
            "Model trained {}",
            local.format("%Y-%m-%d %H:%M:%S")
        ));
        println!();
    }
    print_indented(&metrics_table(metrics).to_string());

    match importances {
        Some(importances) if !importances.is_empty() => {
            print_section("🔍", "PERMUTATION IMPORTANCE");
            print_indented(&importance_table(importances, top).to_string());
            if importances.len() > top {
                println!(
                    "    {}",
                    style(format!("... and {} more", importances.len() - top)).dim()
                );
            }
        }
        _ => {
            println!();
            print_info("No permutation importances recorded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::FeatureImportance;

    #[test]
    fn test_importance_table_respects_top() {
        let importances = ImportanceTable::new(vec![
            FeatureImportance {
                feature: "MMSE".to_string(),
                value: 0.2,
            },
            FeatureImportance {
                feature: "Age".to_string(),
                value: 0.05,
            },
            FeatureImportance {
                feature: "Smoking".to_string(),
                value: -0.01,
            },
        ]);

        let rendered = importance_table(&importances, 2).to_string();
        assert!(rendered.contains("MMSE"));
        assert!(rendered.contains("Age"));
        assert!(!rendered.contains("Smoking"));
    }

    #[test]
    fn test_metrics_table_lists_every_metric() {
        let metrics = MetricsRecord {
            roc_auc: 0.9,
            precision: 0.75,
            recall: 0.6,
            f1: 0.667,
            logloss: 0.412,
        };
        let rendered = metrics_table(&metrics).to_string();
        for name in ["roc_auc", "precision", "recall", "f1", "logloss"] {
            assert!(rendered.contains(name));
        }
        assert!(rendered.contains("0.412"));
    }
}
