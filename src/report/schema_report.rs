//! Feature schema and prediction display

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use polars::prelude::*;

use crate::pipeline::{ColumnSummary, FeatureSchema};
use crate::utils::{print_indented, print_section};

const MAX_CHOICES_SHOWN: usize = 8;

/// Render one row per schema column with its range or categories.
pub fn schema_table(schema: &FeatureSchema) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Column").add_attribute(Attribute::Bold),
        Cell::new("Kind").add_attribute(Attribute::Bold),
        Cell::new("Values").add_attribute(Attribute::Bold),
    ]);

    for (name, summary) in schema.summaries() {
        let (kind, values) = match summary {
            ColumnSummary::Numeric { min, max } => ("numeric", format!("{} .. {}", min, max)),
            ColumnSummary::Categorical { choices } => {
                let mut shown: Vec<String> =
                    choices.iter().take(MAX_CHOICES_SHOWN).cloned().collect();
                if choices.len() > MAX_CHOICES_SHOWN {
                    shown.push(format!("+{} more", choices.len() - MAX_CHOICES_SHOWN));
                }
                ("categorical", shown.join(", "))
            }
        };
        table.add_row(vec![Cell::new(name), Cell::new(kind), Cell::new(values)]);
    }
    table
}

pub fn display_schema(schema: &FeatureSchema) {
    print_section("🧾", "FEATURE SCHEMA");
    print_indented(&schema_table(schema).to_string());
}

/// Print the first `limit` predictions next to their row number.
pub fn display_predictions(predictions: &[u8], limit: usize) {
    print_section("🩺", "PREDICTIONS");

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Row").add_attribute(Attribute::Bold),
        Cell::new("Prediction").add_attribute(Attribute::Bold),
    ]);
    for (row, &p) in predictions.iter().enumerate().take(limit) {
        table.add_row(vec![
            Cell::new(row).set_alignment(CellAlignment::Right),
            prediction_cell(p),
        ]);
    }
    print_indented(&table.to_string());

    let positive = predictions.iter().filter(|&&p| p == 1).count();
    println!();
    println!(
        "    {} of {} rows predicted positive",
        positive,
        predictions.len()
    );
}

/// Print a single record with its prediction and positive-class probability.
pub fn display_record_prediction(record: &DataFrame, prediction: u8, probability: f64) {
    print_section("🩺", "PREDICTION");

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Column").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);
    for column in record.get_columns() {
        let value = column
            .get(0)
            .map(|v| v.str_value().to_string())
            .unwrap_or_default();
        table.add_row(vec![Cell::new(column.name()), Cell::new(value)]);
    }
    table.add_row(vec![
        Cell::new("predict").add_attribute(Attribute::Bold),
        prediction_cell(prediction),
    ]);
    table.add_row(vec![
        Cell::new("probability").add_attribute(Attribute::Bold),
        Cell::new(format!("{:.3}", probability)),
    ]);
    print_indented(&table.to_string());
}

fn prediction_cell(prediction: u8) -> Cell {
    if prediction == 1 {
        Cell::new("1 (positive)").fg(Color::Red)
    } else {
        Cell::new("0 (negative)").fg(Color::Green)
    }
}
