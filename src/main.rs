//! Clinpred: binary diagnosis training and inference CLI
//!
//! Trains an SVM classifier on a clinical dataset with a recorded,
//! reproducible preprocessing pipeline, then scores new records through
//! the exact same preprocessing.

use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use console::style;

use clinpred::cli::{confirm_overwrite, Cli, Commands};
use clinpred::pipeline::{
    canonical_record, export_predictions, load_dataset, predict, predict_with_proba, run_training,
    ArtifactKind, ArtifactStore, DatasetInput, DatasetStats, FeatureSchema, ImportanceTable,
    InputSource, MetricsRecord, PipelineConfig,
};
use clinpred::report::{
    display_metrics, display_predictions, display_record_prediction, display_schema,
    TrainingSummary,
};
use clinpred::utils::{
    create_spinner, finish_with_success, print_banner, print_completion, print_config,
    print_info, print_step_header, print_step_time, print_success, print_warning,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = PipelineConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config: {}", cli.config.display()))?;
    let store = ArtifactStore::from_config(&config);

    match cli.command {
        Commands::Train { data, no_confirm } => {
            let data = match data.or_else(|| config.raw_train_path.clone()) {
                Some(path) => path,
                None => bail!(
                    "No training data given. Use --data or set preprocessing.raw_train_path in {}",
                    cli.config.display()
                ),
            };
            run_train(&cli.config, &data, no_confirm, &config, &store)
        }
        Commands::Predict {
            input,
            output,
            limit,
        } => {
            let df = load_dataset(&input)
                .with_context(|| format!("Failed to load dataset: {}", input.display()))?;
            let spinner = create_spinner("Scoring records...");
            let predictions = predict(
                DatasetInput::Frame(df.clone()),
                InputSource::Raw,
                &config,
                &store,
            )?;
            finish_with_success(&spinner, &format!("Scored {} records", predictions.len()));

            display_predictions(&predictions, limit);
            if let Some(path) = output {
                export_predictions(&df, &predictions, &path)?;
                println!();
                print_success(&format!("Predictions written to {}", path.display()));
            }
            Ok(())
        }
        Commands::PredictRecord { values } => {
            let schema: FeatureSchema = store.load()?;
            let record = canonical_record(&values, &schema, &config.map_change_columns)?;
            let (prediction, probability) = predict_with_proba(
                DatasetInput::Frame(record.clone()),
                InputSource::Canonical,
                &config,
                &store,
            )?;
            match (prediction.first(), probability.first()) {
                (Some(&p), Some(&prob)) => display_record_prediction(&record, p, prob),
                _ => bail!("No prediction produced for the record"),
            }
            Ok(())
        }
        Commands::Metrics { top } => {
            let metrics: MetricsRecord = store.load()?;
            let importances: Option<ImportanceTable> = if store.exists(ArtifactKind::Importances)
            {
                Some(store.load()?)
            } else {
                None
            };
            display_metrics(
                &metrics,
                importances.as_ref(),
                store.modified(ArtifactKind::Model),
                top,
            );
            Ok(())
        }
        Commands::Schema => {
            let schema: FeatureSchema = store.load()?;
            display_schema(&schema);
            Ok(())
        }
    }
}

fn run_train(
    config_path: &std::path::Path,
    data: &std::path::Path,
    no_confirm: bool,
    config: &PipelineConfig,
    store: &ArtifactStore,
) -> Result<()> {
    let existing = store.existing();
    if !existing.is_empty() && !no_confirm && !confirm_overwrite(&existing)? {
        println!("Cancelled by user.");
        return Ok(());
    }

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(
        config_path,
        data,
        &config.target_column,
        store.path(ArtifactKind::Model),
    );

    print_step_header(1, "Load Dataset");
    let step_start = Instant::now();
    let spinner = create_spinner("Reading dataset...");
    let df = load_dataset(data)
        .with_context(|| format!("Failed to load dataset: {}", data.display()))?;
    finish_with_success(&spinner, "Dataset loaded");

    let stats = DatasetStats::of(&df);
    println!("\n    {} Dataset Statistics:", style("✧").cyan());
    println!("      Rows: {}", stats.rows);
    println!("      Columns: {}", stats.columns);
    println!("      Estimated memory: {:.2} MB", stats.memory_mb);
    if !existing.is_empty() {
        print_warning(&format!(
            "Replacing {} existing artifact(s)",
            existing.len()
        ));
    }
    print_step_time(step_start.elapsed());

    print_step_header(2, "Preprocess, Train and Evaluate");
    let step_start = Instant::now();
    let spinner = create_spinner("Fitting preprocessing and SVM classifier...");
    let outcome = run_training(&df, config, store)?;
    finish_with_success(&spinner, "Model trained and evaluated");
    print_info(&format!(
        "Artifacts written next to {}",
        store.path(ArtifactKind::Model).display()
    ));
    print_step_time(step_start.elapsed());

    TrainingSummary::from_outcome(&outcome).display();
    print_completion("Training complete!");
    Ok(())
}
