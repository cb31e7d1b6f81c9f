//! stress-lens CLI Module
//!
//! Command-line interface for training, prediction and dataset exploration.

use clap::{Parser, Subcommand};
use colored::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::inference::{InferenceEngine, Prediction};
use crate::insights::DatasetInsights;
use crate::preprocessing::schema::CATEGORICAL_COLUMNS;
use crate::preprocessing::{DatasetPreparer, PreparedDataset, StressLevel, SurveyInput};
use crate::recommendations::{recommend, RecommendationRules};
use crate::training::{
    EvaluationReport, FeatureImportance, ForestParams, ThresholdScore, TrainedModelBundle,
    TrainingConfig, TrainingPipeline,
};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }
fn alert(s: &str) -> ColoredString  { s.truecolor(240, 110, 100) }

fn kv(key: &str, val: &str) {
    println!("  {:<22} {}", muted(key), val.white());
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn level_label(level: StressLevel) -> ColoredString {
    match level {
        StressLevel::High => alert(level.report_name()).bold(),
        StressLevel::Low => ok(level.report_name()).bold(),
    }
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "stress-lens")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Predict Low/High stress from lifestyle survey answers")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train and evaluate the classifier
    Train {
        /// Survey CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// JSON training configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the training summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Train, then score one respondent
    Predict {
        /// Survey CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// JSON training configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        input: SurveyArgs,
    },

    /// List the valid categories for each categorical field
    Categories {
        /// Survey CSV file
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Describe the dataset
    Insights {
        /// Survey CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// Print insights as JSON
        #[arg(long)]
        json: bool,
    },
}

/// One respondent's answers
#[derive(clap::Args, Debug, Clone)]
pub struct SurveyArgs {
    #[arg(long)]
    pub age: f64,
    #[arg(long)]
    pub gender: String,
    #[arg(long)]
    pub occupation: String,
    /// Daily screen time in hours
    #[arg(long)]
    pub screen_time: f64,
    /// Sleep per night in hours
    #[arg(long)]
    pub sleep: f64,
    #[arg(long)]
    pub exercise: String,
    /// Social interactions per week
    #[arg(long)]
    pub social: f64,
    #[arg(long)]
    pub meditation: String,
    #[arg(long)]
    pub caffeine: String,
    #[arg(long)]
    pub bmi: String,
    /// Has a chronic condition (as written in the data, e.g. "Yes"/"No")
    #[arg(long)]
    pub chronic: String,
}

impl From<SurveyArgs> for SurveyInput {
    fn from(args: SurveyArgs) -> Self {
        SurveyInput {
            age: args.age,
            gender: args.gender,
            occupation: args.occupation,
            screen_time_hours: args.screen_time,
            sleep_hours: args.sleep,
            exercise_frequency: args.exercise,
            social_interactions: args.social,
            meditation_practice: args.meditation,
            caffeine_intake: args.caffeine,
            bmi_category: args.bmi,
            chronic_condition: args.chronic,
        }
    }
}

/// Serializable view of a trained bundle
#[derive(Debug, Serialize)]
pub struct TrainSummary {
    pub rows_kept: usize,
    pub rows_dropped: usize,
    pub best_params: ForestParams,
    pub cv_macro_f1: f64,
    pub threshold_scan: Vec<ThresholdScore>,
    pub evaluation: EvaluationReport,
    pub importances: Vec<FeatureImportance>,
}

impl TrainSummary {
    pub fn new(prepared: &PreparedDataset, bundle: &TrainedModelBundle) -> Self {
        Self {
            rows_kept: prepared.summary.rows_kept(),
            rows_dropped: prepared.summary.rows_dropped,
            best_params: *bundle.best_params(),
            cv_macro_f1: bundle.cv_score(),
            threshold_scan: bundle.threshold_scores().to_vec(),
            evaluation: bundle.evaluation().clone(),
            importances: bundle.ranked_importances(),
        }
    }
}

// ─── Shared steps ──────────────────────────────────────────────────────────────

fn load_config(path: Option<&Path>) -> anyhow::Result<TrainingConfig> {
    Ok(match path {
        Some(path) => TrainingConfig::from_json_file(path)?,
        None => TrainingConfig::default(),
    })
}

fn load_dataset(data_path: &Path, quiet: bool) -> anyhow::Result<PreparedDataset> {
    let start = Instant::now();
    if !quiet {
        step_run("Loading survey data");
    }
    let prepared = DatasetPreparer::new().load_and_prepare(data_path)?;
    if !quiet {
        step_done(&format!(
            "{} rows kept, {} dropped in {:?}",
            prepared.summary.rows_kept(),
            prepared.summary.rows_dropped,
            start.elapsed()
        ));
    }
    Ok(prepared)
}

fn train_bundle(
    prepared: &PreparedDataset,
    config: TrainingConfig,
    quiet: bool,
) -> anyhow::Result<TrainedModelBundle> {
    let start = Instant::now();
    if !quiet {
        step_run(&format!("Training ({} grid candidates)", config.param_grid.len()));
    }
    let bundle = TrainingPipeline::new(config).train(&prepared.table)?;
    if !quiet {
        step_done(&format!("{:?}", start.elapsed()));
    }
    Ok(bundle)
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(data_path: &Path, config_path: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    if !json {
        section("Train");
    }
    let prepared = load_dataset(data_path, json)?;
    let bundle = train_bundle(&prepared, config, json)?;
    let summary = TrainSummary::new(&prepared, &bundle);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    section("Class balance");
    for (label, count) in prepared.table.class_counts() {
        let name = StressLevel::from_code(label).map_or("?", |l| l.report_name());
        kv(name, &count.to_string());
    }

    section("Model");
    kv("Parameters", &summary.best_params.to_string());
    kv("CV macro F1", &format!("{:.4}", summary.cv_macro_f1));
    kv("Threshold", &format!("{:.2}", bundle.threshold()));
    kv("Accuracy", &format!("{:.4}", summary.evaluation.accuracy));
    kv(
        "Accuracy @ 0.50",
        &format!("{:.4}", summary.evaluation.default_cutoff_accuracy),
    );

    section("Threshold scan");
    for score in &summary.threshold_scan {
        let marker = if score.threshold == bundle.threshold() { ok("◆") } else { dim("·") };
        println!("  {} {:.2}  macro F1 {:.4}", marker, score.threshold, score.macro_f1);
    }

    section("Classification report");
    for line in summary.evaluation.report.to_string().lines() {
        println!("  {}", line);
    }

    section("Feature importance");
    for item in &summary.importances {
        let bar = "█".repeat((item.importance * 40.0).round() as usize);
        println!("  {:<30} {:>6.3} {}", item.name, item.importance, accent(&bar));
    }
    println!();
    Ok(())
}

pub fn cmd_predict(
    data_path: &Path,
    config_path: Option<&Path>,
    input: SurveyInput,
) -> anyhow::Result<()> {
    input.validate()?;
    let config = load_config(config_path)?;

    section("Predict");
    let prepared = load_dataset(data_path, false)?;
    let bundle = train_bundle(&prepared, config, false)?;
    let engine = InferenceEngine::new(bundle, prepared.encoders);
    let prediction: Prediction = engine.predict_input(&input)?;

    section("Result");
    println!("  {:<22} {}", muted("Stress level"), level_label(prediction.level));
    kv("High-stress probability", &format!("{:.1}%", prediction.probability * 100.0));
    kv("Threshold", &format!("{:.2}", prediction.threshold));
    kv("Model accuracy", &format!("{:.1}%", engine.bundle().accuracy() * 100.0));
    if prediction.is_near_boundary() {
        println!();
        println!(
            "  {} {}",
            "!".yellow().bold(),
            "Probability is close to the threshold; treat this result with caution.".yellow()
        );
    }

    section("Recommendations");
    for rec in recommend(&input, &RecommendationRules::default()) {
        println!("  {} {}", accent("•"), rec.message());
    }
    println!();
    Ok(())
}

pub fn cmd_categories(data_path: &Path) -> anyhow::Result<()> {
    section("Categories");
    let prepared = load_dataset(data_path, false)?;
    println!();
    for column in CATEGORICAL_COLUMNS {
        let categories = prepared.encoders.categories(column)?;
        println!("  {:<22} {}", muted(column), categories.join(", ").white());
    }
    println!();
    Ok(())
}

pub fn cmd_insights(data_path: &Path, json: bool) -> anyhow::Result<()> {
    if !json {
        section("Insights");
    }
    let prepared = load_dataset(data_path, json)?;
    let insights = DatasetInsights::compute(&prepared.table, &prepared.encoders)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&insights)?);
        return Ok(());
    }

    section("Class balance");
    kv("Low Stress", &insights.class_balance.low.to_string());
    kv("High Stress", &insights.class_balance.high.to_string());
    kv(
        "High share",
        &format!("{:.1}%", insights.class_balance.high_fraction() * 100.0),
    );
    if let Some(fact) = insights.fact() {
        println!();
        println!("  {} {}", accent("Did you know?"), fact);
    }

    section("Average stress by exercise frequency");
    for group in &insights.stress_by_exercise {
        kv(&group.group, &format!("{:.2}  (n={})", group.mean, group.count));
    }

    section("Average screen time by stress level");
    for group in &insights.screen_time_by_level {
        kv(&group.group, &format!("{:.2} h  (n={})", group.mean, group.count));
    }
    println!();
    Ok(())
}
