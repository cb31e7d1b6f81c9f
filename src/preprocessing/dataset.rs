//! Dataset preparation: raw survey table to encoded feature matrix

use super::encoder::EncodingMapSet;
use super::schema::{self, StressLevel, SurveyInput, SurveyRecord};
use crate::error::{Result, StressError};
use crate::utils::DataLoader;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Fully numeric survey table with its binary label
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedTable {
    feature_names: Vec<String>,
    features: Array2<f64>,
    labels: Array1<i64>,
    stress_scores: Option<Array1<f64>>,
}

impl EncodedTable {
    pub fn new(feature_names: Vec<String>, features: Array2<f64>, labels: Array1<i64>) -> Result<Self> {
        if feature_names.is_empty() || features.ncols() == 0 {
            return Err(StressError::ShapeError {
                expected: "at least 1 feature column".to_string(),
                actual: format!("{} feature columns", features.ncols()),
            });
        }
        if features.ncols() != feature_names.len() {
            return Err(StressError::ShapeError {
                expected: format!("{} feature columns", feature_names.len()),
                actual: format!("{} feature columns", features.ncols()),
            });
        }
        if features.nrows() != labels.len() {
            return Err(StressError::ShapeError {
                expected: format!("{} labels", features.nrows()),
                actual: format!("{} labels", labels.len()),
            });
        }
        Ok(Self {
            feature_names,
            features,
            labels,
            stress_scores: None,
        })
    }

    /// Attach the raw stress scores the labels were derived from
    pub fn with_stress_scores(mut self, scores: Array1<f64>) -> Result<Self> {
        if scores.len() != self.labels.len() {
            return Err(StressError::ShapeError {
                expected: format!("{} stress scores", self.labels.len()),
                actual: format!("{} stress scores", scores.len()),
            });
        }
        self.stress_scores = Some(scores);
        Ok(self)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn labels(&self) -> &Array1<i64> {
        &self.labels
    }

    pub fn stress_scores(&self) -> Option<&Array1<f64>> {
        self.stress_scores.as_ref()
    }

    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }

    /// Position of a named feature column
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.feature_names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| StressError::MissingColumn(name.to_string()))
    }

    /// Row count per label code, ascending by code
    pub fn class_counts(&self) -> Vec<(i64, usize)> {
        let mut counts = std::collections::BTreeMap::new();
        for &label in self.labels.iter() {
            *counts.entry(label).or_insert(0usize) += 1;
        }
        counts.into_iter().collect()
    }
}

/// Row bookkeeping from a preparation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparationSummary {
    pub rows_read: usize,
    pub rows_dropped: usize,
}

impl PreparationSummary {
    pub fn rows_kept(&self) -> usize {
        self.rows_read - self.rows_dropped
    }
}

/// Output of [`DatasetPreparer::prepare_with_summary`]
#[derive(Debug, Clone)]
pub struct PreparedDataset {
    pub table: EncodedTable,
    pub encoders: EncodingMapSet,
    pub summary: PreparationSummary,
}

/// Turns a raw survey table into an [`EncodedTable`] plus fitted encoders.
///
/// Rows with a missing value in any required column are dropped rather than
/// imputed. If missingness correlates with stress this skews the data, so the
/// drop count is logged.
#[derive(Debug, Clone, Default)]
pub struct DatasetPreparer {
    loader: DataLoader,
}

impl DatasetPreparer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_loader(mut self, loader: DataLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Read a survey CSV and prepare it
    pub fn load_and_prepare(&self, path: impl AsRef<Path>) -> Result<PreparedDataset> {
        let df = self.loader.load_csv(path)?;
        self.prepare_with_summary(&df)
    }

    /// Encode a raw table; returns the table and the encoders fitted on it
    pub fn prepare(&self, df: &DataFrame) -> Result<(EncodedTable, EncodingMapSet)> {
        let prepared = self.prepare_with_summary(df)?;
        Ok((prepared.table, prepared.encoders))
    }

    pub fn prepare_with_summary(&self, df: &DataFrame) -> Result<PreparedDataset> {
        let (records, summary) = extract_records(df)?;
        if records.is_empty() {
            return Err(StressError::EmptyDataset);
        }
        if summary.rows_dropped > 0 {
            warn!(
                dropped = summary.rows_dropped,
                kept = summary.rows_kept(),
                "Dropped survey rows with missing values; results may be biased if missingness tracks stress"
            );
        }

        let encoders = EncodingMapSet::fit(records.iter().map(|r| &r.input))?;
        let table = encode_records(&records, &encoders)?;

        let high = table.labels().iter().filter(|&&l| l == StressLevel::High.code()).count();
        info!(
            rows = table.n_rows(),
            high_stress = high,
            low_stress = table.n_rows() - high,
            "Prepared survey dataset"
        );

        Ok(PreparedDataset {
            table,
            encoders,
            summary,
        })
    }
}

/// Encode complete records with already-fitted encoders
pub fn encode_records(records: &[SurveyRecord], encoders: &EncodingMapSet) -> Result<EncodedTable> {
    let n_features = schema::FEATURE_COLUMNS.len();
    let mut values = Vec::with_capacity(records.len() * n_features);
    for record in records {
        values.extend_from_slice(encoders.encode_input(&record.input)?.values());
    }

    let features = Array2::from_shape_vec((records.len(), n_features), values)?;
    let labels: Array1<i64> = records.iter().map(|r| r.label().code()).collect();
    let scores: Array1<f64> = records.iter().map(|r| r.stress_score).collect();

    EncodedTable::new(schema::feature_names(), features, labels)?.with_stress_scores(scores)
}

/// Pull complete survey rows out of a DataFrame
pub fn extract_records(df: &DataFrame) -> Result<(Vec<SurveyRecord>, PreparationSummary)> {
    for column in schema::required_columns() {
        if df.column(column).is_err() {
            return Err(StressError::MissingColumn(column.to_string()));
        }
    }

    let age = numeric_column(df, schema::AGE)?;
    let screen = numeric_column(df, schema::SCREEN_TIME)?;
    let sleep = numeric_column(df, schema::SLEEP_HOURS)?;
    let social = numeric_column(df, schema::SOCIAL_INTERACTIONS)?;
    let stress = numeric_column(df, schema::STRESS_SCORE)?;
    let gender = string_column(df, schema::GENDER)?;
    let occupation = string_column(df, schema::OCCUPATION)?;
    let exercise = string_column(df, schema::EXERCISE_FREQUENCY)?;
    let meditation = string_column(df, schema::MEDITATION_PRACTICE)?;
    let caffeine = string_column(df, schema::CAFFEINE_INTAKE)?;
    let bmi = string_column(df, schema::BMI_CATEGORY)?;
    let chronic = string_column(df, schema::CHRONIC_CONDITION)?;

    let rows_read = df.height();
    let mut records = Vec::with_capacity(rows_read);

    for i in 0..rows_read {
        let record = (|| {
            Some(SurveyRecord {
                input: SurveyInput {
                    age: age[i]?,
                    gender: gender[i].clone()?,
                    occupation: occupation[i].clone()?,
                    screen_time_hours: screen[i]?,
                    sleep_hours: sleep[i]?,
                    exercise_frequency: exercise[i].clone()?,
                    social_interactions: social[i]?,
                    meditation_practice: meditation[i].clone()?,
                    caffeine_intake: caffeine[i].clone()?,
                    bmi_category: bmi[i].clone()?,
                    chronic_condition: chronic[i].clone()?,
                },
                stress_score: stress[i]?,
            })
        })();

        if let Some(record) = record {
            records.push(record);
        }
    }

    let summary = PreparationSummary {
        rows_read,
        rows_dropped: rows_read - records.len(),
    };
    Ok((records, summary))
}

fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| StressError::MissingColumn(name.to_string()))?;
    let cast = column.cast(&DataType::Float64)?;
    let was_null = column.is_null();

    // Only cells that were already null count as missing; anything else must parse
    let mut values = Vec::with_capacity(cast.len());
    for (row, (value, missing)) in cast.f64()?.into_iter().zip(&was_null).enumerate() {
        match value {
            Some(v) if v.is_finite() => values.push(Some(v)),
            None if missing.unwrap_or(true) => values.push(None),
            _ => {
                let raw = column
                    .get(row)
                    .map(|v| v.to_string())
                    .unwrap_or_default();
                return Err(StressError::InvalidInput(format!(
                    "{} row {}: {} is not a finite number",
                    name, row, raw
                )));
            }
        }
    }
    Ok(values)
}

fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .map_err(|_| StressError::MissingColumn(name.to_string()))?;
    let cast = column.cast(&DataType::String)?;
    let values = cast
        .str()?
        .into_iter()
        .map(|v| {
            v.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .collect();
    Ok(values)
}
