//! Categorical label encoding
//!
//! An [`EncodingMap`] is fitted once per categorical column and then reused for
//! every later transform. Codes are only meaningful relative to the instance
//! that produced them.

use super::schema::{self, SurveyInput, CATEGORICAL_COLUMNS};
use crate::error::{Result, StressError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Bijection between the category strings of one column and `0..k`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingMap {
    field: String,
    /// Categories in fit order (sorted); position is the code
    categories: Vec<String>,
    codes: HashMap<String, usize>,
}

impl EncodingMap {
    /// Fit a map from the observed values of one column
    pub fn fit<'a, I>(field: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let distinct: BTreeSet<&str> = values.into_iter().collect();
        if distinct.is_empty() {
            return Err(StressError::InvalidInput(format!(
                "cannot fit encoding for {} without values",
                field
            )));
        }

        let categories: Vec<String> = distinct.into_iter().map(str::to_string).collect();
        let codes = categories
            .iter()
            .enumerate()
            .map(|(code, category)| (category.clone(), code))
            .collect();

        Ok(Self {
            field: field.to_string(),
            categories,
            codes,
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Valid category strings in fit order
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.codes.contains_key(value)
    }

    /// Code for a category; unseen values are rejected
    pub fn encode(&self, value: &str) -> Result<usize> {
        self.codes
            .get(value)
            .copied()
            .ok_or_else(|| StressError::UnknownCategory {
                field: self.field.clone(),
                value: value.to_string(),
            })
    }

    /// Category for a code
    pub fn decode(&self, code: usize) -> Result<&str> {
        self.categories
            .get(code)
            .map(String::as_str)
            .ok_or_else(|| StressError::UnknownCategory {
                field: self.field.clone(),
                value: code.to_string(),
            })
    }
}

/// One fitted [`EncodingMap`] per categorical survey column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncodingMapSet {
    maps: BTreeMap<String, EncodingMap>,
}

impl EncodingMapSet {
    /// Fit every categorical column from complete survey inputs
    pub fn fit<'a, I>(inputs: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a SurveyInput> + Clone,
    {
        let mut maps = BTreeMap::new();
        for column in CATEGORICAL_COLUMNS {
            let values = inputs
                .clone()
                .into_iter()
                .filter_map(|input| input.categorical(column));
            maps.insert(column.to_string(), EncodingMap::fit(column, values)?);
        }
        Ok(Self { maps })
    }

    pub fn get(&self, field: &str) -> Result<&EncodingMap> {
        self.maps
            .get(field)
            .ok_or_else(|| StressError::MissingColumn(field.to_string()))
    }

    /// Valid categories for a field, in fit order
    pub fn categories(&self, field: &str) -> Result<&[String]> {
        Ok(self.get(field)?.categories())
    }

    pub fn iter(&self) -> impl Iterator<Item = &EncodingMap> {
        self.maps.values()
    }

    /// Encode one raw input into the ordered model feature vector
    pub fn encode_input(&self, input: &SurveyInput) -> Result<EncodedRecord> {
        let values = schema::FEATURE_COLUMNS
            .iter()
            .map(|&column| match input.numeric(column) {
                Some(value) => Ok(value),
                None => {
                    let raw = input
                        .categorical(column)
                        .ok_or_else(|| StressError::MissingColumn(column.to_string()))?;
                    Ok(self.get(column)?.encode(raw)? as f64)
                }
            })
            .collect::<Result<Vec<f64>>>()?;

        EncodedRecord::new(schema::feature_names(), values)
    }
}

/// A single feature vector with the names it was assembled under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedRecord {
    feature_names: Vec<String>,
    values: Vec<f64>,
}

impl EncodedRecord {
    pub fn new(feature_names: Vec<String>, values: Vec<f64>) -> Result<Self> {
        if feature_names.len() != values.len() {
            return Err(StressError::ShapeError {
                expected: format!("{} values", feature_names.len()),
                actual: format!("{} values", values.len()),
            });
        }
        Ok(Self {
            feature_names,
            values,
        })
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}
