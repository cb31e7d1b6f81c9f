//! Survey schema: column names, feature order and the derived stress label

use crate::error::{Result, StressError};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const AGE: &str = "Age";
pub const GENDER: &str = "Gender";
pub const OCCUPATION: &str = "Occupation";
pub const SCREEN_TIME: &str = "Daily_Screen_Time_Hours";
pub const SLEEP_HOURS: &str = "Sleep_Hours_Per_Night";
pub const EXERCISE_FREQUENCY: &str = "Exercise_Frequency";
pub const SOCIAL_INTERACTIONS: &str = "Social_Interactions_Per_Week";
pub const MEDITATION_PRACTICE: &str = "Meditation_Practice";
pub const CAFFEINE_INTAKE: &str = "Caffeine_Intake_Daily";
pub const BMI_CATEGORY: &str = "BMI_Category";
pub const CHRONIC_CONDITION: &str = "Has_Chronic_Condition";
pub const STRESS_SCORE: &str = "Self_Reported_Stress_Level";

/// Raw stress scores at or above this value are labelled High
pub const HIGH_STRESS_CUTOFF: f64 = 6.0;

/// Model input columns, in the order the scaler and classifier are fitted
pub const FEATURE_COLUMNS: [&str; 11] = [
    AGE,
    GENDER,
    OCCUPATION,
    SCREEN_TIME,
    SLEEP_HOURS,
    EXERCISE_FREQUENCY,
    SOCIAL_INTERACTIONS,
    MEDITATION_PRACTICE,
    CAFFEINE_INTAKE,
    BMI_CATEGORY,
    CHRONIC_CONDITION,
];

pub const NUMERIC_COLUMNS: [&str; 4] = [AGE, SCREEN_TIME, SLEEP_HOURS, SOCIAL_INTERACTIONS];

pub const CATEGORICAL_COLUMNS: [&str; 7] = [
    GENDER,
    OCCUPATION,
    EXERCISE_FREQUENCY,
    MEDITATION_PRACTICE,
    CAFFEINE_INTAKE,
    BMI_CATEGORY,
    CHRONIC_CONDITION,
];

/// Every column a survey file must provide
pub fn required_columns() -> impl Iterator<Item = &'static str> {
    FEATURE_COLUMNS.iter().copied().chain(std::iter::once(STRESS_SCORE))
}

pub fn is_categorical(column: &str) -> bool {
    CATEGORICAL_COLUMNS.contains(&column)
}

/// Ordered feature names as owned strings
pub fn feature_names() -> Vec<String> {
    FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect()
}

/// Binary stress label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StressLevel {
    Low,
    High,
}

impl StressLevel {
    /// Derive the label from a raw self-reported score
    pub fn from_score(score: f64) -> Self {
        if score >= HIGH_STRESS_CUTOFF {
            StressLevel::High
        } else {
            StressLevel::Low
        }
    }

    /// Decide the label from a High-class probability and a cutoff
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        if probability >= threshold {
            StressLevel::High
        } else {
            StressLevel::Low
        }
    }

    pub fn code(self) -> i64 {
        match self {
            StressLevel::Low => 0,
            StressLevel::High => 1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(StressLevel::Low),
            1 => Some(StressLevel::High),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StressLevel::Low => "Low",
            StressLevel::High => "High",
        }
    }

    /// Row name used in classification reports
    pub fn report_name(self) -> &'static str {
        match self {
            StressLevel::Low => "Low Stress",
            StressLevel::High => "High Stress",
        }
    }
}

impl fmt::Display for StressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One respondent's lifestyle answers, before encoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyInput {
    pub age: f64,
    pub gender: String,
    pub occupation: String,
    pub screen_time_hours: f64,
    pub sleep_hours: f64,
    pub exercise_frequency: String,
    pub social_interactions: f64,
    pub meditation_practice: String,
    pub caffeine_intake: String,
    pub bmi_category: String,
    pub chronic_condition: String,
}

impl SurveyInput {
    /// Value of a categorical column
    pub fn categorical(&self, column: &str) -> Option<&str> {
        let value = match column {
            GENDER => &self.gender,
            OCCUPATION => &self.occupation,
            EXERCISE_FREQUENCY => &self.exercise_frequency,
            MEDITATION_PRACTICE => &self.meditation_practice,
            CAFFEINE_INTAKE => &self.caffeine_intake,
            BMI_CATEGORY => &self.bmi_category,
            CHRONIC_CONDITION => &self.chronic_condition,
            _ => return None,
        };
        Some(value.as_str())
    }

    /// Value of a numeric column
    pub fn numeric(&self, column: &str) -> Option<f64> {
        match column {
            AGE => Some(self.age),
            SCREEN_TIME => Some(self.screen_time_hours),
            SLEEP_HOURS => Some(self.sleep_hours),
            SOCIAL_INTERACTIONS => Some(self.social_interactions),
            _ => None,
        }
    }

    /// Range checks applied to user-entered values
    pub fn validate(&self) -> Result<()> {
        for column in NUMERIC_COLUMNS {
            let value = self.numeric(column).unwrap_or(f64::NAN);
            if !value.is_finite() || value < 0.0 {
                return Err(StressError::InvalidInput(format!(
                    "{} must be a non-negative number, got {}",
                    column, value
                )));
            }
        }
        if self.screen_time_hours > 24.0 {
            return Err(StressError::InvalidInput(
                "Daily screen time cannot exceed 24 hours".to_string(),
            ));
        }
        if self.sleep_hours > 12.0 {
            return Err(StressError::InvalidInput(
                "Sleep hours per night cannot exceed 12 hours".to_string(),
            ));
        }
        Ok(())
    }
}

/// A complete survey row: lifestyle answers plus the raw stress score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyRecord {
    pub input: SurveyInput,
    pub stress_score: f64,
}

impl SurveyRecord {
    pub fn label(&self) -> StressLevel {
        StressLevel::from_score(self.stress_score)
    }
}

#[cfg(test)]
pub(crate) fn sample_input() -> SurveyInput {
    SurveyInput {
        age: 30.0,
        gender: "Female".to_string(),
        occupation: "Engineer".to_string(),
        screen_time_hours: 5.0,
        sleep_hours: 7.5,
        exercise_frequency: "3-5x/week".to_string(),
        social_interactions: 6.0,
        meditation_practice: "Yes".to_string(),
        caffeine_intake: "1-2 cups".to_string(),
        bmi_category: "Normal".to_string(),
        chronic_condition: "No".to_string(),
    }
}
