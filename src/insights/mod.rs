//! Descriptive statistics over a prepared survey table

use crate::error::{Result, StressError};
use crate::preprocessing::schema::{EXERCISE_FREQUENCY, SCREEN_TIME, SLEEP_HOURS, STRESS_SCORE};
use crate::preprocessing::{EncodedTable, EncodingMapSet, StressLevel};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sleep below this many hours counts as short sleep
pub const SHORT_SLEEP_HOURS: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassBalance {
    pub low: usize,
    pub high: usize,
}

impl ClassBalance {
    pub fn total(&self) -> usize {
        self.low + self.high
    }

    pub fn high_fraction(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.high as f64 / self.total() as f64
        }
    }
}

/// Mean of some measure within one group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMean {
    pub group: String,
    pub mean: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInsights {
    pub class_balance: ClassBalance,
    /// Share of High-stress respondents sleeping under six hours; `None` without High rows
    pub short_sleep_share_of_high: Option<f64>,
    /// Mean raw stress score per exercise category, in encoder order
    pub stress_by_exercise: Vec<GroupMean>,
    /// Mean screen time for Low then High
    pub screen_time_by_level: Vec<GroupMean>,
}

impl DatasetInsights {
    pub fn compute(table: &EncodedTable, encoders: &EncodingMapSet) -> Result<Self> {
        if table.n_rows() == 0 {
            return Err(StressError::EmptyDataset);
        }
        let scores = table
            .stress_scores()
            .ok_or_else(|| StressError::MissingColumn(STRESS_SCORE.to_string()))?;
        let features = table.features();
        let labels = table.labels();
        let sleep = features.column(table.column_index(SLEEP_HOURS)?);
        let screen = features.column(table.column_index(SCREEN_TIME)?);
        let exercise = features.column(table.column_index(EXERCISE_FREQUENCY)?);

        let high_code = StressLevel::High.code();
        let high = labels.iter().filter(|&&l| l == high_code).count();
        let class_balance = ClassBalance {
            low: labels.len() - high,
            high,
        };

        let short_sleep_share_of_high = if high == 0 {
            None
        } else {
            let short = labels
                .iter()
                .zip(sleep.iter())
                .filter(|&(&l, &s)| l == high_code && s < SHORT_SLEEP_HOURS)
                .count();
            Some(short as f64 / high as f64)
        };

        let exercise_map = encoders.get(EXERCISE_FREQUENCY)?;
        let mut stress_by_exercise = Vec::with_capacity(exercise_map.len());
        for (code, category) in exercise_map.categories().iter().enumerate() {
            let values: Vec<f64> = exercise
                .iter()
                .zip(scores.iter())
                .filter(|&(&e, _)| e as usize == code)
                .map(|(_, &s)| s)
                .collect();
            if let Some(group) = group_mean(category, &values) {
                stress_by_exercise.push(group);
            }
        }

        let screen_time_by_level = [StressLevel::Low, StressLevel::High]
            .iter()
            .filter_map(|level| {
                let values: Vec<f64> = labels
                    .iter()
                    .zip(screen.iter())
                    .filter(|&(&l, _)| l == level.code())
                    .map(|(_, &s)| s)
                    .collect();
                group_mean(level.as_str(), &values)
            })
            .collect();

        Ok(Self {
            class_balance,
            short_sleep_share_of_high,
            stress_by_exercise,
            screen_time_by_level,
        })
    }

    /// One-line observation about sleep and stress
    pub fn fact(&self) -> Option<String> {
        self.short_sleep_share_of_high.map(|share| {
            format!(
                "{:.2}% of individuals with high stress levels sleep less than 6 hours per night.",
                share * 100.0
            )
        })
    }
}

fn group_mean(group: &str, values: &[f64]) -> Option<GroupMean> {
    if values.is_empty() {
        return None;
    }
    Some(GroupMean {
        group: group.to_string(),
        mean: values.iter().sum::<f64>() / values.len() as f64,
        count: values.len(),
    })
}

impl fmt::Display for DatasetInsights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Low: {}  High: {}  (High {:.1}%)",
            self.class_balance.low,
            self.class_balance.high,
            self.class_balance.high_fraction() * 100.0
        )?;
        if let Some(fact) = self.fact() {
            writeln!(f, "{}", fact)?;
        }
        for g in &self.stress_by_exercise {
            writeln!(f, "stress | exercise {:<12} {:>6.2} (n={})", g.group, g.mean, g.count)?;
        }
        for g in &self.screen_time_by_level {
            writeln!(f, "screen time | {:<5} {:>6.2} h (n={})", g.group, g.mean, g.count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::schema::sample_input;
    use crate::preprocessing::{encode_records, SurveyRecord};

    fn record(sleep: f64, screen: f64, exercise: &str, score: f64) -> SurveyRecord {
        let mut input = sample_input();
        input.sleep_hours = sleep;
        input.screen_time_hours = screen;
        input.exercise_frequency = exercise.to_string();
        SurveyRecord {
            input,
            stress_score: score,
        }
    }

    fn table(records: &[SurveyRecord]) -> (EncodedTable, EncodingMapSet) {
        let encoders = EncodingMapSet::fit(records.iter().map(|r| &r.input)).unwrap();
        (encode_records(records, &encoders).unwrap(), encoders)
    }

    #[test]
    fn test_compute() {
        let records = vec![
            record(5.0, 9.0, "None", 8.0),
            record(5.5, 8.0, "None", 7.0),
            record(7.0, 6.0, "None", 9.0),
            record(8.0, 3.0, "3-5x/week", 2.0),
            record(7.5, 4.0, "3-5x/week", 4.0),
        ];
        let (table, encoders) = table(&records);
        let insights = DatasetInsights::compute(&table, &encoders).unwrap();

        assert_eq!(insights.class_balance, ClassBalance { low: 2, high: 3 });
        let share = insights.short_sleep_share_of_high.unwrap();
        assert!((share - 2.0 / 3.0).abs() < 1e-12);

        // Encoder order is sorted: "3-5x/week" before "None"
        assert_eq!(insights.stress_by_exercise[0].group, "3-5x/week");
        assert!((insights.stress_by_exercise[0].mean - 3.0).abs() < 1e-12);
        assert!((insights.stress_by_exercise[1].mean - 8.0).abs() < 1e-12);

        assert_eq!(insights.screen_time_by_level[0].group, "Low");
        assert!((insights.screen_time_by_level[0].mean - 3.5).abs() < 1e-12);
        assert!((insights.screen_time_by_level[1].mean - 23.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_high_stress_rows() {
        let records = vec![record(8.0, 3.0, "Daily", 1.0), record(7.0, 2.0, "Daily", 3.0)];
        let (table, encoders) = table(&records);
        let insights = DatasetInsights::compute(&table, &encoders).unwrap();
        assert_eq!(insights.short_sleep_share_of_high, None);
        assert!(insights.fact().is_none());
        assert_eq!(insights.screen_time_by_level.len(), 1);
    }
}
