//! Lifestyle recommendations
//!
//! Fixed-weight rules over raw survey answers. Category sets are compared as
//! strings so they stay valid regardless of how encoders numbered them.

use crate::preprocessing::SurveyInput;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Most recommendations returned for one respondent
pub const MAX_RECOMMENDATIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecommendationKind {
    Sleep,
    Exercise,
    ScreenTime,
    Meditation,
    Caffeine,
    /// Nothing else fired
    Balanced,
}

impl RecommendationKind {
    pub fn priority(self) -> f64 {
        match self {
            RecommendationKind::Sleep => 2.0,
            RecommendationKind::Exercise => 1.8,
            RecommendationKind::ScreenTime => 1.5,
            RecommendationKind::Meditation => 1.2,
            RecommendationKind::Caffeine => 1.0,
            RecommendationKind::Balanced => 0.0,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            RecommendationKind::Sleep => {
                "Aim for 7-8 hours of sleep per night to improve mental wellness."
            }
            RecommendationKind::Exercise => {
                "Increase exercise to 3-5 times per week to reduce stress."
            }
            RecommendationKind::ScreenTime => {
                "Reduce screen time to under 7 hours daily to lower stress."
            }
            RecommendationKind::Meditation => {
                "Try meditation or mindfulness practices to improve mental health."
            }
            RecommendationKind::Caffeine => {
                "Limit caffeine to 1-2 cups daily to help manage stress."
            }
            RecommendationKind::Balanced => "Your lifestyle habits are well-balanced! Keep it up.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub priority: f64,
}

impl Recommendation {
    pub fn new(kind: RecommendationKind) -> Self {
        Self {
            kind,
            priority: kind.priority(),
        }
    }

    pub fn message(&self) -> &'static str {
        self.kind.message()
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Cutoffs and category sets the rules fire on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationRules {
    /// Fires when sleep is strictly below this
    pub min_sleep_hours: f64,
    /// Fires when screen time is strictly above this
    pub max_screen_time_hours: f64,
    pub low_exercise: BTreeSet<String>,
    pub no_meditation: BTreeSet<String>,
    pub heavy_caffeine: BTreeSet<String>,
}

impl Default for RecommendationRules {
    fn default() -> Self {
        let set = |values: &[&str]| values.iter().map(|v| v.to_string()).collect();
        Self {
            min_sleep_hours: 7.0,
            max_screen_time_hours: 7.0,
            low_exercise: set(&["None", "1-2x/week"]),
            no_meditation: set(&["No"]),
            heavy_caffeine: set(&["4+ cups"]),
        }
    }
}

/// Up to three recommendations, highest priority first
pub fn recommend(input: &SurveyInput, rules: &RecommendationRules) -> Vec<Recommendation> {
    let checks = [
        (
            input.sleep_hours < rules.min_sleep_hours,
            RecommendationKind::Sleep,
        ),
        (
            input.screen_time_hours > rules.max_screen_time_hours,
            RecommendationKind::ScreenTime,
        ),
        (
            rules.low_exercise.contains(&input.exercise_frequency),
            RecommendationKind::Exercise,
        ),
        (
            rules.no_meditation.contains(&input.meditation_practice),
            RecommendationKind::Meditation,
        ),
        (
            rules.heavy_caffeine.contains(&input.caffeine_intake),
            RecommendationKind::Caffeine,
        ),
    ];

    let mut fired: Vec<Recommendation> = checks
        .iter()
        .filter(|(hit, _)| *hit)
        .map(|&(_, kind)| Recommendation::new(kind))
        .collect();
    fired.sort_by(|a, b| b.priority.total_cmp(&a.priority));
    fired.truncate(MAX_RECOMMENDATIONS);

    if fired.is_empty() {
        fired.push(Recommendation::new(RecommendationKind::Balanced));
    }
    fired
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::schema::sample_input;

    fn kinds(recs: &[Recommendation]) -> Vec<RecommendationKind> {
        recs.iter().map(|r| r.kind).collect()
    }

    #[test]
    fn test_balanced_when_nothing_fires() {
        let recs = recommend(&sample_input(), &RecommendationRules::default());
        assert_eq!(kinds(&recs), vec![RecommendationKind::Balanced]);
    }

    #[test]
    fn test_poor_sleep_heavy_screen_no_exercise() {
        let mut input = sample_input();
        input.sleep_hours = 4.0;
        input.screen_time_hours = 10.0;
        input.exercise_frequency = "None".to_string();
        input.caffeine_intake = "4+ cups".to_string();

        let recs = recommend(&input, &RecommendationRules::default());
        assert_eq!(
            kinds(&recs),
            vec![
                RecommendationKind::Sleep,
                RecommendationKind::Exercise,
                RecommendationKind::ScreenTime,
            ]
        );
    }

    #[test]
    fn test_top_three_only() {
        let mut input = sample_input();
        input.sleep_hours = 5.0;
        input.screen_time_hours = 12.0;
        input.exercise_frequency = "1-2x/week".to_string();
        input.meditation_practice = "No".to_string();
        input.caffeine_intake = "4+ cups".to_string();

        let recs = recommend(&input, &RecommendationRules::default());
        assert_eq!(recs.len(), MAX_RECOMMENDATIONS);
        assert!(recs.windows(2).all(|w| w[0].priority >= w[1].priority));
    }

    #[test]
    fn test_boundaries_are_strict() {
        let mut input = sample_input();
        input.sleep_hours = 7.0;
        input.screen_time_hours = 7.0;
        let recs = recommend(&input, &RecommendationRules::default());
        assert_eq!(kinds(&recs), vec![RecommendationKind::Balanced]);
    }

    #[test]
    fn test_custom_rules() {
        let mut rules = RecommendationRules::default();
        rules.heavy_caffeine.insert("2-3 cups".to_string());
        let mut input = sample_input();
        input.caffeine_intake = "2-3 cups".to_string();
        let recs = recommend(&input, &rules);
        assert_eq!(kinds(&recs), vec![RecommendationKind::Caffeine]);
        assert_eq!(recs[0].to_string(), RecommendationKind::Caffeine.message());
    }
}
