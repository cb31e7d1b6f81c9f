//! Classification metrics for binary stress labels

use crate::preprocessing::StressLevel;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Precision / recall / F1 for one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Averaged precision / recall / F1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Per-class report plus accuracy and macro/weighted averages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl ClassificationReport {
    /// Build a report over the Low/High stress classes. Undefined ratios
    /// (no predictions or no support) count as 0.
    pub fn compute(y_true: &Array1<i64>, y_pred: &Array1<i64>) -> Self {
        let levels = [StressLevel::Low, StressLevel::High];

        let classes: Vec<ClassMetrics> = levels
            .iter()
            .map(|&level| {
                let code = level.code();
                let pairs = || y_true.iter().zip(y_pred.iter());
                let tp = pairs().filter(|&(&t, &p)| t == code && p == code).count();
                let predicted = y_pred.iter().filter(|&&p| p == code).count();
                let support = y_true.iter().filter(|&&t| t == code).count();

                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                let f1_score = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };

                ClassMetrics {
                    label: level.report_name().to_string(),
                    precision,
                    recall,
                    f1_score,
                    support,
                }
            })
            .collect();

        let total: usize = classes.iter().map(|c| c.support).sum();
        let n = classes.len() as f64;

        let macro_avg = AverageMetrics {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / n,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / n,
            f1_score: classes.iter().map(|c| c.f1_score).sum::<f64>() / n,
            support: total,
        };

        let weight = |c: &ClassMetrics| ratio(c.support, total);
        let weighted_avg = AverageMetrics {
            precision: classes.iter().map(|c| c.precision * weight(c)).sum(),
            recall: classes.iter().map(|c| c.recall * weight(c)).sum(),
            f1_score: classes.iter().map(|c| c.f1_score * weight(c)).sum(),
            support: total,
        };

        Self {
            classes,
            accuracy: accuracy(y_true, y_pred),
            macro_avg,
            weighted_avg,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>14} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.label, c.precision, c.recall, c.f1_score, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>14} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1_score, avg.support
            )?;
        }
        Ok(())
    }
}

/// Fraction of matching labels
pub fn accuracy(y_true: &Array1<i64>, y_pred: &Array1<i64>) -> f64 {
    let correct = y_true.iter().zip(y_pred.iter()).filter(|(t, p)| t == p).count();
    ratio(correct, y_true.len())
}

/// Unweighted mean of the Low and High F1 scores
pub fn macro_f1(y_true: &Array1<i64>, y_pred: &Array1<i64>) -> f64 {
    ClassificationReport::compute(y_true, y_pred).macro_avg.f1_score
}

/// Labels from High-class probabilities at a cutoff
pub fn apply_threshold(probabilities: &Array1<f64>, threshold: f64) -> Array1<i64> {
    probabilities.mapv(|p| StressLevel::from_probability(p, threshold).code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_perfect_predictions() {
        let y = array![0, 1, 0, 1];
        let report = ClassificationReport::compute(&y, &y);
        assert_eq!(report.accuracy, 1.0);
        assert_eq!(report.macro_avg.f1_score, 1.0);
        assert_eq!(report.classes[0].label, "Low Stress");
        assert_eq!(report.classes[1].support, 2);
    }

    #[test]
    fn test_known_values() {
        let y_true = array![0, 0, 0, 1, 1];
        let y_pred = array![0, 0, 1, 1, 0];
        let report = ClassificationReport::compute(&y_true, &y_pred);

        let low = &report.classes[0];
        assert!((low.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((low.recall - 2.0 / 3.0).abs() < 1e-12);
        let high = &report.classes[1];
        assert!((high.precision - 0.5).abs() < 1e-12);
        assert!((high.recall - 0.5).abs() < 1e-12);

        assert!((report.accuracy - 0.6).abs() < 1e-12);
        assert!((report.macro_avg.f1_score - (2.0 / 3.0 + 0.5) / 2.0).abs() < 1e-12);
        assert!((report.weighted_avg.f1_score - (0.6 * 2.0 / 3.0 + 0.4 * 0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_all_one_class_predicted() {
        let y_true = array![0, 0, 1, 1];
        let y_pred = array![0, 0, 0, 0];
        let report = ClassificationReport::compute(&y_true, &y_pred);
        assert_eq!(report.classes[1].precision, 0.0);
        assert_eq!(report.classes[1].f1_score, 0.0);
        assert!((macro_f1(&y_true, &y_pred) - (2.0 / 3.0) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_apply_threshold_inclusive() {
        let p = array![0.2, 0.45, 0.5, 0.9];
        assert_eq!(apply_threshold(&p, 0.45).to_vec(), vec![0, 1, 1, 1]);
        assert_eq!(apply_threshold(&p, 0.5).to_vec(), vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_report_display() {
        let y = array![0, 1];
        let text = ClassificationReport::compute(&y, &y).to_string();
        assert!(text.contains("High Stress"));
        assert!(text.contains("macro avg"));
    }
}
