//! Integration tests for data processing: CSV loading, preparation, encoding and insights

use std::io::Write;
use stress_lens::insights::DatasetInsights;
use stress_lens::preprocessing::schema::{CATEGORICAL_COLUMNS, EXERCISE_FREQUENCY, GENDER};
use stress_lens::preprocessing::DatasetPreparer;
use stress_lens::utils::DataLoader;
use stress_lens::{ErrorKind, StressError};
use tempfile::NamedTempFile;

const HEADER: &str = "Age,Gender,Occupation,Daily_Screen_Time_Hours,Sleep_Hours_Per_Night,\
Exercise_Frequency,Social_Interactions_Per_Week,Meditation_Practice,Caffeine_Intake_Daily,\
BMI_Category,Has_Chronic_Condition,Self_Reported_Stress_Level";

const ROWS: &[&str] = &[
    "25,Male,Student,9.5,5.0,None,3,No,4+ cups,Normal,No,8",
    "31,Female,Engineer,6.0,7.5,3-5x/week,8,Yes,1-2 cups,Normal,No,3",
    "45,Female,Teacher,4.0,8.0,Daily,10,Yes,0 cups,Overweight,Yes,2",
    "38,Male,Nurse,8.0,5.5,1-2x/week,4,No,2-3 cups,Obese,Yes,7",
    "29,Other,Engineer,10.0,6.0,None,2,No,4+ cups,Normal,No,9",
    "52,Male,Teacher,3.5,7.0,3-5x/week,12,Yes,1-2 cups,Normal,No,4",
];

fn write_csv(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    file.flush().unwrap();
    file
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_load_survey_csv() {
    let file = write_csv(ROWS);
    let df = DataLoader::new().load_csv(file.path()).unwrap();
    assert_eq!(df.height(), 6);
    assert_eq!(df.width(), 12);
}

#[test]
fn test_missing_file() {
    let err = DatasetPreparer::new()
        .load_and_prepare("/definitely/not/here.csv")
        .unwrap_err();
    assert!(matches!(err, StressError::MissingFile(_)));
    assert_eq!(err.kind(), ErrorKind::Input);
}

#[test]
fn test_missing_column() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Age,Gender").unwrap();
    writeln!(file, "30,Male").unwrap();
    file.flush().unwrap();

    let err = DatasetPreparer::new().load_and_prepare(file.path()).unwrap_err();
    assert!(matches!(err, StressError::MissingColumn(_)));
}

// ============================================================================
// Preparation
// ============================================================================

#[test]
fn test_prepare_labels_and_summary() {
    let file = write_csv(ROWS);
    let prepared = DatasetPreparer::new().load_and_prepare(file.path()).unwrap();

    assert_eq!(prepared.summary.rows_read, 6);
    assert_eq!(prepared.summary.rows_dropped, 0);
    assert_eq!(prepared.table.n_rows(), 6);
    assert_eq!(prepared.table.labels().to_vec(), vec![1, 0, 0, 1, 1, 0]);
    assert_eq!(prepared.table.feature_names().len(), 11);
}

#[test]
fn test_incomplete_rows_dropped() {
    let mut rows = ROWS.to_vec();
    rows.push("40,Female,Teacher,,6.5,Daily,5,Yes,0 cups,Normal,No,5");
    rows.push("33,,Engineer,5.0,6.5,Daily,5,Yes,0 cups,Normal,No,5");
    let file = write_csv(&rows);

    let prepared = DatasetPreparer::new().load_and_prepare(file.path()).unwrap();
    assert_eq!(prepared.summary.rows_read, 8);
    assert_eq!(prepared.summary.rows_dropped, 2);
    assert_eq!(prepared.table.n_rows(), 6);
}

#[test]
fn test_malformed_numeric_cells_rejected() {
    let mut rows = ROWS.to_vec();
    rows.push("thirty,Female,Teacher,5.0,6.5,Daily,5,Yes,0 cups,Normal,No,5");
    let file = write_csv(&rows);

    let err = DatasetPreparer::new().load_and_prepare(file.path()).unwrap_err();
    assert!(matches!(
        err,
        StressError::InvalidInput(ref msg) if msg.contains("Age") && msg.contains("row 6")
    ));
    assert_eq!(err.kind(), ErrorKind::Input);

    let mut rows = ROWS.to_vec();
    rows.push("40,Female,Teacher,5.0,6.5,Daily,5,Yes,0 cups,Normal,No,eight");
    let file = write_csv(&rows);

    let err = DatasetPreparer::new().load_and_prepare(file.path()).unwrap_err();
    assert!(matches!(
        err,
        StressError::InvalidInput(ref msg) if msg.contains("Self_Reported_Stress_Level")
    ));
}

#[test]
fn test_categories_sorted_and_none_kept() {
    let file = write_csv(ROWS);
    let prepared = DatasetPreparer::new().load_and_prepare(file.path()).unwrap();

    assert_eq!(
        prepared.encoders.categories(GENDER).unwrap(),
        &["Female".to_string(), "Male".to_string(), "Other".to_string()]
    );
    let exercise = prepared.encoders.categories(EXERCISE_FREQUENCY).unwrap();
    assert_eq!(exercise, &["1-2x/week", "3-5x/week", "Daily", "None"]);
    for column in CATEGORICAL_COLUMNS {
        assert!(!prepared.encoders.categories(column).unwrap().is_empty());
    }
}

#[test]
fn test_unknown_category_is_encoding_error() {
    let file = write_csv(ROWS);
    let prepared = DatasetPreparer::new().load_and_prepare(file.path()).unwrap();

    let err = prepared
        .encoders
        .get(GENDER)
        .unwrap()
        .encode("Robot")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Encoding);
}

// ============================================================================
// Insights
// ============================================================================

#[test]
fn test_insights_from_csv() {
    let file = write_csv(ROWS);
    let prepared = DatasetPreparer::new().load_and_prepare(file.path()).unwrap();
    let insights = DatasetInsights::compute(&prepared.table, &prepared.encoders).unwrap();

    assert_eq!(insights.class_balance.high, 3);
    assert_eq!(insights.class_balance.low, 3);
    // High rows sleep 5.0, 5.5 and 6.0
    let share = insights.short_sleep_share_of_high.unwrap();
    assert!((share - 2.0 / 3.0).abs() < 1e-12);

    let none_group = insights
        .stress_by_exercise
        .iter()
        .find(|g| g.group == "None")
        .unwrap();
    assert_eq!(none_group.count, 2);
    assert!((none_group.mean - 8.5).abs() < 1e-12);
}
