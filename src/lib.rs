//! stress-lens - Lifestyle-survey stress prediction
//!
//! This crate turns self-reported lifestyle answers into a Low/High stress
//! prediction:
//! - CSV loading, categorical encoding and label derivation
//! - Stratified splitting, z-score scaling and SMOTE rebalancing
//! - Random-forest grid search and decision-threshold calibration
//! - Inference over a fitted bundle, with lifestyle recommendations
//!
//! # Modules
//!
//! ## Core
//! - [`preprocessing`] - Survey schema, encoding maps, scaler, dataset preparation
//! - [`training`] - Trees, forests, cross-validation, grid search, pipeline
//! - [`inference`] - Scoring encoded records and raw survey inputs
//!
//! ## Data
//! - [`synthetic`] - SMOTE minority oversampling
//! - [`utils`] - CSV loading
//!
//! ## Reporting
//! - [`recommendations`] - Priority-weighted lifestyle advice
//! - [`insights`] - Descriptive statistics over a prepared dataset
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Core ML modules
pub mod preprocessing;
pub mod training;
pub mod inference;

// Data processing
pub mod synthetic;
pub mod utils;

// Reporting
pub mod recommendations;
pub mod insights;

// Services
pub mod cli;

pub use error::{ErrorKind, Result, StressError};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{ErrorKind, Result, StressError};

    // Preprocessing
    pub use crate::preprocessing::{
        DatasetPreparer, EncodedRecord, EncodedTable, EncodingMapSet, StandardScaler,
        StressLevel, SurveyInput,
    };

    // Training
    pub use crate::training::{
        ParamGrid, RandomForest, ThresholdScan, TrainedModelBundle, TrainingConfig,
        TrainingPipeline,
    };

    // Inference
    pub use crate::inference::{predict, InferenceEngine, Prediction};

    // Synthetic data
    pub use crate::synthetic::{Sampler, SMOTE};

    // Reporting
    pub use crate::insights::DatasetInsights;
    pub use crate::recommendations::{recommend, Recommendation, RecommendationRules};
}
