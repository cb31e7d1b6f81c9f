//! Data preprocessing module
//!
//! Survey-specific preparation:
//! - Column schema and the derived High/Low stress label
//! - Categorical label encoding with guarded unknown-category handling
//! - Z-score feature scaling
//! - Dataset preparation (null dropping, encoding, labelling)

pub mod schema;
mod encoder;
mod scaler;
mod dataset;

pub use schema::{StressLevel, SurveyInput, SurveyRecord};
pub use encoder::{EncodingMap, EncodingMapSet, EncodedRecord};
pub use scaler::StandardScaler;
pub use dataset::{
    encode_records, extract_records, DatasetPreparer, EncodedTable, PreparationSummary,
    PreparedDataset,
};
