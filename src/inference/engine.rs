//! Inference engine over a shared bundle
//!
//! Holds the fitted bundle and encoding maps behind `Arc`, so clones are cheap
//! and concurrent queries need no locking.

use super::{predict, Prediction};
use crate::error::Result;
use crate::preprocessing::{EncodingMapSet, SurveyInput};
use crate::training::TrainedModelBundle;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::debug;

/// Validates, encodes and scores raw survey answers
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    bundle: Arc<TrainedModelBundle>,
    encoders: Arc<EncodingMapSet>,
}

impl InferenceEngine {
    pub fn new(bundle: TrainedModelBundle, encoders: EncodingMapSet) -> Self {
        Self::from_shared(Arc::new(bundle), Arc::new(encoders))
    }

    pub fn from_shared(bundle: Arc<TrainedModelBundle>, encoders: Arc<EncodingMapSet>) -> Self {
        Self { bundle, encoders }
    }

    pub fn bundle(&self) -> &TrainedModelBundle {
        &self.bundle
    }

    pub fn encoders(&self) -> &EncodingMapSet {
        &self.encoders
    }

    /// Score one respondent
    pub fn predict_input(&self, input: &SurveyInput) -> Result<Prediction> {
        input.validate()?;
        let record = self.encoders.encode_input(input)?;
        let prediction = predict(&self.bundle, &record)?;
        debug!(
            level = %prediction.level,
            probability = prediction.probability,
            "Scored survey input"
        );
        Ok(prediction)
    }

    /// Score many respondents in parallel; results keep input order
    pub fn predict_batch(&self, inputs: &[SurveyInput]) -> Vec<Result<Prediction>> {
        inputs
            .par_iter()
            .map(|input| self.predict_input(input))
            .collect()
    }
}
