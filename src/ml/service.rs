use crate::error::{AppError, Result};
use crate::metrics::{CONFIDENCE_SOURCE_TOTAL, PREDICTIONS_TOTAL, PREDICTION_DURATION_SECONDS};
use crate::ml::features::{EncodedVector, FeatureEncoder};
use crate::ml::models::{Confidence, ModelMetadata, Prediction};
use crate::ml::schema::ModelRole;
use crate::ml::store::{LoadedRegressor, ModelStore};
use crate::models::{FeasibilityLabel, ProjectInput};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Prediction service over the three loaded models.
///
/// Inference is synchronous and side-effect free apart from metrics; the
/// store is shared and never mutated.
#[derive(Clone)]
pub struct PredictionService {
    /// Loaded models
    store: Arc<ModelStore>,

    /// Input encoder
    encoder: FeatureEncoder,
}

impl PredictionService {
    /// Create a new prediction service
    pub fn new(store: Arc<ModelStore>, encoder: FeatureEncoder) -> Self {
        Self { store, encoder }
    }

    pub fn store(&self) -> &Arc<ModelStore> {
        &self.store
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    /// Metadata of every loaded model
    pub fn model_metadata(&self) -> Vec<ModelMetadata> {
        vec![
            self.store.metadata(ModelRole::Feasibility).clone(),
            self.store.metadata(ModelRole::Cost).clone(),
            self.store.metadata(ModelRole::Time).clone(),
        ]
    }

    /// Predict the feasibility class of a project
    pub fn predict_feasibility(&self, input: &ProjectInput) -> Result<Prediction<FeasibilityLabel>> {
        let vector = self.encoder.encode_for(input, ModelRole::Feasibility)?;
        self.classify(&vector)
    }

    /// Predict the cost of a project in USD
    pub fn predict_cost(&self, input: &ProjectInput) -> Result<Prediction<f64>> {
        let vector = self.encoder.encode_for(input, ModelRole::Cost)?;
        self.regress(&vector)
    }

    /// Predict the duration of a project in days
    pub fn predict_time(&self, input: &ProjectInput) -> Result<Prediction<f64>> {
        let vector = self.encoder.encode_for(input, ModelRole::Time)?;
        self.regress(&vector)
    }

    /// Run all three predictions for one input
    pub fn assess(&self, input: &ProjectInput) -> Result<ProjectAssessment> {
        let features = self.encoder.encode_for(input, ModelRole::Feasibility)?;
        let feasibility = self.classify(&features)?;
        let estimated_cost = self.predict_cost(input)?;
        let estimated_time = self.predict_time(input)?;

        debug!(
            project_type = %input.project_type,
            feasibility = %feasibility.value,
            cost = estimated_cost.value,
            time = estimated_time.value,
            "Assessment completed"
        );

        Ok(ProjectAssessment {
            feasibility,
            estimated_cost,
            estimated_time,
            features,
        })
    }

    /// Classify an encoded feasibility vector
    pub fn classify(&self, vector: &EncodedVector) -> Result<Prediction<FeasibilityLabel>> {
        let role = ModelRole::Feasibility;
        let _timer = PREDICTION_DURATION_SECONDS
            .with_label_values(&[role.as_ref()])
            .start_timer();

        let result = self.classify_inner(vector);
        record_outcome(role, &result);

        if let Ok(prediction) = &result {
            if let Some(confidence) = &prediction.confidence {
                let source = if confidence.is_fallback() {
                    "default"
                } else {
                    "model_probability"
                };
                CONFIDENCE_SOURCE_TOTAL.with_label_values(&[source]).inc();
            }
        }

        result
    }

    fn classify_inner(&self, vector: &EncodedVector) -> Result<Prediction<FeasibilityLabel>> {
        let loaded = self.store.feasibility();
        check_vector(vector, ModelRole::Feasibility, loaded.metadata.n_features)?;

        let x = vector.to_row_matrix()?;
        let class_index = loaded
            .model
            .predict(&x)?
            .first()
            .copied()
            .ok_or_else(|| AppError::Inference("classifier returned no prediction".to_string()))?;

        let label = FeasibilityLabel::from_class_index(class_index).ok_or_else(|| {
            AppError::Inference(format!("classifier produced unknown class {}", class_index))
        })?;

        let prediction = match loaded.model.predict_proba(&x)? {
            Some(proba) => {
                let row = proba.row(0);
                let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);

                let probabilities: HashMap<String, f64> = row
                    .iter()
                    .enumerate()
                    .filter_map(|(idx, p)| {
                        FeasibilityLabel::from_class_index(idx).map(|l| (l.to_string(), *p))
                    })
                    .collect();

                Prediction::new(label)
                    .with_confidence(Confidence::from_probability(max))
                    .with_probabilities(probabilities)
            }
            None => Prediction::new(label).with_confidence(Confidence::fallback()),
        };

        Ok(prediction)
    }

    /// Run a regressor on an encoded cost or time vector
    pub fn regress(&self, vector: &EncodedVector) -> Result<Prediction<f64>> {
        let role = vector.role();
        let loaded = self.regressor(role)?;
        let _timer = PREDICTION_DURATION_SECONDS
            .with_label_values(&[role.as_ref()])
            .start_timer();

        let result = check_vector(vector, role, loaded.metadata.n_features)
            .and_then(|_| vector.to_row_matrix())
            .and_then(|x| loaded.model.predict(&x))
            .and_then(|values| {
                values.first().copied().ok_or_else(|| {
                    AppError::Inference(format!("{} regressor returned no prediction", role))
                })
            })
            .map(Prediction::new);

        record_outcome(role, &result);
        result
    }

    fn regressor(&self, role: ModelRole) -> Result<&LoadedRegressor> {
        match role {
            ModelRole::Cost => Ok(self.store.cost()),
            ModelRole::Time => Ok(self.store.time()),
            ModelRole::Feasibility => Err(AppError::encoding_mismatch(
                role.to_string(),
                "feasibility vector passed to a regressor",
            )),
        }
    }
}

fn check_vector(vector: &EncodedVector, role: ModelRole, n_features: usize) -> Result<()> {
    if vector.role() != role {
        return Err(AppError::encoding_mismatch(
            role.to_string(),
            format!("vector was encoded for the {} model", vector.role()),
        ));
    }
    if vector.len() != n_features {
        return Err(AppError::encoding_mismatch(
            role.to_string(),
            format!("vector has {} values, model expects {}", vector.len(), n_features),
        ));
    }
    Ok(())
}

fn record_outcome<T>(role: ModelRole, result: &Result<T>) {
    let outcome = if result.is_ok() { "ok" } else { "error" };
    PREDICTIONS_TOTAL
        .with_label_values(&[role.as_ref(), outcome])
        .inc();
}

/// Combined predictions for one project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectAssessment {
    pub feasibility: Prediction<FeasibilityLabel>,
    pub estimated_cost: Prediction<f64>,
    pub estimated_time: Prediction<f64>,

    /// Feasibility vector the classifier saw, charted by the renderer
    pub features: EncodedVector,
}

impl ProjectAssessment {
    /// Confidence of the feasibility label, 0 when absent
    pub fn confidence(&self) -> f64 {
        self.feasibility
            .confidence
            .map(|c| c.value)
            .unwrap_or_default()
    }
}
