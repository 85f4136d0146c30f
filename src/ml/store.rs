use crate::config::ModelsConfig;
use crate::error::{AppError, Result};
use crate::ml::artifact::ModelArtifact;
use crate::ml::estimator::{Classifier, Regressor};
use crate::ml::models::{ModelMetadata, ModelType};
use crate::ml::schema::{ModelRole, ModelTask};
use crate::models::FeasibilityLabel;
use ndarray::Array2;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tracing::info;

/// Loaded classifier with its metadata
pub struct LoadedClassifier {
    pub metadata: ModelMetadata,
    pub feature_importances: Option<Vec<f64>>,
    pub model: Box<dyn Classifier>,
}

/// Loaded regressor with its metadata
pub struct LoadedRegressor {
    pub metadata: ModelMetadata,
    pub feature_importances: Option<Vec<f64>>,
    pub model: Box<dyn Regressor>,
}

/// The three predictors, loaded once and never mutated
pub struct ModelStore {
    feasibility: LoadedClassifier,
    cost: LoadedRegressor,
    time: LoadedRegressor,
}

impl ModelStore {
    /// Load every artifact named in the configuration
    pub fn load(config: &ModelsConfig) -> Result<Self> {
        info!(dir = %config.dir.display(), "Loading model artifacts");

        let store = Self {
            feasibility: load_classifier(ModelRole::Feasibility, &config.feasibility_path())?,
            cost: load_regressor(ModelRole::Cost, &config.cost_path())?,
            time: load_regressor(ModelRole::Time, &config.time_path())?,
        };

        info!("✅ Feasibility, cost and time models loaded");
        Ok(store)
    }

    /// Assemble a store from already loaded models
    pub fn from_parts(
        feasibility: LoadedClassifier,
        cost: LoadedRegressor,
        time: LoadedRegressor,
    ) -> Result<Self> {
        for (expected, actual) in [
            (ModelRole::Feasibility, feasibility.metadata.role),
            (ModelRole::Cost, cost.metadata.role),
            (ModelRole::Time, time.metadata.role),
        ] {
            if expected != actual {
                return Err(AppError::ModelUnavailable(format!(
                    "{} model supplied where {} model expected",
                    actual, expected
                )));
            }
        }

        Ok(Self {
            feasibility,
            cost,
            time,
        })
    }

    pub fn feasibility(&self) -> &LoadedClassifier {
        &self.feasibility
    }

    pub fn cost(&self) -> &LoadedRegressor {
        &self.cost
    }

    pub fn time(&self) -> &LoadedRegressor {
        &self.time
    }

    pub fn metadata(&self, role: ModelRole) -> &ModelMetadata {
        match role {
            ModelRole::Feasibility => &self.feasibility.metadata,
            ModelRole::Cost => &self.cost.metadata,
            ModelRole::Time => &self.time.metadata,
        }
    }

    /// Feature importances of a model, in its schema order
    pub fn feature_importances(&self, role: ModelRole) -> Option<&[f64]> {
        match role {
            ModelRole::Feasibility => self.feasibility.feature_importances.as_deref(),
            ModelRole::Cost => self.cost.feature_importances.as_deref(),
            ModelRole::Time => self.time.feature_importances.as_deref(),
        }
    }
}

/// Run one all-zero row of schema width through a freshly built estimator.
///
/// Estimators that fail or panic here are reported as unavailable so the
/// fault surfaces at start-up instead of on a request.
fn trial_prediction<T>(
    role: ModelRole,
    n_features: usize,
    predict: impl FnOnce(&Array2<f64>) -> Result<T>,
) -> Result<()> {
    let row = Array2::zeros((1, n_features));
    match panic::catch_unwind(AssertUnwindSafe(|| predict(&row))) {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => Err(AppError::ModelUnavailable(format!(
            "{} model failed a trial prediction: {}",
            role, e
        ))),
        Err(_) => Err(AppError::ModelUnavailable(format!(
            "{} model panicked on a trial prediction",
            role
        ))),
    }
}

/// Artifact header fields kept after the estimator is consumed
struct ArtifactHeader {
    name: String,
    version: String,
    task: ModelTask,
    n_features: usize,
    feature_importances: Option<Vec<f64>>,
}

impl ArtifactHeader {
    fn of(artifact: &ModelArtifact) -> Self {
        Self {
            name: artifact.name.clone(),
            version: artifact.version.clone(),
            task: artifact.task,
            n_features: artifact.feature_names.len(),
            feature_importances: artifact.feature_importances.clone(),
        }
    }

    fn metadata(
        self,
        role: ModelRole,
        path: &Path,
        model_type: ModelType,
        supports_probabilities: bool,
    ) -> ModelMetadata {
        ModelMetadata {
            name: self.name,
            version: self.version,
            role,
            task: self.task,
            model_type,
            n_features: self.n_features,
            supports_probabilities,
            source: path.display().to_string(),
            loaded_at: chrono::Utc::now(),
        }
    }
}

/// Load and validate a classifier artifact for a role
pub fn load_classifier(role: ModelRole, path: &Path) -> Result<LoadedClassifier> {
    let artifact = ModelArtifact::from_path(path)?;
    classifier_from_artifact(role, artifact, path)
}

/// Validate and instantiate a classifier from an in-memory artifact
pub fn classifier_from_artifact(
    role: ModelRole,
    artifact: ModelArtifact,
    path: &Path,
) -> Result<LoadedClassifier> {
    artifact.check_against(role)?;

    let mut header = ArtifactHeader::of(&artifact);
    let model = artifact.into_classifier()?;

    if role == ModelRole::Feasibility && model.n_classes() != FeasibilityLabel::n_classes() {
        return Err(AppError::ModelUnavailable(format!(
            "feasibility classifier declares {} classes, expected {}",
            model.n_classes(),
            FeasibilityLabel::n_classes()
        )));
    }

    trial_prediction(role, header.n_features, |x| model.predict(x))?;

    let feature_importances = header
        .feature_importances
        .take()
        .or_else(|| model.feature_importances());
    let metadata = header.metadata(role, path, model.model_type(), model.supports_probabilities());

    info!(
        role = %role,
        name = %metadata.name,
        version = %metadata.version,
        model_type = %metadata.model_type,
        probabilities = metadata.supports_probabilities,
        "Loaded classifier"
    );

    Ok(LoadedClassifier {
        metadata,
        feature_importances,
        model,
    })
}

/// Load and validate a regressor artifact for a role
pub fn load_regressor(role: ModelRole, path: &Path) -> Result<LoadedRegressor> {
    let artifact = ModelArtifact::from_path(path)?;
    regressor_from_artifact(role, artifact, path)
}

/// Validate and instantiate a regressor from an in-memory artifact
pub fn regressor_from_artifact(
    role: ModelRole,
    artifact: ModelArtifact,
    path: &Path,
) -> Result<LoadedRegressor> {
    artifact.check_against(role)?;

    let mut header = ArtifactHeader::of(&artifact);
    let model = artifact.into_regressor()?;
    trial_prediction(role, header.n_features, |x| model.predict(x))?;

    let feature_importances = header
        .feature_importances
        .take()
        .or_else(|| model.feature_importances());
    let metadata = header.metadata(role, path, model.model_type(), false);

    info!(
        role = %role,
        name = %metadata.name,
        version = %metadata.version,
        model_type = %metadata.model_type,
        "Loaded regressor"
    );

    Ok(LoadedRegressor {
        metadata,
        feature_importances,
        model,
    })
}
