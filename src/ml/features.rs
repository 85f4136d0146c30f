use crate::error::{AppError, Result};
use crate::ml::schema::{FeatureField, ModelRole, ModelSchema};
use crate::models::{ProjectInput, ProjectType};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Feature vector produced for one model role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedVector {
    role: ModelRole,
    values: Vec<f64>,
}

impl EncodedVector {
    pub fn role(&self) -> ModelRole {
        self.role
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Single-row matrix for estimators
    pub fn to_row_matrix(&self) -> Result<Array2<f64>> {
        Array2::from_shape_vec((1, self.values.len()), self.values.clone())
            .map_err(|e| AppError::Internal(format!("Failed to create feature array: {}", e)))
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

/// Maps a project input onto the ordered vector a model schema declares
#[derive(Debug, Clone, Default)]
pub struct FeatureEncoder {
    /// Reject unknown project types instead of encoding them as the
    /// reference category
    strict_project_type: bool,
}

impl FeatureEncoder {
    /// Create an encoder that maps unknown project types onto the
    /// reference category
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an encoder that rejects unknown project types
    pub fn strict() -> Self {
        Self {
            strict_project_type: true,
        }
    }

    pub fn with_strict_project_type(mut self, strict: bool) -> Self {
        self.strict_project_type = strict;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict_project_type
    }

    /// Encode an input for the given schema
    pub fn encode(&self, input: &ProjectInput, schema: &ModelSchema) -> Result<EncodedVector> {
        let project_type = self.resolve_project_type(input)?;

        let values: Vec<f64> = schema
            .fields
            .iter()
            .map(|field| Self::field_value(input, project_type, *field))
            .collect();

        if values.len() != schema.len() {
            return Err(AppError::encoding_mismatch(
                schema.role.to_string(),
                format!("encoded {} values for {} fields", values.len(), schema.len()),
            ));
        }

        Ok(EncodedVector {
            role: schema.role,
            values,
        })
    }

    /// Encode an input for the schema of a model role
    pub fn encode_for(&self, input: &ProjectInput, role: ModelRole) -> Result<EncodedVector> {
        self.encode(input, role.schema())
    }

    /// Indicator block in column order. The reference category and
    /// unrecognised values (when not strict) give all zeros.
    pub fn project_type_indicators(&self, input: &ProjectInput) -> Result<Vec<f64>> {
        let project_type = self.resolve_project_type(input)?;
        Ok(ProjectType::ENCODED
            .iter()
            .map(|encoded| Self::indicator(project_type, *encoded))
            .collect())
    }

    fn resolve_project_type(&self, input: &ProjectInput) -> Result<Option<ProjectType>> {
        match input.known_project_type() {
            Some(project_type) => Ok(Some(project_type)),
            None if self.strict_project_type => Err(AppError::InvalidInput(format!(
                "unknown project type '{}', expected one of: {}",
                input.project_type,
                ProjectType::names().join(", ")
            ))),
            None => {
                warn!(
                    project_type = %input.project_type,
                    reference = %ProjectType::REFERENCE,
                    "Unrecognized project type encoded as reference category"
                );
                Ok(None)
            }
        }
    }

    fn indicator(project_type: Option<ProjectType>, column: ProjectType) -> f64 {
        if project_type == Some(column) {
            1.0
        } else {
            0.0
        }
    }

    fn field_value(
        input: &ProjectInput,
        project_type: Option<ProjectType>,
        field: FeatureField,
    ) -> f64 {
        match field {
            FeatureField::EstimatedCost => input.estimated_cost_usd,
            FeatureField::TimeEstimate => input.time_estimate_days as f64,
            FeatureField::ResourceAllocation => input.resource_allocation_score,
            FeatureField::RiskAssessment => input.risk_assessment_score,
            FeatureField::EnvironmentalImpact => input.environmental_impact_score,
            FeatureField::HistoricalCostDeviation => input.historical_cost_deviation_pct,
            FeatureField::StakeholderPriority => input.stakeholder_priority_score,
            FeatureField::ScopeComplexity => input.scope_complexity as f64,
            FeatureField::ProjectTypeIs(column) => Self::indicator(project_type, column),
        }
    }
}
