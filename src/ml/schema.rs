//! Training-time feature orderings, one named constant per model.
//!
//! Each model was trained on a fixed column order. The encoder reads these
//! constants and the model store checks them against the `feature_names`
//! recorded in every artifact, so an ordering mistake fails at start-up
//! instead of producing a plausible wrong prediction.

use crate::models::ProjectType;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter};

/// A single column of an encoded feature vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureField {
    EstimatedCost,
    TimeEstimate,
    ResourceAllocation,
    RiskAssessment,
    EnvironmentalImpact,
    HistoricalCostDeviation,
    StakeholderPriority,
    ScopeComplexity,
    /// Indicator column for one non-reference project type
    ProjectTypeIs(ProjectType),
}

impl FeatureField {
    /// Column name as recorded at training time
    pub fn name(&self) -> String {
        match self {
            FeatureField::EstimatedCost => "Estimated_Cost_USD".to_string(),
            FeatureField::TimeEstimate => "Time_Estimate_Days".to_string(),
            FeatureField::ResourceAllocation => "Resource_Allocation_Score".to_string(),
            FeatureField::RiskAssessment => "Risk_Assessment_Score".to_string(),
            FeatureField::EnvironmentalImpact => "Environmental_Impact_Score".to_string(),
            FeatureField::HistoricalCostDeviation => "Historical_Cost_Deviation_%".to_string(),
            FeatureField::StakeholderPriority => "Stakeholder_Priority_Score".to_string(),
            FeatureField::ScopeComplexity => "Scope_Complexity_Numeric".to_string(),
            FeatureField::ProjectTypeIs(project_type) => format!("Project_Type_{}", project_type),
        }
    }

    pub fn is_indicator(&self) -> bool {
        matches!(self, FeatureField::ProjectTypeIs(_))
    }
}

/// The three predictors the service loads
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ModelRole {
    Feasibility,
    Cost,
    Time,
}

/// Learning task an artifact was trained for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ModelTask {
    Classification,
    Regression,
}

impl ModelRole {
    pub fn schema(&self) -> &'static ModelSchema {
        match self {
            ModelRole::Feasibility => &FEASIBILITY_SCHEMA,
            ModelRole::Cost => &COST_SCHEMA,
            ModelRole::Time => &TIME_SCHEMA,
        }
    }

    pub fn task(&self) -> ModelTask {
        match self {
            ModelRole::Feasibility => ModelTask::Classification,
            ModelRole::Cost | ModelRole::Time => ModelTask::Regression,
        }
    }
}

/// Ordered field list a model expects
#[derive(Debug, PartialEq, Eq)]
pub struct ModelSchema {
    pub role: ModelRole,
    pub fields: &'static [FeatureField],
}

impl ModelSchema {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Training-time column names in order
    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(FeatureField::name).collect()
    }

    /// Position of a field in this schema
    pub fn position(&self, field: FeatureField) -> Option<usize> {
        self.fields.iter().position(|f| *f == field)
    }

    /// Compare artifact column names against this schema, reporting the
    /// first disagreement.
    pub fn check_names(&self, names: &[String]) -> std::result::Result<(), String> {
        if names.len() != self.len() {
            return Err(format!(
                "expected {} features, artifact declares {}",
                self.len(),
                names.len()
            ));
        }

        for (idx, (field, name)) in self.fields.iter().zip(names).enumerate() {
            if field.name() != *name {
                return Err(format!(
                    "feature {} should be '{}', artifact has '{}'",
                    idx,
                    field.name(),
                    name
                ));
            }
        }

        Ok(())
    }
}

const INDICATORS: [FeatureField; 4] = [
    FeatureField::ProjectTypeIs(ProjectType::Building),
    FeatureField::ProjectTypeIs(ProjectType::PowerPlant),
    FeatureField::ProjectTypeIs(ProjectType::Road),
    FeatureField::ProjectTypeIs(ProjectType::WaterInfra),
];

pub static FEASIBILITY_SCHEMA: ModelSchema = ModelSchema {
    role: ModelRole::Feasibility,
    fields: &[
        FeatureField::EstimatedCost,
        FeatureField::TimeEstimate,
        FeatureField::ResourceAllocation,
        FeatureField::RiskAssessment,
        FeatureField::EnvironmentalImpact,
        FeatureField::HistoricalCostDeviation,
        FeatureField::StakeholderPriority,
        FeatureField::ScopeComplexity,
        INDICATORS[0],
        INDICATORS[1],
        INDICATORS[2],
        INDICATORS[3],
    ],
};

pub static COST_SCHEMA: ModelSchema = ModelSchema {
    role: ModelRole::Cost,
    fields: &[
        FeatureField::ScopeComplexity,
        FeatureField::ResourceAllocation,
        FeatureField::RiskAssessment,
        FeatureField::EnvironmentalImpact,
        FeatureField::HistoricalCostDeviation,
        FeatureField::StakeholderPriority,
        INDICATORS[0],
        INDICATORS[1],
        INDICATORS[2],
        INDICATORS[3],
    ],
};

pub static TIME_SCHEMA: ModelSchema = ModelSchema {
    role: ModelRole::Time,
    fields: &[
        FeatureField::ResourceAllocation,
        FeatureField::RiskAssessment,
        FeatureField::EnvironmentalImpact,
        FeatureField::HistoricalCostDeviation,
        FeatureField::StakeholderPriority,
        FeatureField::ScopeComplexity,
        INDICATORS[0],
        INDICATORS[1],
        INDICATORS[2],
        INDICATORS[3],
    ],
};
