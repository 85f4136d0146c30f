use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Known construction project categories.
///
/// Variants are declared in alphabetical order of their display names; the
/// first one is the reference category of the one-hot encoding.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, EnumIter, Display,
)]
pub enum ProjectType {
    Bridge,
    Building,
    #[strum(serialize = "Power Plant")]
    #[serde(rename = "Power Plant")]
    PowerPlant,
    Road,
    #[strum(serialize = "Water Infra")]
    #[serde(rename = "Water Infra")]
    WaterInfra,
}

impl ProjectType {
    /// Category represented by an all-zero indicator block
    pub const REFERENCE: ProjectType = ProjectType::Bridge;

    /// Categories that own an indicator column, in column order
    pub const ENCODED: [ProjectType; 4] = [
        ProjectType::Building,
        ProjectType::PowerPlant,
        ProjectType::Road,
        ProjectType::WaterInfra,
    ];

    /// Resolve a submitted project type string. Matching is exact.
    pub fn resolve(raw: &str) -> Option<ProjectType> {
        ProjectType::from_str(raw).ok()
    }

    /// Display names of every known category, reference first
    pub fn names() -> Vec<String> {
        ProjectType::iter().map(|t| t.to_string()).collect()
    }
}

/// Feasibility classes produced by the feasibility classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
pub enum FeasibilityLabel {
    #[strum(serialize = "Not Feasible")]
    #[serde(rename = "Not Feasible")]
    NotFeasible,
    Feasible,
    Borderline,
}

impl FeasibilityLabel {
    /// Map a classifier class index onto its label
    pub fn from_class_index(index: usize) -> Option<FeasibilityLabel> {
        match index {
            0 => Some(FeasibilityLabel::NotFeasible),
            1 => Some(FeasibilityLabel::Feasible),
            2 => Some(FeasibilityLabel::Borderline),
            _ => None,
        }
    }

    pub fn class_index(&self) -> usize {
        match self {
            FeasibilityLabel::NotFeasible => 0,
            FeasibilityLabel::Feasible => 1,
            FeasibilityLabel::Borderline => 2,
        }
    }

    /// Number of classes the feasibility classifier must emit
    pub const fn n_classes() -> usize {
        3
    }
}

/// One project's attributes as submitted by a user.
///
/// `project_type` keeps the raw submitted string so that unknown
/// categories reach the encoder unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInput {
    pub project_type: String,
    pub estimated_cost_usd: f64,
    pub time_estimate_days: i64,
    pub resource_allocation_score: f64,
    pub risk_assessment_score: f64,
    pub environmental_impact_score: f64,
    pub historical_cost_deviation_pct: f64,
    pub stakeholder_priority_score: f64,
    pub scope_complexity: i64,
}

impl ProjectInput {
    /// Known category of this project, if the submitted string matches one
    pub fn known_project_type(&self) -> Option<ProjectType> {
        ProjectType::resolve(&self.project_type)
    }
}
