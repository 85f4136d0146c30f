//! Shared fixtures for integration tests
//!
//! Model artifacts are small hand-built estimators with known outputs so
//! that tests can assert exact predictions.

#![allow(dead_code)]

use project_feasibility::config::ModelsConfig;
use project_feasibility::ml::{
    DecisionTree, EstimatorSpec, ModelArtifact, ModelRole, ModelTask, TreeNode,
};
use project_feasibility::models::ProjectInput;
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::collections::HashMap;
use std::path::Path;

/// Project used throughout the tests: a Road with risk 6
pub fn road_project() -> ProjectInput {
    ProjectInput {
        project_type: "Road".to_string(),
        estimated_cost_usd: 500_000.0,
        time_estimate_days: 120,
        resource_allocation_score: 7.0,
        risk_assessment_score: 6.0,
        environmental_impact_score: 5.0,
        historical_cost_deviation_pct: 10.0,
        stakeholder_priority_score: 8.0,
        scope_complexity: 2,
    }
}

pub fn project(project_type: &str, risk: f64) -> ProjectInput {
    ProjectInput {
        project_type: project_type.to_string(),
        risk_assessment_score: risk,
        ..road_project()
    }
}

/// Two-tree feasibility ensemble.
///
/// Tree one splits on risk (column 3) at 5, tree two on the Road indicator
/// (column 10). For the Road project with risk 6 the averaged distribution
/// is [0.5, 0.2, 0.3]: Not Feasible with confidence 0.5.
pub fn feasibility_artifact() -> ModelArtifact {
    let risk_tree = DecisionTree {
        nodes: vec![
            TreeNode::Split {
                feature: 3,
                threshold: 5.0,
                left: 1,
                right: 2,
            },
            TreeNode::Leaf {
                value: vec![1.0, 8.0, 1.0],
            },
            TreeNode::Leaf {
                value: vec![6.0, 1.0, 3.0],
            },
        ],
    };
    let road_tree = DecisionTree {
        nodes: vec![
            TreeNode::Split {
                feature: 10,
                threshold: 0.5,
                left: 1,
                right: 2,
            },
            TreeNode::Leaf {
                value: vec![1.0, 6.0, 3.0],
            },
            TreeNode::Leaf {
                value: vec![4.0, 3.0, 3.0],
            },
        ],
    };

    ModelArtifact {
        name: "feasibility-ensemble".to_string(),
        version: "2".to_string(),
        task: ModelTask::Classification,
        feature_names: ModelRole::Feasibility.schema().field_names(),
        feature_importances: None,
        estimator: EstimatorSpec::TreeEnsemble {
            trees: vec![risk_tree, road_tree],
            n_classes: Some(3),
        },
    }
}

/// cost = 50000 * complexity + 1000 * risk + 100000 * Building
pub fn cost_artifact() -> ModelArtifact {
    let mut coefficients = vec![0.0; 10];
    coefficients[0] = 50_000.0;
    coefficients[2] = 1_000.0;
    coefficients[6] = 100_000.0;
    linear_artifact(ModelRole::Cost, coefficients, 0.0)
}

/// time = 10 * resource + 30 * complexity + 20
pub fn time_artifact() -> ModelArtifact {
    let mut coefficients = vec![0.0; 10];
    coefficients[0] = 10.0;
    coefficients[5] = 30.0;
    linear_artifact(ModelRole::Time, coefficients, 20.0)
}

pub fn linear_artifact(role: ModelRole, coefficients: Vec<f64>, intercept: f64) -> ModelArtifact {
    ModelArtifact {
        name: format!("{}-linear", role),
        version: "1".to_string(),
        task: ModelTask::Regression,
        feature_names: role.schema().field_names(),
        feature_importances: None,
        estimator: EstimatorSpec::Linear {
            coefficients,
            intercept,
        },
    }
}

/// Feasibility classifier without a probability interface
pub fn forest_feasibility_artifact() -> ModelArtifact {
    let rows: Vec<Vec<f64>> = (0..30)
        .map(|i| {
            let risk = (i % 10) as f64;
            vec![
                100_000.0 * (i % 7) as f64,
                30.0 + i as f64,
                (i % 9) as f64,
                risk,
                (i % 5) as f64,
                (i % 20) as f64,
                (i % 8) as f64,
                (i % 3) as f64,
                (i % 4 == 0) as i32 as f64,
                (i % 4 == 1) as i32 as f64,
                (i % 4 == 2) as i32 as f64,
                0.0,
            ]
        })
        .collect();
    let labels: Vec<i32> = (0..30).map(|i| (i % 3) as i32).collect();

    let x = DenseMatrix::from_2d_vec(&rows);
    let model = RandomForestClassifier::fit(&x, &labels, RandomForestClassifierParameters::default())
        .expect("forest fits");

    ModelArtifact {
        name: "feasibility-forest".to_string(),
        version: "1".to_string(),
        task: ModelTask::Classification,
        feature_names: ModelRole::Feasibility.schema().field_names(),
        feature_importances: None,
        estimator: EstimatorSpec::RandomForestClassifier {
            n_classes: 3,
            model,
        },
    }
}

/// Feasibility forest trained on 16 columns whose label follows the last
/// one, wrapped as if it read the 12 feasibility columns
pub fn wide_forest_feasibility_artifact() -> ModelArtifact {
    let rows: Vec<Vec<f64>> = (0..30)
        .map(|i| {
            let mut row = vec![1.0; 16];
            row[15] = (i % 3) as f64;
            row
        })
        .collect();
    let labels: Vec<i32> = (0..30).map(|i| (i % 3) as i32).collect();

    let x = DenseMatrix::from_2d_vec(&rows);
    let model = RandomForestClassifier::fit(&x, &labels, RandomForestClassifierParameters::default())
        .expect("forest fits");

    ModelArtifact {
        name: "feasibility-wide-forest".to_string(),
        version: "1".to_string(),
        task: ModelTask::Classification,
        feature_names: ModelRole::Feasibility.schema().field_names(),
        feature_importances: None,
        estimator: EstimatorSpec::RandomForestClassifier {
            n_classes: 3,
            model,
        },
    }
}

/// Write the three default fixture artifacts and return a matching config
pub fn write_models(dir: &Path) -> ModelsConfig {
    write_models_with(dir, feasibility_artifact())
}

/// Write fixture artifacts with a custom feasibility model
pub fn write_models_with(dir: &Path, feasibility: ModelArtifact) -> ModelsConfig {
    let config = ModelsConfig {
        dir: dir.to_path_buf(),
        ..ModelsConfig::default()
    };

    feasibility
        .write_to(&config.feasibility_path())
        .expect("write feasibility artifact");
    cost_artifact()
        .write_to(&config.cost_path())
        .expect("write cost artifact");
    time_artifact()
        .write_to(&config.time_path())
        .expect("write time artifact");

    config
}

/// Metric lines of a Prometheus exposition, keyed by metric family
pub fn parse_prometheus_output(output: &str) -> HashMap<String, Vec<String>> {
    let mut metrics: HashMap<String, Vec<String>> = HashMap::new();
    let mut family = String::new();

    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(rest) = line.strip_prefix("# TYPE ") {
            family = rest.split_whitespace().next().unwrap_or_default().to_string();
        } else if !line.starts_with('#') && !family.is_empty() {
            metrics.entry(family.clone()).or_default().push(line.to_string());
        }
    }

    metrics
}

/// Labels of a sample line: `name{a="1",b="2"} 3` gives {a: 1, b: 2}
pub fn extract_labels(line: &str) -> HashMap<String, String> {
    let inner = match (line.find('{'), line.find('}')) {
        (Some(start), Some(end)) if start < end => &line[start + 1..end],
        _ => return HashMap::new(),
    };

    inner
        .split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().trim_matches('"').to_string()))
        .collect()
}

/// Value of a sample line
pub fn extract_metric_value(line: &str) -> Option<f64> {
    line.split_whitespace().last()?.parse().ok()
}
