use crate::error::{AppError, Result};
use crate::ml::models::ModelType;
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smartcore::ensemble::random_forest_classifier::RandomForestClassifier;
use smartcore::ensemble::random_forest_regressor::RandomForestRegressor;
use smartcore::linalg::basic::matrix::DenseMatrix;

/// Trait for classifiers
pub trait Classifier: Send + Sync {
    /// Predict class indices, one per row
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<usize>>;

    /// Predict class probabilities (n_samples x n_classes).
    ///
    /// Returns `Ok(None)` when the estimator has no probability interface.
    fn predict_proba(&self, features: &Array2<f64>) -> Result<Option<Array2<f64>>>;

    /// Whether `predict_proba` yields probabilities
    fn supports_probabilities(&self) -> bool;

    /// Number of classes
    fn n_classes(&self) -> usize;

    /// Per-feature importances, if the estimator defines them
    fn feature_importances(&self) -> Option<Vec<f64>>;

    /// Get model type
    fn model_type(&self) -> ModelType;
}

/// Trait for regressors
pub trait Regressor: Send + Sync {
    /// Predict one value per row
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<f64>>;

    /// Per-feature importances, if the estimator defines them
    fn feature_importances(&self) -> Option<Vec<f64>>;

    /// Get model type
    fn model_type(&self) -> ModelType;
}

/// Node of an exported decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    /// Rows with `x[feature] <= threshold` go left
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Class distribution (classification) or single value (regression)
    Leaf { value: Vec<f64> },
}

/// Decision tree stored as a flat node table rooted at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Check the node table against the expected feature count and leaf width
    pub fn validate(&self, n_features: usize, leaf_width: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(format!(
                            "node {} splits on feature {} but only {} features exist",
                            idx, feature, n_features
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {} has non-finite threshold", idx));
                    }
                    for child in [left, right] {
                        if *child >= self.nodes.len() || *child == idx {
                            return Err(format!("node {} has invalid child {}", idx, child));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.len() != leaf_width {
                        return Err(format!(
                            "leaf {} holds {} values, expected {}",
                            idx,
                            value.len(),
                            leaf_width
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    /// Walk the tree for one row and return the reached leaf
    pub fn leaf(&self, row: ArrayView1<f64>) -> Result<&[f64]> {
        let mut idx = 0;
        // A valid path visits each node at most once
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { value }) => return Ok(value.as_slice()),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let x = row.get(*feature).ok_or_else(|| {
                        AppError::Inference(format!(
                            "row has {} features, tree splits on feature {}",
                            row.len(),
                            feature
                        ))
                    })?;
                    idx = if *x <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(AppError::Inference(format!(
                        "tree references missing node {}",
                        idx
                    )))
                }
            }
        }

        Err(AppError::Inference("tree traversal did not reach a leaf".to_string()))
    }

    /// Class-count leaves must be finite, non-negative and not all zero
    pub fn validate_class_counts(&self) -> std::result::Result<(), String> {
        for (idx, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Leaf { value } = node {
                if value.iter().any(|v| !v.is_finite() || *v < 0.0) {
                    return Err(format!(
                        "leaf {} holds a negative or non-finite class count",
                        idx
                    ));
                }
                if value.iter().sum::<f64>() <= 0.0 {
                    return Err(format!("leaf {} holds no class counts", idx));
                }
            }
        }
        Ok(())
    }

    fn count_splits(&self, counts: &mut [f64]) {
        for node in &self.nodes {
            if let TreeNode::Split { feature, .. } = node {
                if let Some(count) = counts.get_mut(*feature) {
                    *count += 1.0;
                }
            }
        }
    }
}

/// Split-frequency importances across a forest, normalised to sum to 1
pub fn split_frequency_importances(trees: &[DecisionTree], n_features: usize) -> Vec<f64> {
    let mut counts = vec![0.0; n_features];
    for tree in trees {
        tree.count_splits(&mut counts);
    }

    let total: f64 = counts.iter().sum();
    if total > 0.0 {
        counts.iter_mut().for_each(|c| *c /= total);
    }
    counts
}

fn check_width(features: &Array2<f64>, n_features: usize) -> Result<()> {
    if features.ncols() != n_features {
        return Err(AppError::Inference(format!(
            "model expects {} features, got {}",
            n_features,
            features.ncols()
        )));
    }
    Ok(())
}

/// Forest of exported decision trees predicting class distributions
#[derive(Debug, Clone)]
pub struct TreeEnsembleClassifier {
    trees: Vec<DecisionTree>,
    n_features: usize,
    n_classes: usize,
}

impl TreeEnsembleClassifier {
    pub fn new(trees: Vec<DecisionTree>, n_features: usize, n_classes: usize) -> Result<Self> {
        if trees.is_empty() {
            return Err(AppError::ModelUnavailable("tree ensemble has no trees".to_string()));
        }
        if n_classes == 0 {
            return Err(AppError::ModelUnavailable(
                "classifier must declare at least one class".to_string(),
            ));
        }
        for (i, tree) in trees.iter().enumerate() {
            tree.validate(n_features, n_classes)
                .and_then(|_| tree.validate_class_counts())
                .map_err(|e| AppError::ModelUnavailable(format!("tree {}: {}", i, e)))?;
        }

        Ok(Self {
            trees,
            n_features,
            n_classes,
        })
    }

    fn row_distribution(&self, row: ArrayView1<f64>) -> Result<Vec<f64>> {
        let mut proba = vec![0.0; self.n_classes];

        for tree in &self.trees {
            let leaf = tree.leaf(row)?;
            let total: f64 = leaf.iter().sum();
            if total > 0.0 {
                for (p, v) in proba.iter_mut().zip(leaf) {
                    *p += v / total;
                }
            }
        }

        let n_trees = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n_trees);
        Ok(proba)
    }
}

impl Classifier for TreeEnsembleClassifier {
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<usize>> {
        let proba = self.predict_proba(features)?.ok_or_else(|| {
            AppError::Internal("tree ensemble returned no probabilities".to_string())
        })?;

        Ok(proba
            .rows()
            .into_iter()
            .map(|row| {
                // First maximum wins on ties
                row.iter()
                    .enumerate()
                    .fold((0, f64::NEG_INFINITY), |best, (idx, &p)| {
                        if p > best.1 {
                            (idx, p)
                        } else {
                            best
                        }
                    })
                    .0
            })
            .collect())
    }

    fn predict_proba(&self, features: &Array2<f64>) -> Result<Option<Array2<f64>>> {
        check_width(features, self.n_features)?;

        let n_samples = features.nrows();
        let mut proba = Array2::zeros((n_samples, self.n_classes));

        for (i, row) in features.rows().into_iter().enumerate() {
            for (j, p) in self.row_distribution(row)?.into_iter().enumerate() {
                proba[[i, j]] = p;
            }
        }

        Ok(Some(proba))
    }

    fn supports_probabilities(&self) -> bool {
        true
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        Some(split_frequency_importances(&self.trees, self.n_features))
    }

    fn model_type(&self) -> ModelType {
        ModelType::TreeEnsemble
    }
}

/// Forest of exported decision trees averaging leaf values
#[derive(Debug, Clone)]
pub struct TreeEnsembleRegressor {
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl TreeEnsembleRegressor {
    pub fn new(trees: Vec<DecisionTree>, n_features: usize) -> Result<Self> {
        if trees.is_empty() {
            return Err(AppError::ModelUnavailable("tree ensemble has no trees".to_string()));
        }
        for (i, tree) in trees.iter().enumerate() {
            tree.validate(n_features, 1)
                .map_err(|e| AppError::ModelUnavailable(format!("tree {}: {}", i, e)))?;
        }

        Ok(Self { trees, n_features })
    }
}

impl Regressor for TreeEnsembleRegressor {
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<f64>> {
        check_width(features, self.n_features)?;

        features
            .rows()
            .into_iter()
            .map(|row| {
                let mut sum = 0.0;
                for tree in &self.trees {
                    sum += tree.leaf(row)?[0];
                }
                Ok(sum / self.trees.len() as f64)
            })
            .collect()
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        Some(split_frequency_importances(&self.trees, self.n_features))
    }

    fn model_type(&self) -> ModelType {
        ModelType::TreeEnsemble
    }
}

/// Linear regression from stored coefficients
#[derive(Debug, Clone)]
pub struct LinearRegressor {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearRegressor {
    pub fn new(coefficients: Vec<f64>, intercept: f64, n_features: usize) -> Result<Self> {
        if coefficients.len() != n_features {
            return Err(AppError::ModelUnavailable(format!(
                "linear model has {} coefficients for {} features",
                coefficients.len(),
                n_features
            )));
        }

        Ok(Self {
            coefficients,
            intercept,
        })
    }
}

impl Regressor for LinearRegressor {
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<f64>> {
        check_width(features, self.coefficients.len())?;

        let coefficients = ArrayView1::from(&self.coefficients);
        Ok(features
            .rows()
            .into_iter()
            .map(|row| row.dot(&coefficients) + self.intercept)
            .collect())
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        None
    }

    fn model_type(&self) -> ModelType {
        ModelType::Linear
    }
}

/// Number of columns a serialized smartcore forest reads: one past the
/// highest `split_feature` of any node
pub fn forest_split_width<T: Serialize>(model: &T) -> Result<usize> {
    let value = serde_json::to_value(model)
        .map_err(|e| AppError::ModelUnavailable(format!("cannot inspect forest: {}", e)))?;

    let mut highest = None;
    collect_split_features(&value, &mut highest);
    Ok(highest.map_or(0, |f| f + 1))
}

fn collect_split_features(value: &Value, highest: &mut Option<usize>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                match (key.as_str(), child.as_u64()) {
                    ("split_feature", Some(feature)) => {
                        let feature = feature as usize;
                        *highest = Some(highest.map_or(feature, |h| h.max(feature)));
                    }
                    _ => collect_split_features(child, highest),
                }
            }
        }
        Value::Array(items) => items
            .iter()
            .for_each(|item| collect_split_features(item, highest)),
        _ => {}
    }
}

fn check_forest_width<T: Serialize>(model: &T, n_features: usize) -> Result<()> {
    let width = forest_split_width(model)?;
    if width > n_features {
        return Err(AppError::ModelUnavailable(format!(
            "forest splits on feature {} but only {} features are declared",
            width - 1,
            n_features
        )));
    }
    Ok(())
}

pub(crate) fn ndarray_to_densematrix(arr: &Array2<f64>) -> DenseMatrix<f64> {
    let shape = arr.shape();
    let data: Vec<f64> = arr.iter().copied().collect();
    DenseMatrix::new(shape[0], shape[1], data, false)
}

/// smartcore random forest classifier. It exposes no class probabilities.
pub struct ForestClassifier {
    model: RandomForestClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>,
    n_features: usize,
    n_classes: usize,
}

impl ForestClassifier {
    pub fn new(
        model: RandomForestClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>,
        n_features: usize,
        n_classes: usize,
    ) -> Result<Self> {
        check_forest_width(&model, n_features)?;
        Ok(Self {
            model,
            n_features,
            n_classes,
        })
    }
}

impl Classifier for ForestClassifier {
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<usize>> {
        check_width(features, self.n_features)?;

        let x = ndarray_to_densematrix(features);
        let predictions = self
            .model
            .predict(&x)
            .map_err(|e| AppError::Inference(format!("Prediction failed: {}", e)))?;

        predictions
            .into_iter()
            .map(|label| {
                usize::try_from(label)
                    .map_err(|_| AppError::Inference(format!("negative class label {}", label)))
            })
            .collect()
    }

    fn predict_proba(&self, _features: &Array2<f64>) -> Result<Option<Array2<f64>>> {
        Ok(None)
    }

    fn supports_probabilities(&self) -> bool {
        false
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        None
    }

    fn model_type(&self) -> ModelType {
        ModelType::RandomForest
    }
}

/// smartcore random forest regressor
pub struct ForestRegressor {
    model: RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>,
    n_features: usize,
}

impl ForestRegressor {
    pub fn new(
        model: RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>,
        n_features: usize,
    ) -> Result<Self> {
        check_forest_width(&model, n_features)?;
        Ok(Self { model, n_features })
    }
}

impl Regressor for ForestRegressor {
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<f64>> {
        check_width(features, self.n_features)?;

        let x = ndarray_to_densematrix(features);
        self.model
            .predict(&x)
            .map_err(|e| AppError::Inference(format!("Prediction failed: {}", e)))
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        None
    }

    fn model_type(&self) -> ModelType {
        ModelType::RandomForest
    }
}
