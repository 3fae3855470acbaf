//! The trained crop classifier.
//!
//! `crop_model.json` holds one of two model families, tagged by `kind`:
//!
//! * `forest`: one or more CART trees in flat-array form (a single decision
//!   tree is a forest of one).  Leaf class weights are normalized per tree,
//!   averaged over the forest, and the most probable class wins.
//! * `linear`: a multinomial linear model (`coef . x + intercept`, argmax).
//!
//! Both carry `classes`, the output codes in column order.  Codes index into
//! the `Crop_Type` encoder.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of model inputs: soil, season, water, irrigation.
pub const N_FEATURES: usize = 4;

/// One row of model input, in training column order.
pub type FeatureVector = [f64; N_FEATURES];

// ---------------------------------------------------------------------------
// ModelError
// ---------------------------------------------------------------------------

/// Structural defects found while validating a loaded model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("model expects {found} features, the form provides {expected}")]
    FeatureCount { expected: usize, found: usize },

    #[error("model has no output classes")]
    NoClasses,

    #[error("forest has no trees")]
    NoTrees,

    #[error("tree {tree}: {reason}")]
    Tree { tree: usize, reason: String },

    #[error("linear model: {0}")]
    Linear(String),
}

// ---------------------------------------------------------------------------
// Classifier trait
// ---------------------------------------------------------------------------

/// A deterministic single-row classifier.
///
/// Implementations must be `Send + Sync`; the loaded model is shared
/// read-only behind an `Arc` for the whole process.
pub trait Classifier: Send + Sync {
    /// Predict the output class code for one feature row.
    ///
    /// The returned code is whatever the model was trained with; callers are
    /// responsible for checking it against the output encoder.
    fn predict(&self, features: &FeatureVector) -> i64;

    /// Output codes the model can produce.
    fn classes(&self) -> &[i64];

    /// Short description for logging.
    fn describe(&self) -> String;
}

// ---------------------------------------------------------------------------
// ModelArtifact
// ---------------------------------------------------------------------------

/// Deserialized form of `crop_model.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Forest(TreeEnsemble),
    Linear(LinearModel),
}

impl ModelArtifact {
    /// Validate the artifact and turn it into a shareable classifier.
    pub fn into_classifier(self) -> Result<Box<dyn Classifier>, ModelError> {
        match self {
            ModelArtifact::Forest(m) => {
                m.validate()?;
                Ok(Box::new(m))
            }
            ModelArtifact::Linear(m) => {
                m.validate()?;
                Ok(Box::new(m))
            }
        }
    }
}

fn check_feature_count(found: usize) -> Result<(), ModelError> {
    if found != N_FEATURES {
        return Err(ModelError::FeatureCount {
            expected: N_FEATURES,
            found,
        });
    }
    Ok(())
}

/// Index of the largest score; the lowest index wins ties.
fn argmax(scores: &[f64]) -> usize {
    let mut best = 0;
    for (i, &s) in scores.iter().enumerate().skip(1) {
        if s > scores[best] {
            best = i;
        }
    }
    best
}

// ---------------------------------------------------------------------------
// Decision trees
// ---------------------------------------------------------------------------

/// Leaf marker in `children_left` / `children_right`.
const LEAF: i64 = -1;

/// One CART tree in flat-array form.
///
/// Node `i` is a leaf when `children_left[i] == -1`.  Otherwise a row goes
/// left when `x[feature[i]] <= threshold[i]`.  `value[i]` holds per-class
/// weights (only read at leaves).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

impl DecisionTree {
    fn node_count(&self) -> usize {
        self.children_left.len()
    }

    fn validate(&self, n_classes: usize) -> Result<(), String> {
        let n = self.node_count();
        if n == 0 {
            return Err("tree has no nodes".into());
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err("node arrays have different lengths".into());
        }

        for i in 0..n {
            let (l, r) = (self.children_left[i], self.children_right[i]);
            if l == LEAF {
                if self.value[i].len() != n_classes {
                    return Err(format!(
                        "leaf {i} has {} class weights, expected {n_classes}",
                        self.value[i].len()
                    ));
                }
                continue;
            }
            // Children always come after their parent; this also rules out
            // cycles.
            for child in [l, r] {
                if child <= i as i64 || child >= n as i64 {
                    return Err(format!("node {i} has invalid child {child}"));
                }
            }
            let f = self.feature[i];
            if f < 0 || f >= N_FEATURES as i64 {
                return Err(format!("node {i} splits on unknown feature {f}"));
            }
            if !self.threshold[i].is_finite() {
                return Err(format!("node {i} has a non-finite threshold"));
            }
        }
        Ok(())
    }

    /// Walk the tree and return the leaf reached by `x`.
    fn leaf(&self, x: &FeatureVector) -> usize {
        let mut node = 0usize;
        while self.children_left[node] != LEAF {
            let f = self.feature[node] as usize;
            node = if x[f] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        node
    }

    /// Normalized class probabilities at the leaf reached by `x`.
    fn proba(&self, x: &FeatureVector) -> Vec<f64> {
        let weights = &self.value[self.leaf(x)];
        let total: f64 = weights.iter().sum();
        if total > 0.0 {
            weights.iter().map(|w| w / total).collect()
        } else {
            vec![0.0; weights.len()]
        }
    }
}

/// A forest of [`DecisionTree`]s voting with averaged probabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub n_features: usize,
    pub classes: Vec<i64>,
    pub trees: Vec<DecisionTree>,
}

impl TreeEnsemble {
    pub fn validate(&self) -> Result<(), ModelError> {
        check_feature_count(self.n_features)?;
        if self.classes.is_empty() {
            return Err(ModelError::NoClasses);
        }
        if self.trees.is_empty() {
            return Err(ModelError::NoTrees);
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.classes.len())
                .map_err(|reason| ModelError::Tree { tree: i, reason })?;
        }
        Ok(())
    }

    /// Averaged class probabilities, in `classes` order.
    pub fn predict_proba(&self, x: &FeatureVector) -> Vec<f64> {
        let mut acc = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (a, p) in acc.iter_mut().zip(tree.proba(x)) {
                *a += p;
            }
        }
        let n = self.trees.len() as f64;
        acc.iter_mut().for_each(|a| *a /= n);
        acc
    }
}

impl Classifier for TreeEnsemble {
    fn predict(&self, features: &FeatureVector) -> i64 {
        self.classes[argmax(&self.predict_proba(features))]
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn describe(&self) -> String {
        format!(
            "forest ({} trees, {} classes)",
            self.trees.len(),
            self.classes.len()
        )
    }
}

// ---------------------------------------------------------------------------
// Linear model
// ---------------------------------------------------------------------------

/// Multinomial linear classifier.
///
/// With two classes a single coefficient row is accepted; a positive score
/// then selects `classes[1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    pub n_features: usize,
    pub classes: Vec<i64>,
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

impl LinearModel {
    pub fn validate(&self) -> Result<(), ModelError> {
        check_feature_count(self.n_features)?;
        if self.classes.is_empty() {
            return Err(ModelError::NoClasses);
        }
        if self.classes.len() == 1 {
            return Err(ModelError::Linear(
                "a linear model needs at least two classes".into(),
            ));
        }
        let binary = self.classes.len() == 2 && self.coef.len() == 1;
        if !binary && self.coef.len() != self.classes.len() {
            return Err(ModelError::Linear(format!(
                "{} coefficient rows for {} classes",
                self.coef.len(),
                self.classes.len()
            )));
        }
        if self.intercept.len() != self.coef.len() {
            return Err(ModelError::Linear(format!(
                "{} intercepts for {} coefficient rows",
                self.intercept.len(),
                self.coef.len()
            )));
        }
        if let Some(i) = self.coef.iter().position(|row| row.len() != N_FEATURES) {
            return Err(ModelError::Linear(format!(
                "coefficient row {i} has the wrong width"
            )));
        }
        Ok(())
    }

    fn scores(&self, x: &FeatureVector) -> Vec<f64> {
        self.coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, b)| row.iter().zip(x).map(|(w, v)| w * v).sum::<f64>() + b)
            .collect()
    }
}

impl Classifier for LinearModel {
    fn predict(&self, features: &FeatureVector) -> i64 {
        let scores = self.scores(features);
        if scores.len() == 1 {
            return if scores[0] > 0.0 {
                self.classes[1]
            } else {
                self.classes[0]
            };
        }
        self.classes[argmax(&scores)]
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn describe(&self) -> String {
        format!("linear ({} classes)", self.classes.len())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Root splits on water (feature 2): <= 0.0 → leaf 1, else leaf 2.
    fn stump(left: Vec<f64>, right: Vec<f64>) -> DecisionTree {
        DecisionTree {
            children_left: vec![1, LEAF, LEAF],
            children_right: vec![2, LEAF, LEAF],
            feature: vec![2, -2, -2],
            threshold: vec![0.0, -2.0, -2.0],
            value: vec![vec![1.0, 1.0], left, right],
        }
    }

    fn forest(trees: Vec<DecisionTree>) -> TreeEnsemble {
        TreeEnsemble {
            n_features: N_FEATURES,
            classes: vec![0, 1],
            trees,
        }
    }

    #[test]
    fn single_tree_follows_threshold() {
        let m = forest(vec![stump(vec![5.0, 0.0], vec![0.0, 3.0])]);
        m.validate().unwrap();
        assert_eq!(m.predict(&[0.0, 0.0, -1.0, 0.0]), 0);
        assert_eq!(m.predict(&[0.0, 0.0, 0.0, 0.0]), 0, "equal goes left");
        assert_eq!(m.predict(&[0.0, 0.0, 0.5, 0.0]), 1);
    }

    #[test]
    fn forest_averages_normalized_leaves() {
        // Tree A strongly favours class 0 by count, tree B mildly favours 1,
        // but after normalization B's 0.9 outweighs A's 0.6.
        let a = stump(vec![60.0, 40.0], vec![60.0, 40.0]);
        let b = stump(vec![1.0, 9.0], vec![1.0, 9.0]);
        let m = forest(vec![a, b]);
        let p = m.predict_proba(&[0.0; N_FEATURES]);
        assert!((p[0] - 0.35).abs() < 1e-12);
        assert!((p[1] - 0.65).abs() < 1e-12);
        assert_eq!(m.predict(&[0.0; N_FEATURES]), 1);
    }

    #[test]
    fn ties_pick_lowest_class_index() {
        let m = forest(vec![stump(vec![1.0, 1.0], vec![1.0, 1.0])]);
        assert_eq!(m.predict(&[0.0; N_FEATURES]), 0);
    }

    #[test]
    fn rejects_wrong_feature_count() {
        let mut m = forest(vec![stump(vec![1.0, 0.0], vec![0.0, 1.0])]);
        m.n_features = 3;
        assert_eq!(
            m.validate(),
            Err(ModelError::FeatureCount {
                expected: 4,
                found: 3
            })
        );
    }

    #[test]
    fn rejects_backward_child() {
        let mut t = stump(vec![1.0, 0.0], vec![0.0, 1.0]);
        t.children_left[0] = 0;
        let err = forest(vec![t]).validate().unwrap_err();
        assert!(matches!(err, ModelError::Tree { tree: 0, .. }));
    }

    #[test]
    fn rejects_unknown_split_feature() {
        let mut t = stump(vec![1.0, 0.0], vec![0.0, 1.0]);
        t.feature[0] = 7;
        assert!(forest(vec![t]).validate().is_err());
    }

    #[test]
    fn rejects_narrow_leaf() {
        let t = stump(vec![1.0], vec![0.0, 1.0]);
        assert!(forest(vec![t]).validate().is_err());
    }

    #[test]
    fn rejects_empty_forest() {
        assert_eq!(forest(vec![]).validate(), Err(ModelError::NoTrees));
    }

    #[test]
    fn linear_multiclass_argmax() {
        let m = LinearModel {
            n_features: N_FEATURES,
            classes: vec![0, 1, 2],
            coef: vec![
                vec![1.0, 0.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0, 0.0],
                vec![0.0, 0.0, 1.0, 0.0],
            ],
            intercept: vec![0.0, 0.0, 0.0],
        };
        m.validate().unwrap();
        assert_eq!(m.predict(&[0.0, 0.0, 3.0, 0.0]), 2);
        assert_eq!(m.predict(&[0.0, 2.0, 1.0, 0.0]), 1);
    }

    #[test]
    fn linear_binary_single_row() {
        let m = LinearModel {
            n_features: N_FEATURES,
            classes: vec![4, 7],
            coef: vec![vec![0.0, 0.0, 1.0, 0.0]],
            intercept: vec![-1.0],
        };
        m.validate().unwrap();
        assert_eq!(m.predict(&[0.0, 0.0, 0.5, 0.0]), 4);
        assert_eq!(m.predict(&[0.0, 0.0, 1.5, 0.0]), 7);
    }

    #[test]
    fn linear_rejects_single_class() {
        let m = LinearModel {
            n_features: N_FEATURES,
            classes: vec![3],
            coef: vec![vec![0.0, 0.0, 1.0, 0.0]],
            intercept: vec![0.0],
        };
        assert!(matches!(m.validate(), Err(ModelError::Linear(_))));
    }

    #[test]
    fn linear_rejects_mismatched_intercepts() {
        let m = LinearModel {
            n_features: N_FEATURES,
            classes: vec![0, 1, 2],
            coef: vec![vec![0.0; 4], vec![0.0; 4], vec![0.0; 4]],
            intercept: vec![0.0],
        };
        assert!(matches!(m.validate(), Err(ModelError::Linear(_))));
    }

    #[test]
    fn artifact_parses_forest_json() {
        let json = r#"{
            "kind": "forest",
            "n_features": 4,
            "classes": [0, 1],
            "trees": [{
                "children_left": [-1],
                "children_right": [-1],
                "feature": [-2],
                "threshold": [-2.0],
                "value": [[0.0, 2.0]]
            }]
        }"#;
        let artifact: ModelArtifact = serde_json::from_str(json).expect("parse");
        let clf = artifact.into_classifier().expect("valid");
        assert_eq!(clf.predict(&[0.0; N_FEATURES]), 1);
        assert_eq!(clf.classes(), &[0, 1]);
    }
}
