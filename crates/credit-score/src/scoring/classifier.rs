use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use super::features::{FeatureKey, MODEL_FEATURE_ORDER};

/// Trained model seam consumed by the analyzer and the scoring service.
///
/// Importances are aligned positionally with [`MODEL_FEATURE_ORDER`].
pub trait Classifier: Send + Sync {
    fn predict(&self, features: &[f64]) -> Result<f64, ClassifierError>;

    fn feature_importances(&self) -> &[f64];
}

/// Pairs each model feature with its importance, in model order.
pub fn importance_pairs(importances: &[f64]) -> impl Iterator<Item = (FeatureKey, f64)> + '_ {
    MODEL_FEATURE_ORDER
        .iter()
        .copied()
        .zip(importances.iter().copied())
}

#[derive(Debug, Deserialize)]
struct ModelArtifact {
    feature_names: Vec<String>,
    classes: Vec<f64>,
    #[serde(default)]
    base_score: f64,
    trees: Vec<Tree>,
    feature_importances: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct Tree {
    #[serde(default)]
    class_index: usize,
    nodes: Vec<Node>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        yes: usize,
        no: usize,
        #[serde(default)]
        missing: Option<usize>,
    },
    Leaf {
        leaf: f64,
    },
}

impl Tree {
    fn leaf_value(&self, features: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { leaf } => return *leaf,
                Node::Split {
                    feature,
                    threshold,
                    yes,
                    no,
                    missing,
                } => {
                    let value = features[*feature];
                    index = if value.is_nan() {
                        missing.unwrap_or(*yes)
                    } else if value < *threshold {
                        *yes
                    } else {
                        *no
                    };
                }
            }
        }
    }
}

/// Gradient-boosted tree ensemble evaluated from a JSON model dump.
///
/// Multi-class models carry one tree group per class and predict the class with the largest
/// summed margin. Two-class models carry a single group and predict the second class when the
/// margin is positive.
#[derive(Debug)]
pub struct TreeEnsembleClassifier {
    classes: Vec<f64>,
    base_score: f64,
    groups: usize,
    trees: Vec<Tree>,
    importances: Vec<f64>,
}

impl TreeEnsembleClassifier {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ClassifierError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let model = Self::from_reader(BufReader::new(file))?;
        info!(
            path = %path.display(),
            trees = model.trees.len(),
            classes = model.classes.len(),
            "credit model loaded"
        );
        Ok(model)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ClassifierError> {
        let artifact: ModelArtifact = serde_json::from_reader(reader)?;
        Self::from_artifact(artifact)
    }

    pub fn from_json(json: &str) -> Result<Self, ClassifierError> {
        let artifact: ModelArtifact = serde_json::from_str(json)?;
        Self::from_artifact(artifact)
    }

    fn from_artifact(artifact: ModelArtifact) -> Result<Self, ClassifierError> {
        check_feature_order(&artifact.feature_names)?;
        check_importances(&artifact.feature_importances)?;

        if artifact.classes.len() < 2 {
            return Err(ClassifierError::Classes(artifact.classes.len()));
        }
        let groups = if artifact.classes.len() == 2 {
            1
        } else {
            artifact.classes.len()
        };

        for (tree_index, tree) in artifact.trees.iter().enumerate() {
            check_tree(tree_index, tree, groups)?;
        }

        Ok(Self {
            classes: artifact.classes,
            base_score: artifact.base_score,
            groups,
            trees: artifact.trees,
            importances: artifact.feature_importances,
        })
    }

    pub fn classes(&self) -> &[f64] {
        &self.classes
    }
}

impl Classifier for TreeEnsembleClassifier {
    fn predict(&self, features: &[f64]) -> Result<f64, ClassifierError> {
        if features.len() != MODEL_FEATURE_ORDER.len() {
            return Err(ClassifierError::InputLength {
                expected: MODEL_FEATURE_ORDER.len(),
                found: features.len(),
            });
        }

        let mut margins = vec![self.base_score; self.groups];
        for tree in &self.trees {
            margins[tree.class_index] += tree.leaf_value(features);
        }

        let class = if self.groups == 1 {
            usize::from(margins[0] > 0.0)
        } else {
            margins
                .iter()
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |best, (index, &margin)| {
                    if margin > best.1 {
                        (index, margin)
                    } else {
                        best
                    }
                })
                .0
        };

        Ok(self.classes[class])
    }

    fn feature_importances(&self) -> &[f64] {
        &self.importances
    }
}

fn check_feature_order(names: &[String]) -> Result<(), ClassifierError> {
    if names.len() != MODEL_FEATURE_ORDER.len() {
        return Err(ClassifierError::FeatureCount {
            expected: MODEL_FEATURE_ORDER.len(),
            found: names.len(),
        });
    }

    for (position, (name, expected)) in names.iter().zip(MODEL_FEATURE_ORDER).enumerate() {
        if name != expected.as_str() {
            return Err(ClassifierError::FeatureOrder {
                position,
                expected,
                found: name.clone(),
            });
        }
    }
    Ok(())
}

fn check_importances(importances: &[f64]) -> Result<(), ClassifierError> {
    if importances.len() != MODEL_FEATURE_ORDER.len() {
        return Err(ClassifierError::FeatureCount {
            expected: MODEL_FEATURE_ORDER.len(),
            found: importances.len(),
        });
    }
    if importances
        .iter()
        .any(|weight| !weight.is_finite() || *weight < 0.0)
    {
        return Err(ClassifierError::Importances(
            "weights must be finite and non-negative".to_string(),
        ));
    }
    let total: f64 = importances.iter().sum();
    if total > 1.0 + 1e-6 {
        return Err(ClassifierError::Importances(format!(
            "weights sum to {total:.6}, expected at most 1"
        )));
    }
    Ok(())
}

fn check_tree(tree_index: usize, tree: &Tree, groups: usize) -> Result<(), ClassifierError> {
    let invalid = |reason: String| ClassifierError::Tree {
        tree: tree_index,
        reason,
    };

    if tree.nodes.is_empty() {
        return Err(invalid("tree has no nodes".to_string()));
    }
    if tree.class_index >= groups {
        return Err(invalid(format!(
            "class index {} exceeds {groups} tree group(s)",
            tree.class_index
        )));
    }

    for (index, node) in tree.nodes.iter().enumerate() {
        if let Node::Split {
            feature,
            threshold,
            yes,
            no,
            missing,
        } = node
        {
            if *feature >= MODEL_FEATURE_ORDER.len() {
                return Err(invalid(format!("node {index} splits on unknown feature {feature}")));
            }
            if !threshold.is_finite() {
                return Err(invalid(format!("node {index} has a non-finite threshold")));
            }
            // Children must come later in the node list, which also rules out cycles.
            for child in [Some(*yes), Some(*no), *missing].into_iter().flatten() {
                if child <= index || child >= tree.nodes.len() {
                    return Err(invalid(format!(
                        "node {index} points at invalid child {child}"
                    )));
                }
            }
        }
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("unable to read model artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed model artifact: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("model expects {expected} features, artifact declares {found}")]
    FeatureCount { expected: usize, found: usize },
    #[error("feature {position} must be {expected}, artifact declares {found}")]
    FeatureOrder {
        position: usize,
        expected: FeatureKey,
        found: String,
    },
    #[error("invalid feature importances: {0}")]
    Importances(String),
    #[error("model needs at least two classes, artifact declares {0}")]
    Classes(usize),
    #[error("tree {tree} is invalid: {reason}")]
    Tree { tree: usize, reason: String },
    #[error("input vector has {found} values, model expects {expected}")]
    InputLength { expected: usize, found: usize },
}
