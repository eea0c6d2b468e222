//! Trained ridership regression model.
//!
//! The model is shipped as a JSON artifact exported by the external training
//! job: an ordered feature-name list plus a decision-tree ensemble evaluated
//! as the mean of per-tree outputs. A one-tree artifact behaves as plain
//! regression-tree inference.

use anyhow::Result;
use serde::Deserialize;

use crate::features::FEATURE_NAMES;

/// On-disk model artifact layout.
#[derive(Debug, Deserialize)]
pub struct ModelArtifact {
    pub model_version: String,
    pub feature_names: Vec<String>,
    pub trees: Vec<Tree>,
}

#[derive(Debug, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

/// One tree node. Split nodes carry `feature`/`threshold` and child indices;
/// leaves carry only `value`.
#[derive(Debug, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub feature: Option<usize>,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default)]
    pub left: usize,
    #[serde(default)]
    pub right: usize,
    #[serde(default)]
    pub value: f64,
}

/// A loaded, validated regression model.
#[derive(Debug)]
pub struct RidershipModel {
    version: String,
    trees: Vec<Tree>,
}

impl RidershipModel {
    /// Loads and validates a model artifact from disk.
    ///
    /// # Errors
    ///
    /// A missing file yields a distinct error instructing retraining; a
    /// present-but-invalid artifact (wrong feature order, empty ensemble,
    /// out-of-range child index) is also rejected here so that evaluation
    /// never fails later.
    pub fn load(path: &str) -> Result<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(anyhow::anyhow!(
                    "Model artifact not found: {}. Run the training job to produce one.",
                    path
                ));
            }
            Err(e) => {
                return Err(anyhow::anyhow!("Failed to read model artifact {}: {}", path, e));
            }
        };

        let artifact: ModelArtifact = serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("Invalid model artifact {}: {}", path, e))?;

        Self::from_artifact(artifact)
    }

    /// Validates a parsed artifact and wraps it for inference.
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self> {
        if artifact.feature_names != FEATURE_NAMES {
            return Err(anyhow::anyhow!(
                "Model artifact feature order {:?} does not match expected {:?}",
                artifact.feature_names,
                FEATURE_NAMES
            ));
        }

        if artifact.trees.is_empty() {
            return Err(anyhow::anyhow!("Model artifact contains no trees"));
        }

        for (i, tree) in artifact.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(anyhow::anyhow!("Tree {} has no nodes", i));
            }
            for node in &tree.nodes {
                if let Some(feature) = node.feature {
                    if feature >= FEATURE_NAMES.len() {
                        return Err(anyhow::anyhow!(
                            "Tree {} references feature index {} out of range",
                            i,
                            feature
                        ));
                    }
                    if node.left >= tree.nodes.len() || node.right >= tree.nodes.len() {
                        return Err(anyhow::anyhow!("Tree {} has a child index out of range", i));
                    }
                }
            }
        }

        Ok(Self {
            version: artifact.model_version,
            trees: artifact.trees,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Evaluates the ensemble on an ordered input vector, returning the mean
    /// of per-tree predictions. Infallible after load-time validation.
    pub fn predict(&self, inputs: &[f64; 5]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| eval_tree(t, inputs)).sum();
        sum / self.trees.len() as f64
    }
}

fn eval_tree(tree: &Tree, inputs: &[f64; 5]) -> f64 {
    let mut idx = 0;
    // Step cap guards against a malformed (cyclic) artifact that slipped
    // through validation.
    for _ in 0..tree.nodes.len() {
        let node = &tree.nodes[idx];
        match node.feature {
            Some(feature) => {
                idx = if inputs[feature] <= node.threshold {
                    node.left
                } else {
                    node.right
                };
            }
            None => return node.value,
        }
    }
    tree.nodes[idx].value
}

/// Convenience over [`RidershipModel::load`] using the configured artifact path.
pub fn load_model() -> Result<RidershipModel> {
    RidershipModel::load(&crate::config::model_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(value: f64) -> Node {
        Node {
            feature: None,
            threshold: 0.0,
            left: 0,
            right: 0,
            value,
        }
    }

    fn split(feature: usize, threshold: f64, left: usize, right: usize) -> Node {
        Node {
            feature: Some(feature),
            threshold,
            left,
            right,
            value: 0.0,
        }
    }

    fn artifact(trees: Vec<Tree>) -> ModelArtifact {
        ModelArtifact {
            model_version: "v1.0".to_string(),
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            trees,
        }
    }

    #[test]
    fn test_single_leaf_tree() {
        let model = RidershipModel::from_artifact(artifact(vec![Tree {
            nodes: vec![leaf(42.0)],
        }]))
        .unwrap();

        assert_eq!(model.predict(&[8.0, 0.0, 0.0, 11.0, 120.0]), 42.0);
    }

    #[test]
    fn test_split_on_hour() {
        // hour <= 12 -> 50, else 200
        let tree = Tree {
            nodes: vec![split(0, 12.0, 1, 2), leaf(50.0), leaf(200.0)],
        };
        let model = RidershipModel::from_artifact(artifact(vec![tree])).unwrap();

        assert_eq!(model.predict(&[8.0, 0.0, 0.0, 1.0, 100.0]), 50.0);
        assert_eq!(model.predict(&[18.0, 0.0, 0.0, 1.0, 100.0]), 200.0);
    }

    #[test]
    fn test_ensemble_mean() {
        let trees = vec![
            Tree { nodes: vec![leaf(100.0)] },
            Tree { nodes: vec![leaf(200.0)] },
        ];
        let model = RidershipModel::from_artifact(artifact(trees)).unwrap();

        assert_eq!(model.predict(&[0.0, 0.0, 0.0, 1.0, 0.0]), 150.0);
    }

    #[test]
    fn test_rejects_wrong_feature_order() {
        let mut bad = artifact(vec![Tree { nodes: vec![leaf(1.0)] }]);
        bad.feature_names.swap(0, 1);

        let err = RidershipModel::from_artifact(bad).unwrap_err();
        assert!(err.to_string().contains("feature order"));
    }

    #[test]
    fn test_rejects_empty_ensemble() {
        let err = RidershipModel::from_artifact(artifact(vec![])).unwrap_err();
        assert!(err.to_string().contains("no trees"));
    }

    #[test]
    fn test_rejects_out_of_range_child() {
        let tree = Tree {
            nodes: vec![split(0, 12.0, 1, 9), leaf(50.0)],
        };
        let err = RidershipModel::from_artifact(artifact(vec![tree])).unwrap_err();
        assert!(err.to_string().contains("child index"));
    }

    #[test]
    fn test_load_missing_file_mentions_training() {
        let err = RidershipModel::load("/nonexistent/ridership_model.json").unwrap_err();
        assert!(err.to_string().contains("training"));
    }

    #[test]
    fn test_version_exposed() {
        let model = RidershipModel::from_artifact(artifact(vec![Tree {
            nodes: vec![leaf(1.0)],
        }]))
        .unwrap();
        assert_eq!(model.version(), "v1.0");
    }
}
