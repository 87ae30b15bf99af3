//! Network adapter: Implementation of RiskModel for a dense feed-forward network.
//!
//! The network is exported by the training pipeline as JSON:
//!
//! ```json
//! {
//!   "input_features": ["age", "height", ...],
//!   "layers": [
//!     { "weights": [[...], ...], "bias": [...], "activation": "relu" },
//!     { "weights": [[...], ...], "bias": [0.0], "activation": "sigmoid" }
//!   ]
//! }
//! ```
//!
//! `weights` is stored row-major as `inputs x outputs`, so a layer computes
//! `activation(x . W + b)`.
//!
//! The bundled `models/cardiovascular_nn_model.json` is a placeholder fixture
//! with synthetic weights so the application starts out of the box. It is not
//! a trained classifier and its scores carry no clinical meaning. Point
//! `CARDIOLENS_MODEL_PATH` at a network exported from a trained model.

use std::path::Path;

use ndarray::{Array1, Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::domain::{FEATURE_COLUMNS, N_FEATURES};
use crate::ports::{ModelError, RiskModel};

/// Layer activation function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Sigmoid,
    Tanh,
    Linear,
}

impl Activation {
    fn apply(self, x: f64) -> f64 {
        match self {
            Self::Relu => x.max(0.0),
            Self::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Self::Tanh => x.tanh(),
            Self::Linear => x,
        }
    }
}

/// Layer as it appears in the exported JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedLayer {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    pub activation: Activation,
}

/// Network as it appears in the exported JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedNetwork {
    pub input_features: Vec<String>,
    pub layers: Vec<ExportedLayer>,
}

#[derive(Debug, Clone)]
struct DenseLayer {
    weights: Array2<f64>,
    bias: Array1<f64>,
    activation: Activation,
}

/// Dense feed-forward classifier over the encoded feature vector.
#[derive(Debug, Clone)]
pub struct DenseNetwork {
    layers: Vec<DenseLayer>,
}

impl DenseNetwork {
    /// Load and validate a network from a JSON file.
    ///
    /// # Errors
    /// Returns `ModelError::NotFound` if the file does not exist and
    /// `ModelError::Invalid` if its layout does not match the encoder.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        if !path.is_file() {
            return Err(ModelError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let exported: ExportedNetwork = serde_json::from_str(&content)?;
        let network = Self::from_exported(exported)?;

        tracing::info!(
            "Loaded model from {:?} ({} layers, {} inputs)",
            path,
            network.layers.len(),
            N_FEATURES
        );
        Ok(network)
    }

    /// Build a network from its exported form.
    ///
    /// # Errors
    /// Returns `ModelError::Invalid` on any shape or feature-order mismatch.
    pub fn from_exported(exported: ExportedNetwork) -> Result<Self, ModelError> {
        if exported.input_features.len() != N_FEATURES
            || exported
                .input_features
                .iter()
                .zip(FEATURE_COLUMNS.iter())
                .any(|(got, want)| got != want)
        {
            return Err(ModelError::Invalid(format!(
                "input_features must be {FEATURE_COLUMNS:?}, got {:?}",
                exported.input_features
            )));
        }
        if exported.layers.is_empty() {
            return Err(ModelError::Invalid("network has no layers".into()));
        }

        let mut width = N_FEATURES;
        let mut layers = Vec::with_capacity(exported.layers.len());
        for (i, layer) in exported.layers.into_iter().enumerate() {
            let dense = Self::build_layer(i, width, layer)?;
            width = dense.bias.len();
            layers.push(dense);
        }

        if width != 1 {
            return Err(ModelError::Invalid(format!(
                "final layer must produce 1 output, got {width}"
            )));
        }

        Ok(Self { layers })
    }

    fn build_layer(
        index: usize,
        inputs: usize,
        layer: ExportedLayer,
    ) -> Result<DenseLayer, ModelError> {
        if layer.weights.len() != inputs {
            return Err(ModelError::Invalid(format!(
                "layer {index}: expected {inputs} weight rows, got {}",
                layer.weights.len()
            )));
        }
        let outputs = layer.bias.len();
        if outputs == 0 {
            return Err(ModelError::Invalid(format!("layer {index}: empty bias")));
        }
        if let Some(row) = layer.weights.iter().position(|r| r.len() != outputs) {
            return Err(ModelError::Invalid(format!(
                "layer {index}: weight row {row} does not have {outputs} columns"
            )));
        }

        let flat: Vec<f64> = layer.weights.into_iter().flatten().collect();
        if flat.iter().chain(layer.bias.iter()).any(|v| !v.is_finite()) {
            return Err(ModelError::Invalid(format!(
                "layer {index}: non-finite parameter"
            )));
        }
        let weights = Array2::from_shape_vec((inputs, outputs), flat)
            .map_err(|e| ModelError::Invalid(format!("layer {index}: {e}")))?;

        Ok(DenseLayer {
            weights,
            bias: Array1::from(layer.bias),
            activation: layer.activation,
        })
    }
}

impl RiskModel for DenseNetwork {
    fn input_width(&self) -> usize {
        N_FEATURES
    }

    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array2<f64>, ModelError> {
        if features.ncols() != N_FEATURES {
            return Err(ModelError::InputShape {
                expected: N_FEATURES,
                actual: features.ncols(),
            });
        }

        let mut activations = features.to_owned();
        for layer in &self.layers {
            let mut z = activations.dot(&layer.weights);
            z += &layer.bias;
            z.mapv_inplace(|v| layer.activation.apply(v));
            activations = z;
        }

        if let Some(&bad) = activations
            .iter()
            .find(|p| !p.is_finite() || !(0.0..=1.0).contains(*p))
        {
            return Err(ModelError::OutputOutOfRange(bad));
        }

        Ok(activations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn features() -> Vec<String> {
        FEATURE_COLUMNS.iter().map(|s| (*s).to_string()).collect()
    }

    /// Single sigmoid unit reading only the age column.
    fn age_only(activation: Activation) -> ExportedNetwork {
        let mut weights = vec![vec![0.0]; N_FEATURES];
        weights[0][0] = 1.0;
        ExportedNetwork {
            input_features: features(),
            layers: vec![ExportedLayer {
                weights,
                bias: vec![0.0],
                activation,
            }],
        }
    }

    #[test]
    fn test_sigmoid_unit() {
        let net = DenseNetwork::from_exported(age_only(Activation::Sigmoid)).expect("valid");
        let mut x = Array2::zeros((2, N_FEATURES));
        x[[1, 0]] = 2.0;

        let p = net.predict(x.view()).expect("predict");
        assert_eq!(p.dim(), (2, 1));
        assert_abs_diff_eq!(p[[0, 0]], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(p[[1, 0]], 1.0 / (1.0 + (-2.0f64).exp()), epsilon = 1e-12);
    }

    #[test]
    fn test_hidden_relu_layer() {
        // age -> relu(age), relu(-age) -> sigmoid(h0 - h1) == sigmoid(age)
        let mut hidden = vec![vec![0.0, 0.0]; N_FEATURES];
        hidden[0] = vec![1.0, -1.0];
        let exported = ExportedNetwork {
            input_features: features(),
            layers: vec![
                ExportedLayer {
                    weights: hidden,
                    bias: vec![0.0, 0.0],
                    activation: Activation::Relu,
                },
                ExportedLayer {
                    weights: vec![vec![1.0], vec![-1.0]],
                    bias: vec![0.0],
                    activation: Activation::Sigmoid,
                },
            ],
        };
        let net = DenseNetwork::from_exported(exported).expect("valid");

        let mut x = Array2::zeros((1, N_FEATURES));
        x[[0, 0]] = -1.5;
        let p = net.predict(x.view()).expect("predict");
        assert_abs_diff_eq!(p[[0, 0]], 1.0 / (1.0 + 1.5f64.exp()), epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_wrong_feature_order() {
        let mut exported = age_only(Activation::Sigmoid);
        exported.input_features.swap(0, 1);
        assert!(matches!(
            DenseNetwork::from_exported(exported),
            Err(ModelError::Invalid(_))
        ));
    }

    #[test]
    fn test_rejects_shape_mismatch() {
        let mut exported = age_only(Activation::Sigmoid);
        exported.layers[0].weights.pop();
        assert!(matches!(
            DenseNetwork::from_exported(exported),
            Err(ModelError::Invalid(_))
        ));

        let mut exported = age_only(Activation::Sigmoid);
        exported.layers[0].bias = vec![0.0, 0.0];
        assert!(matches!(
            DenseNetwork::from_exported(exported),
            Err(ModelError::Invalid(_))
        ));
    }

    #[test]
    fn test_rejects_multi_output() {
        let exported = ExportedNetwork {
            input_features: features(),
            layers: vec![ExportedLayer {
                weights: vec![vec![0.0, 0.0]; N_FEATURES],
                bias: vec![0.0, 0.0],
                activation: Activation::Sigmoid,
            }],
        };
        assert!(matches!(
            DenseNetwork::from_exported(exported),
            Err(ModelError::Invalid(_))
        ));
    }

    #[test]
    fn test_input_width_checked() {
        let net = DenseNetwork::from_exported(age_only(Activation::Sigmoid)).expect("valid");
        let x = Array2::zeros((1, 5));
        assert!(matches!(
            net.predict(x.view()),
            Err(ModelError::InputShape {
                expected: 19,
                actual: 5
            })
        ));
    }

    #[test]
    fn test_linear_output_out_of_range() {
        let net = DenseNetwork::from_exported(age_only(Activation::Linear)).expect("valid");
        let mut x = Array2::zeros((1, N_FEATURES));
        x[[0, 0]] = 3.0;
        assert!(matches!(
            net.predict(x.view()),
            Err(ModelError::OutputOutOfRange(v)) if v == 3.0
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = DenseNetwork::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ModelError::NotFound(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("model.json");
        let json = serde_json::to_string(&age_only(Activation::Tanh)).expect("serialize");
        std::fs::write(&path, json).expect("write");

        let net = DenseNetwork::load(&path).expect("load");
        let mut x = Array2::zeros((1, N_FEATURES));
        x[[0, 0]] = 0.5;
        let p = net.predict(x.view()).expect("predict");
        assert_abs_diff_eq!(p[[0, 0]], 0.5f64.tanh(), epsilon = 1e-12);
    }

    #[test]
    fn test_load_malformed_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("model.json");
        std::fs::write(&path, "{\"input_features\": 3}").expect("write");
        assert!(matches!(
            DenseNetwork::load(&path),
            Err(ModelError::Serialization(_))
        ));
    }

    #[test]
    fn test_bundled_model_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("models/cardiovascular_nn_model.json");
        let net = DenseNetwork::load(&path).expect("bundled model");
        let p = net
            .predict(Array2::zeros((1, N_FEATURES)).view())
            .expect("predict");
        assert!((0.0..=1.0).contains(&p[[0, 0]]));
    }
}
