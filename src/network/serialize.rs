use crate::error::IoError;
use crate::layer::{
    Activation, ActivationFn, ActivationKind, Convolution, FullyConnected, Layer, MaxPooling,
};
use crate::tensor::{Tensor, TensorSize};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Persisted form of a whole network: an ordered list of layer records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkDocument {
    pub layers: Vec<LayerRecord>,
}

/// Persisted form of a single layer: kind tag, shape metadata and the
/// kind-specific numeric parameters.
///
/// # Variants
///
/// - `Convolution` - kernel geometry plus one flat weight buffer and one bias
///   per filter
/// - `MaxPooling` - pool window and stride only (no learnable state)
/// - `Activation` - the activation kind, including the leak coefficient for
///   Leaky ReLU
/// - `FullyConnected` - weight matrix rows, bias vector and activation name
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "layer_type", rename_all = "snake_case")]
pub enum LayerRecord {
    Convolution {
        input_size: TensorSize,
        kernel_size: usize,
        stride: usize,
        kernels: Vec<Vec<f64>>,
        biases: Vec<f64>,
    },
    MaxPooling {
        input_size: TensorSize,
        pool_size: usize,
        stride: usize,
    },
    Activation {
        input_size: TensorSize,
        kind: ActivationKind,
    },
    FullyConnected {
        input_size: TensorSize,
        neurons: usize,
        weights: Vec<Vec<f64>>,
        bias: Vec<f64>,
        activation: String,
    },
}

/// Rebuilds a boxed layer from its persisted record.
///
/// # Returns
///
/// - `Ok(Box<dyn Layer>)` - the reconstructed layer
/// - `Err(IoError::FormatError)` - the record's parameter arrays do not match
///   its declared geometry
pub(crate) fn build_layer(record: LayerRecord) -> Result<Box<dyn Layer>, IoError> {
    match record {
        LayerRecord::Convolution {
            input_size,
            kernel_size,
            stride,
            kernels,
            biases,
        } => {
            let kernel_volume = kernel_size * kernel_size * input_size.z;
            let mut tensors = Vec::with_capacity(kernels.len());
            for flat in &kernels {
                if flat.len() != kernel_volume {
                    return Err(IoError::FormatError(format!(
                        "convolution kernel has {} values, expected {}",
                        flat.len(),
                        kernel_volume
                    )));
                }
                tensors.push(Tensor::from_flat(kernel_size, kernel_size, input_size.z, flat));
            }
            let layer = Convolution::from_parts(input_size, kernel_size, stride, tensors, biases)?;
            Ok(Box::new(layer))
        }

        LayerRecord::MaxPooling {
            input_size,
            pool_size,
            stride,
        } => {
            if stride == 0 {
                return Err(IoError::FormatError(
                    "max pooling stride must be at least 1".to_string(),
                ));
            }
            if pool_size == 0 || pool_size > input_size.x || pool_size > input_size.y {
                return Err(IoError::FormatError(format!(
                    "max pooling window of size {} does not fit input of size {}",
                    pool_size, input_size
                )));
            }
            Ok(Box::new(MaxPooling::new(pool_size, stride, input_size)))
        }

        LayerRecord::Activation { input_size, kind } => {
            Ok(Box::new(Activation::new(kind, input_size)))
        }

        LayerRecord::FullyConnected {
            input_size,
            neurons,
            weights,
            bias,
            activation,
        } => {
            let inputs = input_size.volume();
            if weights.len() != neurons {
                return Err(IoError::FormatError(format!(
                    "fully connected record has {} weight rows, expected {}",
                    weights.len(),
                    neurons
                )));
            }
            let mut flat = Vec::with_capacity(neurons * inputs);
            for row in &weights {
                if row.len() != inputs {
                    return Err(IoError::FormatError(format!(
                        "fully connected weight row has {} values, expected {}",
                        row.len(),
                        inputs
                    )));
                }
                flat.extend_from_slice(row);
            }
            let weights = Array2::from_shape_vec((neurons, inputs), flat)
                .map_err(|e| IoError::FormatError(e.to_string()))?;
            let bias = Array1::from_vec(bias);
            let activation = ActivationFn::from_name(&activation).ok_or_else(|| {
                IoError::FormatError(format!("unknown activation function '{}'", activation))
            })?;

            let layer = FullyConnected::from_parts(input_size, neurons, weights, bias, activation)?;
            Ok(Box::new(layer))
        }
    }
}
