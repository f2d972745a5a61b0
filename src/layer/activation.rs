use crate::error::IoError;
use crate::layer::{Layer, LayerWeight};
use crate::network::serialize::LayerRecord;
use crate::tensor::{Tensor, TensorSize};
use serde::{Deserialize, Serialize};

/// The elementwise activation family, selecting both the forward transform and
/// its backward rule.
///
/// # Variants
///
/// - `ReLU` - `max(x, 0)`
/// - `LeakyReLU` - `alpha * x` for `x < 0`, `x` otherwise
/// - `Sigmoid` - `1 / (1 + e^-x)`
/// - `Tanh` - hyperbolic tangent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "function")]
pub enum ActivationKind {
    #[serde(rename = "relu")]
    ReLU,
    #[serde(rename = "leaky_relu")]
    LeakyReLU { alpha: f64 },
    #[serde(rename = "sigmoid")]
    Sigmoid,
    #[serde(rename = "tanh")]
    Tanh,
}

impl ActivationKind {
    /// Applies the forward transform to a single element.
    pub fn apply(&self, v: f64) -> f64 {
        match self {
            ActivationKind::ReLU => {
                if v < 0.0 {
                    0.0
                } else {
                    v
                }
            }
            ActivationKind::LeakyReLU { alpha } => {
                if v < 0.0 {
                    alpha * v
                } else {
                    v
                }
            }
            ActivationKind::Sigmoid => 1.0 / (1.0 + (-v).exp()),
            ActivationKind::Tanh => v.tanh(),
        }
    }

    /// Computes the gradient recorded for the previous layer, given the input
    /// value `v` seen during the forward pass and the `incoming` gradient.
    pub fn grad(&self, v: f64, incoming: f64) -> f64 {
        match self {
            ActivationKind::ReLU => {
                if v < 0.0 {
                    0.0
                } else {
                    incoming
                }
            }
            ActivationKind::LeakyReLU { alpha } => {
                // The negative branch records the bare leak coefficient, not
                // alpha * incoming. Recorded behavior; trained networks depend on it.
                if v < 0.0 {
                    *alpha
                } else {
                    1.0 * incoming
                }
            }
            ActivationKind::Sigmoid => {
                let s = 1.0 / (1.0 + (-v).exp());
                s * (1.0 - s) * incoming
            }
            ActivationKind::Tanh => {
                let t = v.tanh();
                (1.0 - t * t) * incoming
            }
        }
    }
}

/// Elementwise activation layer: input size equals output size, no learnable
/// parameters and no update step.
///
/// # Example
/// ```rust
/// use convnet::prelude::*;
///
/// let mut relu = Activation::relu(TensorSize::new(2, 1, 1));
/// relu.forward(&Tensor::from_flat(2, 1, 1, &[-1.0, 2.0]));
/// assert_eq!(relu.output().as_slice(), &[0.0, 2.0]);
/// ```
pub struct Activation {
    kind: ActivationKind,
    size: TensorSize,
    input: Tensor,
    output: Tensor,
    gradients: Tensor,
}

impl Activation {
    /// Creates an activation layer of the given kind.
    pub fn new(kind: ActivationKind, input_size: TensorSize) -> Self {
        Self {
            kind,
            size: input_size,
            input: Tensor::zeros(input_size),
            output: Tensor::zeros(input_size),
            gradients: Tensor::zeros(input_size),
        }
    }

    /// Creates a ReLU layer.
    pub fn relu(input_size: TensorSize) -> Self {
        Self::new(ActivationKind::ReLU, input_size)
    }

    /// Creates a Leaky ReLU layer; `alpha` is the leak coefficient and should
    /// be small (for example 0.01).
    pub fn leaky_relu(input_size: TensorSize, alpha: f64) -> Self {
        Self::new(ActivationKind::LeakyReLU { alpha }, input_size)
    }

    /// Creates a sigmoid layer.
    pub fn sigmoid(input_size: TensorSize) -> Self {
        Self::new(ActivationKind::Sigmoid, input_size)
    }

    /// Creates a tanh layer.
    pub fn tanh(input_size: TensorSize) -> Self {
        Self::new(ActivationKind::Tanh, input_size)
    }

    /// The configured activation kind.
    pub fn kind(&self) -> ActivationKind {
        self.kind
    }
}

impl Layer for Activation {
    fn forward(&mut self, input: &Tensor) {
        self.input = input.clone();
        for (out, &v) in self
            .output
            .as_mut_slice()
            .iter_mut()
            .zip(self.input.as_slice())
        {
            *out = self.kind.apply(v);
        }
    }

    fn backward(&mut self, next_grad: &Tensor) {
        for ((grad, &v), &incoming) in self
            .gradients
            .as_mut_slice()
            .iter_mut()
            .zip(self.input.as_slice())
            .zip(next_grad.as_slice())
        {
            *grad = self.kind.grad(v, incoming);
        }
    }

    fn input_size(&self) -> TensorSize {
        self.size
    }

    fn output_size(&self) -> TensorSize {
        self.size
    }

    fn output(&self) -> &Tensor {
        &self.output
    }

    fn gradients(&self) -> &Tensor {
        &self.gradients
    }

    fn layer_type(&self) -> &str {
        match self.kind {
            ActivationKind::ReLU => "relu",
            ActivationKind::LeakyReLU { .. } => "leaky_relu",
            ActivationKind::Sigmoid => "sigmoid",
            ActivationKind::Tanh => "tanh",
        }
    }

    fn get_weights(&self) -> LayerWeight<'_> {
        LayerWeight::Empty
    }

    fn to_record(&self) -> Result<LayerRecord, IoError> {
        Ok(LayerRecord::Activation {
            input_size: self.size,
            kind: self.kind,
        })
    }
}
