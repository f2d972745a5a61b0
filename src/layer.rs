/// Module that contains the elementwise activation layer family (ReLU, Leaky ReLU, Sigmoid, Tanh)
pub mod activation;
/// Module that contains the sliding-window convolution layer
pub mod convolution;
/// Module that contains the fully-connected layer and its pluggable activation functions
pub mod fully_connected;
/// Module that contains the max-pooling layer with winner-take-all gradient routing
pub mod max_pooling;

pub use activation::{Activation, ActivationKind};
pub use convolution::Convolution;
pub use fully_connected::{ActivationFn, FullyConnected};
pub use max_pooling::MaxPooling;

use crate::error::IoError;
use crate::network::serialize::LayerRecord;
use crate::tensor::{Tensor, TensorSize};
use ndarray::{Array1, Array2};

/// Hyperparameters of the momentum update rule shared by the learnable layers.
///
/// The update applied to every learnable parameter is
/// `velocity = momentum * velocity - learning_rate * gradient; parameter += velocity`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LearningParams {
    pub learning_rate: f64,
    pub momentum: f64,
}

impl Default for LearningParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            momentum: 0.6,
        }
    }
}

/// Defines the interface every layer of a [`crate::network::Network`] implements.
///
/// A layer exclusively owns its input, output and gradient tensors; forward and
/// backward calls overwrite them in place. Output size of layer `i` must equal
/// input size of layer `i + 1` — the network does not re-validate this at
/// runtime, it is enforced by the caller at construction time.
pub trait Layer {
    /// Performs forward propagation, retaining the input for gradient
    /// computation and overwriting the owned output tensor.
    fn forward(&mut self, input: &Tensor);

    /// Performs backward propagation given the gradient tensor from the next
    /// layer (shaped like this layer's output). Fills the owned input-gradient
    /// tensor and, for learnable layers, accumulates parameter gradients.
    /// No parameter is mutated here.
    fn backward(&mut self, next_grad: &Tensor);

    /// Applies the momentum update to learnable parameters and resets the
    /// parameter-gradient accumulators. No-op for layers without parameters.
    fn update_parameters(&mut self) {}

    /// Returns the input size fixed at construction.
    fn input_size(&self) -> TensorSize;

    /// Returns the output size fixed at construction.
    fn output_size(&self) -> TensorSize;

    /// Borrows the output of the last forward pass.
    fn output(&self) -> &Tensor;

    /// Borrows the gradients with respect to this layer's input
    /// (for the previous layer to consume).
    fn gradients(&self) -> &Tensor;

    /// Returns the type name of the layer (e.g., "fully_connected").
    fn layer_type(&self) -> &str;

    /// Returns the total number of trainable parameters in the layer.
    fn param_count(&self) -> usize {
        0
    }

    /// Borrows the learnable parameters for inspection.
    fn get_weights(&self) -> LayerWeight<'_> {
        LayerWeight::Empty
    }

    /// Produces the serializable snapshot of this layer: kind tag, shape
    /// metadata and every learnable parameter.
    fn to_record(&self) -> Result<LayerRecord, IoError>;
}

/// Borrowed view over a layer's learnable parameters.
///
/// # Variants
///
/// - `Convolution` - filter kernels and per-filter biases
/// - `FullyConnected` - weight matrix and bias vector
/// - `Empty` - the layer owns no learnable state
pub enum LayerWeight<'a> {
    Convolution(ConvolutionWeight<'a>),
    FullyConnected(FullyConnectedWeight<'a>),
    Empty,
}

/// Weights of a [`Convolution`] layer.
pub struct ConvolutionWeight<'a> {
    pub kernels: &'a [Tensor],
    pub biases: &'a [f64],
}

/// Weights of a [`FullyConnected`] layer.
pub struct FullyConnectedWeight<'a> {
    pub weights: &'a Array2<f64>,
    pub bias: &'a Array1<f64>,
}
