use crate::error::IoError;
use crate::layer::{FullyConnectedWeight, Layer, LayerWeight, LearningParams};
use crate::network::serialize::LayerRecord;
use crate::tensor::{Tensor, TensorSize};
use ndarray::{Array1, Array2, ArrayView1};
use rand::Rng;

/// Pluggable activation function of a [`FullyConnected`] layer: the function
/// and its derivative, evaluated on the pre-activation value.
///
/// # Variants
///
/// - `Identity` - `f(x) = x` (the default)
/// - `Sigmoid` - logistic function
/// - `Tanh` - hyperbolic tangent
/// - `Custom` - caller-supplied function and derivative; cannot be persisted
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActivationFn {
    Identity,
    Sigmoid,
    Tanh,
    Custom {
        f: fn(f64) -> f64,
        df: fn(f64) -> f64,
    },
}

impl ActivationFn {
    /// Applies the activation function to a pre-activation value.
    pub fn apply(&self, v: f64) -> f64 {
        match self {
            ActivationFn::Identity => v,
            ActivationFn::Sigmoid => 1.0 / (1.0 + (-v).exp()),
            ActivationFn::Tanh => v.tanh(),
            ActivationFn::Custom { f, .. } => f(v),
        }
    }

    /// Evaluates the derivative at a pre-activation value.
    pub fn derivative(&self, v: f64) -> f64 {
        match self {
            ActivationFn::Identity => 1.0,
            ActivationFn::Sigmoid => {
                let s = 1.0 / (1.0 + (-v).exp());
                s * (1.0 - s)
            }
            ActivationFn::Tanh => {
                let t = v.tanh();
                1.0 - t * t
            }
            ActivationFn::Custom { df, .. } => df(v),
        }
    }

    /// Stable name used in persisted network documents.
    pub fn name(&self) -> &'static str {
        match self {
            ActivationFn::Identity => "identity",
            ActivationFn::Sigmoid => "sigmoid",
            ActivationFn::Tanh => "tanh",
            ActivationFn::Custom { .. } => "custom",
        }
    }

    /// Resolves a persisted name back to an activation function; `None` for
    /// unknown names (custom functions are not representable by name).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "identity" => Some(ActivationFn::Identity),
            "sigmoid" => Some(ActivationFn::Sigmoid),
            "tanh" => Some(ActivationFn::Tanh),
            _ => None,
        }
    }
}

/// Fully-connected layer.
///
/// Flattens its 3-D input into a vector `x` of length `input_size.volume()`,
/// computes `z = W·x + b` with a `(neurons, inputs)` weight matrix, applies the
/// configured [`ActivationFn`] elementwise and exposes the result as a
/// `(neurons, 1, 1)` tensor. Weights are initialized uniformly in
/// `±1/sqrt(inputs)` from the passed random source, biases start at zero.
///
/// # Example
/// ```rust
/// use convnet::prelude::*;
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let mut rng = StdRng::seed_from_u64(42);
/// let mut fc = FullyConnected::new(TensorSize::new(2, 1, 1), 2, &mut rng);
/// fc.set_activation(ActivationFn::Tanh);
/// assert_eq!(fc.output_size(), TensorSize::new(2, 1, 1));
/// ```
pub struct FullyConnected {
    input_size: TensorSize,
    input: Tensor,
    output: Tensor,
    gradients: Tensor,
    /// Pre-activation values cached by the forward pass for the backward pass.
    raw_output: Array1<f64>,
    weights: Array2<f64>,
    bias: Array1<f64>,
    weight_gradients: Array2<f64>,
    bias_gradients: Array1<f64>,
    weight_velocities: Array2<f64>,
    bias_velocities: Array1<f64>,
    activation: ActivationFn,
    params: LearningParams,
}

impl FullyConnected {
    /// Creates a new fully-connected layer with `neurons` outputs and the
    /// identity activation.
    pub fn new<R: Rng>(input_size: TensorSize, neurons: usize, rng: &mut R) -> Self {
        let inputs = input_size.volume();
        let limit = 1.0 / (inputs as f64).sqrt();
        let weights =
            Array2::from_shape_fn((neurons, inputs), |_| rng.random_range(-limit..limit));
        let bias = Array1::zeros(neurons);

        Self::from_parts(input_size, neurons, weights, bias, ActivationFn::Identity)
            .expect("freshly initialized weights always match the layer geometry")
    }

    /// Rebuilds a fully-connected layer from explicit parameters, as found in
    /// a persisted network document.
    ///
    /// # Returns
    ///
    /// - `Ok(Self)` - the reconstructed layer
    /// - `Err(IoError::FormatError)` - weight or bias dimensions do not agree
    pub fn from_parts(
        input_size: TensorSize,
        neurons: usize,
        weights: Array2<f64>,
        bias: Array1<f64>,
        activation: ActivationFn,
    ) -> Result<Self, IoError> {
        let inputs = input_size.volume();
        if weights.dim() != (neurons, inputs) {
            return Err(IoError::FormatError(format!(
                "fully connected weights of shape {:?} do not match expected ({}, {})",
                weights.dim(),
                neurons,
                inputs
            )));
        }
        if bias.len() != neurons {
            return Err(IoError::FormatError(format!(
                "fully connected bias of length {} does not match {} neurons",
                bias.len(),
                neurons
            )));
        }

        Ok(Self {
            input_size,
            input: Tensor::zeros(input_size),
            output: Tensor::new(neurons, 1, 1),
            gradients: Tensor::zeros(input_size),
            raw_output: Array1::zeros(neurons),
            weight_gradients: Array2::zeros((neurons, inputs)),
            bias_gradients: Array1::zeros(neurons),
            weight_velocities: Array2::zeros((neurons, inputs)),
            bias_velocities: Array1::zeros(neurons),
            weights,
            bias,
            activation,
            params: LearningParams::default(),
        })
    }

    /// Sets the activation function applied after the linear transform.
    pub fn set_activation(&mut self, activation: ActivationFn) {
        self.activation = activation;
    }

    /// Overrides the learning rate and momentum for this layer.
    pub fn set_learning_params(&mut self, params: LearningParams) {
        self.params = params;
    }

    /// Replaces the weight matrix and bias vector (make it carefully).
    ///
    /// # Panics
    ///
    /// Panics if the dimensions differ from the current ones.
    pub fn set_weights(&mut self, weights: Array2<f64>, bias: Array1<f64>) {
        assert_eq!(weights.dim(), self.weights.dim(), "weight shape mismatch");
        assert_eq!(bias.len(), self.bias.len(), "bias length mismatch");
        self.weights = weights;
        self.bias = bias;
    }

    /// Borrows the weight matrix.
    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    /// Borrows the bias vector.
    pub fn bias(&self) -> &Array1<f64> {
        &self.bias
    }

    /// Borrows the accumulated weight gradients.
    pub fn weight_gradients(&self) -> &Array2<f64> {
        &self.weight_gradients
    }

    /// Borrows the accumulated bias gradients.
    pub fn bias_gradients(&self) -> &Array1<f64> {
        &self.bias_gradients
    }

    /// The configured activation function.
    pub fn activation(&self) -> ActivationFn {
        self.activation
    }
}

impl Layer for FullyConnected {
    fn forward(&mut self, input: &Tensor) {
        self.input = input.clone();
        let x = ArrayView1::from(self.input.as_slice());
        self.raw_output = self.weights.dot(&x) + &self.bias;

        for (out, &z) in self
            .output
            .as_mut_slice()
            .iter_mut()
            .zip(self.raw_output.iter())
        {
            *out = self.activation.apply(z);
        }
    }

    fn backward(&mut self, next_grad: &Tensor) {
        let neurons = self.bias.len();
        let inputs = self.input_size.volume();
        let x = self.input.as_slice();
        let incoming = next_grad.as_slice();

        let delta: Vec<f64> = (0..neurons)
            .map(|j| incoming[j] * self.activation.derivative(self.raw_output[j]))
            .collect();

        for j in 0..neurons {
            for i in 0..inputs {
                self.weight_gradients[[j, i]] += delta[j] * x[i];
            }
            self.bias_gradients[j] += delta[j];
        }

        let gradients = self.gradients.as_mut_slice();
        for i in 0..inputs {
            let mut sum = 0.0;
            for j in 0..neurons {
                sum += delta[j] * self.weights[[j, i]];
            }
            gradients[i] = sum;
        }
    }

    fn update_parameters(&mut self) {
        let LearningParams {
            learning_rate,
            momentum,
        } = self.params;

        for ((w, v), g) in self
            .weights
            .iter_mut()
            .zip(self.weight_velocities.iter_mut())
            .zip(self.weight_gradients.iter_mut())
        {
            *v = momentum * *v - learning_rate * *g;
            *w += *v;
            *g = 0.0;
        }
        for ((b, v), g) in self
            .bias
            .iter_mut()
            .zip(self.bias_velocities.iter_mut())
            .zip(self.bias_gradients.iter_mut())
        {
            *v = momentum * *v - learning_rate * *g;
            *b += *v;
            *g = 0.0;
        }
    }

    fn input_size(&self) -> TensorSize {
        self.input_size
    }

    fn output_size(&self) -> TensorSize {
        self.output.size()
    }

    fn output(&self) -> &Tensor {
        &self.output
    }

    fn gradients(&self) -> &Tensor {
        &self.gradients
    }

    fn layer_type(&self) -> &str {
        "fully_connected"
    }

    fn param_count(&self) -> usize {
        self.weights.len() + self.bias.len()
    }

    fn get_weights(&self) -> LayerWeight<'_> {
        LayerWeight::FullyConnected(FullyConnectedWeight {
            weights: &self.weights,
            bias: &self.bias,
        })
    }

    fn to_record(&self) -> Result<LayerRecord, IoError> {
        if let ActivationFn::Custom { .. } = self.activation {
            return Err(IoError::FormatError(
                "custom activation functions cannot be serialized".to_string(),
            ));
        }
        Ok(LayerRecord::FullyConnected {
            input_size: self.input_size,
            neurons: self.bias.len(),
            weights: self
                .weights
                .outer_iter()
                .map(|row| row.to_vec())
                .collect(),
            bias: self.bias.to_vec(),
            activation: self.activation.name().to_string(),
        })
    }
}
