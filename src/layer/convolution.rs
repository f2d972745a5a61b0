use crate::error::IoError;
use crate::layer::{ConvolutionWeight, Layer, LayerWeight, LearningParams};
use crate::network::serialize::LayerRecord;
use crate::tensor::{Tensor, TensorSize};
use rand::Rng;

/// Sliding-window convolution layer.
///
/// Each of the `filters` kernels is a `(kernel_size, kernel_size, input_depth)`
/// tensor with a scalar bias. For every valid output position the layer computes
/// the dot product of the kernel with the corresponding input window across all
/// input channels and adds the bias. Output spatial size is
/// `floor((input - kernel_size) / stride) + 1` per axis; output depth equals the
/// number of filters.
///
/// Kernels and biases are initialized uniformly in a symmetric range scaled by
/// the fan-in (`1 / sqrt(kernel_size² * input_depth)`) from the random source
/// passed to the constructor, so runs are reproducible from a seeded generator.
///
/// # Example
/// ```rust
/// use convnet::prelude::*;
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let mut rng = StdRng::seed_from_u64(42);
/// let conv = Convolution::new(4, 3, 2, TensorSize::new(7, 5, 3), &mut rng);
/// assert_eq!(conv.output_size(), TensorSize::new(3, 2, 4));
/// ```
pub struct Convolution {
    input_size: TensorSize,
    input: Tensor,
    output: Tensor,
    gradients: Tensor,
    kernels: Vec<Tensor>,
    biases: Vec<f64>,
    kernel_gradients: Vec<Tensor>,
    bias_gradients: Vec<f64>,
    kernel_velocities: Vec<Tensor>,
    bias_velocities: Vec<f64>,
    kernel_size: usize,
    stride: usize,
    params: LearningParams,
}

impl Convolution {
    /// Creates a new convolution layer.
    ///
    /// # Parameters
    ///
    /// - `filters` - number of kernels (output depth)
    /// - `kernel_size` - spatial size of the square kernels
    /// - `stride` - step of the sliding window
    /// - `input_size` - size of the input tensor
    /// - `rng` - random source for weight initialization
    pub fn new<R: Rng>(
        filters: usize,
        kernel_size: usize,
        stride: usize,
        input_size: TensorSize,
        rng: &mut R,
    ) -> Self {
        let fan_in = kernel_size * kernel_size * input_size.z;
        let limit = 1.0 / (fan_in as f64).sqrt();

        let mut kernels = Vec::with_capacity(filters);
        let mut biases = Vec::with_capacity(filters);
        for _ in 0..filters {
            let mut kernel = Tensor::new(kernel_size, kernel_size, input_size.z);
            for value in kernel.as_mut_slice() {
                *value = rng.random_range(-limit..limit);
            }
            kernels.push(kernel);
            biases.push(rng.random_range(-limit..limit));
        }

        Self::from_parts(input_size, kernel_size, stride, kernels, biases)
            .expect("freshly initialized kernels always match the layer geometry")
    }

    /// Rebuilds a convolution layer from explicit kernels and biases, as found
    /// in a persisted network document.
    ///
    /// # Returns
    ///
    /// - `Ok(Self)` - the reconstructed layer
    /// - `Err(IoError::FormatError)` - the stride is zero, the kernel does not
    ///   fit the input, or kernel shapes or counts do not agree
    pub fn from_parts(
        input_size: TensorSize,
        kernel_size: usize,
        stride: usize,
        kernels: Vec<Tensor>,
        biases: Vec<f64>,
    ) -> Result<Self, IoError> {
        if stride == 0 {
            return Err(IoError::FormatError(
                "convolution stride must be at least 1".to_string(),
            ));
        }
        if kernel_size == 0 || kernel_size > input_size.x || kernel_size > input_size.y {
            return Err(IoError::FormatError(format!(
                "convolution kernel of size {} does not fit input of size {}",
                kernel_size, input_size
            )));
        }
        if kernels.len() != biases.len() {
            return Err(IoError::FormatError(format!(
                "convolution has {} kernels but {} biases",
                kernels.len(),
                biases.len()
            )));
        }
        if kernels.is_empty() {
            return Err(IoError::FormatError(
                "convolution must have at least one filter".to_string(),
            ));
        }
        let kernel_shape = TensorSize::new(kernel_size, kernel_size, input_size.z);
        for kernel in &kernels {
            if kernel.size() != kernel_shape {
                return Err(IoError::FormatError(format!(
                    "convolution kernel of size {} does not match expected {}",
                    kernel.size(),
                    kernel_shape
                )));
            }
        }

        let filters = kernels.len();
        let output_size = TensorSize::new(
            (input_size.x - kernel_size) / stride + 1,
            (input_size.y - kernel_size) / stride + 1,
            filters,
        );
        let zero_kernels: Vec<Tensor> = kernels.iter().map(|k| Tensor::zeros(k.size())).collect();

        Ok(Self {
            input_size,
            input: Tensor::zeros(input_size),
            output: Tensor::zeros(output_size),
            gradients: Tensor::zeros(input_size),
            kernel_gradients: zero_kernels.clone(),
            kernel_velocities: zero_kernels,
            bias_gradients: vec![0.0; filters],
            bias_velocities: vec![0.0; filters],
            kernels,
            biases,
            kernel_size,
            stride,
            params: LearningParams::default(),
        })
    }

    /// Overrides the learning rate and momentum for this layer.
    pub fn set_learning_params(&mut self, params: LearningParams) {
        self.params = params;
    }

    /// Replaces the filter kernels (make it carefully).
    ///
    /// # Panics
    ///
    /// Panics if the count or any kernel shape differs from the current ones.
    pub fn set_kernels(&mut self, kernels: Vec<Tensor>) {
        assert_eq!(kernels.len(), self.kernels.len(), "filter count mismatch");
        for (new, old) in kernels.iter().zip(&self.kernels) {
            assert!(new.same_shape(old), "kernel shape mismatch");
        }
        self.kernels = kernels;
    }

    /// Replaces the per-filter biases.
    ///
    /// # Panics
    ///
    /// Panics if the count differs from the number of filters.
    pub fn set_biases(&mut self, biases: Vec<f64>) {
        assert_eq!(biases.len(), self.biases.len(), "filter count mismatch");
        self.biases = biases;
    }

    /// Borrows the filter kernels.
    pub fn kernels(&self) -> &[Tensor] {
        &self.kernels
    }

    /// Borrows the per-filter biases.
    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    /// Borrows the accumulated kernel gradients.
    pub fn kernel_gradients(&self) -> &[Tensor] {
        &self.kernel_gradients
    }

    /// Borrows the accumulated bias gradients.
    pub fn bias_gradients(&self) -> &[f64] {
        &self.bias_gradients
    }
}

impl Layer for Convolution {
    fn forward(&mut self, input: &Tensor) {
        self.input = input.clone();
        let out_size = self.output.size();
        let in_depth = self.input_size.z;

        for (f, kernel) in self.kernels.iter().enumerate() {
            for oy in 0..out_size.y {
                for ox in 0..out_size.x {
                    let mut sum = 0.0;
                    for kz in 0..in_depth {
                        for ky in 0..self.kernel_size {
                            for kx in 0..self.kernel_size {
                                let value = self.input.get(
                                    ox * self.stride + kx,
                                    oy * self.stride + ky,
                                    kz,
                                );
                                sum += value * kernel.get(kx, ky, kz);
                            }
                        }
                    }
                    self.output.set(ox, oy, f, sum + self.biases[f]);
                }
            }
        }
    }

    fn backward(&mut self, next_grad: &Tensor) {
        self.gradients.fill_zero();
        let out_size = self.output.size();
        let in_depth = self.input_size.z;

        for f in 0..self.kernels.len() {
            for oy in 0..out_size.y {
                for ox in 0..out_size.x {
                    let grad = next_grad.get(ox, oy, f);
                    self.bias_gradients[f] += grad;
                    for kz in 0..in_depth {
                        for ky in 0..self.kernel_size {
                            for kx in 0..self.kernel_size {
                                let ix = ox * self.stride + kx;
                                let iy = oy * self.stride + ky;
                                self.kernel_gradients[f]
                                    .add(kx, ky, kz, grad * self.input.get(ix, iy, kz));
                                self.gradients
                                    .add(ix, iy, kz, grad * self.kernels[f].get(kx, ky, kz));
                            }
                        }
                    }
                }
            }
        }
    }

    fn update_parameters(&mut self) {
        let LearningParams {
            learning_rate,
            momentum,
        } = self.params;

        for f in 0..self.kernels.len() {
            let weights = self.kernels[f].as_mut_slice();
            let velocities = self.kernel_velocities[f].as_mut_slice();
            let gradients = self.kernel_gradients[f].as_mut_slice();
            for i in 0..weights.len() {
                velocities[i] = momentum * velocities[i] - learning_rate * gradients[i];
                weights[i] += velocities[i];
                gradients[i] = 0.0;
            }

            self.bias_velocities[f] =
                momentum * self.bias_velocities[f] - learning_rate * self.bias_gradients[f];
            self.biases[f] += self.bias_velocities[f];
            self.bias_gradients[f] = 0.0;
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
        "convolution"
    }

    fn param_count(&self) -> usize {
        let kernel_volume = self.kernel_size * self.kernel_size * self.input_size.z;
        self.kernels.len() * kernel_volume + self.biases.len()
    }

    fn get_weights(&self) -> LayerWeight<'_> {
        LayerWeight::Convolution(ConvolutionWeight {
            kernels: &self.kernels,
            biases: &self.biases,
        })
    }

    fn to_record(&self) -> Result<LayerRecord, IoError> {
        Ok(LayerRecord::Convolution {
            input_size: self.input_size,
            kernel_size: self.kernel_size,
            stride: self.stride,
            kernels: self
                .kernels
                .iter()
                .map(|k| k.as_slice().to_vec())
                .collect(),
            biases: self.biases.clone(),
        })
    }
}
