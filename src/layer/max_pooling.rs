use crate::error::IoError;
use crate::layer::{Layer, LayerWeight};
use crate::network::serialize::LayerRecord;
use crate::tensor::{Tensor, TensorSize};

/// Max-pooling layer.
///
/// For each depth channel and each output position the layer scans the
/// corresponding `pool_size`-square input window, keeps the maximum value and
/// remembers the flat input index where it occurred. Backward routes each
/// output gradient entirely to that single winning position (winner-take-all);
/// every other position in the window contributes zero. Ties resolve to the
/// first position scanned.
///
/// Output spatial size is `floor((input - pool_size) / stride) + 1` per axis,
/// depth is preserved. No learnable parameters.
pub struct MaxPooling {
    input_size: TensorSize,
    input: Tensor,
    output: Tensor,
    gradients: Tensor,
    /// Flat input index of the window maximum, per output element in buffer order.
    max_indices: Vec<usize>,
    pool_size: usize,
    stride: usize,
}

impl MaxPooling {
    /// Creates a new max-pooling layer.
    ///
    /// # Parameters
    ///
    /// - `pool_size` - spatial size of the square pooling window
    /// - `stride` - step of the window
    /// - `input_size` - size of the input tensor
    pub fn new(pool_size: usize, stride: usize, input_size: TensorSize) -> Self {
        let output_size = TensorSize::new(
            (input_size.x - pool_size) / stride + 1,
            (input_size.y - pool_size) / stride + 1,
            input_size.z,
        );
        Self {
            input_size,
            input: Tensor::zeros(input_size),
            output: Tensor::zeros(output_size),
            gradients: Tensor::zeros(input_size),
            max_indices: vec![0; output_size.volume()],
            pool_size,
            stride,
        }
    }

    /// Pooling window size.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Window stride.
    pub fn stride(&self) -> usize {
        self.stride
    }
}

impl Layer for MaxPooling {
    fn forward(&mut self, input: &Tensor) {
        self.input = input.clone();
        let in_size = self.input_size;
        let out_size = self.output.size();

        for z in 0..out_size.z {
            for oy in 0..out_size.y {
                for ox in 0..out_size.x {
                    let mut max_value = f64::NEG_INFINITY;
                    let mut max_flat = 0;
                    for py in 0..self.pool_size {
                        for px in 0..self.pool_size {
                            let ix = ox * self.stride + px;
                            let iy = oy * self.stride + py;
                            let value = self.input.get(ix, iy, z);
                            if value > max_value {
                                max_value = value;
                                max_flat = z * in_size.x * in_size.y + iy * in_size.x + ix;
                            }
                        }
                    }
                    self.output.set(ox, oy, z, max_value);
                    let out_flat = z * out_size.x * out_size.y + oy * out_size.x + ox;
                    self.max_indices[out_flat] = max_flat;
                }
            }
        }
    }

    fn backward(&mut self, next_grad: &Tensor) {
        self.gradients.fill_zero();
        let gradients = self.gradients.as_mut_slice();
        // Overlapping windows can elect the same winner, hence accumulation.
        for (out_flat, &in_flat) in self.max_indices.iter().enumerate() {
            gradients[in_flat] += next_grad.as_slice()[out_flat];
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
        "max_pooling"
    }

    fn get_weights(&self) -> LayerWeight<'_> {
        LayerWeight::Empty
    }

    fn to_record(&self) -> Result<LayerRecord, IoError> {
        Ok(LayerRecord::MaxPooling {
            input_size: self.input_size,
            pool_size: self.pool_size,
            stride: self.stride,
        })
    }
}
