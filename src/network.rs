/// Module that contains the persisted-network document types
pub mod serialize;

use crate::error::{IoError, NetworkError};
use crate::layer::Layer;
use crate::tensor::Tensor;
use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use serde_json::{from_reader, to_writer_pretty};
use std::fs::File;
use std::io::{BufWriter, Write};

use serialize::NetworkDocument;

/// An ordered sequence of layers driven end to end: forward inference,
/// backpropagation with per-layer momentum updates, and supervised training
/// over labeled example sets.
///
/// The network owns no data beyond the layer sequence — all state lives in the
/// layers. Output size of layer `i` must equal input size of layer `i + 1`;
/// this structural invariant is the caller's responsibility at construction
/// time and is not re-validated at runtime.
///
/// # Example
/// ```rust
/// use convnet::prelude::*;
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let mut rng = StdRng::seed_from_u64(42);
///
/// let mut first = FullyConnected::new(TensorSize::new(2, 1, 1), 2, &mut rng);
/// first.set_activation(ActivationFn::Tanh);
/// let mut second = FullyConnected::new(first.output_size(), 1, &mut rng);
/// second.set_activation(ActivationFn::Tanh);
///
/// let mut net = Network::new();
/// net.add(first).add(second);
///
/// net.feed_forward(&Tensor::from_flat(2, 1, 1, &[1.0, 0.0]));
/// println!("{}", net.output());
/// ```
pub struct Network {
    layers: Vec<Box<dyn Layer>>,
}

impl Network {
    /// Creates a new empty network.
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Adds a layer to the end of the sequence.
    ///
    /// Supports method chaining pattern
    ///
    /// # Returns
    ///
    /// * `&mut Network` - Mutable reference to self for method chaining
    pub fn add<L: 'static + Layer>(&mut self, layer: L) -> &mut Self {
        self.layers.push(Box::new(layer));
        self
    }

    /// Borrows the layer sequence.
    pub fn layers(&self) -> &[Box<dyn Layer>] {
        &self.layers
    }

    /// Threads `input` forward through every layer in sequence order; each
    /// layer's output becomes the next layer's input.
    pub fn feed_forward(&mut self, input: &Tensor) {
        let mut current = input.clone();
        for layer in &mut self.layers {
            layer.forward(&current);
            current = layer.output().clone();
        }
    }

    /// Borrows the output of the last layer.
    ///
    /// # Panics
    ///
    /// Panics if the network has no layers.
    pub fn output(&self) -> &Tensor {
        self.layers
            .last()
            .expect("network has no layers")
            .output()
    }

    /// Backpropagates the mean-squared-error gradient of `desired` against the
    /// last forward pass, threading gradients through the layers in reverse
    /// order, then applies every layer's parameter update.
    ///
    /// # Returns
    ///
    /// - `Ok(())` - gradients propagated and parameters updated
    /// - `Err(NetworkError::ShapeMismatch)` - `desired` does not match the
    ///   last layer's output shape; no gradient is computed
    ///
    /// # Panics
    ///
    /// Panics if the network has no layers.
    pub fn backpropagate(&mut self, desired: &Tensor) -> Result<(), NetworkError> {
        let output = self.output().clone();
        if !desired.same_shape(&output) {
            return Err(NetworkError::ShapeMismatch(format!(
                "desired output of size {} does not match network output of size {}",
                desired.size(),
                output.size()
            )));
        }

        let mut grad = &output - desired;
        for layer in self.layers.iter_mut().rev() {
            layer.backward(&grad);
            grad = layer.gradients().clone();
        }

        // Updates are independent once every gradient is fixed.
        for layer in &mut self.layers {
            layer.update_parameters();
        }
        Ok(())
    }

    /// Trains the network with per-example stochastic gradient descent
    /// (batch size 1, no mini-batching).
    ///
    /// Shuffles the paired training sequences once up front and again at the
    /// start of every epoch, then feeds each example forward and
    /// backpropagates the loss (which also updates weights). After all epochs
    /// the aggregate mean-squared error is accumulated over the full training
    /// set and the full held-out test set with no further weight updates.
    ///
    /// # Parameters
    ///
    /// - `inputs` / `desired` - paired training examples, shuffled in place
    /// - `test_inputs` / `test_desired` - paired held-out examples
    /// - `epochs` - number of passes over the training data
    /// - `rng` - random source for shuffling
    ///
    /// # Returns
    ///
    /// - `Ok((f64, f64))` - summed training error and summed test error
    /// - `Err(NetworkError::LengthMismatch)` - a pair of sequences differs in
    ///   length; no forward or backward pass is performed
    /// - `Err(NetworkError::ShapeMismatch)` - a desired tensor does not match
    ///   the network output shape
    pub fn train<R: Rng>(
        &mut self,
        inputs: &mut [Tensor],
        desired: &mut [Tensor],
        test_inputs: &[Tensor],
        test_desired: &[Tensor],
        epochs: usize,
        rng: &mut R,
    ) -> Result<(f64, f64), NetworkError> {
        if inputs.len() != desired.len() {
            return Err(NetworkError::LengthMismatch(format!(
                "number of inputs ({}) not equal to number of desired ({})",
                inputs.len(),
                desired.len()
            )));
        }
        if test_inputs.len() != test_desired.len() {
            return Err(NetworkError::LengthMismatch(format!(
                "number of test inputs ({}) not equal to number of test desired ({})",
                test_inputs.len(),
                test_desired.len()
            )));
        }

        // Initial shuffling of input data
        shuffle_paired(inputs, desired, rng);

        let progress_bar = ProgressBar::new(epochs as u64);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} | {msg}")
                .expect("Failed to set progress bar template")
                .progress_chars("█▓░"),
        );

        for epoch in 0..epochs {
            // Shuffle training data every epoch
            shuffle_paired(inputs, desired, rng);

            for (input, target) in inputs.iter().zip(desired.iter()) {
                self.feed_forward(input);
                self.backpropagate(target)?;
            }

            progress_bar.set_message(format!("epoch {}", epoch + 1));
            progress_bar.inc(1);
        }
        progress_bar.finish_with_message("Training completed");

        let mut train_error = 0.0;
        for (input, target) in inputs.iter().zip(desired.iter()) {
            self.feed_forward(input);
            train_error += target.mse(self.output())?;
        }

        let mut test_error = 0.0;
        for (input, target) in test_inputs.iter().zip(test_desired.iter()) {
            self.feed_forward(input);
            test_error += target.mse(self.output())?;
        }

        Ok((train_error, test_error))
    }

    /// Prints a summary of the network's structure
    ///
    /// Displays each layer's information and parameter statistics in a tabular format
    pub fn summary(&self) {
        let col1_width = 33;
        let col2_width = 24;
        let col3_width = 15;
        println!("Network:");
        println!(
            "┏{}┳{}┳{}┓",
            "━".repeat(col1_width),
            "━".repeat(col2_width),
            "━".repeat(col3_width)
        );
        println!(
            "┃ {:<31} ┃ {:<22} ┃ {:>13} ┃",
            "Layer (type)", "Output Shape", "Param #"
        );
        println!(
            "┡{}╇{}╇{}┩",
            "━".repeat(col1_width),
            "━".repeat(col2_width),
            "━".repeat(col3_width)
        );

        let mut total_params: usize = 0;
        for (i, layer) in self.layers.iter().enumerate() {
            let layer_name = if i == 0 {
                "Layer".to_string()
            } else {
                format!("Layer_{}", i)
            };
            let param_count = layer.param_count();
            total_params += param_count;

            println!(
                "│ {:<31} │ {:<22} │ {:>13} │",
                format!("{} ({})", layer_name, layer.layer_type()),
                layer.output_size().to_string(),
                param_count
            );
        }
        println!(
            "└{}┴{}┴{}┘",
            "─".repeat(col1_width),
            "─".repeat(col2_width),
            "─".repeat(col3_width)
        );
        // Using f64, each parameter is 8 bytes
        println!(" Total params: {} ({} B)", total_params, total_params * 8);
    }

    /// Saves the network topology and every learnable parameter to a JSON
    /// document at `path`.
    ///
    /// # Returns
    ///
    /// - `Ok(())` - network successfully saved to file
    /// - `Err(IoError::StdIoError)` - file creation or write operation failed
    /// - `Err(IoError::JsonError)` - serialization to JSON failed
    /// - `Err(IoError::FormatError)` - a layer cannot be represented in the
    ///   document (custom activation function)
    pub fn save_to_path(&self, path: &str) -> Result<(), IoError> {
        let mut records = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            records.push(layer.to_record()?);
        }
        let document = NetworkDocument { layers: records };

        let file = File::create(path).map_err(IoError::StdIoError)?;
        let mut writer = BufWriter::new(file);
        to_writer_pretty(&mut writer, &document).map_err(IoError::JsonError)?;
        writer.flush().map_err(IoError::StdIoError)?;

        Ok(())
    }

    /// Reconstructs a network from a JSON document written by
    /// [`Network::save_to_path`]: layers are rebuilt in the same order with
    /// the same parameter values, bit for bit.
    ///
    /// # Returns
    ///
    /// - `Ok(Network)` - the reconstructed network
    /// - `Err(IoError::StdIoError)` - file not found or read operation failed
    /// - `Err(IoError::JsonError)` - deserialization from JSON failed
    /// - `Err(IoError::FormatError)` - the document does not describe a valid
    ///   network; no partially constructed network is returned
    pub fn load_from_path(path: &str) -> Result<Network, IoError> {
        let reader = IoError::load_in_buf_reader(path)?;
        let document: NetworkDocument = from_reader(reader).map_err(IoError::JsonError)?;

        let mut layers = Vec::with_capacity(document.layers.len());
        for record in document.layers {
            layers.push(serialize::build_layer(record)?);
        }
        Ok(Network { layers })
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

/// In-place Fisher–Yates shuffle of two paired slices: index `i` is swapped
/// with a uniformly chosen index in `[0, i]` in both slices.
fn shuffle_paired<R: Rng>(inputs: &mut [Tensor], desired: &mut [Tensor], rng: &mut R) {
    for i in 0..inputs.len() {
        let j = rng.random_range(0..=i);
        inputs.swap(i, j);
        desired.swap(i, j);
    }
}
