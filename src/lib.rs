//! A small convolutional neural network engine in pure Rust.
//!
//! The crate provides a dense 3-D tensor, a set of composable layer types
//! (convolution, max pooling, elementwise activations, fully connected) and a
//! network container that chains layers to perform forward inference,
//! backpropagation, momentum weight updates and supervised training over
//! labeled example sets. Training is per-example stochastic gradient descent
//! (batch size 1), fully synchronous and single-threaded, with in-place
//! mutation of layer state.
//!
//! Randomness is always explicit: layer constructors and the training loop
//! take a `rand::Rng`, so runs reproduce exactly from a seeded generator.
//!
//! # Example
//! ```rust
//! use convnet::prelude::*;
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let mut rng = StdRng::seed_from_u64(42);
//!
//! // 8x8 grayscale input -> conv -> relu -> pool -> 2 classes
//! let conv = Convolution::new(4, 3, 1, TensorSize::new(8, 8, 1), &mut rng);
//! let relu = Activation::relu(conv.output_size());
//! let pool = MaxPooling::new(2, 2, relu.output_size());
//! let fc = FullyConnected::new(pool.output_size(), 2, &mut rng);
//!
//! let mut net = Network::new();
//! net.add(conv).add(relu).add(pool).add(fc);
//! net.summary();
//!
//! net.feed_forward(&Tensor::new(8, 8, 1));
//! println!("{}", net.output());
//! ```

/// Module `error` contains the engine's error taxonomy: shape and length
/// mismatches surfaced at call boundaries, and I/O errors from persisting or
/// restoring a trained network.
pub mod error;

/// Module `tensor` contains the dense 3-D tensor, the uniform value type
/// flowing between layers, with coordinate accessors, bulk loaders and the
/// mean-squared-error loss signal.
pub mod tensor;

/// Module `layer` contains the polymorphic [`layer::Layer`] capability and its
/// four concrete kinds:
///
/// - [`layer::Convolution`] - sliding-window convolution with stride
/// - [`layer::MaxPooling`] - pooling with max-index tracking and
///   winner-take-all gradient routing
/// - [`layer::Activation`] - elementwise ReLU / Leaky ReLU / Sigmoid / Tanh
/// - [`layer::FullyConnected`] - dense layer with a pluggable activation
///   function
pub mod layer;

/// Module `network` contains the [`network::Network`] orchestrator driving
/// forward passes, backpropagation and parameter updates across an ordered
/// layer sequence, the supervised training loop, and JSON export/import of a
/// trained network.
pub mod network;

/// A convenience module that re-exports the most commonly used types of this
/// crate, enabling quick access with a single `use` statement.
pub mod prelude;

pub use error::{IoError, NetworkError};

#[cfg(test)]
mod test;
