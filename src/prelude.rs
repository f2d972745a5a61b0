pub use crate::error::{IoError, NetworkError};
pub use crate::layer::{
    Activation, ActivationFn, ActivationKind, Convolution, ConvolutionWeight, FullyConnected,
    FullyConnectedWeight, Layer, LayerWeight, LearningParams, MaxPooling,
};
pub use crate::network::serialize::{LayerRecord, NetworkDocument};
pub use crate::network::Network;
pub use crate::tensor::{Tensor, TensorSize};
