use std::fs::File;
use std::io::BufReader;

/// Error types surfaced by the computation engine itself
///
/// # Variants
///
/// - `ShapeMismatch` - tensor or layer dimensions do not agree (e.g. a desired-output tensor
///   whose shape differs from the last layer's output shape)
/// - `LengthMismatch` - paired training or test sequences have different lengths
///
/// Both are detected eagerly at the call boundary (training start, backpropagation start)
/// and returned to the caller; the engine never truncates or pads mismatched data.
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkError {
    ShapeMismatch(String),
    LengthMismatch(String),
}

impl std::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkError::ShapeMismatch(msg) => write!(f, "Shape mismatch: {}", msg),
            NetworkError::LengthMismatch(msg) => write!(f, "Length mismatch: {}", msg),
        }
    }
}

impl std::error::Error for NetworkError {}

/// Input/Output error types that can occur while exporting or importing a trained network
///
/// # Variants
///
/// - `StdIoError` - Wraps standard I/O errors from file system operations
/// - `JsonError` - Wraps JSON serialization/deserialization errors
/// - `FormatError` - The document parsed as JSON but does not describe a valid network
///   (wrong parameter counts, unknown activation names, inconsistent shapes)
#[derive(Debug)]
pub enum IoError {
    StdIoError(std::io::Error),
    JsonError(serde_json::Error),
    FormatError(String),
}

impl IoError {
    pub fn load_in_buf_reader(path: &str) -> Result<BufReader<File>, IoError> {
        let file = File::open(path).map_err(IoError::StdIoError)?;
        Ok(BufReader::new(file))
    }
}

impl std::fmt::Display for IoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IoError::StdIoError(e) => write!(f, "IO error: {}", e),
            IoError::JsonError(e) => write!(f, "JSON error: {}", e),
            IoError::FormatError(msg) => write!(f, "Format error: {}", msg),
        }
    }
}

impl std::error::Error for IoError {}
