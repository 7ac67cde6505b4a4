//! Error types for the transform engine

use std::fmt;

/// Errors that can occur during transform computation
#[derive(Debug, Clone)]
pub enum TransformError {
    /// Invalid input parameters (non-positive sizes, out-of-bounds indices,
    /// window longer than FFT size, empty CQT/VQT input)
    InvalidParameter(String),

    /// Processing error during transform computation
    ProcessingError(String),
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            TransformError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
        }
    }
}

impl std::error::Error for TransformError {}
