use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Failed to read input file: {0}")]
    InputReadError(String),
    
    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),
    
    #[error("Failed to decode RAW image: {0}")]
    DecodeError(String),
    
    #[error("Failed to encode TIFF image: {0}")]
    EncodeError(String),
    
    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),
    
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Color matrix is singular (determinant={determinant})")]
    SingularColorMatrix { determinant: f32 },

    #[error("Stretch rate must be within [0, 1], got {0}")]
    InvalidStretchRate(f32),

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("Gamma max value must be non-zero, got {0}")]
    InvalidMaxValue(u16),

    #[error("No camera to sRGB matrix available for the direct color path")]
    MissingColorMatrix,
    
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConversionError>;
