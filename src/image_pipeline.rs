//! Image processing pipeline module
//!
//! This module turns ProRaw DNG files into display-ready sRGB TIFFs, with
//! separate modules for RAW reading, color processing, TIFF writing, and
//! conversion orchestration.

pub mod raw;
pub mod color;
pub mod tiff;
pub mod conversions;
pub mod common;

pub use common::{
    ColorPath,
    ConversionConfig,
    ConversionConfigBuilder,
    ConversionError,
    Result,
};

pub use raw::{
    CameraMetadata,
    RawImageData,
    RawImageReader,
    RawLoaderReader,
};

pub use color::{
    BlackLevel,
    ChannelReduction,
    ColorMatrix,
    DebugLog,
    FloatBuffer,
    GammaCurve,
    PixelBuffer,
    PlanarBuffer,
    RawConverter,
};

pub use tiff::{
    RgbImageData,
    TiffCompression,
    TiffWriter,
    StandardTiffWriter,
};

pub use conversions::{
    PipelineTimings,
    RawToSrgbPipeline,
};
