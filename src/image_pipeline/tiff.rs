//! TIFF writing module
//!
//! Hands the finished 16-bit RGB image to a TIFF encoder with the configured
//! compression options.

mod writer;
mod standard_tiff_writer;
pub mod types;

pub use writer::TiffWriter;
pub use standard_tiff_writer::StandardTiffWriter;
pub use types::{RgbImageData, TiffCompression};
