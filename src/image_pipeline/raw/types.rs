//! RAW image data types

use crate::image_pipeline::color::{AnalogBalance, BlackLevel, ColorMatrix};

/// Calibration metadata the color stages need
#[derive(Debug, Clone, PartialEq)]
pub struct CameraMetadata {
    /// XYZ to camera-native matrix (DNG ColorMatrix2)
    pub xyz_to_cam: ColorMatrix,
    /// Camera-native to sRGB' matrix, when the decoder provides one
    pub cam_to_srgb: Option<ColorMatrix>,
    /// Per-channel analog gain (identity when absent from the file)
    pub analog_balance: AnalogBalance,
    /// Sensor black level
    pub black_level: BlackLevel,
}

impl Default for CameraMetadata {
    fn default() -> Self {
        Self {
            xyz_to_cam: ColorMatrix::identity(),
            cam_to_srgb: None,
            analog_balance: AnalogBalance::default(),
            black_level: BlackLevel::default(),
        }
    }
}

/// Represents decoded RAW image data
#[derive(Debug, Clone)]
pub struct RawImageData {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// Demosaiced samples, interleaved with `cpp` components per pixel
    pub data: Vec<u16>,
    /// Components per pixel (3 for RGB, 4 for R, G1, B, G2)
    pub cpp: usize,
    /// Actual bits per sample from the sensor (e.g., 12, 14, or 16)
    pub bits_per_sample: u32,
    /// Color calibration taken from the file
    pub metadata: CameraMetadata,
}
