//! Camera-native to XYZ / sRGB' color space transforms.

use tracing::{debug, trace};

use crate::image_pipeline::color::buffer::{FloatBuffer, PlanarBuffer, Sample};
use crate::image_pipeline::color::matrix::{
    AnalogBalance, ColorMatrix, Mat3, SRGB_FROM_XYZ_D65, apply_matrix, invert3x3, mul3x3,
    normalize_rows,
};
use crate::image_pipeline::common::error::Result;

/// `AnalogBalance . ColorMatrix` with every row normalized to sum to 1,
/// i.e. the XYZ-to-camera map whose inverse the converter applies.
pub fn normalized_cam_from_xyz(color_matrix: &ColorMatrix, analog_balance: &AnalogBalance) -> Mat3 {
    let cam_from_xyz = mul3x3(&analog_balance.diagonal(), &color_matrix.0);
    normalize_rows(&cam_from_xyz)
}

/// Camera-to-XYZ matrix derived from calibration metadata.
pub fn xyz_from_cam(color_matrix: &ColorMatrix, analog_balance: &AnalogBalance) -> Result<Mat3> {
    let cam_from_xyz = normalized_cam_from_xyz(color_matrix, analog_balance);
    trace!(?cam_from_xyz, "Normalized XYZ to camera matrix");
    let inverse = invert3x3(&cam_from_xyz)?;
    debug!(xyz_from_cam = ?inverse, "Derived camera to XYZ matrix");
    Ok(inverse)
}

/// Converts camera-native samples to CIE D65 XYZ.
///
/// `color_matrix` maps XYZ to the camera space (DNG ColorMatrix2); it is
/// balanced, row-normalized and inverted before being applied.
pub fn camera_to_xyz<T: Sample>(
    buffer: &PlanarBuffer<T>,
    color_matrix: &ColorMatrix,
    analog_balance: &AnalogBalance,
) -> Result<FloatBuffer> {
    let m = xyz_from_cam(color_matrix, analog_balance)?;
    Ok(apply_matrix(buffer, &m))
}

/// Applies a camera-to-sRGB' matrix as is.
pub fn camera_to_srgb<T: Sample>(buffer: &PlanarBuffer<T>, color_matrix: &ColorMatrix) -> FloatBuffer {
    apply_matrix(buffer, &color_matrix.0)
}

/// Converts CIE D65 XYZ samples to linear sRGB'.
pub fn xyz_to_srgb<T: Sample>(buffer: &PlanarBuffer<T>) -> FloatBuffer {
    apply_matrix(buffer, &SRGB_FROM_XYZ_D65)
}
