//! RAW image reader implementation using the rawloader library.
//!
//! ProRaw DNG files carry demosaiced linear RGB samples, so only decoders
//! yielding 3 or 4 components per pixel are accepted. Single-component
//! (Bayer mosaic) files are rejected rather than demosaiced.

use std::io::Cursor;

use tracing::debug;
use rawloader::{RawImage, RawImageData as RawloaderImageData};
use crate::image_pipeline::color::{BlackLevel, ColorMatrix, SRGB_FROM_XYZ_D65, matrix::mul3x3};
use crate::image_pipeline::common::error::{Result, ConversionError};
use crate::image_pipeline::raw::types::{CameraMetadata, RawImageData};
use crate::image_pipeline::raw::reader::RawImageReader;

/// RAW image reader that uses the rawloader library for decoding.
pub struct RawLoaderReader;

/// Default bit depth when no white level information is available from the RAW file.
const DEFAULT_BITS_PER_SAMPLE: u32 = 16;

/// The bit width of the u16 data type, used for calculating actual bits per sample.
const U16_BITS: u32 = 16;

impl RawImageReader for RawLoaderReader {
    /// Reads and decodes RAW image data from a byte array.
    ///
    /// This method:
    /// 1. Decodes the RAW file using rawloader
    /// 2. Converts the data to u16 format (handles both integer and float RAW data)
    /// 3. Calculates the actual bits per sample from the sensor's white level metadata
    /// 4. Collects the color matrices and black levels for the color stages
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use proraw_rs::image_pipeline::{RawImageReader, RawLoaderReader};
    ///
    /// let reader = RawLoaderReader;
    /// let raw_bytes = std::fs::read("image.dng").unwrap();
    /// let image_data = reader.read_raw(&raw_bytes).unwrap();
    /// ```
    fn read_raw(&self, data: &[u8]) -> Result<RawImageData> {
        debug!("Decoding RAW image, {} bytes", data.len());

        let decoded = rawloader::decode(&mut Cursor::new(data))
            .map_err(|e| ConversionError::DecodeError(e.to_string()))?;

        let width = decoded.width;
        let height = decoded.height;
        let cpp = decoded.cpp;

        debug!("Decoded image: {}x{}, {} components per pixel", width, height, cpp);

        if cpp != 3 && cpp != 4 {
            return Err(ConversionError::UnsupportedFormat(format!(
                "{} components per pixel (mosaiced data is not supported)",
                cpp
            )));
        }

        // Integer data is cast directly, float data (normalized 0.0-1.0) is scaled to u16 range
        let data: Vec<u16> = match decoded.data {
            RawloaderImageData::Integer(values) => values,
            RawloaderImageData::Float(values) => {
                values.iter().map(|&v| (v * u16::MAX as f32) as u16).collect()
            }
        };

        // The white level is the largest value the sensor produces, which gives its
        // real bit depth (4095 -> 12 bits, 8191 -> 13 bits).
        let max_white_level = decoded.whitelevels.iter().max().copied().unwrap_or(u16::MAX);
        let bits_per_sample = if max_white_level == 0 {
            DEFAULT_BITS_PER_SAMPLE
        } else {
            U16_BITS - max_white_level.leading_zeros()
        };

        debug!("Calculated bits_per_sample: {} (max white level: {})", bits_per_sample, max_white_level);

        let metadata = camera_metadata(&decoded.xyz_to_cam, decoded.blacklevels)?;
        debug!(
            black_level = ?metadata.black_level,
            xyz_to_cam = ?decoded.xyz_to_cam,
            cam_to_srgb = ?metadata.cam_to_srgb,
            "Camera metadata"
        );

        Ok(RawImageData {
            width,
            height,
            data,
            cpp,
            bits_per_sample,
            metadata,
        })
    }
}

/// Color calibration for the decoded file.
///
/// The camera to sRGB' matrix is sRGB'-from-XYZ times rawloader's
/// normalized pseudoinverse of `xyz_to_cam`, so camera white maps to
/// sRGB' white. A calibration matrix that cannot be inverted leaves it
/// unset.
pub(crate) fn camera_metadata(xyz_to_cam: &[[f32; 3]; 4], blacklevels: [u16; 4]) -> Result<CameraMetadata> {
    let [r, g, b, _] = blacklevels;
    let black_level = if r == g && g == b {
        BlackLevel::uniform(r)
    } else {
        BlackLevel::per_channel(&blacklevels)?
    };

    let cam_to_xyz = ColorMatrix::from_cam_to_rgb(&RawImage::normalized_pseudoinverse(*xyz_to_cam));
    let cam_to_srgb = Some(ColorMatrix(mul3x3(&SRGB_FROM_XYZ_D65, &cam_to_xyz.0)))
        .filter(|m| m.0.iter().flatten().all(|v| v.is_finite()));

    Ok(CameraMetadata {
        xyz_to_cam: ColorMatrix::from_xyz_to_cam(xyz_to_cam),
        cam_to_srgb,
        black_level,
        ..CameraMetadata::default()
    })
}
