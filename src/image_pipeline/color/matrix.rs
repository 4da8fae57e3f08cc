//! 3x3 color matrices and the camera calibration metadata they come from.

use crate::image_pipeline::color::buffer::{FloatBuffer, PlanarBuffer, Sample};
use crate::image_pipeline::common::error::{ConversionError, Result};

pub type Mat3 = [[f32; 3]; 3];

pub const IDENTITY: Mat3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// CIE XYZ (D65) to linear sRGB'. These literals are part of the output
/// contract and must not be replaced by a recomputed matrix.
pub const SRGB_FROM_XYZ_D65: Mat3 = [
    [3.079955, -1.537139, -0.542816],
    [-0.921259, 1.876011, 0.045247],
    [0.052887, -0.204026, 1.151138],
];

/// Rows whose sum is at or below this are treated as degenerate.
pub const ROW_SUM_EPSILON: f32 = 0.0000001;

const SINGULAR_EPSILON: f32 = 1e-12;

/// A linear map between camera-native and a reference color space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix(pub Mat3);

impl ColorMatrix {
    /// From an XYZ-to-camera matrix stored as in DNG ColorMatrix2 (4 rows of
    /// 3, the fourth row only used by 4-color sensors).
    pub fn from_xyz_to_cam(m: &[[f32; 3]; 4]) -> Self {
        Self([m[0], m[1], m[2]])
    }

    /// From a 3x4 camera-to-RGB matrix; the fourth column is ignored.
    pub fn from_cam_to_rgb(m: &[[f32; 4]; 3]) -> Self {
        let mut out = [[0.0; 3]; 3];
        for (dst, src) in out.iter_mut().zip(m) {
            dst.copy_from_slice(&src[..3]);
        }
        Self(out)
    }

    /// From row-major values with the given shape. 3x3, 3x4 and 4x3 are
    /// accepted; the extra column or row is dropped.
    pub fn try_from_slice(values: &[f32], rows: usize, cols: usize) -> Result<Self> {
        let shape_ok = matches!((rows, cols), (3, 3) | (3, 4) | (4, 3));
        if !shape_ok || values.len() != rows * cols {
            return Err(ConversionError::ShapeMismatch {
                expected: "3x3, 3x4 or 4x3 color matrix".to_string(),
                actual: format!("{}x{} with {} values", rows, cols, values.len()),
            });
        }
        let mut out = [[0.0; 3]; 3];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = values[i * cols + j];
            }
        }
        Ok(Self(out))
    }

    pub fn identity() -> Self {
        Self(IDENTITY)
    }
}

/// Per-channel gain applied ahead of the color matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalogBalance(pub [f32; 4]);

impl Default for AnalogBalance {
    fn default() -> Self {
        Self([1.0; 4])
    }
}

impl AnalogBalance {
    /// Accepts up to 4 factors; missing ones are 1.0.
    pub fn from_slice(values: &[f32]) -> Result<Self> {
        if values.len() > 4 {
            return Err(ConversionError::ShapeMismatch {
                expected: "at most 4 analog balance values".to_string(),
                actual: format!("{} values", values.len()),
            });
        }
        let mut out = [1.0; 4];
        out[..values.len()].copy_from_slice(values);
        Ok(Self(out))
    }

    /// Diagonal matrix built from the first three factors.
    pub fn diagonal(&self) -> Mat3 {
        let [r, g, b, _] = self.0;
        [[r, 0.0, 0.0], [0.0, g, 0.0], [0.0, 0.0, b]]
    }
}

pub fn mul3x3(a: &Mat3, b: &Mat3) -> Mat3 {
    let mut r = [[0.0_f32; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            r[i][j] = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
        }
    }
    r
}

pub fn determinant(m: &Mat3) -> f32 {
    let [a, b, c] = m[0];
    let [d, e, f] = m[1];
    let [g, h, i] = m[2];
    a * (e * i - f * h) - b * (d * i - f * g) + c * (d * h - e * g)
}

/// Inverse of `m`, or `SingularColorMatrix` when it has none.
pub fn invert3x3(m: &Mat3) -> Result<Mat3> {
    let det = determinant(m);
    if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
        return Err(ConversionError::SingularColorMatrix { determinant: det });
    }

    let [a, b, c] = m[0];
    let [d, e, f] = m[1];
    let [g, h, i] = m[2];
    let inv = 1.0 / det;

    let out = [
        [(e * i - f * h) * inv, (c * h - b * i) * inv, (b * f - c * e) * inv],
        [(f * g - d * i) * inv, (a * i - c * g) * inv, (c * d - a * f) * inv],
        [(d * h - e * g) * inv, (b * g - a * h) * inv, (a * e - b * d) * inv],
    ];
    if out.iter().flatten().any(|v| !v.is_finite()) {
        return Err(ConversionError::SingularColorMatrix { determinant: det });
    }
    Ok(out)
}

/// Scales each row to sum to 1. Rows summing to `ROW_SUM_EPSILON` or less
/// are zeroed.
pub fn normalize_rows(m: &Mat3) -> Mat3 {
    let mut out = *m;
    for row in out.iter_mut() {
        let sum: f32 = row.iter().sum();
        if ROW_SUM_EPSILON < sum {
            row.iter_mut().for_each(|v| *v /= sum);
        } else {
            *row = [0.0; 3];
        }
    }
    out
}

/// `m . buffer`, evaluated per pixel column.
pub fn apply_matrix<T: Sample>(buffer: &PlanarBuffer<T>, m: &Mat3) -> FloatBuffer {
    let n = buffer.pixel_count();
    let mut out = FloatBuffer::zeros(n);
    let (r, g, b) = (buffer.channel(0), buffer.channel(1), buffer.channel(2));
    for (ch, row) in m.iter().enumerate() {
        let dst = out.channel_mut(ch);
        for i in 0..n {
            dst[i] = row[0] * r[i].to_f32() + row[1] * g[i].to_f32() + row[2] * b[i].to_f32();
        }
    }
    out
}
