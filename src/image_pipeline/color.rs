//! Color and tone pipeline
//!
//! Black level subtraction, camera-native to XYZ / sRGB' transforms,
//! histogram stretching and gamma encoding of planar 16-bit RGB buffers.

pub mod black_level;
pub mod buffer;
pub mod converter;
pub mod debug_log;
pub mod gamma;
pub mod matrix;
pub mod stretch;
pub mod transform;

#[cfg(test)]
mod tests;

pub use black_level::BlackLevel;
pub use buffer::{ChannelReduction, FloatBuffer, PixelBuffer, PlanarBuffer, Sample};
pub use converter::RawConverter;
pub use debug_log::{DebugEntry, DebugLog};
pub use gamma::GammaCurve;
pub use matrix::{AnalogBalance, ColorMatrix, Mat3, SRGB_FROM_XYZ_D65};
pub use stretch::StretchWindow;
