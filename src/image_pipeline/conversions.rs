//! Pipeline conversions module
//!
//! This module contains orchestration logic running decoded RAW data through
//! the color stages and into the writer.

mod raw_to_srgb;
mod timing;


pub use raw_to_srgb::RawToSrgbPipeline;
pub use timing::{PipelineTimings, StepTiming, Timer};
