//! Common utilities module
//!
//! This module contains the error type and conversion settings shared across
//! the image pipeline.

pub mod config;
pub mod error;

pub use config::{ColorPath, ConversionConfig, ConversionConfigBuilder};
pub use error::{ConversionError, Result};
