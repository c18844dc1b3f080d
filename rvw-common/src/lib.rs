//! # RVW Common Library
//!
//! Shared code for the review analysis crates including:
//! - Error and result types
//! - Bootstrap configuration loading (TOML)
//! - Logging initialization

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
