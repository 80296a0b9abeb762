//! # EcoSort Common Library
//!
//! Shared code for the EcoSort services:
//! - Error and result types
//! - Bootstrap configuration loading (TOML, environment, compiled defaults)
//! - Tracing subscriber setup
//! - Timestamp helpers

pub mod config;
pub mod error;
pub mod logging;
pub mod time;

pub use error::{Error, Result};
