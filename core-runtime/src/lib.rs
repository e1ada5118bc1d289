//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the album sync core:
//! - Logging and tracing infrastructure
//! - Configuration management
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the other core crates
//! depend on. It establishes the logging conventions and the validated
//! configuration every reconciliation run starts from.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder, DuplicateIdPolicy, ExecutionMode};
pub use error::{Error, Result};
