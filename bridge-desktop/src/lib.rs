//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `FileSystemAccess` using `tokio::fs`, with extended attributes read via
//!   the `xattr` crate on unix platforms
//! - `Confirmation` using a `dialoguer` terminal prompt
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{TerminalConfirmation, TokioFileSystem};
//! use bridge_traits::{Confirmation, FileSystemAccess};
//!
//! #[tokio::main]
//! async fn main() {
//!     let fs = TokioFileSystem::new();
//!     let confirm = TerminalConfirmation::new();
//!
//!     // Use in core configuration
//! }
//! ```

mod filesystem;
mod prompt;

pub use filesystem::TokioFileSystem;
pub use prompt::TerminalConfirmation;
