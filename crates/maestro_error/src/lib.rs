//! Error types for the Maestro library.
//!
//! This crate provides the foundation error types used throughout the Maestro
//! ecosystem.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern for clean error handling:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use maestro_error::{MaestroResult, HttpError};
//!
//! fn fetch_data() -> MaestroResult<String> {
//!     Err(HttpError::new("Connection refused"))?
//! }
//!
//! match fetch_data() {
//!     Ok(data) => println!("Got: {}", data),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod category;
mod client;
mod config;
mod director;
mod error;
mod http;
mod json;

pub use builder::{BuilderError, BuilderErrorKind};
pub use category::ErrorCategory;
pub use client::{AbortReason, ClientError, ClientErrorKind, ClientResult};
pub use config::ConfigError;
pub use director::{DirectorError, DirectorErrorKind};
pub use error::{MaestroError, MaestroErrorKind, MaestroResult};
pub use http::HttpError;
pub use json::JsonError;
