//! Core data types for the Maestro director orchestration library.
//!
//! This crate provides the foundation data types used across all Maestro interfaces.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod message;
mod request;
mod role;
mod telemetry;
mod turn;

pub use message::Message;
pub use request::{
    GenerateRequest, GenerateRequestBuilder, GenerateRequestBuilderError, GenerateResponse,
};
pub use role::Role;
pub use telemetry::{init_telemetry, shutdown_telemetry};
pub use turn::Turn;
