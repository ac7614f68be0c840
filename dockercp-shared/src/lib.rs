//! dockercp shared - types common to the library, the CLI and test tooling
//!
//! This crate contains the error type, the engine endpoint description
//! and constants used across the workspace.

pub mod constants;
pub mod endpoint;
pub mod errors;

pub use endpoint::EngineEndpoint;
pub use errors::{DockercpError, DockercpResult};
