//! Shared types for Archway

pub mod error;

pub use error::{ArchwayError, Result};
