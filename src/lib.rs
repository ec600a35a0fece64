//! Archway - identity and access gateway for the community artifact archive
//!
//! Archway fronts the archive's contribution registry with a consistent
//! identity model: visitors may arrive with a connected wallet, a social
//! login session, both, or neither, and every policy decision flows through
//! the same canonical `Identity`.
//!
//! ## Services
//!
//! - **Identity**: credential normalization and the operator allow-list
//! - **Authorization**: per-record visibility decisions
//! - **Registry**: MongoDB-backed contribution fetches with legacy-row
//!   reconciliation and fetch-boundary filtering
//! - **Gallery**: contributor aggregation and artifact submission
//! - **Admin**: operator-only deletion and verification

pub mod admin;
pub mod authz;
pub mod config;
pub mod db;
pub mod gallery;
pub mod identity;
pub mod registry;
pub mod routes;
pub mod server;
pub mod storage;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{ArchwayError, Result};
