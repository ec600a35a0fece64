//! Gallery surface: contributor aggregation and artifact submission

pub mod aggregate;
pub mod submit;

pub use aggregate::{aggregate_contributors, ContributorSummary};
pub use submit::{SubmissionReceipt, SubmissionRequest, SubmissionService};
