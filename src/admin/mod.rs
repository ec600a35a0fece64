//! Administrative action gateway

pub mod actions;
pub mod optimistic;

pub use actions::{AdminGateway, VerifyReceipt};
pub use optimistic::{ChangeToken, OptimisticSet};
