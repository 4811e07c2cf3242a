//! Drive-level state and operations over the file-manager SDK.
//!
//! - [`DriveStore`] keeps stamps, drives and file listings fresh.
//! - [`StampManager`] buys, extends and prices storage.
//! - [`reconstruct_history`] enumerates a file's versions.
//! - [`BulkActions`] applies trash, restore and forget across a selection.

pub mod bulk;
pub mod error;
pub mod history;
pub mod retry;
pub mod selection;
pub mod stamps;
pub mod store;

#[cfg(test)]
pub(crate) mod mock;

pub use bulk::{BulkActions, BulkOp, BulkOutcome};
pub use error::DriveError;
pub use history::{HistoryLimits, reconstruct_history};
pub use retry::{RetryConfig, retry_sdk};
pub use selection::Selection;
pub use stamps::StampManager;
pub use store::{DriveState, DriveStore};
