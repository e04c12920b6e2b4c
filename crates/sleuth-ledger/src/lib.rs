//! SalarySleuth Ledger - what changed since the last run.
//!
//! # Modules
//!
//! - [`id`] - Stable job identifiers
//! - [`store`] - The persisted `{last_updated, jobs}` file
//! - [`reconcile`] - Multi-pass merge and reconciliation against the ledger

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod id;
pub mod reconcile;
pub mod store;

// Re-export commonly used types
pub use error::{LedgerError, Result};
pub use id::{stable_id, MAX_ID_LEN};
pub use reconcile::{merge_passes, reconcile, Ledger, Reconciliation};
pub use store::{write_json_atomic, JobStore, TrackedJob};
