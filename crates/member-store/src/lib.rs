//! Member identities and points ledger.
//!
//! Members are keyed by their Telegram user id; at most one member exists
//! per id. Every balance change is recorded as a [`LedgerEntry`]. The whole
//! store can be snapshotted to a JSON file after each mutation.

mod error;
mod store;
mod types;

pub use error::StoreError;
pub use store::MemberStore;
pub use types::*;
