//! Ledger entries and the records that own them.
//!
//! Every record that moves money owns exactly one ledger entry. The entry
//! stores the record id in `source_id`, the record stores the entry id in
//! `transaction_id`, and both are written in one database transaction.

pub mod entries;
pub mod handlers;
pub mod linked;

#[cfg(test)]
mod tests;

pub use entries::LedgerFilter;
pub use linked::{create_linked, delete_linked, get_linked, update_linked, LedgerLinked, Linked, LinkedPayload};
