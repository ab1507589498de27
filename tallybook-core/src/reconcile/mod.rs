//! Background repair of ledger and invoice linkage.

pub mod checks;
pub mod scheduler;

#[cfg(test)]
mod tests;

pub use checks::{deactivate_orphan_entries, relink_invoice_works};
pub use scheduler::{ReconcileReport, Reconciler};
