//! Invoice numbering, creation and work linkage.

pub mod amounts;
pub mod handlers;
pub mod linker;
pub mod store;


pub use linker::link_works_to_invoice;
pub use store::{create_invoice, delete_invoice, get_invoice, update_invoice, InvoiceNumbering};
