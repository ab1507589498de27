pub mod attendance;
pub mod borrowing;
pub mod employee;
pub mod expenditure;
pub mod fuel_log;
pub mod invoice;
pub mod ledger_entry;
pub mod page;
pub mod revenue;
pub mod salary;
pub mod work;

pub use attendance::{Attendance, MarkAttendance};
pub use borrowing::Borrowing;
pub use employee::Employee;
pub use expenditure::Expenditure;
pub use fuel_log::FuelLog;
pub use invoice::{Invoice, InvoiceStatus};
pub use ledger_entry::{LedgerEntry, LedgerInput};
pub use page::Page;
pub use revenue::Revenue;
pub use salary::Salary;
pub use work::Work;
