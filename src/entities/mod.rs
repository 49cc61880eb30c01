// Entity Models - persons and the loans linked to them
//
// Each entity has:
// - Stable identity (UUID) that never changes across edits
// - Validated field values (constructors return the constraint message on failure)

pub mod loan;
pub mod person;

pub use loan::{parse_date, Loan, Money, DATE_FORMAT};
pub use person::{Address, Email, Name, Person, Phone, Tag};
