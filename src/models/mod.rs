pub mod calendar;
pub mod candidate;
pub mod dispute;
pub mod invoice;
pub mod mapping;
pub mod row;

pub use calendar::HolidaySet;
pub use candidate::{CandidateDispute, CandidateStatus};
pub use dispute::{ActiveDispute, DisputeState, NewDispute, TierUpdate, UrgencyTier};
pub use invoice::InvoiceIndex;
pub use mapping::{ColumnMapping, Field, FieldOverrides, FieldSpec};
pub use row::{RawRow, RawValue};
