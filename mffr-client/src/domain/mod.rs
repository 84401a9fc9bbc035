pub mod field;
pub mod signal;
pub mod slot_entry;

pub use field::{Field, Flag, FlagError};
pub use signal::Signal;
pub use slot_entry::{RawFeed, RawSlotEntry};
