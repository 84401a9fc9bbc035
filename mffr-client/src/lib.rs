pub mod domain;
pub mod feed;

pub use domain::{Field, Flag, RawFeed, RawSlotEntry, Signal};
