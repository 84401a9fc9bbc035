pub mod slot_queries;

pub use slot_queries::{fetch_slots, parse_feed, FeedError, FeedQuery};
