//! Store Module
//!
//! Generic time-bounded storage shared by the weather cache and the token
//! revocation list.

mod entry;
mod stats;
mod ttl;


pub use entry::TtlEntry;
pub use stats::CacheStats;
pub use ttl::TtlStore;
