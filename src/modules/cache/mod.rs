//! Cache module for the active-zone snapshot
//!
//! Cache-aside view over the incident store. Readers call [`ActiveZoneCache::get`],
//! refill from the store on a miss and write the snapshot back with
//! [`ActiveZoneCache::set`]. Every successful zone mutation calls
//! [`ActiveZoneCache::invalidate`].
//!
//! Refill is not serialized across requests. A refill racing with an
//! invalidation may write a snapshot that predates the mutation; it stays
//! visible until the TTL expires or the next mutation invalidates it again.

mod active_zone_cache;
mod errors;

pub use active_zone_cache::{ActiveZoneCache, RedisActiveZoneCache};
pub use errors::{CacheError, CacheResult};
