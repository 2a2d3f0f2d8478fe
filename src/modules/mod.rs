//! Modules layer - Redis-backed infrastructure shared by features
//!
//! Contains the active-zone snapshot cache and the notification queue.

pub mod cache;
pub mod queue;
