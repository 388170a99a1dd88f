//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of a cache.
//!
//! # Tasks
//! - Scavenger: removes entries older than the TTL at the configured interval

mod scavenger;

pub(crate) use scavenger::Scavenger;
