//! Background Tasks Module
//!
//! Contains the background task that runs while a cache is enabled.
//!
//! # Tasks
//! - Janitor: Removes expired cache entries once per TTL interval

mod janitor;

pub use janitor::{spawn_janitor_task, JanitorHandle};
