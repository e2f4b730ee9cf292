//! Persistence contract for normalized samples.
//!
//! The housekeeping engine writes one sample per tick through [`StorageSink::add_stats`]
//! and reads the latest two back through [`StorageSink::recent_stats`] to decide its
//! next polling interval. [`InMemoryStorage`] is a bounded in-process implementation.
mod error;
mod memory;

pub use error::{Error, Result};
pub use memory::{DEFAULT_MAX_SAMPLES, InMemoryStorage};

use crate::info::{ContainerReference, ContainerStats};

pub trait StorageSink: Send + Sync {
    /// Stores a new sample for the container identified by `reference`.
    fn add_stats(&self, reference: &ContainerReference, stats: ContainerStats) -> Result<()>;

    /// Returns up to `count` of the most recent samples of container `name`, ordered
    /// oldest to newest.
    fn recent_stats(&self, name: &str, count: usize) -> Result<Vec<ContainerStats>>;

    /// Forgets all samples of container `name`. Backends with external retention
    /// may ignore this.
    fn remove_container(&self, _name: &str) {}
}
