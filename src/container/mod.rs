//! Contracts between the housekeeping engine and a concrete container backend.
//!
//! A backend provides a [`ContainerResolver`] that turns a container name into a
//! [`ContainerHandle`]. The handle is the only way the engine reads a container:
//! its identity, its spec, raw accounting counters and its direct children.
//!
//! [`crate::cgroup::CgroupResolver`] is the cgroup v1 backend shipped with this crate.
use std::sync::Arc;

use crate::cgroup::RawSnapshot;
use crate::info::{ContainerReference, ContainerSpec};

mod error;

pub use error::{Error, Result};

/// Read access to one container.
///
/// Calls are synchronous and expected to be short (file reads); the engine runs them
/// off the async executor.
pub trait ContainerHandle: Send + Sync {
    /// Identity of the container.
    fn reference(&self) -> Result<ContainerReference>;

    /// Resource domains isolated for the container.
    fn spec(&self) -> Result<ContainerSpec>;

    /// Current raw counters, or `None` if there is nothing to sample right now.
    fn raw_stats(&self) -> Result<Option<RawSnapshot>>;

    /// Direct children of the container.
    fn list_subcontainers(&self) -> Result<Vec<ContainerReference>>;
}

/// Looks up the handle for a container name.
pub trait ContainerResolver: Send + Sync {
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no such container exists, or any error the
    /// backend hits while looking it up.
    fn resolve(&self, name: &str) -> Result<Arc<dyn ContainerHandle>>;
}
