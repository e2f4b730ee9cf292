//! Raw accounting counters of cgroup v1 containers and their normalization.
//!
//! - [`RawSnapshot`]: unprocessed counters of one container.
//! - [`to_container_stats`]: turns a [`RawSnapshot`] into the canonical
//!   [`crate::info::ContainerStats`].
//! - [`CgroupResolver`] / [`CgroupHandle`]: a [`crate::container::ContainerHandle`]
//!   backend reading the `cpuacct` and `memory` controllers and `/proc/<pid>/net/dev`.
//! - [`stats`]: typed parsers for the individual accounting files.
//!
//! # Platform Requirements
//!
//! - Linux with the cgroup v1 `cpuacct` and `memory` controllers mounted under a common
//!   root (usually `/sys/fs/cgroup`).
//! - Read access to `/proc/<pid>/net/dev` for network counters.
mod handle;
mod normalize;
mod raw;
pub mod stats;
mod utils;

pub use handle::{CgroupHandle, CgroupResolver};
pub use normalize::{to_container_stats, to_container_stats_at};
pub use raw::{RawCpuStats, RawMemoryStats, RawSnapshot};
