use std::collections::HashMap;

use super::stats::NetworkStat;

/// Unprocessed accounting counters of one container, as read from the kernel.
///
/// A section is `None` when its controller is not available for the container.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawSnapshot {
    pub cpu: Option<RawCpuStats>,
    pub memory: Option<RawMemoryStats>,
    pub network: Option<NetworkStat>,
}

impl RawSnapshot {
    pub fn is_empty(&self) -> bool {
        self.cpu.is_none() && self.memory.is_none() && self.network.is_none()
    }
}

/// Cumulative CPU counters in nanoseconds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawCpuStats {
    pub percpu_usage: Vec<u64>,
    pub usage_in_usermode: u64,
    pub usage_in_kernelmode: u64,
    /// Aggregate reported by the kernel. Informational only; normalization derives the
    /// total from `percpu_usage`.
    pub total_usage: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawMemoryStats {
    /// Current usage in bytes.
    pub usage: u64,
    /// Counters of `memory.stat`, keyed by their kernel name.
    pub stats: HashMap<String, u64>,
}
