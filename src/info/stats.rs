use std::time::SystemTime;

/// One normalized resource usage sample of a container.
///
/// Built once per housekeeping tick and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ContainerStats {
    /// Time the sample was normalized, not the kernel's report time.
    pub timestamp: SystemTime,
    pub cpu: CpuStats,
    pub memory: MemoryStats,
    pub network: NetworkStats,
}

impl ContainerStats {
    /// Creates an empty sample stamped with `timestamp`.
    pub fn new(timestamp: SystemTime) -> Self {
        Self {
            timestamp,
            cpu: CpuStats::default(),
            memory: MemoryStats::default(),
            network: NetworkStats::default(),
        }
    }

    /// Compares the usage values of two samples, ignoring their timestamps.
    ///
    /// Two samples that are equal here indicate an idle container.
    pub fn stats_eq(&self, other: &ContainerStats) -> bool {
        self.cpu == other.cpu && self.memory == other.memory && self.network == other.network
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
pub struct CpuStats {
    pub usage: CpuUsage,
}

/// Cumulative CPU usage in nanoseconds.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
pub struct CpuUsage {
    /// Sum of `per_cpu`.
    pub total: u64,
    /// One entry per logical CPU, in the order the kernel reports them.
    pub per_cpu: Vec<u64>,
    pub user: u64,
    pub system: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
pub struct MemoryStats {
    /// Current usage in bytes.
    pub usage: u64,
    /// Usage minus inactive anonymous and active file pages. Zero when the
    /// kernel did not report `total_inactive_anon`.
    pub working_set: u64,
    pub container_data: MemoryData,
    pub hierarchical_data: MemoryData,
}

/// Page fault counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct MemoryData {
    pub pgfault: u64,
    pub pgmajfault: u64,
}

/// Network counters of a container, summed over its interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct NetworkStats {
    pub rx_bytes: u64,
    pub rx_packets: u64,
    pub rx_errors: u64,
    pub rx_dropped: u64,
    pub rx_fifo: u64,
    pub rx_frame: u64,
    pub rx_compressed: u64,
    pub rx_multicast: u64,
    pub tx_bytes: u64,
    pub tx_packets: u64,
    pub tx_errors: u64,
    pub tx_dropped: u64,
    pub tx_fifo: u64,
    pub tx_collisions: u64,
    pub tx_carrier: u64,
    pub tx_compressed: u64,
}
