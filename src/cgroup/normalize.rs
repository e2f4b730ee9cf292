//! Conversion of raw kernel counters into [`ContainerStats`].

use std::time::SystemTime;

use crate::info::{ContainerStats, CpuUsage, MemoryStats, NetworkStats};

use super::raw::{RawCpuStats, RawMemoryStats, RawSnapshot};
use super::stats::NetworkStat;

const PGFAULT: &str = "pgfault";
const PGMAJFAULT: &str = "pgmajfault";
const TOTAL_INACTIVE_ANON: &str = "total_inactive_anon";
const TOTAL_ACTIVE_FILE: &str = "total_active_file";

/// Normalizes `raw` into a sample stamped with the current wall-clock time.
///
/// Missing sections produce zero-valued substructures; this never fails.
pub fn to_container_stats(raw: &RawSnapshot) -> ContainerStats {
    to_container_stats_at(raw, SystemTime::now())
}

/// Like [`to_container_stats`], with an explicit observation time.
pub fn to_container_stats_at(raw: &RawSnapshot, timestamp: SystemTime) -> ContainerStats {
    let mut ret = ContainerStats::new(timestamp);
    if let Some(cpu) = &raw.cpu {
        ret.cpu.usage = cpu_usage(cpu);
    }
    if let Some(memory) = &raw.memory {
        ret.memory = memory_stats(memory);
    }
    if let Some(network) = raw.network {
        ret.network = network.into();
    }
    ret
}

fn cpu_usage(cpu: &RawCpuStats) -> CpuUsage {
    // The kernel aggregate is not trusted to agree with the per-CPU counters.
    let total = cpu
        .percpu_usage
        .iter()
        .fold(0u64, |acc, usage| acc.wrapping_add(*usage));
    CpuUsage {
        total,
        per_cpu: cpu.percpu_usage.clone(),
        user: cpu.usage_in_usermode,
        system: cpu.usage_in_kernelmode,
    }
}

fn memory_stats(memory: &RawMemoryStats) -> MemoryStats {
    let mut ret = MemoryStats {
        usage: memory.usage,
        ..MemoryStats::default()
    };
    if let Some(&v) = memory.stats.get(PGFAULT) {
        ret.container_data.pgfault = v;
        ret.hierarchical_data.pgfault = v;
    }
    if let Some(&v) = memory.stats.get(PGMAJFAULT) {
        ret.container_data.pgmajfault = v;
        ret.hierarchical_data.pgmajfault = v;
    }
    if let Some(&inactive_anon) = memory.stats.get(TOTAL_INACTIVE_ANON) {
        ret.working_set = memory.usage.saturating_sub(inactive_anon);
        if let Some(&active_file) = memory.stats.get(TOTAL_ACTIVE_FILE) {
            ret.working_set = ret.working_set.saturating_sub(active_file);
        }
    }
    ret
}

impl From<NetworkStat> for NetworkStats {
    fn from(NetworkStat { rx, tx }: NetworkStat) -> Self {
        Self {
            rx_bytes: rx.bytes,
            rx_packets: rx.packets,
            rx_errors: rx.errors,
            rx_dropped: rx.dropped,
            rx_fifo: rx.fifo,
            rx_frame: rx.frame,
            rx_compressed: rx.compressed,
            rx_multicast: rx.multicast,
            tx_bytes: tx.bytes,
            tx_packets: tx.packets,
            tx_errors: tx.errors,
            tx_dropped: tx.dropped,
            tx_fifo: tx.fifo,
            tx_collisions: tx.collisions,
            tx_carrier: tx.carrier,
            tx_compressed: tx.compressed,
        }
    }
}
