//! Typed parsers for cgroup v1 accounting files and `/proc/<pid>/net/dev`.
//!
//! Each parser reads from any [`std::io::BufRead`], so tests feed them byte slices and
//! the cgroup handle feeds them open files.
//!
//! | File                    | Type             |
//! |-------------------------|------------------|
//! | `cpuacct.stat`          | [`CpuAcctStat`]  |
//! | `cpuacct.usage_percpu`  | [`PerCpuUsage`]  |
//! | `cpuacct.usage`         | [`CpuAcctUsage`] |
//! | `memory.stat`           | [`MemoryStat`]   |
//! | `memory.usage_in_bytes` | [`MemoryUsage`]  |
//! | `/proc/<pid>/net/dev`   | [`NetworkStat`]  |

mod cpu;
mod error;
mod memory;
mod net;
mod parser;

pub use cpu::{CLOCK_TICKS_PER_SEC, CpuAcctStat, CpuAcctUsage, PerCpuUsage};
pub use error::StatParseError;
pub use memory::{MemoryStat, MemoryUsage};
pub use net::{NetworkStat, ReceiveCounters, TransmitCounters};
pub use parser::{KeyValueStat, SingleLineStat, parse_key_values};
