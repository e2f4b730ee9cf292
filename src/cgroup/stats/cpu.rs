//! Parsers for the cgroup v1 `cpuacct` controller.
//!
//! - `cpuacct.stat`: `user <ticks>` and `system <ticks>` lines, in `USER_HZ` ticks.
//! - `cpuacct.usage_percpu`: one line of per-CPU cumulative usage in nanoseconds.
//! - `cpuacct.usage`: cumulative usage of all CPUs in nanoseconds.
//!
//! ```rust
//! use creo_housekeeper::cgroup::stats::{CpuAcctStat, KeyValueStat, PerCpuUsage, SingleLineStat};
//!
//! let stat = CpuAcctStat::from_reader(&mut "user 5\nsystem 3\n".as_bytes()).unwrap();
//! assert_eq!(stat.user_nanos(), 50_000_000);
//!
//! let per_cpu = PerCpuUsage::from_reader(&mut "100 200 \n".as_bytes()).unwrap();
//! assert_eq!(per_cpu.usage_ns, vec![100, 200]);
//! ```

use std::collections::HashMap;
use std::io::BufRead;
use std::sync::LazyLock;

use super::{KeyValueStat, SingleLineStat, StatParseError};

/// Kernel `USER_HZ`, the unit of `cpuacct.stat`.
pub const CLOCK_TICKS_PER_SEC: u64 = 100;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Parsed `cpuacct.stat`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CpuAcctStat {
    /// Ticks spent in user mode.
    pub user: u64,
    /// Ticks spent in kernel mode.
    pub system: u64,
}

impl CpuAcctStat {
    fn set_user(&mut self, user: u64) {
        self.user = user;
    }

    fn set_system(&mut self, system: u64) {
        self.system = system;
    }

    pub fn user_nanos(&self) -> u64 {
        ticks_to_nanos(self.user)
    }

    pub fn system_nanos(&self) -> u64 {
        ticks_to_nanos(self.system)
    }
}

fn ticks_to_nanos(ticks: u64) -> u64 {
    ticks.saturating_mul(NANOS_PER_SEC / CLOCK_TICKS_PER_SEC)
}

type Setter = fn(&mut CpuAcctStat, u64);

static SETTERS: LazyLock<HashMap<&'static str, Setter>> = LazyLock::new(|| {
    let mut m: HashMap<&'static str, Setter> = HashMap::with_capacity(2);

    m.insert("user", CpuAcctStat::set_user);
    m.insert("system", CpuAcctStat::set_system);

    m
});

impl KeyValueStat for CpuAcctStat {
    const ALLOW_DUPLICATE_KEYS: bool = false;

    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
        &SETTERS
    }
}

/// Parsed `cpuacct.usage_percpu`, one entry per logical CPU in kernel order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PerCpuUsage {
    pub usage_ns: Vec<u64>,
}

impl SingleLineStat for PerCpuUsage {
    /// An empty file yields an empty list.
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let mut line = String::new();
        buf.read_line(&mut line)?;
        let usage_ns = line
            .split_whitespace()
            .map(|value| {
                value
                    .parse::<u64>()
                    .map_err(|source| StatParseError::InvalidValue {
                        value: value.to_string(),
                        line: 1,
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PerCpuUsage { usage_ns })
    }
}

/// Parsed `cpuacct.usage`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CpuAcctUsage {
    pub usage_ns: u64,
}

impl SingleLineStat for CpuAcctUsage {
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let mut line = String::new();
        buf.read_line(&mut line)?;
        let line = line.trim();
        let usage_ns = line
            .parse::<u64>()
            .map_err(|source| StatParseError::InvalidValue {
                value: line.to_string(),
                line: 1,
                source,
            })?;

        Ok(CpuAcctUsage { usage_ns })
    }
}
