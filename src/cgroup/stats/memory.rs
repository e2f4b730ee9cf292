//! Parsers for the cgroup v1 `memory` controller.
//!
//! - `memory.stat`: open-ended `key value` lines, kept as a map so callers can tell a
//!   missing counter apart from a zero one.
//! - `memory.usage_in_bytes`: a single number.
//!
//! ```rust
//! use creo_housekeeper::cgroup::stats::{MemoryStat, MemoryUsage, SingleLineStat};
//!
//! let stat = MemoryStat::from_reader(&mut "pgfault 12\ntotal_inactive_anon 4096\n".as_bytes()).unwrap();
//! assert_eq!(stat.get("pgfault"), Some(12));
//! assert_eq!(stat.get("pgmajfault"), None);
//!
//! let usage = MemoryUsage::from_reader(&mut "8192\n".as_bytes()).unwrap();
//! assert_eq!(usage.usage_bytes, 8192);
//! ```

use std::collections::HashMap;
use std::io::BufRead;

use super::{SingleLineStat, StatParseError, parse_key_values};

/// Parsed `memory.stat`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryStat {
    pub stats: HashMap<String, u64>,
}

impl MemoryStat {
    /// Parses a `memory.stat` file.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` of kind `InvalidData` if a value is not numeric or a key is
    /// repeated.
    pub fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        Ok(Self {
            stats: parse_key_values(buf)?,
        })
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.stats.get(key).copied()
    }
}

/// Parsed `memory.usage_in_bytes`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryUsage {
    pub usage_bytes: u64,
}

impl SingleLineStat for MemoryUsage {
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let mut line = String::new();
        buf.read_line(&mut line)?;
        let line = line.trim();
        let usage_bytes = line
            .parse::<u64>()
            .map_err(|source| StatParseError::InvalidValue {
                value: line.to_string(),
                line: 1,
                source,
            })?;

        Ok(MemoryUsage { usage_bytes })
    }
}
