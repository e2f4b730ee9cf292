//! Shared parsing traits for cgroup v1 accounting files.
//!
//! - [`KeyValueStat`] parses files made of `key value` lines into a struct with a
//!   fixed set of known keys (e.g. `cpuacct.stat`).
//! - [`SingleLineStat`] parses files holding one line (e.g. `memory.usage_in_bytes`,
//!   `cpuacct.usage_percpu`).
//! - [`parse_key_values`] collects every `key value` line of a file into a map, for
//!   files whose key set is open-ended (e.g. `memory.stat`).
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use std::sync::OnceLock;
//! use creo_housekeeper::cgroup::stats::KeyValueStat;
//!
//! #[derive(Default)]
//! struct Throttling {
//!     nr_throttled: u64,
//! }
//!
//! static HANDLERS: OnceLock<HashMap<&'static str, fn(&mut Throttling, u64)>> = OnceLock::new();
//!
//! impl KeyValueStat for Throttling {
//!     const ALLOW_DUPLICATE_KEYS: bool = false;
//!
//!     fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
//!         HANDLERS.get_or_init(|| {
//!             let mut map = HashMap::new();
//!             map.insert("nr_throttled", (|s: &mut Throttling, v| s.nr_throttled = v) as fn(&mut Throttling, u64));
//!             map
//!         })
//!     }
//! }
//!
//! let stat = Throttling::from_reader(&mut "nr_periods 4\nnr_throttled 2\n".as_bytes()).unwrap();
//! assert_eq!(stat.nr_throttled, 2);
//! ```

use std::collections::{HashMap, HashSet};
use std::io::BufRead;

use super::StatParseError;

/// A `key value` per line stat file with a fixed set of interesting keys.
///
/// Unknown keys are ignored. Lines without a value are skipped.
pub trait KeyValueStat: Default
where
    Self: 'static,
{
    /// If `false`, a key seen twice is reported as [`StatParseError::DuplicateField`].
    const ALLOW_DUPLICATE_KEYS: bool;

    /// Known keys and the setter applying a parsed value to `Self`.
    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)>;

    /// Parses the whole buffer into `Self`.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if reading fails, or one of kind `InvalidData` wrapping a
    /// [`StatParseError`] if a known key has a non-numeric value or is duplicated.
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let mut stat = Self::default();
        let handlers = Self::field_handlers();
        let mut seen_keys = HashSet::with_capacity(handlers.len());

        let mut line = String::new();
        let mut lineno = 0;
        while buf.read_line(&mut line)? != 0 {
            lineno += 1;
            if let Some((key, val)) = split_key_value(&line) {
                if let Some((k, handler)) = handlers.get_key_value(key) {
                    let parsed = parse_value(key, val, lineno)?;
                    if !Self::ALLOW_DUPLICATE_KEYS && !seen_keys.insert(*k) {
                        return Err(StatParseError::DuplicateField {
                            field: key.to_string(),
                            line: lineno,
                        }
                        .into());
                    }
                    handler(&mut stat, parsed);
                }
            }
            if !Self::ALLOW_DUPLICATE_KEYS && seen_keys.len() == handlers.len() {
                break;
            }
            line.clear();
        }

        Ok(stat)
    }
}

/// A stat file consisting of a single line.
pub trait SingleLineStat: Sized + Default {
    /// Parses the first line of `buf` into `Self`.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if reading or parsing fails.
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self>;
}

/// Collects all `key value` lines of `buf` into a map.
///
/// Every key is kept, known or not. Lines without a value are skipped.
///
/// # Errors
///
/// Returns an `io::Error` of kind `InvalidData` wrapping a [`StatParseError`] if a value is
/// not numeric or a key appears twice.
pub fn parse_key_values<R: BufRead>(buf: &mut R) -> std::io::Result<HashMap<String, u64>> {
    let mut values = HashMap::new();
    let mut line = String::new();
    let mut lineno = 0;
    while buf.read_line(&mut line)? != 0 {
        lineno += 1;
        if let Some((key, val)) = split_key_value(&line) {
            let parsed = parse_value(key, val, lineno)?;
            if values.insert(key.to_owned(), parsed).is_some() {
                return Err(StatParseError::DuplicateField {
                    field: key.to_string(),
                    line: lineno,
                }
                .into());
            }
        }
        line.clear();
    }

    Ok(values)
}

fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let mut parts = line.split_whitespace();
    Some((parts.next()?, parts.next()?))
}

fn parse_value(key: &str, val: &str, lineno: usize) -> Result<u64, StatParseError> {
    val.parse::<u64>()
        .map_err(|source| StatParseError::InvalidKeyValue {
            key: key.to_string(),
            value: val.to_string(),
            line: lineno,
            source,
        })
}
