//! Housekeeping configuration.
//!
//! Values come from the environment:
//!
//! | Variable                       | Default | Meaning                                   |
//! |--------------------------------|---------|-------------------------------------------|
//! | `HOUSEKEEPING_INTERVAL_MS`     | `1000`  | Baseline interval between housekeepings   |
//! | `MAX_HOUSEKEEPING_INTERVAL_MS` | `60000` | Largest interval dynamic housekeeping may reach |
//! | `ALLOW_DYNAMIC_HOUSEKEEPING`   | `true`  | Whether the interval adapts to activity   |
use std::time::Duration;

pub const HOUSEKEEPING_INTERVAL_ENV: &str = "HOUSEKEEPING_INTERVAL_MS";
pub const MAX_HOUSEKEEPING_INTERVAL_ENV: &str = "MAX_HOUSEKEEPING_INTERVAL_MS";
pub const ALLOW_DYNAMIC_HOUSEKEEPING_ENV: &str = "ALLOW_DYNAMIC_HOUSEKEEPING";

pub const DEFAULT_HOUSEKEEPING_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_HOUSEKEEPING_INTERVAL: Duration = Duration::from_secs(60);

/// Upper bound of the "long housekeeping" threshold.
const LONG_HOUSEKEEPING: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid value `{value}` for `{key}`: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("housekeeping interval must be greater than zero")]
    ZeroInterval,
    #[error("max housekeeping interval {max:?} is below the housekeeping interval {interval:?}")]
    MaxBelowBaseline { interval: Duration, max: Duration },
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HousekeepingConfig {
    /// Baseline interval; also the interval every container starts with.
    pub interval: Duration,
    /// Cap for dynamic housekeeping.
    pub max_interval: Duration,
    /// If `false`, every container is housekept at exactly `interval`.
    pub allow_dynamic: bool,
}

impl Default for HousekeepingConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_HOUSEKEEPING_INTERVAL,
            max_interval: DEFAULT_MAX_HOUSEKEEPING_INTERVAL,
            allow_dynamic: true,
        }
    }
}

impl HousekeepingConfig {
    /// Reads the configuration from the process environment.
    ///
    /// Unset variables fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or the resulting configuration is
    /// inconsistent (see [`HousekeepingConfig::validate`]).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let interval = match lookup(HOUSEKEEPING_INTERVAL_ENV) {
            Some(value) => parse_millis(HOUSEKEEPING_INTERVAL_ENV, value)?,
            None => defaults.interval,
        };
        let max_interval = match lookup(MAX_HOUSEKEEPING_INTERVAL_ENV) {
            Some(value) => parse_millis(MAX_HOUSEKEEPING_INTERVAL_ENV, value)?,
            None => defaults.max_interval,
        };
        let allow_dynamic = match lookup(ALLOW_DYNAMIC_HOUSEKEEPING_ENV) {
            Some(value) => parse_bool(ALLOW_DYNAMIC_HOUSEKEEPING_ENV, value)?,
            None => defaults.allow_dynamic,
        };

        Self {
            interval,
            max_interval,
            allow_dynamic,
        }
        .validate()
    }

    /// Checks that the baseline is non-zero and does not exceed the maximum.
    pub fn validate(self) -> Result<Self> {
        if self.interval.is_zero() {
            return Err(Error::ZeroInterval);
        }
        if self.max_interval < self.interval {
            return Err(Error::MaxBelowBaseline {
                interval: self.interval,
                max: self.max_interval,
            });
        }
        Ok(self)
    }

    /// Tick duration above which a housekeeping is reported as slow: 100ms, or half
    /// the baseline interval if that is shorter.
    pub fn long_housekeeping(&self) -> Duration {
        LONG_HOUSEKEEPING.min(self.interval / 2)
    }
}

fn parse_millis(key: &'static str, value: String) -> Result<Duration> {
    match value.trim().parse::<u64>() {
        Ok(millis) => Ok(Duration::from_millis(millis)),
        Err(err) => Err(Error::InvalidValue {
            key,
            reason: err.to_string(),
            value,
        }),
    }
}

fn parse_bool(key: &'static str, value: String) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(Error::InvalidValue {
            key,
            value,
            reason: "expected a boolean".to_owned(),
        }),
    }
}
