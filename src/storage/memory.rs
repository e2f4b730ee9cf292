use std::collections::VecDeque;

use dashmap::DashMap;

use crate::info::{ContainerReference, ContainerStats};

use super::{Error, Result, StorageSink};

/// Number of samples kept per container when not configured otherwise.
pub const DEFAULT_MAX_SAMPLES: usize = 60;

/// Keeps the most recent samples of every container in memory.
///
/// Each container has its own bounded ring buffer; once full, the oldest sample is
/// evicted. Containers are sharded across the map so writers of different containers
/// do not contend.
#[derive(Debug)]
pub struct InMemoryStorage {
    samples: DashMap<String, VecDeque<ContainerStats>>,
    max_samples: usize,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SAMPLES)
    }
}

impl InMemoryStorage {
    /// Creates a store keeping up to `max_samples` samples per container (at least one).
    pub fn new(max_samples: usize) -> Self {
        Self {
            samples: DashMap::new(),
            max_samples: max_samples.max(1),
        }
    }

    pub fn len(&self, name: &str) -> usize {
        self.samples.get(name).map_or(0, |samples| samples.len())
    }
}

impl StorageSink for InMemoryStorage {
    fn add_stats(&self, reference: &ContainerReference, stats: ContainerStats) -> Result<()> {
        let mut samples = self
            .samples
            .entry(reference.name.clone())
            .or_insert_with(|| VecDeque::with_capacity(self.max_samples));
        if samples.len() >= self.max_samples {
            samples.pop_front();
        }
        samples.push_back(stats);
        Ok(())
    }

    fn recent_stats(&self, name: &str, count: usize) -> Result<Vec<ContainerStats>> {
        let samples = self
            .samples
            .get(name)
            .ok_or_else(|| Error::UnknownContainer(name.to_owned()))?;
        let skip = samples.len().saturating_sub(count);
        Ok(samples.iter().skip(skip).cloned().collect())
    }

    fn remove_container(&self, name: &str) {
        self.samples.remove(name);
    }
}
