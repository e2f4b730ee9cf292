use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::config::HousekeepingConfig;
use crate::container::ContainerResolver;
use crate::info::ContainerInfo;
use crate::storage::StorageSink;

use super::{ContainerManager, Error, Result};

/// Keeps one running [`ContainerManager`] per monitored container.
pub struct Monitor {
    managers: DashMap<String, Arc<ContainerManager>>,
    resolver: Arc<dyn ContainerResolver>,
    storage: Arc<dyn StorageSink>,
    config: HousekeepingConfig,
}

impl Monitor {
    pub fn new(
        resolver: Arc<dyn ContainerResolver>,
        storage: Arc<dyn StorageSink>,
        config: HousekeepingConfig,
    ) -> Self {
        Self {
            managers: DashMap::new(),
            resolver,
            storage,
            config,
        }
    }

    /// Starts monitoring container `name`.
    ///
    /// Returns `false` if the container is already monitored.
    ///
    /// # Errors
    ///
    /// Fails if the container cannot be resolved or its housekeeping cannot be started.
    pub fn add_container(&self, name: &str) -> Result<bool> {
        if self.managers.contains_key(name) {
            return Ok(false);
        }
        let manager = ContainerManager::builder(name)
            .resolver(Arc::clone(&self.resolver))
            .storage(Arc::clone(&self.storage))
            .config(self.config)
            .build()?;

        match self.managers.entry(name.to_owned()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(entry) => {
                manager.start()?;
                entry.insert(Arc::new(manager));
                log::info!("monitoring container `{name}`");
                Ok(true)
            }
        }
    }

    /// Stops and forgets container `name`, dropping its stored samples. Returns `false`
    /// if it was not monitored.
    ///
    /// A tick already in flight may still store one last sample.
    pub fn remove_container(&self, name: &str) -> Result<bool> {
        match self.managers.remove(name) {
            Some((_, manager)) => {
                manager.stop()?;
                self.storage.remove_container(name);
                log::info!("stopped monitoring container `{name}`");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn get_info(&self, name: &str) -> Result<ContainerInfo> {
        // Release the shard lock before touching the container.
        let manager = self
            .managers
            .get(name)
            .map(|manager| Arc::clone(manager.value()))
            .ok_or_else(|| Error::UnknownContainer(name.to_owned()))?;
        manager.get_info()
    }

    /// Names of all monitored containers, sorted.
    pub fn container_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.managers.iter().map(|entry| entry.key().clone()).collect();
        names.sort_unstable();
        names
    }

    pub fn size(&self) -> usize {
        self.managers.len()
    }

    /// Stops every manager and empties the registry and the storage.
    pub fn stop_all(&self) {
        let names = self.container_names();
        for name in names {
            if let Some((_, manager)) = self.managers.remove(&name) {
                if let Err(err) = manager.stop() {
                    log::error!("failed to stop housekeeping for container `{name}`: {err}");
                }
                self.storage.remove_container(&name);
            }
        }
    }
}
