//! Per-container managers and the registry owning them.
//!
//! A [`ContainerManager`] watches exactly one container: once started it runs an
//! independent housekeeping task that samples the container, stores the normalized
//! stats and adapts its own polling interval (see [`AdaptiveInterval`]). API layers
//! read the container through [`ContainerManager::get_info`], which may be called
//! concurrently with housekeeping.
//!
//! [`Monitor`] keeps one manager per monitored container.
mod housekeeping;
mod monitor;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::HousekeepingConfig;
use crate::container::{self, ContainerHandle, ContainerResolver};
use crate::info::{ContainerInfo, ContainerReference};
use crate::storage::{self, StorageSink};

pub use housekeeping::{AdaptiveInterval, IntervalChange};
pub use monitor::Monitor;

use housekeeping::Housekeeper;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error(transparent)]
    Container(#[from] container::Error),
    #[error(transparent)]
    Storage(#[from] storage::Error),
    #[error(transparent)]
    Config(#[from] crate::config::Error),
    #[error("housekeeping for container `{0}` was already started")]
    AlreadyStarted(String),
    #[error("cannot start housekeeping for container `{0}` outside of a tokio runtime")]
    NoRuntime(String),
    #[error("container `{0}` is not monitored")]
    UnknownContainer(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Monitors a single container.
///
/// Lifecycle: constructed → running ([`ContainerManager::start`]) → stopped
/// ([`ContainerManager::stop`]). Dropping the manager also ends its housekeeping.
pub struct ContainerManager {
    reference: ContainerReference,
    handle: Arc<dyn ContainerHandle>,
    storage: Arc<dyn StorageSink>,
    config: HousekeepingConfig,
    info: Mutex<ContainerInfo>,
    stop_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for ContainerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerManager")
            .field("reference", &self.reference)
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl ContainerManager {
    /// Creates a manager for container `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `storage` is `None`, and the resolver's or
    /// handle's error unchanged if the container cannot be resolved or identified.
    pub fn new(
        name: impl Into<String>,
        resolver: Arc<dyn ContainerResolver>,
        storage: Option<Arc<dyn StorageSink>>,
        config: HousekeepingConfig,
    ) -> Result<Self> {
        let mut builder = Self::builder(name).resolver(resolver).config(config);
        builder.storage = storage;
        builder.build()
    }

    pub fn builder(name: impl Into<String>) -> ContainerManagerBuilder {
        ContainerManagerBuilder {
            name: name.into(),
            resolver: None,
            storage: None,
            config: HousekeepingConfig::default(),
        }
    }

    /// Identity of the container, as seen at construction.
    pub fn reference(&self) -> &ContainerReference {
        &self.reference
    }

    /// Launches the housekeeping task.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyStarted`] on a second call and [`Error::NoRuntime`] if no
    /// runtime is available.
    pub fn start(&self) -> Result<()> {
        let mut task = lock(&self.task);
        if task.is_some() {
            return Err(Error::AlreadyStarted(self.reference.name.clone()));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| Error::NoRuntime(self.reference.name.clone()))?;

        let housekeeper = Housekeeper::new(
            self.reference.name.clone(),
            Arc::clone(&self.handle),
            Arc::clone(&self.storage),
            self.config,
        );
        *task = Some(runtime.spawn(housekeeper.run(self.stop_tx.subscribe())));
        Ok(())
    }

    /// Asks the housekeeping task to exit.
    ///
    /// A tick already in progress completes first. Calling this more than once, or
    /// before [`ContainerManager::start`], is harmless.
    pub fn stop(&self) -> Result<()> {
        self.stop_tx.send_replace(true);
        Ok(())
    }

    /// Whether the housekeeping task is alive.
    pub fn is_running(&self) -> bool {
        lock(&self.task)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Refreshes the container's spec and subcontainers and returns a copy of its info.
    ///
    /// # Errors
    ///
    /// Returns the handle's error if the spec or the subcontainers cannot be read; the
    /// stored info is left unchanged in that case.
    pub fn get_info(&self) -> Result<ContainerInfo> {
        let spec = self.handle.spec()?;
        let subcontainers = self.handle.list_subcontainers()?;

        let mut info = lock(&self.info);
        info.spec = spec;
        info.subcontainers = subcontainers;
        Ok(info.clone())
    }
}

/// Builder for [`ContainerManager`].
pub struct ContainerManagerBuilder {
    name: String,
    resolver: Option<Arc<dyn ContainerResolver>>,
    storage: Option<Arc<dyn StorageSink>>,
    config: HousekeepingConfig,
}

impl ContainerManagerBuilder {
    pub fn resolver(mut self, resolver: Arc<dyn ContainerResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn storage(mut self, storage: Arc<dyn StorageSink>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn config(mut self, config: HousekeepingConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolves the container and creates a manager that is not yet running.
    ///
    /// # Errors
    ///
    /// See [`ContainerManager::new`]. An invalid configuration is reported as
    /// [`Error::Config`].
    pub fn build(self) -> Result<ContainerManager> {
        let storage = self
            .storage
            .ok_or(Error::InvalidArgument("missing storage sink"))?;
        let resolver = self
            .resolver
            .ok_or(Error::InvalidArgument("missing container resolver"))?;
        let config = self.config.validate()?;

        let handle = resolver.resolve(&self.name)?;
        let reference = handle.reference()?;
        let (stop_tx, _) = watch::channel(false);

        Ok(ContainerManager {
            info: Mutex::new(ContainerInfo::new(reference.clone())),
            reference,
            handle,
            storage,
            config,
            stop_tx,
            task: Mutex::new(None),
        })
    }
}

/// Locks `mutex`, recovering the data if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fake collaborators shared by the manager and monitor tests.
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use crate::cgroup::{RawCpuStats, RawMemoryStats, RawSnapshot};
    use crate::container::{self, ContainerHandle, ContainerResolver};
    use crate::info::{ContainerReference, ContainerSpec, ContainerStats};
    use crate::storage::{self, StorageSink};

    #[derive(Debug, Default)]
    pub struct FakeHandle {
        pub name: String,
        pub spec: Mutex<ContainerSpec>,
        pub subcontainers: Mutex<Vec<ContainerReference>>,
        pub fail_spec: AtomicBool,
        pub fail_stats: AtomicBool,
        /// Report that there is nothing to sample.
        pub no_snapshot: AtomicBool,
        /// Return a snapshot without any section.
        pub empty_snapshot: AtomicBool,
        /// Bump memory usage on every sample so consecutive samples differ.
        pub busy: AtomicBool,
        pub memory_usage: AtomicU64,
        pub stats_calls: AtomicUsize,
    }

    impl FakeHandle {
        pub fn new(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_owned(),
                memory_usage: AtomicU64::new(4096),
                ..Self::default()
            })
        }

        pub fn stats_calls(&self) -> usize {
            self.stats_calls.load(Ordering::SeqCst)
        }
    }

    impl ContainerHandle for FakeHandle {
        fn reference(&self) -> container::Result<ContainerReference> {
            Ok(ContainerReference::new(self.name.clone()))
        }

        fn spec(&self) -> container::Result<ContainerSpec> {
            if self.fail_spec.load(Ordering::SeqCst) {
                return Err(container::Error::NotFound(self.name.clone()));
            }
            Ok(*self.spec.lock().unwrap())
        }

        fn raw_stats(&self) -> container::Result<Option<RawSnapshot>> {
            self.stats_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_stats.load(Ordering::SeqCst) {
                return Err(container::Error::NotFound(self.name.clone()));
            }
            if self.no_snapshot.load(Ordering::SeqCst) {
                return Ok(None);
            }
            if self.empty_snapshot.load(Ordering::SeqCst) {
                return Ok(Some(RawSnapshot::default()));
            }
            let usage = if self.busy.load(Ordering::SeqCst) {
                self.memory_usage.fetch_add(1, Ordering::SeqCst) + 1
            } else {
                self.memory_usage.load(Ordering::SeqCst)
            };
            Ok(Some(RawSnapshot {
                cpu: Some(RawCpuStats {
                    percpu_usage: vec![100, 200],
                    usage_in_usermode: 50,
                    usage_in_kernelmode: 30,
                    total_usage: 300,
                }),
                memory: Some(RawMemoryStats {
                    usage,
                    ..RawMemoryStats::default()
                }),
                network: None,
            }))
        }

        fn list_subcontainers(&self) -> container::Result<Vec<ContainerReference>> {
            Ok(self.subcontainers.lock().unwrap().clone())
        }
    }

    /// Resolves a fixed set of fake handles by name.
    #[derive(Debug, Default)]
    pub struct FakeResolver {
        pub handles: Vec<Arc<FakeHandle>>,
    }

    impl FakeResolver {
        pub fn with(handles: &[&Arc<FakeHandle>]) -> Arc<Self> {
            Arc::new(Self {
                handles: handles.iter().map(|h| Arc::clone(*h)).collect(),
            })
        }
    }

    impl ContainerResolver for FakeResolver {
        fn resolve(&self, name: &str) -> container::Result<Arc<dyn ContainerHandle>> {
            self.handles
                .iter()
                .find(|h| h.name == name)
                .map(|h| Arc::clone(h) as Arc<dyn ContainerHandle>)
                .ok_or_else(|| container::Error::NotFound(name.to_owned()))
        }
    }

    /// Storage rejecting every operation.
    #[derive(Debug, Default)]
    pub struct FailingStorage;

    impl StorageSink for FailingStorage {
        fn add_stats(
            &self,
            _reference: &ContainerReference,
            _stats: ContainerStats,
        ) -> storage::Result<()> {
            Err(storage::Error::Backend("disk full".into()))
        }

        fn recent_stats(&self, name: &str, _count: usize) -> storage::Result<Vec<ContainerStats>> {
            Err(storage::Error::UnknownContainer(name.to_owned()))
        }
    }
}
