//! Creo Housekeeper: per-container housekeeping for cgroup v1 hosts.
//!
//! Every monitored container gets a [`manager::ContainerManager`] that periodically
//! samples its cgroup accounting files, normalizes the counters into
//! [`info::ContainerStats`] and hands them to a [`storage::StorageSink`]. Idle
//! containers are polled less often: the housekeeping interval doubles while
//! consecutive samples are identical and drops back to the baseline on the first change.
use std::path::PathBuf;
use std::sync::Arc;

pub mod cgroup;
pub mod config;
pub mod container;
pub mod error;
pub mod fsutil;
pub mod info;
pub mod manager;
pub mod storage;

pub const CGROUP_ROOT_ENV: &str = "CGROUP_ROOT";
pub const PROC_ROOT_ENV: &str = "PROC_ROOT";
pub const STORAGE_MAX_SAMPLES_ENV: &str = "STORAGE_MAX_SAMPLES";

/// Runs the housekeeper until interrupted.
///
/// Monitors the containers named on the command line (the root container `/` if none
/// are given), logs their info once and keeps housekeeping them until `ctrl-c`.
///
/// # Errors
///
/// Possible errors include:
/// - An invalid housekeeping configuration in the environment.
/// - An unparsable `STORAGE_MAX_SAMPLES`.
/// - A container that does not exist under the cgroup root.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::HousekeepingConfig::from_env()?;
    let cgroup_root = std::env::var_os(CGROUP_ROOT_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/sys/fs/cgroup"));
    let max_samples = match std::env::var(STORAGE_MAX_SAMPLES_ENV) {
        Ok(value) => value
            .parse()
            .map_err(|err| format!("invalid value `{value}` for `{STORAGE_MAX_SAMPLES_ENV}`: {err}"))?,
        Err(_) => storage::DEFAULT_MAX_SAMPLES,
    };
    log::debug!("Cgroup root: {}", cgroup_root.display());
    log::debug!("Housekeeping config: {:?}", config);

    let mut resolver = cgroup::CgroupResolver::new(cgroup_root);
    if let Some(proc_root) = std::env::var_os(PROC_ROOT_ENV) {
        resolver = resolver.with_proc_root(proc_root);
    }
    let monitor = Arc::new(manager::Monitor::new(
        Arc::new(resolver),
        Arc::new(storage::InMemoryStorage::new(max_samples)),
        config,
    ));

    let mut names: Vec<String> = std::env::args().skip(1).collect();
    if names.is_empty() {
        names.push("/".to_owned());
    }
    for name in &names {
        if let Err(err) = monitor.add_container(name) {
            monitor.stop_all();
            return Err(err.into());
        }
    }

    {
        let monitor = Arc::clone(&monitor);
        tokio::task::spawn_blocking(move || {
            for name in monitor.container_names() {
                match monitor.get_info(&name) {
                    Ok(info) => match serde_json::to_string(&info) {
                        Ok(json) => log::info!("{json}"),
                        Err(err) => log::error!("failed to serialize info of `{name}`: {err}"),
                    },
                    Err(err) => log::error!("failed to get info of `{name}`: {err}"),
                }
            }
        })
        .await?;
    }

    tokio::signal::ctrl_c().await?;
    log::info!("Shutting down");
    monitor.stop_all();
    Ok(())
}
