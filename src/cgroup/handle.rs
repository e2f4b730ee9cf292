use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::container::{ContainerHandle, ContainerResolver, Error, Result};
use crate::info::{ContainerReference, ContainerSpec};

use super::raw::{RawCpuStats, RawMemoryStats, RawSnapshot};
use super::stats::{
    CpuAcctStat, CpuAcctUsage, KeyValueStat, MemoryStat, MemoryUsage, NetworkStat, PerCpuUsage,
    SingleLineStat,
};
use super::utils;

const CPUACCT_HIERARCHY: &str = "cpuacct";
const MEMORY_HIERARCHY: &str = "memory";
const DEFAULT_PROC_ROOT: &str = "/proc";

/// Resolves container names to cgroups of a v1 hierarchy mounted at `root`.
///
/// A container named `/docker/abc` lives in `<root>/cpuacct/docker/abc` and
/// `<root>/memory/docker/abc`; it exists if at least one of the two does.
#[derive(Debug, Clone)]
pub struct CgroupResolver {
    root: PathBuf,
    proc_root: PathBuf,
}

impl CgroupResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
        }
    }

    /// Sets where `/proc` is found, e.g. a host procfs mounted into a container.
    pub fn with_proc_root(mut self, proc_root: impl Into<PathBuf>) -> Self {
        self.proc_root = proc_root.into();
        self
    }
}

impl ContainerResolver for CgroupResolver {
    fn resolve(&self, name: &str) -> Result<Arc<dyn ContainerHandle>> {
        let handle = CgroupHandle::new(&self.root, &self.proc_root, name)?;
        if !handle.cpuacct_dir.is_dir() && !handle.memory_dir.is_dir() {
            return Err(Error::NotFound(handle.name));
        }
        log::trace!("resolved container `{}`", handle.name);
        Ok(Arc::new(handle))
    }
}

/// [`ContainerHandle`] reading a cgroup v1 `cpuacct` and `memory` controller pair.
#[derive(Debug)]
pub struct CgroupHandle {
    name: String,
    cpuacct_dir: PathBuf,
    memory_dir: PathBuf,
    proc_root: PathBuf,
}

impl CgroupHandle {
    fn new(root: &Path, proc_root: &Path, name: &str) -> Result<Self> {
        let relative = relative_cgroup_path(name)?;
        Ok(Self {
            name: join_name("/", relative.to_str().unwrap_or_default()),
            cpuacct_dir: root.join(CPUACCT_HIERARCHY).join(&relative),
            memory_dir: root.join(MEMORY_HIERARCHY).join(&relative),
            proc_root: proc_root.to_path_buf(),
        })
    }

    fn first_pid(&self) -> Result<Option<u32>> {
        for dir in [&self.cpuacct_dir, &self.memory_dir] {
            if let Some(pid) = utils::read_first_pid(&dir.join("cgroup.procs"))? {
                return Ok(Some(pid));
            }
        }
        Ok(None)
    }

    fn cpu_stats(&self) -> Result<Option<RawCpuStats>> {
        let dir = &self.cpuacct_dir;
        let stat = utils::read_optional(&dir.join("cpuacct.stat"), CpuAcctStat::from_reader)?;
        let per_cpu =
            utils::read_optional(&dir.join("cpuacct.usage_percpu"), PerCpuUsage::from_reader)?;
        if stat.is_none() && per_cpu.is_none() {
            return Ok(None);
        }
        let total = utils::read_optional(&dir.join("cpuacct.usage"), CpuAcctUsage::from_reader)?;
        let stat = stat.unwrap_or_default();

        Ok(Some(RawCpuStats {
            percpu_usage: per_cpu.unwrap_or_default().usage_ns,
            usage_in_usermode: stat.user_nanos(),
            usage_in_kernelmode: stat.system_nanos(),
            total_usage: total.unwrap_or_default().usage_ns,
        }))
    }

    fn memory_stats(&self) -> Result<Option<RawMemoryStats>> {
        let dir = &self.memory_dir;
        let usage =
            utils::read_optional(&dir.join("memory.usage_in_bytes"), MemoryUsage::from_reader)?;
        let stat = utils::read_optional(&dir.join("memory.stat"), MemoryStat::from_reader)?;
        if usage.is_none() && stat.is_none() {
            return Ok(None);
        }

        Ok(Some(RawMemoryStats {
            usage: usage.unwrap_or_default().usage_bytes,
            stats: stat.unwrap_or_default().stats,
        }))
    }

    fn network_stats(&self) -> Result<Option<NetworkStat>> {
        let Some(pid) = self.first_pid()? else {
            return Ok(None);
        };
        let path = self.proc_root.join(pid.to_string()).join("net/dev");
        utils::read_optional(&path, NetworkStat::from_reader)
    }
}

impl ContainerHandle for CgroupHandle {
    fn reference(&self) -> Result<ContainerReference> {
        Ok(ContainerReference::new(self.name.clone()))
    }

    fn spec(&self) -> Result<ContainerSpec> {
        Ok(ContainerSpec {
            has_cpu: self.cpuacct_dir.is_dir(),
            has_memory: self.memory_dir.is_dir(),
            has_network: self.first_pid()?.is_some(),
            has_filesystem: false,
        })
    }

    fn raw_stats(&self) -> Result<Option<RawSnapshot>> {
        let snapshot = RawSnapshot {
            cpu: self.cpu_stats()?,
            memory: self.memory_stats()?,
            network: self.network_stats()?,
        };
        if snapshot.is_empty() {
            return Ok(None);
        }
        Ok(Some(snapshot))
    }

    fn list_subcontainers(&self) -> Result<Vec<ContainerReference>> {
        let mut children = BTreeSet::new();
        for dir in [&self.cpuacct_dir, &self.memory_dir] {
            let entries = match std::fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                Err(source) => {
                    return Err(Error::Read {
                        path: dir.clone(),
                        source,
                    });
                }
            };
            for entry in entries {
                let entry = entry.map_err(|source| Error::Read {
                    path: dir.clone(),
                    source,
                })?;
                if entry.path().is_dir() {
                    children.insert(entry.file_name().to_string_lossy().into_owned());
                }
            }
        }

        Ok(children
            .into_iter()
            .map(|child| ContainerReference::new(join_name(&self.name, &child)))
            .collect())
    }
}

/// Turns a container name into a path relative to a hierarchy root.
fn relative_cgroup_path(name: &str) -> Result<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::RootDir | Component::CurDir => {}
            Component::Normal(part) => relative.push(part),
            Component::ParentDir | Component::Prefix(_) => {
                return Err(Error::InvalidName(name.to_owned()));
            }
        }
    }
    Ok(relative)
}

fn join_name(parent: &str, child: &str) -> String {
    if child.is_empty() {
        return parent.to_owned();
    }
    format!("{}/{}", parent.trim_end_matches('/'), child)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    struct FakeCgroupFs {
        dir: tempfile::TempDir,
    }

    impl FakeCgroupFs {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
            }
        }

        fn cgroup_root(&self) -> PathBuf {
            self.dir.path().join("cgroup")
        }

        fn proc_root(&self) -> PathBuf {
            self.dir.path().join("proc")
        }

        fn write(&self, hierarchy: &str, cgroup: &str, file: &str, contents: &str) {
            let dir = self.cgroup_root().join(hierarchy).join(cgroup);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(file), contents).unwrap();
        }

        fn write_net_dev(&self, pid: u32, contents: &str) {
            let dir = self.proc_root().join(pid.to_string()).join("net");
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("dev"), contents).unwrap();
        }

        fn resolver(&self) -> CgroupResolver {
            CgroupResolver::new(self.cgroup_root()).with_proc_root(self.proc_root())
        }
    }

    fn populated() -> FakeCgroupFs {
        let cgroups = FakeCgroupFs::new();
        cgroups.write(CPUACCT_HIERARCHY, "docker/abc", "cpuacct.stat", "user 5\nsystem 3\n");
        cgroups.write(CPUACCT_HIERARCHY, "docker/abc", "cpuacct.usage_percpu", "100 200 \n");
        cgroups.write(CPUACCT_HIERARCHY, "docker/abc", "cpuacct.usage", "301\n");
        cgroups.write(CPUACCT_HIERARCHY, "docker/abc", "cgroup.procs", "77\n");
        cgroups.write(MEMORY_HIERARCHY, "docker/abc", "memory.usage_in_bytes", "1000\n");
        cgroups.write(
            MEMORY_HIERARCHY,
            "docker/abc",
            "memory.stat",
            "pgfault 9\ntotal_inactive_anon 200\ntotal_active_file 50\n",
        );
        cgroups.write_net_dev(
            77,
            "header\nheader\n  eth0: 10 1 0 0 0 0 0 0 20 2 0 0 0 0 0 0\n",
        );
        cgroups
    }

    #[test]
    fn test_resolve_unknown_container() {
        let cgroups = populated();
        let err = cgroups.resolver().resolve("/docker/nope").err().unwrap();
        assert!(matches!(err, Error::NotFound(name) if name == "/docker/nope"));
    }

    #[test]
    fn test_resolve_rejects_parent_components() {
        let cgroups = populated();
        let err = cgroups.resolver().resolve("/docker/../../etc").err().unwrap();
        assert!(matches!(err, Error::InvalidName(_)));
    }

    #[test]
    fn test_reference_is_normalized() {
        let cgroups = populated();
        let handle = cgroups.resolver().resolve("docker/abc/").unwrap();
        assert_eq!(handle.reference().unwrap().name, "/docker/abc");
    }

    #[test]
    fn test_raw_stats_reads_all_controllers() {
        let cgroups = populated();
        let handle = cgroups.resolver().resolve("/docker/abc").unwrap();
        let raw = handle.raw_stats().unwrap().unwrap();

        let cpu = raw.cpu.unwrap();
        assert_eq!(cpu.percpu_usage, vec![100, 200]);
        assert_eq!(cpu.usage_in_usermode, 50_000_000);
        assert_eq!(cpu.usage_in_kernelmode, 30_000_000);
        assert_eq!(cpu.total_usage, 301);

        let memory = raw.memory.unwrap();
        assert_eq!(memory.usage, 1000);
        assert_eq!(memory.stats["pgfault"], 9);
        assert_eq!(memory.stats["total_inactive_anon"], 200);

        let network = raw.network.unwrap();
        assert_eq!(network.rx.bytes, 10);
        assert_eq!(network.tx.packets, 2);
    }

    #[test]
    fn test_raw_stats_without_memory_controller() {
        let cgroups = FakeCgroupFs::new();
        cgroups.write(CPUACCT_HIERARCHY, "solo", "cpuacct.usage_percpu", "1 2 3\n");
        let handle = cgroups.resolver().resolve("/solo").unwrap();
        let raw = handle.raw_stats().unwrap().unwrap();
        assert_eq!(raw.cpu.unwrap().percpu_usage, vec![1, 2, 3]);
        assert!(raw.memory.is_none());
        assert!(raw.network.is_none());
    }

    #[test]
    fn test_raw_stats_of_removed_cgroup_is_none() {
        let cgroups = populated();
        let handle = cgroups.resolver().resolve("/docker/abc").unwrap();
        fs::remove_dir_all(cgroups.cgroup_root().join(CPUACCT_HIERARCHY).join("docker/abc")).unwrap();
        fs::remove_dir_all(cgroups.cgroup_root().join(MEMORY_HIERARCHY).join("docker/abc")).unwrap();
        assert!(handle.raw_stats().unwrap().is_none());
    }

    #[test]
    fn test_raw_stats_reports_corrupt_file() {
        let cgroups = populated();
        cgroups.write(MEMORY_HIERARCHY, "docker/abc", "memory.usage_in_bytes", "oops\n");
        let handle = cgroups.resolver().resolve("/docker/abc").unwrap();
        let err = handle.raw_stats().unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }

    #[test]
    fn test_spec_reflects_controllers() {
        let cgroups = populated();
        cgroups.write(MEMORY_HIERARCHY, "memonly", "memory.usage_in_bytes", "1\n");

        let spec = cgroups.resolver().resolve("/docker/abc").unwrap().spec().unwrap();
        assert!(spec.has_cpu && spec.has_memory && spec.has_network);
        assert!(!spec.has_filesystem);

        let spec = cgroups.resolver().resolve("/memonly").unwrap().spec().unwrap();
        assert!(!spec.has_cpu);
        assert!(spec.has_memory);
        assert!(!spec.has_network);
    }

    #[test]
    fn test_list_subcontainers_merges_hierarchies() {
        let cgroups = populated();
        cgroups.write(CPUACCT_HIERARCHY, "docker/def", "cpuacct.usage", "0\n");
        cgroups.write(MEMORY_HIERARCHY, "docker/xyz", "memory.usage_in_bytes", "0\n");

        let handle = cgroups.resolver().resolve("/docker").unwrap();
        let names: Vec<_> = handle
            .list_subcontainers()
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["/docker/abc", "/docker/def", "/docker/xyz"]);

        let root = cgroups.resolver().resolve("/").unwrap();
        let names: Vec<_> = root
            .list_subcontainers()
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["/docker"]);
    }
}
