//! Public data model exposed to API layers.
//!
//! - [`ContainerReference`]: immutable identity of a monitored container.
//! - [`ContainerSpec`]: which resource domains are isolated for the container.
//! - [`ContainerInfo`]: identity, direct subcontainers and spec, as returned by
//!   [`crate::manager::ContainerManager::get_info`].
//! - [`ContainerStats`]: one normalized point-in-time sample.
mod stats;

pub use stats::{
    ContainerStats, CpuStats, CpuUsage, MemoryData, MemoryStats, NetworkStats,
};

/// Identity of a container: a unique, path-like name plus any alternate names.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
pub struct ContainerReference {
    pub name: String,
    pub aliases: Vec<String>,
}

impl ContainerReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
        }
    }

    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }
}

impl std::fmt::Display for ContainerReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Resource domains isolated for a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct ContainerSpec {
    pub has_cpu: bool,
    pub has_memory: bool,
    pub has_network: bool,
    pub has_filesystem: bool,
}

/// Snapshot of a container handed out to callers.
///
/// Always a copy; mutations performed by the housekeeping loop after the
/// snapshot was taken are never visible through it.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
pub struct ContainerInfo {
    #[serde(flatten)]
    pub reference: ContainerReference,
    pub subcontainers: Vec<ContainerReference>,
    pub spec: ContainerSpec,
}

impl ContainerInfo {
    pub fn new(reference: ContainerReference) -> Self {
        Self {
            reference,
            subcontainers: Vec::new(),
            spec: ContainerSpec::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.reference.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_serializes_flat_reference() {
        let mut info = ContainerInfo::new(
            ContainerReference::new("/docker/abc").with_aliases(vec!["web".to_owned()]),
        );
        info.subcontainers.push(ContainerReference::new("/docker/abc/child"));
        info.spec.has_cpu = true;

        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["name"], "/docker/abc");
        assert_eq!(value["aliases"][0], "web");
        assert_eq!(value["subcontainers"][0]["name"], "/docker/abc/child");
        assert_eq!(value["spec"]["has_cpu"], true);
        assert_eq!(value["spec"]["has_memory"], false);
    }

    #[test]
    fn test_reference_display_is_name() {
        let reference = ContainerReference::new("/system.slice");
        assert_eq!(reference.to_string(), "/system.slice");
    }
}
