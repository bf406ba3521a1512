/// Snapshot input model — containers and their volume mounts as captured
/// from a Docker host (or supplied from a file).
///
/// A snapshot is immutable once captured: the engine only reads it, and
/// distinct analyses of the same snapshot produce identical results.
use crate::error::MountDataError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One captured view of a Docker host: metadata plus the ordered list of
/// containers to analyse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Host metadata reported by the connectivity layer, if any.
    #[serde(default)]
    pub meta: SnapshotMeta,
    /// Containers in capture order.
    #[serde(default)]
    pub containers: Vec<Container>,
}

impl Snapshot {
    /// Build a snapshot with no host metadata.
    pub fn from_containers(containers: Vec<Container>) -> Self {
        Self {
            meta: SnapshotMeta::default(),
            containers,
        }
    }
}

/// Host-level metadata attached to a snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotMeta {
    /// Host OS as reported by the Docker engine (`linux`, `windows`,
    /// `darwin`). `None` when the connectivity layer could not tell.
    #[serde(default)]
    pub operating_system: Option<String>,
}

/// A single container and its volume mounts.
///
/// Identity is `id`; `name` and `image` are informational.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    /// Volume mounts in configuration order.
    #[serde(default)]
    pub mounts: Vec<Mount>,
    /// Path/permission-related environment variables (PUID, PGID, …).
    /// A `BTreeMap` keeps iteration deterministic.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl Container {
    /// Build a container with no mounts and no environment.
    pub fn new(id: impl Into<String>, name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image: image.into(),
            mounts: Vec::new(),
            env: BTreeMap::new(),
        }
    }
}

/// A single volume mount: host source path, container destination path,
/// and access mode. Belongs to exactly one container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mount {
    /// Host-side source path, raw as configured.
    pub host_path: String,
    /// Container-side destination path.
    pub container_path: String,
    #[serde(default)]
    pub mode: MountMode,
}

impl Mount {
    pub fn new(
        host_path: impl Into<String>,
        container_path: impl Into<String>,
        mode: MountMode,
    ) -> Self {
        Self {
            host_path: host_path.into(),
            container_path: container_path.into(),
            mode,
        }
    }

    /// Reject mounts whose paths are empty or whitespace-only.
    ///
    /// Malformed-but-non-empty paths are *not* an error — the normalizer
    /// falls back to an opaque literal key for those.
    pub fn validate(&self) -> Result<(), MountDataError> {
        if self.host_path.trim().is_empty() {
            return Err(MountDataError::EmptyHostPath);
        }
        if self.container_path.trim().is_empty() {
            return Err(MountDataError::EmptyContainerPath);
        }
        Ok(())
    }
}

/// Mount access mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MountMode {
    Ro,
    #[default]
    Rw,
}

impl MountMode {
    /// Human-readable label for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Ro => "ro",
            Self::Rw => "rw",
        }
    }

    pub fn is_writable(self) -> bool {
        matches!(self, Self::Rw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_normal_mount() {
        let mount = Mount::new("/data/tv", "/tv", MountMode::Rw);
        assert!(mount.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_host_path() {
        let mount = Mount::new("   ", "/tv", MountMode::Rw);
        assert_eq!(mount.validate(), Err(MountDataError::EmptyHostPath));
    }

    #[test]
    fn validate_rejects_empty_container_path() {
        let mount = Mount::new("/data/tv", "", MountMode::Ro);
        assert_eq!(mount.validate(), Err(MountDataError::EmptyContainerPath));
    }

    /// Mode defaults to `rw`, matching Docker's default bind behaviour.
    #[test]
    fn mode_defaults_to_rw() {
        let mount: Mount = serde_json::from_str(
            r#"{"host_path": "/data", "container_path": "/data"}"#,
        )
        .unwrap();
        assert_eq!(mount.mode, MountMode::Rw);
        assert!(mount.mode.is_writable());
    }
}
