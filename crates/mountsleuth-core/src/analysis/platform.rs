/// Host platform detection — infers the environment the Docker host runs
/// in from snapshot metadata and the shape of configured host paths.
///
/// The platform feeds the normalizer (whether `/mnt/<drive>` means a
/// Windows drive) and the WSL2 conversion rule. Detection is a total,
/// deterministic function of its inputs; an unresolvable platform degrades
/// to `Unknown`, which only relaxes platform-specific rules.
use crate::model::container::{Container, SnapshotMeta};
use serde::{Deserialize, Serialize};

/// Host environment classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Mac,
    Linux,
    Wsl2,
    Unknown,
}

impl Platform {
    /// Human-readable label for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Mac => "mac",
            Self::Linux => "linux",
            Self::Wsl2 => "wsl2",
            Self::Unknown => "unknown",
        }
    }

    /// Hosts where the WSL2 drive-mapping convention applies.
    pub fn is_windows_family(self) -> bool {
        matches!(self, Self::Windows | Self::Wsl2)
    }
}

/// Path-shape buckets used for the dominant-shape vote.
#[derive(Debug, Clone, Copy, Default)]
struct ShapeCounts {
    windows: usize,
    wsl: usize,
    posix: usize,
    other: usize,
}

impl ShapeCounts {
    fn total(self) -> usize {
        self.windows + self.wsl + self.posix + self.other
    }
}

/// Infer the host platform.
///
/// Priority: explicit engine metadata first (with `linux` refined to `wsl2`
/// when WSL2-style mounts are present, since Docker reports the WSL2 VM as
/// linux), then the dominant path shape. Both Windows-native and WSL2 forms
/// in one snapshot mean a mixed host, classified `wsl2`. POSIX-only paths
/// cannot distinguish linux from mac without metadata.
pub fn detect_platform(meta: &SnapshotMeta, containers: &[Container]) -> Platform {
    let counts = count_shapes(containers);

    if let Some(os) = &meta.operating_system {
        let os = os.to_lowercase();
        if os.contains("windows") {
            return Platform::Windows;
        }
        if os.contains("darwin") || os.contains("mac") {
            return Platform::Mac;
        }
        if os.contains("linux") {
            return if counts.wsl > 0 {
                Platform::Wsl2
            } else {
                Platform::Linux
            };
        }
    }

    let total = counts.total();
    if total == 0 {
        return Platform::Unknown;
    }
    if counts.windows > 0 && counts.wsl > 0 {
        return Platform::Wsl2;
    }
    if counts.windows * 2 > total {
        return Platform::Windows;
    }
    if counts.wsl * 2 > total {
        return Platform::Wsl2;
    }
    Platform::Unknown
}

fn count_shapes(containers: &[Container]) -> ShapeCounts {
    let mut counts = ShapeCounts::default();
    for container in containers {
        for mount in &container.mounts {
            let path = mount.host_path.trim();
            if path.is_empty() {
                continue;
            }
            if is_windows_shape(path) {
                counts.windows += 1;
            } else if is_wsl_shape(path) {
                counts.wsl += 1;
            } else if path.starts_with('/') {
                counts.posix += 1;
            } else {
                counts.other += 1;
            }
        }
    }
    counts
}

/// Windows-native shapes: drive-letter prefix, UNC prefix, or any backslash.
fn is_windows_shape(path: &str) -> bool {
    let bytes = path.as_bytes();
    (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':')
        || path.starts_with("\\\\")
        || path.contains('\\')
}

/// WSL2 drive-mount shape: `/mnt/<single letter>` optionally followed by a
/// subpath.
fn is_wsl_shape(path: &str) -> bool {
    let Some(rest) = path.strip_prefix("/mnt/") else {
        return false;
    };
    let letter = rest.split('/').next().unwrap_or("");
    letter.len() == 1 && letter.as_bytes()[0].is_ascii_alphabetic()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::container::{Mount, MountMode};

    fn container_with_paths(paths: &[&str]) -> Container {
        let mut container = Container::new("abc123", "sonarr", "linuxserver/sonarr:latest");
        container.mounts = paths
            .iter()
            .enumerate()
            .map(|(i, p)| Mount::new(*p, format!("/dest{i}"), MountMode::Rw))
            .collect();
        container
    }

    fn detect(paths: &[&str]) -> Platform {
        detect_platform(&SnapshotMeta::default(), &[container_with_paths(paths)])
    }

    #[test]
    fn metadata_overrides_path_shapes() {
        let meta = SnapshotMeta {
            operating_system: Some("Windows Server 2022".to_owned()),
        };
        let containers = [container_with_paths(&["/data/tv"])];
        assert_eq!(detect_platform(&meta, &containers), Platform::Windows);
    }

    /// Docker reports the WSL2 VM as linux; WSL2-style mounts refine it.
    #[test]
    fn linux_metadata_refined_by_wsl_mounts() {
        let meta = SnapshotMeta {
            operating_system: Some("linux".to_owned()),
        };
        let wsl = [container_with_paths(&["/mnt/c/docker/data"])];
        assert_eq!(detect_platform(&meta, &wsl), Platform::Wsl2);

        let plain = [container_with_paths(&["/srv/media"])];
        assert_eq!(detect_platform(&meta, &plain), Platform::Linux);
    }

    #[test]
    fn mixed_windows_and_wsl_forms_mean_wsl2_host() {
        assert_eq!(
            detect(&["C:\\docker\\data", "/mnt/c/docker/data/downloads"]),
            Platform::Wsl2
        );
    }

    #[test]
    fn windows_majority_wins() {
        assert_eq!(
            detect(&["C:\\data\\tv", "D:\\data\\movies", "/opt/config"]),
            Platform::Windows
        );
    }

    #[test]
    fn posix_only_is_unknown_without_metadata() {
        assert_eq!(detect(&["/mnt/user/data", "/opt/config"]), Platform::Unknown);
    }

    /// `/mnt/user` is an unraid share, not a drive mount.
    #[test]
    fn unraid_share_is_not_wsl_shape() {
        assert!(!is_wsl_shape("/mnt/user/data"));
        assert!(is_wsl_shape("/mnt/c"));
        assert!(is_wsl_shape("/mnt/c/docker"));
    }

    #[test]
    fn empty_snapshot_is_unknown() {
        assert_eq!(
            detect_platform(&SnapshotMeta::default(), &[]),
            Platform::Unknown
        );
    }
}
