/// Docker connectivity — container discovery over the local engine API.
///
/// Connection strategy covers the ways users actually run the dashboard:
/// the mounted Unix socket first, then the Windows named pipe, then
/// whatever `DOCKER_HOST` points at. A failed connection is a reportable
/// status, never a crash — the engine can still analyze file-provided
/// snapshots.
use anyhow::{Context, Result};
use bollard::container::{InspectContainerOptions, ListContainersOptions};
use bollard::models::{ContainerSummary, MountPoint};
use bollard::{Docker, API_DEFAULT_VERSION};
use mountsleuth_core::model::{Container, Mount, MountMode, Snapshot, SnapshotMeta};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Seconds to wait on each connection attempt before trying the next.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// How the manager reached the Docker engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMethod {
    UnixSocket,
    WindowsPipe,
    DockerHostEnv,
}

impl ConnectionMethod {
    /// Wire name reported by the status endpoint.
    pub fn label(self) -> &'static str {
        match self {
            Self::UnixSocket => "unix_socket",
            Self::WindowsPipe => "windows_pipe",
            Self::DockerHostEnv => "docker_host_env",
        }
    }
}

/// Connection state reported to the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DockerStatus {
    pub connected: bool,
    pub method: Option<&'static str>,
    pub error: Option<String>,
}

/// Manages the Docker connection and captures container snapshots.
pub struct DockerManager {
    client: Option<Docker>,
    method: Option<ConnectionMethod>,
    error: Option<String>,
}

impl DockerManager {
    /// Attempt each connection method in turn. Never fails: a fully
    /// disconnected manager carries the error for the status endpoint.
    pub async fn connect() -> Self {
        #[cfg(unix)]
        match Docker::connect_with_unix(
            "unix:///var/run/docker.sock",
            CONNECT_TIMEOUT_SECS,
            API_DEFAULT_VERSION,
        ) {
            Ok(client) => {
                if client.ping().await.is_ok() {
                    info!("Docker connected via Unix socket");
                    return Self::connected(client, ConnectionMethod::UnixSocket);
                }
                debug!("Unix socket present but ping failed");
            }
            Err(err) => debug!(%err, "Unix socket connection failed"),
        }

        #[cfg(windows)]
        match Docker::connect_with_named_pipe(
            "npipe:////./pipe/docker_engine",
            CONNECT_TIMEOUT_SECS,
            API_DEFAULT_VERSION,
        ) {
            Ok(client) => {
                if client.ping().await.is_ok() {
                    info!("Docker connected via Windows named pipe");
                    return Self::connected(client, ConnectionMethod::WindowsPipe);
                }
                debug!("named pipe present but ping failed");
            }
            Err(err) => debug!(%err, "named pipe connection failed"),
        }

        match Docker::connect_with_local_defaults() {
            Ok(client) => {
                if client.ping().await.is_ok() {
                    info!("Docker connected via DOCKER_HOST defaults");
                    return Self::connected(client, ConnectionMethod::DockerHostEnv);
                }
                debug!("default connection present but ping failed");
            }
            Err(err) => debug!(%err, "default connection failed"),
        }

        warn!("Docker connection failed on every method");
        Self {
            client: None,
            method: None,
            error: Some(
                "could not connect to Docker; check the docker socket mount".to_owned(),
            ),
        }
    }

    fn connected(client: Docker, method: ConnectionMethod) -> Self {
        Self {
            client: Some(client),
            method: Some(method),
            error: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    pub fn status(&self) -> DockerStatus {
        DockerStatus {
            connected: self.is_connected(),
            method: self.method.map(ConnectionMethod::label),
            error: self.error.clone(),
        }
    }

    /// Capture a snapshot of running containers: mounts, path-related
    /// environment, and the host OS reported by the engine.
    pub async fn snapshot(&self) -> Result<Snapshot> {
        let client = self.client.as_ref().context("Docker not connected")?;

        let meta = match client.info().await {
            Ok(info) => SnapshotMeta {
                operating_system: info.os_type.or(info.operating_system),
            },
            Err(err) => {
                debug!(%err, "engine info unavailable");
                SnapshotMeta::default()
            }
        };

        let summaries = client
            .list_containers(Some(ListContainersOptions::<String> {
                all: false,
                ..Default::default()
            }))
            .await
            .context("listing containers")?;

        let mut containers = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let full_id = summary.id.clone().unwrap_or_default();
            let env = if full_id.is_empty() {
                BTreeMap::new()
            } else {
                match client
                    .inspect_container(&full_id, None::<InspectContainerOptions>)
                    .await
                {
                    Ok(inspect) => {
                        path_related_env(inspect.config.and_then(|c| c.env).unwrap_or_default())
                    }
                    Err(err) => {
                        debug!(%err, container = %full_id, "container inspect failed");
                        BTreeMap::new()
                    }
                }
            };
            containers.push(container_from_summary(summary, env));
        }

        info!(count = containers.len(), "captured container snapshot");
        Ok(Snapshot { meta, containers })
    }
}

/// Convert one listed container into the engine's model.
fn container_from_summary(
    summary: ContainerSummary,
    env: BTreeMap<String, String>,
) -> Container {
    let id = short_id(summary.id.as_deref().unwrap_or_default());
    let name = summary
        .names
        .unwrap_or_default()
        .into_iter()
        .next()
        .map(|n| n.trim_start_matches('/').to_owned())
        .unwrap_or_else(|| id.clone());
    let image = summary.image.unwrap_or_else(|| "unknown".to_owned());
    let mounts = summary
        .mounts
        .unwrap_or_default()
        .into_iter()
        .filter_map(mount_from_point)
        .collect();

    let mut container = Container::new(id, name, image);
    container.mounts = mounts;
    container.env = env;
    container
}

/// Convert one Docker mount point; anonymous volumes without a host source
/// carry no mapping to analyze and are dropped.
fn mount_from_point(point: MountPoint) -> Option<Mount> {
    let host_path = point.source.filter(|s| !s.is_empty())?;
    let container_path = point.destination.filter(|d| !d.is_empty())?;
    let read_only = point.rw == Some(false)
        || point
            .mode
            .as_deref()
            .is_some_and(|mode| mode.split(',').any(|part| part == "ro"));
    let mode = if read_only {
        MountMode::Ro
    } else {
        MountMode::Rw
    };
    Some(Mount::new(host_path, container_path, mode))
}

/// Environment variables worth carrying into analysis: permission ids plus
/// anything that looks path-related.
fn path_related_env(vars: Vec<String>) -> BTreeMap<String, String> {
    const ID_KEYS: [&str; 5] = ["PUID", "PGID", "UID", "GID", "UMASK"];
    const PATH_KEYWORDS: [&str; 5] = ["path", "root", "mount", "dir", "folder"];

    let mut env = BTreeMap::new();
    for var in vars {
        let Some((key, value)) = var.split_once('=') else {
            continue;
        };
        let keep = ID_KEYS.contains(&key)
            || PATH_KEYWORDS
                .iter()
                .any(|kw| key.to_lowercase().contains(kw));
        if keep {
            env.insert(key.to_owned(), value.to_owned());
        }
    }
    env
}

/// Docker's short container id — the first 12 hex characters.
fn short_id(id: &str) -> String {
    id.chars().take(12).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mount_point_maps_mode_from_rw_flag() {
        let point = MountPoint {
            source: Some("/data/tv".to_owned()),
            destination: Some("/tv".to_owned()),
            rw: Some(false),
            ..Default::default()
        };
        let mount = mount_from_point(point).unwrap();
        assert_eq!(mount.mode, MountMode::Ro);
    }

    #[test]
    fn mount_point_falls_back_to_mode_string() {
        let point = MountPoint {
            source: Some("/data/tv".to_owned()),
            destination: Some("/tv".to_owned()),
            mode: Some("ro,z".to_owned()),
            ..Default::default()
        };
        let mount = mount_from_point(point).unwrap();
        assert_eq!(mount.mode, MountMode::Ro);
    }

    #[test]
    fn anonymous_volume_is_dropped() {
        let point = MountPoint {
            source: Some(String::new()),
            destination: Some("/var/lib/data".to_owned()),
            ..Default::default()
        };
        assert!(mount_from_point(point).is_none());
    }

    #[test]
    fn env_filter_keeps_ids_and_path_vars() {
        let env = path_related_env(vec![
            "PUID=1000".to_owned(),
            "PGID=1000".to_owned(),
            "TZ=Europe/London".to_owned(),
            "DOWNLOAD_DIR=/downloads".to_owned(),
            "MALFORMED".to_owned(),
        ]);
        assert_eq!(env.len(), 3);
        assert_eq!(env.get("PUID").map(String::as_str), Some("1000"));
        assert!(env.contains_key("DOWNLOAD_DIR"));
        assert!(!env.contains_key("TZ"));
    }

    #[test]
    fn summary_conversion_trims_name_and_id() {
        let summary = ContainerSummary {
            id: Some("0123456789abcdef0123".to_owned()),
            names: Some(vec!["/sonarr".to_owned()]),
            image: Some("linuxserver/sonarr:latest".to_owned()),
            ..Default::default()
        };
        let container = container_from_summary(summary, BTreeMap::new());
        assert_eq!(container.id, "0123456789ab");
        assert_eq!(container.name, "sonarr");
        assert_eq!(container.image, "linuxserver/sonarr:latest");
        assert!(container.mounts.is_empty());
    }
}
