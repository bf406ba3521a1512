/// Container graph — clusters containers by shared or nested canonical
/// subtrees into cooperating sets.
///
/// Two containers cooperate when any mount of one is equal to, an ancestor
/// of, or a descendant of any mount of the other — or when both mount the
/// identical container-side destination (the "should share" half of
/// cooperation: a downloader and a library manager that both mount
/// `/downloads` are meant to see the same files even when their host roots
/// are configured to be unrelated). The union is transitive-closure
/// correct: if A cooperates with B and B with C, all three land in one set.
use crate::analysis::normalize::{CanonicalKey, PathNormalizer};
use crate::error::MountDataError;
use crate::model::container::{Container, MountMode};
use std::collections::BTreeMap;
use tracing::debug;

/// One mount, normalized and attached to its container.
#[derive(Debug, Clone)]
pub struct MountSite {
    /// Index of the owning container in the snapshot.
    pub container: usize,
    /// Container-side destination, trailing-slash trimmed.
    pub container_path: String,
    pub mode: MountMode,
    /// Host path exactly as configured.
    pub raw_host_path: String,
    pub key: CanonicalKey,
}

/// A mount that failed validation and was excluded from analysis.
#[derive(Debug, Clone)]
pub struct RejectedMount {
    pub container: usize,
    pub error: MountDataError,
}

/// A maximal group of containers whose mounts intersect or nest.
#[derive(Debug, Clone)]
pub struct CooperatingSet {
    /// Container indices, sorted ascending. Always two or more.
    pub containers: Vec<usize>,
    /// Indices of the sites that establish cooperation, sorted ascending.
    /// Mounts of member containers with no cross-container relation (a
    /// private `/config` mount, say) are deliberately not included.
    pub sites: Vec<usize>,
}

/// The analysed mount structure of one snapshot.
#[derive(Debug)]
pub struct MountGraph {
    pub sites: Vec<MountSite>,
    /// Canonical key → indices of sites mounting that exact key.
    pub by_key: BTreeMap<CanonicalKey, Vec<usize>>,
    pub cooperating_sets: Vec<CooperatingSet>,
    pub rejected: Vec<RejectedMount>,
}

/// Build the mount graph for a snapshot.
///
/// Invalid mounts are logged and skipped; the rest of the container is
/// still analysed.
pub fn build_graph(containers: &[Container], normalizer: &PathNormalizer) -> MountGraph {
    let mut sites = Vec::new();
    let mut rejected = Vec::new();

    for (ci, container) in containers.iter().enumerate() {
        for mount in &container.mounts {
            if let Err(error) = mount.validate() {
                debug!(container = %container.name, %error, "skipping invalid mount");
                rejected.push(RejectedMount {
                    container: ci,
                    error,
                });
                continue;
            }
            // validate() guarantees a non-empty host path, so this cannot
            // fail; the match keeps the engine panic-free regardless.
            let key = match normalizer.normalize(&mount.host_path) {
                Ok(key) => key,
                Err(error) => {
                    rejected.push(RejectedMount {
                        container: ci,
                        error,
                    });
                    continue;
                }
            };
            sites.push(MountSite {
                container: ci,
                container_path: trim_destination(&mount.container_path),
                mode: mount.mode,
                raw_host_path: mount.host_path.trim().to_owned(),
                key,
            });
        }
    }

    let mut by_key: BTreeMap<CanonicalKey, Vec<usize>> = BTreeMap::new();
    for (i, site) in sites.iter().enumerate() {
        by_key.entry(site.key.clone()).or_default().push(i);
    }

    // Union containers over the cooperation relation, remembering which
    // sites supplied the evidence.
    let mut union = UnionFind::new(containers.len());
    let mut linked = vec![false; sites.len()];
    for i in 0..sites.len() {
        for j in (i + 1)..sites.len() {
            let (a, b) = (&sites[i], &sites[j]);
            if a.container == b.container {
                continue;
            }
            if a.key.is_related(&b.key) || a.container_path == b.container_path {
                union.unite(a.container, b.container);
                linked[i] = true;
                linked[j] = true;
            }
        }
    }

    // Collect equivalence classes with two or more containers.
    let mut classes: BTreeMap<usize, CooperatingSet> = BTreeMap::new();
    for ci in 0..containers.len() {
        let root = union.find(ci);
        classes
            .entry(root)
            .or_insert_with(|| CooperatingSet {
                containers: Vec::new(),
                sites: Vec::new(),
            })
            .containers
            .push(ci);
    }
    for (i, site) in sites.iter().enumerate() {
        if linked[i] {
            let root = union.find(site.container);
            if let Some(set) = classes.get_mut(&root) {
                set.sites.push(i);
            }
        }
    }
    let cooperating_sets: Vec<CooperatingSet> = classes
        .into_values()
        .filter(|set| set.containers.len() >= 2)
        .collect();

    MountGraph {
        sites,
        by_key,
        cooperating_sets,
        rejected,
    }
}

/// Trailing-slash-insensitive container destination ("/downloads/" and
/// "/downloads" are the same destination).
fn trim_destination(path: &str) -> String {
    let trimmed = path.trim();
    let stripped = trimmed.trim_end_matches('/');
    if stripped.is_empty() {
        "/".to_owned()
    } else {
        stripped.to_owned()
    }
}

/// Disjoint-set forest with path compression.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn unite(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // Attach the larger root under the smaller so class roots stay
            // stable and iteration order is deterministic.
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::platform::Platform;
    use crate::model::container::Mount;

    fn container(id: &str, mounts: &[(&str, &str)]) -> Container {
        let mut c = Container::new(id, id, "img:latest");
        c.mounts = mounts
            .iter()
            .map(|(host, dest)| Mount::new(*host, *dest, MountMode::Rw))
            .collect();
        c
    }

    fn graph(containers: &[Container]) -> MountGraph {
        build_graph(containers, &PathNormalizer::new(Platform::Linux))
    }

    #[test]
    fn nested_mounts_cooperate() {
        let containers = vec![
            container("sonarr", &[("/mnt/user/data", "/data")]),
            container("qbit", &[("/mnt/user/data/downloads", "/downloads")]),
        ];
        let g = graph(&containers);
        assert_eq!(g.cooperating_sets.len(), 1);
        assert_eq!(g.cooperating_sets[0].containers, vec![0, 1]);
        assert_eq!(g.cooperating_sets[0].sites.len(), 2);
    }

    /// Identical container destinations mean the containers are *meant* to
    /// share files, even when their host roots are unrelated.
    #[test]
    fn shared_destination_cooperates() {
        let containers = vec![
            container("sonarr", &[("/mnt/user/downloads", "/downloads")]),
            container("qbit", &[("/mnt/user/media", "/downloads")]),
        ];
        let g = graph(&containers);
        assert_eq!(g.cooperating_sets.len(), 1);
        assert_eq!(g.cooperating_sets[0].containers, vec![0, 1]);
    }

    /// A cooperates with B, B with C — all three land in one set even
    /// though A and C have no direct relation.
    #[test]
    fn cooperation_is_transitive() {
        let containers = vec![
            container("a", &[("/data/tv", "/tv")]),
            container("b", &[("/data", "/data"), ("/media", "/media")]),
            container("c", &[("/media/movies", "/movies")]),
        ];
        let g = graph(&containers);
        assert_eq!(g.cooperating_sets.len(), 1);
        assert_eq!(g.cooperating_sets[0].containers, vec![0, 1, 2]);
        assert_eq!(g.cooperating_sets[0].sites.len(), 4);
    }

    /// A private /config mount supplies no cooperation evidence and stays
    /// out of the set's site list.
    #[test]
    fn unrelated_config_mount_is_not_linked() {
        let containers = vec![
            container(
                "sonarr",
                &[("/data/tv", "/tv"), ("/opt/sonarr", "/config")],
            ),
            container("radarr", &[("/data/movies", "/movies"), ("/data", "/data")]),
        ];
        let g = graph(&containers);
        assert_eq!(g.cooperating_sets.len(), 1);
        let set = &g.cooperating_sets[0];
        // sonarr's /config site must not appear among the linked sites.
        assert!(set
            .sites
            .iter()
            .all(|&s| g.sites[s].container_path != "/config"));
    }

    #[test]
    fn no_cooperation_yields_no_sets() {
        let containers = vec![
            container("sonarr", &[("/data/tv", "/tv")]),
            container("nginx", &[("/srv/www", "/var/www")]),
        ];
        let g = graph(&containers);
        assert!(g.cooperating_sets.is_empty());
    }

    #[test]
    fn invalid_mounts_are_rejected_not_fatal() {
        let containers = vec![
            container("sonarr", &[("", "/tv"), ("/data/tv", "/tv")]),
            container("radarr", &[("/data", "   ")]),
        ];
        let g = graph(&containers);
        assert_eq!(g.rejected.len(), 2);
        assert_eq!(g.sites.len(), 1);
        assert_eq!(
            g.rejected[0].error,
            MountDataError::EmptyHostPath
        );
        assert_eq!(
            g.rejected[1].error,
            MountDataError::EmptyContainerPath
        );
    }

    #[test]
    fn by_key_groups_identical_sources() {
        let containers = vec![
            container("sonarr", &[("/shared/data", "/data")]),
            container("radarr", &[("/shared/data/", "/data")]),
        ];
        let g = graph(&containers);
        let entry = g.by_key.values().find(|v| v.len() == 2);
        assert!(entry.is_some(), "both mounts should share one canonical key");
    }
}
