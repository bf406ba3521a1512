/// Conflict detection — a pure, deterministic rule evaluator over the
/// mount graph.
///
/// Each rule is evaluated independently per cooperating set; sets are
/// processed in parallel since rules only read the graph. Determinism
/// comes from the final merge + sort pass, never from evaluation order.
use crate::analysis::graph::{CooperatingSet, MountGraph};
use crate::analysis::normalize::{common_root, CanonicalKey, PathNormalizer, PathRoot};
use crate::analysis::platform::Platform;
use crate::model::conflict::Conflict;
use crate::model::container::Container;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

/// Run every detection rule and return the merged, ordered conflict list.
pub fn detect_conflicts(
    graph: &MountGraph,
    containers: &[Container],
    platform: Platform,
) -> Vec<Conflict> {
    let mut conflicts: Vec<Conflict> = graph
        .cooperating_sets
        .par_iter()
        .flat_map_iter(|set| detect_in_set(set, graph, containers, platform))
        .collect();

    conflicts.extend(detect_wsl2_conversion(graph, containers, platform));

    let mut merged = merge_by_scope(conflicts);
    merged.sort_by(|a, b| {
        a.severity
            .cmp(&b.severity)
            .then_with(|| a.containers.cmp(&b.containers))
            .then_with(|| a.destination.cmp(&b.destination))
            .then_with(|| a.kind.cmp(&b.kind))
    });
    merged
}

/// Rules scoped to one cooperating set.
fn detect_in_set(
    set: &CooperatingSet,
    graph: &MountGraph,
    containers: &[Container],
    platform: Platform,
) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    detect_destination_collisions(set, graph, containers, platform, &mut conflicts);
    detect_split_root(set, graph, containers, platform, &mut conflicts);
    detect_cross_filesystem(set, graph, containers, &mut conflicts);
    detect_permission_mismatch(set, graph, containers, &mut conflicts);
    conflicts
}

/// `destination_collision`: different, non-equivalent host sources mounted
/// to the identical container destination.
fn detect_destination_collisions(
    set: &CooperatingSet,
    graph: &MountGraph,
    containers: &[Container],
    platform: Platform,
    out: &mut Vec<Conflict>,
) {
    let mut by_destination: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for &si in &set.sites {
        by_destination
            .entry(graph.sites[si].container_path.as_str())
            .or_default()
            .push(si);
    }

    for (destination, site_indices) in by_destination {
        let container_ids = sorted_container_ids(&site_indices, graph, containers);
        if container_ids.len() < 2 {
            continue;
        }
        let keys: BTreeSet<&CanonicalKey> =
            site_indices.iter().map(|&si| &graph.sites[si].key).collect();
        if keys.len() < 2 {
            // One shared source seen by several containers — the desired
            // sharing pattern, not a conflict.
            continue;
        }
        let sources: Vec<String> = keys
            .iter()
            .map(|key| key.preferred_display(platform))
            .collect();
        let suggested = preferred_source(sources.clone());
        out.push(Conflict::destination_collision(
            destination.to_owned(),
            container_ids,
            sources,
            suggested,
        ));
    }
}

/// `split_root`: the set's mounts have no single top-level host root.
fn detect_split_root(
    set: &CooperatingSet,
    graph: &MountGraph,
    containers: &[Container],
    platform: Platform,
    out: &mut Vec<Conflict>,
) {
    let keys: Vec<CanonicalKey> = set
        .sites
        .iter()
        .map(|&si| graph.sites[si].key.clone())
        .collect();
    if keys.is_empty() || common_root(&keys).is_some() {
        return;
    }

    // The divergence may be an artifact of the platform hint: paths that
    // the WSL2 drive rule would unify stay divergent on a host we did not
    // detect as Windows/WSL2. Those downgrade to a warning.
    let equivalence_possible = !platform.is_windows_family() && {
        let wsl = PathNormalizer::new(Platform::Wsl2);
        let renormalized: Vec<CanonicalKey> = set
            .sites
            .iter()
            .filter_map(|&si| wsl.normalize(&graph.sites[si].raw_host_path).ok())
            .collect();
        renormalized.len() == set.sites.len() && common_root(&renormalized).is_some()
    };

    let roots: BTreeSet<String> = keys.iter().map(root_display).collect();
    let suggested = suggest_root(&keys);
    out.push(Conflict::split_root(
        sorted_container_ids(&set.sites, graph, containers),
        roots.into_iter().collect(),
        suggested,
        equivalence_possible,
    ));
}

/// `cross_filesystem`: mixed storage backends inside one cooperating set.
fn detect_cross_filesystem(
    set: &CooperatingSet,
    graph: &MountGraph,
    containers: &[Container],
    out: &mut Vec<Conflict>,
) {
    let backends: BTreeSet<&'static str> = set
        .sites
        .iter()
        .map(|&si| graph.sites[si].key.root().backend_label())
        .collect();
    if backends.len() < 2 {
        return;
    }
    out.push(Conflict::cross_filesystem(
        sorted_container_ids(&set.sites, graph, containers),
        backends.into_iter().map(str::to_owned).collect(),
    ));
}

/// `permission_mismatch`: an overlapping destination shared with divergent
/// access modes, or written by containers with divergent PUID/PGID.
fn detect_permission_mismatch(
    set: &CooperatingSet,
    graph: &MountGraph,
    containers: &[Container],
    out: &mut Vec<Conflict>,
) {
    let mut by_destination: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for &si in &set.sites {
        by_destination
            .entry(graph.sites[si].container_path.as_str())
            .or_default()
            .push(si);
    }

    for (destination, site_indices) in by_destination {
        let container_ids = sorted_container_ids(&site_indices, graph, containers);
        if container_ids.len() < 2 {
            continue;
        }
        let any_rw = site_indices
            .iter()
            .any(|&si| graph.sites[si].mode.is_writable());
        let any_ro = site_indices
            .iter()
            .any(|&si| !graph.sites[si].mode.is_writable());
        if !any_rw {
            // All read-only: nobody can write, so nothing to mismatch.
            continue;
        }

        let uid_gid_diverges = declared_ids_diverge(&site_indices, graph, containers);
        if !any_ro && !uid_gid_diverges {
            continue;
        }

        let mut detail = String::new();
        if any_ro {
            detail.push_str(&format!(
                "access modes differ across containers sharing {destination}: {}",
                mode_listing(&site_indices, graph, containers),
            ));
        }
        if uid_gid_diverges {
            if !detail.is_empty() {
                detail.push_str("; ");
            }
            detail.push_str("declared PUID/PGID values differ across these containers");
        }

        out.push(Conflict::permission_mismatch(
            destination.to_owned(),
            container_ids,
            detail,
        ));
    }
}

/// `wsl2_path_conversion`: Windows-native paths the normalizer could not
/// resolve to a drive key on a Windows-family host (UNC shares, relative
/// backslash paths). Evaluated per mount — a lone container with an
/// unconvertible path is still worth flagging.
fn detect_wsl2_conversion(
    graph: &MountGraph,
    containers: &[Container],
    platform: Platform,
) -> Vec<Conflict> {
    if !platform.is_windows_family() {
        return Vec::new();
    }
    graph
        .sites
        .iter()
        .filter(|site| {
            is_windows_native(&site.raw_host_path)
                && matches!(site.key.root(), PathRoot::Opaque(_))
        })
        .map(|site| {
            Conflict::wsl2_path_conversion(
                containers[site.container].id.clone(),
                site.container_path.clone(),
                &site.raw_host_path,
            )
        })
        .collect()
}

// ── Helpers ──────────────────────────────────────────────────────────────

/// Sorted, deduplicated ids of the containers owning the given sites.
fn sorted_container_ids(
    site_indices: &[usize],
    graph: &MountGraph,
    containers: &[Container],
) -> Vec<String> {
    let ids: BTreeSet<String> = site_indices
        .iter()
        .map(|&si| containers[graph.sites[si].container].id.clone())
        .collect();
    ids.into_iter().collect()
}

/// "sonarr (rw), radarr (ro)" style listing, ordered by container id.
fn mode_listing(site_indices: &[usize], graph: &MountGraph, containers: &[Container]) -> String {
    let mut entries: Vec<(String, &'static str)> = site_indices
        .iter()
        .map(|&si| {
            let site = &graph.sites[si];
            (
                containers[site.container].name.clone(),
                site.mode.label(),
            )
        })
        .collect();
    entries.sort();
    entries.dedup();
    entries
        .into_iter()
        .map(|(name, mode)| format!("{name} ({mode})"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// PUID/PGID (UID/GID fallback) declared by at least two involved
/// containers with differing values.
fn declared_ids_diverge(
    site_indices: &[usize],
    graph: &MountGraph,
    containers: &[Container],
) -> bool {
    let declared: BTreeSet<(Option<&String>, Option<&String>)> = site_indices
        .iter()
        .filter_map(|&si| {
            let env = &containers[graph.sites[si].container].env;
            let uid = env.get("PUID").or_else(|| env.get("UID"));
            let gid = env.get("PGID").or_else(|| env.get("GID"));
            if uid.is_none() && gid.is_none() {
                None
            } else {
                Some((uid, gid))
            }
        })
        .collect();
    declared.len() > 1
}

/// Top-level root a key hangs off, rendered for display.
fn root_display(key: &CanonicalKey) -> String {
    match key.root() {
        PathRoot::Bind => match key.segments().first() {
            Some(first) => format!("/{first}"),
            None => "/".to_owned(),
        },
        PathRoot::Drive(d) => format!("{}:/", d.to_ascii_uppercase()),
        PathRoot::Volume(v) => format!("/{v}"),
        PathRoot::Opaque(_) => key.to_string(),
    }
}

/// Pick the root to consolidate on: the most common root wins, with
/// recognized shared-data layouts breaking ties.
fn suggest_root(keys: &[CanonicalKey]) -> Option<String> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for key in keys {
        *counts.entry(root_display(key)).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|(a, ca), (b, cb)| {
            ca.cmp(cb)
                .then_with(|| layout_rank(b).cmp(&layout_rank(a)))
                .then_with(|| b.len().cmp(&a.len()))
                .then_with(|| b.cmp(a))
        })
        .map(|(root, _)| root)
}

/// Pick the source to standardize on for a destination collision.
fn preferred_source(mut candidates: Vec<String>) -> String {
    candidates.sort_by(|a, b| {
        layout_rank(a)
            .cmp(&layout_rank(b))
            .then_with(|| a.len().cmp(&b.len()))
            .then_with(|| a.cmp(b))
    });
    candidates.remove(0)
}

/// Recognized shared-data layouts rank ahead of ad-hoc paths.
fn layout_rank(path: &str) -> u8 {
    if path == "/data" || path.starts_with("/data/") {
        0
    } else if path.starts_with("/mnt/user") {
        1
    } else if path.starts_with("/volume") {
        2
    } else {
        3
    }
}

fn is_windows_native(path: &str) -> bool {
    let bytes = path.as_bytes();
    path.contains('\\') || (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':')
}

/// Tie-break: one conflict per (containers, destination) scope. The
/// highest-severity conflict survives; the rest fold in as secondary notes.
fn merge_by_scope(conflicts: Vec<Conflict>) -> Vec<Conflict> {
    let mut groups: BTreeMap<(Vec<String>, Option<String>), Vec<Conflict>> = BTreeMap::new();
    for conflict in conflicts {
        groups
            .entry((conflict.containers.clone(), conflict.destination.clone()))
            .or_default()
            .push(conflict);
    }
    groups
        .into_values()
        .map(|mut group| {
            group.sort_by_key(|c| (c.severity, c.kind));
            let mut primary = group.remove(0);
            for secondary in &group {
                primary.absorb(secondary);
            }
            primary
        })
        .collect()
}
