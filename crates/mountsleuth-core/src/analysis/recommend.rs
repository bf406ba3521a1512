/// Recommendation engine — maps detected conflict types to canonical,
/// prioritized fix guidance.
///
/// Titles are a closed, versioned vocabulary: the dashboard keys its
/// "learn more" documentation links off these exact strings. One
/// recommendation is emitted per conflict type regardless of how many
/// conflicts of that type fired; descriptions aggregate the affected
/// destinations.
use crate::analysis::platform::Platform;
use crate::model::conflict::{Conflict, ConflictKind, Severity};
use crate::model::report::{Priority, Recommendation};
use std::collections::BTreeSet;

pub const TITLE_RESOLVE_CRITICAL: &str = "Resolve Critical Conflicts";
pub const TITLE_UNIFY_PATH_MAPPINGS: &str = "Unify Path Mappings";
pub const TITLE_SINGLE_ROOT: &str = "Single Root Data Directory";
pub const TITLE_CONSISTENT_BACKEND: &str = "Consistent Storage Backend";
pub const TITLE_WSL2_CONVERSION: &str = "WSL2 Path Conversion";
pub const TITLE_CONSISTENT_UID_GID: &str = "Consistent UID/GID";

/// Reporting order for per-type recommendations.
const KIND_ORDER: [ConflictKind; 5] = [
    ConflictKind::DestinationCollision,
    ConflictKind::SplitRoot,
    ConflictKind::CrossFilesystem,
    ConflictKind::Wsl2PathConversion,
    ConflictKind::PermissionMismatch,
];

/// Build the ordered recommendation list for a conflict set.
///
/// Zero conflicts produce zero recommendations — a healthy host needs no
/// guidance.
pub fn recommend(conflicts: &[Conflict], platform: Platform) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();
    if conflicts.is_empty() {
        return recommendations;
    }

    let criticals: Vec<&Conflict> = conflicts
        .iter()
        .filter(|c| c.severity == Severity::Critical)
        .collect();
    if !criticals.is_empty() {
        recommendations.push(Recommendation {
            priority: Priority::High,
            title: TITLE_RESOLVE_CRITICAL.to_owned(),
            description: format!(
                "{} critical conflict(s) break the shared-file guarantees cooperating containers rely on{}",
                criticals.len(),
                scope_suffix(&criticals),
            ),
            action: None,
        });
    }

    for kind in KIND_ORDER {
        let matching: Vec<&Conflict> = conflicts.iter().filter(|c| c.kind == kind).collect();
        let Some(top_severity) = matching.iter().map(|c| c.severity).min() else {
            continue;
        };
        let priority = match top_severity {
            Severity::Critical => Priority::High,
            Severity::Warning => Priority::Medium,
            Severity::Info => Priority::Low,
        };
        let (title, description, action) = template(kind, platform);
        recommendations.push(Recommendation {
            priority,
            title: title.to_owned(),
            description: format!("{description}{}", scope_suffix(&matching)),
            action,
        });
    }

    // Stable sort: within one priority the fixed type order is preserved,
    // with "Resolve Critical Conflicts" always leading the high group.
    recommendations.sort_by_key(|r| r.priority);
    recommendations
}

/// " (affects /downloads, /tv)" from the conflicts' destinations, or empty
/// when none carry one.
fn scope_suffix(conflicts: &[&Conflict]) -> String {
    let destinations: BTreeSet<&str> = conflicts
        .iter()
        .filter_map(|c| c.destination.as_deref())
        .collect();
    if destinations.is_empty() {
        String::new()
    } else {
        format!(
            " (affects {})",
            destinations.into_iter().collect::<Vec<_>>().join(", ")
        )
    }
}

/// Fixed per-type template: title, base description, optional action.
fn template(kind: ConflictKind, platform: Platform) -> (&'static str, &'static str, Option<String>) {
    match kind {
        ConflictKind::DestinationCollision => (
            TITLE_UNIFY_PATH_MAPPINGS,
            "Containers map different host sources onto the same destination, so files written by one are invisible to the others",
            Some("Use one identical host source path for each shared destination".to_owned()),
        ),
        ConflictKind::SplitRoot => {
            let example = if platform.is_windows_family() {
                "- /mnt/c/data:/data"
            } else {
                "- /data:/data"
            };
            (
                TITLE_SINGLE_ROOT,
                "Mount one common top-level host directory into every cooperating container and use subfolders beneath it, so moves stay on one filesystem",
                Some(example.to_owned()),
            )
        }
        ConflictKind::CrossFilesystem => (
            TITLE_CONSISTENT_BACKEND,
            "Cooperating mounts live on different storage backends; hardlinks cannot cross them",
            Some("Move all cooperating mounts onto the same volume or bind root".to_owned()),
        ),
        ConflictKind::Wsl2PathConversion => (
            TITLE_WSL2_CONVERSION,
            "Windows-native paths should use the WSL2 mount form so Docker resolves them consistently",
            Some("C:\\data → /mnt/c/data".to_owned()),
        ),
        ConflictKind::PermissionMismatch => (
            TITLE_CONSISTENT_UID_GID,
            "Containers sharing a subtree should agree on access mode and write as one user",
            Some("Set identical PUID/PGID environment values on every container sharing files".to_owned()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collision() -> Conflict {
        Conflict::destination_collision(
            "/downloads".to_owned(),
            vec!["aaa".to_owned(), "bbb".to_owned()],
            vec!["/x".to_owned(), "/y".to_owned()],
            "/x".to_owned(),
        )
    }

    #[test]
    fn zero_conflicts_zero_recommendations() {
        assert!(recommend(&[], Platform::Linux).is_empty());
    }

    #[test]
    fn critical_forces_resolve_critical_first() {
        let recs = recommend(&[collision()], Platform::Linux);
        assert_eq!(recs[0].title, TITLE_RESOLVE_CRITICAL);
        assert_eq!(recs[0].priority, Priority::High);
        // Plus the per-type recommendation.
        assert!(recs.iter().any(|r| r.title == TITLE_UNIFY_PATH_MAPPINGS));
    }

    #[test]
    fn repeated_types_are_deduplicated_with_aggregated_scope() {
        let mut second = collision();
        second.destination = Some("/tv".to_owned());
        let recs = recommend(&[collision(), second], Platform::Linux);
        let unify: Vec<_> = recs
            .iter()
            .filter(|r| r.title == TITLE_UNIFY_PATH_MAPPINGS)
            .collect();
        assert_eq!(unify.len(), 1);
        assert!(unify[0].description.contains("/downloads"));
        assert!(unify[0].description.contains("/tv"));
    }

    #[test]
    fn warning_maps_to_medium_and_info_to_low() {
        let warning = Conflict::cross_filesystem(
            vec!["aaa".to_owned()],
            vec!["bind-mount".to_owned(), "nas-volume".to_owned()],
        );
        let info = Conflict::permission_mismatch(
            "/data".to_owned(),
            vec!["aaa".to_owned(), "bbb".to_owned()],
            "modes differ".to_owned(),
        );
        let recs = recommend(&[warning, info], Platform::Linux);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].title, TITLE_CONSISTENT_BACKEND);
        assert_eq!(recs[0].priority, Priority::Medium);
        assert_eq!(recs[1].title, TITLE_CONSISTENT_UID_GID);
        assert_eq!(recs[1].priority, Priority::Low);
    }

    #[test]
    fn wsl_example_follows_platform() {
        let split = Conflict::split_root(
            vec!["aaa".to_owned()],
            vec!["/data".to_owned(), "/media".to_owned()],
            Some("/data".to_owned()),
            false,
        );
        let recs = recommend(&[split.clone()], Platform::Wsl2);
        let single_root = recs
            .iter()
            .find(|r| r.title == TITLE_SINGLE_ROOT)
            .unwrap();
        assert_eq!(single_root.action.as_deref(), Some("- /mnt/c/data:/data"));

        let recs = recommend(&[split], Platform::Linux);
        let single_root = recs
            .iter()
            .find(|r| r.title == TITLE_SINGLE_ROOT)
            .unwrap();
        assert_eq!(single_root.action.as_deref(), Some("- /data:/data"));
    }
}
