/// Typed path-mapping conflicts.
///
/// Every conflict is built through a per-type constructor so the record
/// always carries exactly the fields its type requires; the serialized
/// shape (`type`, `severity`, `note`, `destination`, `containers`, `fix`)
/// is a stable contract rendered directly by the dashboard.
use serde::{Deserialize, Serialize};

/// Conflict severity. The derived order puts `Critical` first so sorting
/// ascending yields severity-descending output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    /// Human-readable label for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

/// The closed set of detected conflict types.
///
/// The derived order is the evaluation/reporting order used to break ties
/// between equal-severity conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// Different host sources mounted to the identical container destination.
    DestinationCollision,
    /// Cooperating mounts span host roots with no common ancestor.
    SplitRoot,
    /// Cooperating mounts mix storage backends (NAS volume vs bind mount).
    CrossFilesystem,
    /// Windows-native path that could not be unified with a WSL2 mount form.
    Wsl2PathConversion,
    /// Shared subtree with divergent access modes or UID/GID settings.
    PermissionMismatch,
}

impl ConflictKind {
    /// Human-readable label for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::DestinationCollision => "destination_collision",
            Self::SplitRoot => "split_root",
            Self::CrossFilesystem => "cross_filesystem",
            Self::Wsl2PathConversion => "wsl2_path_conversion",
            Self::PermissionMismatch => "permission_mismatch",
        }
    }
}

/// Actionable fix guidance attached to a conflict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictFix {
    pub description: String,
    /// Literal remediation command or compose snippet, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Canonical host path to standardize on, when one can be chosen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_source: Option<String>,
}

/// A single detected mapping conflict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conflict {
    #[serde(rename = "type")]
    pub kind: ConflictKind,
    pub severity: Severity,
    pub note: String,
    /// Container-side path implicated, if any.
    pub destination: Option<String>,
    /// Involved container ids, ordered and deduplicated.
    pub containers: Vec<String>,
    pub fix: ConflictFix,
}

impl Conflict {
    /// Two or more containers mount different, non-equivalent host sources
    /// to the identical container destination.
    pub fn destination_collision(
        destination: String,
        containers: Vec<String>,
        sources: Vec<String>,
        suggested_source: String,
    ) -> Self {
        let note = format!(
            "{} containers mount different host paths ({}) to {destination}; files written by one are invisible to the others",
            containers.len(),
            sources.join(", "),
        );
        let action = format!("- {suggested_source}:{destination}");
        Self {
            kind: ConflictKind::DestinationCollision,
            severity: Severity::Critical,
            note,
            destination: Some(destination),
            containers,
            fix: ConflictFix {
                description: "Standardize on a single host source for this destination across all cooperating containers".to_owned(),
                action: Some(action),
                suggested_source: Some(suggested_source),
            },
        }
    }

    /// Cooperating mounts have no single top-level host root in common.
    ///
    /// `equivalence_possible` downgrades the severity to warning when the
    /// divergent roots would unify under the WSL2 drive rule (i.e. the paths
    /// may denote one filesystem, but the detected platform gave the
    /// normalizer no licence to prove it).
    pub fn split_root(
        containers: Vec<String>,
        roots: Vec<String>,
        suggested_root: Option<String>,
        equivalence_possible: bool,
    ) -> Self {
        let severity = if equivalence_possible {
            Severity::Warning
        } else {
            Severity::Critical
        };
        let note = format!(
            "cooperating mounts span unrelated host roots ({}); moves between them fall back to copy+delete instead of instant hardlink renames",
            roots.join(", "),
        );
        let action = suggested_root
            .as_ref()
            .map(|root| format!("- {root}:{root}"));
        Self {
            kind: ConflictKind::SplitRoot,
            severity,
            note,
            destination: None,
            containers,
            fix: ConflictFix {
                description: "Consolidate all cooperating mounts under one top-level host directory and use subfolders beneath it".to_owned(),
                action,
                suggested_source: suggested_root,
            },
        }
    }

    /// Cooperating mounts mix storage backends.
    pub fn cross_filesystem(containers: Vec<String>, backends: Vec<String>) -> Self {
        let note = format!(
            "cooperating mounts mix storage backends ({}); paths on different backends cannot share hardlinks",
            backends.join(", "),
        );
        Self {
            kind: ConflictKind::CrossFilesystem,
            severity: Severity::Warning,
            note,
            destination: None,
            containers,
            fix: ConflictFix {
                description: "Move all cooperating mounts onto one consistent storage backend".to_owned(),
                action: None,
                suggested_source: None,
            },
        }
    }

    /// A Windows-native host path the normalizer could not unify with the
    /// WSL2 mount convention.
    pub fn wsl2_path_conversion(container: String, destination: String, raw_path: &str) -> Self {
        let note = format!(
            "host path {raw_path} uses a Windows-native form that Docker cannot match against WSL2 mounts",
        );
        Self {
            kind: ConflictKind::Wsl2PathConversion,
            severity: Severity::Warning,
            note,
            destination: Some(destination),
            containers: vec![container],
            fix: ConflictFix {
                description: "Convert the host path to the WSL2 mount form".to_owned(),
                action: Some("C:\\data → /mnt/c/data".to_owned()),
                suggested_source: None,
            },
        }
    }

    /// Divergent access modes (or UID/GID settings) on a shared subtree.
    pub fn permission_mismatch(
        destination: String,
        containers: Vec<String>,
        detail: String,
    ) -> Self {
        Self {
            kind: ConflictKind::PermissionMismatch,
            severity: Severity::Info,
            note: detail,
            destination: Some(destination),
            containers,
            fix: ConflictFix {
                description: "Align mount modes and PUID/PGID across containers sharing this subtree".to_owned(),
                action: None,
                suggested_source: None,
            },
        }
    }

    /// Fold a lower-severity conflict for the same containers/destination
    /// into this one as secondary detail.
    pub fn absorb(&mut self, other: &Conflict) {
        self.note.push_str("; also: ");
        self.note.push_str(&other.note);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Severity must order critical < warning < info so an ascending sort
    /// yields severity-descending output.
    #[test]
    fn severity_order() {
        assert!(Severity::Critical < Severity::Warning);
        assert!(Severity::Warning < Severity::Info);
    }

    #[test]
    fn conflict_serializes_with_type_tag() {
        let conflict = Conflict::destination_collision(
            "/downloads".to_owned(),
            vec!["aaa".to_owned(), "bbb".to_owned()],
            vec!["/media/tv".to_owned(), "/media/movies".to_owned()],
            "/media/tv".to_owned(),
        );
        let json = serde_json::to_value(&conflict).unwrap();
        assert_eq!(json["type"], "destination_collision");
        assert_eq!(json["severity"], "critical");
        assert_eq!(json["destination"], "/downloads");
        assert_eq!(json["fix"]["suggested_source"], "/media/tv");
    }

    #[test]
    fn absorb_appends_secondary_note() {
        let mut primary = Conflict::destination_collision(
            "/downloads".to_owned(),
            vec!["aaa".to_owned()],
            vec!["/a".to_owned(), "/b".to_owned()],
            "/a".to_owned(),
        );
        let secondary = Conflict::permission_mismatch(
            "/downloads".to_owned(),
            vec!["aaa".to_owned()],
            "modes differ".to_owned(),
        );
        primary.absorb(&secondary);
        assert!(primary.note.contains("also: modes differ"));
        assert_eq!(primary.severity, Severity::Critical);
    }
}
