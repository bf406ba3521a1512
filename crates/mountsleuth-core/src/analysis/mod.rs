/// Analysis modules — the path-mapping conflict engine.
///
/// The pipeline is a chain of pure, synchronous transformations over an
/// immutable snapshot: platform detection feeds the path normalizer, the
/// graph builder clusters containers into cooperating sets, the conflict
/// detector evaluates its rule set over the graph, and the recommendation
/// engine turns conflict types into fix guidance. Concurrent analyses of
/// independent snapshots need no locking; within one call only conflict
/// rule evaluation is parallelized.
pub mod conflicts;
pub mod graph;
pub mod normalize;
pub mod platform;
pub mod recommend;

pub use conflicts::detect_conflicts;
pub use graph::{build_graph, CooperatingSet, MountGraph, MountSite};
pub use normalize::{CanonicalKey, PathNormalizer, PathRoot};
pub use platform::{detect_platform, Platform};
pub use recommend::recommend;

use crate::model::report::{AnalysisResult, HealthStatus, Summary};
use crate::model::Snapshot;
use tracing::info;

/// Run the full analysis pipeline over one snapshot.
///
/// Deterministic: identical snapshots (order included) produce identical
/// results, conflict and recommendation ordering included. Never fails —
/// invalid mounts are skipped per-mount, an undetectable platform degrades
/// to `unknown`, and an empty snapshot yields a healthy, empty result.
pub fn analyze(snapshot: &Snapshot) -> AnalysisResult {
    let platform = detect_platform(&snapshot.meta, &snapshot.containers);
    let normalizer = PathNormalizer::new(platform);
    let graph = build_graph(&snapshot.containers, &normalizer);
    let conflicts = detect_conflicts(&graph, &snapshot.containers, platform);
    let recommendations = recommend(&conflicts, platform);
    let status = HealthStatus::from_conflicts(&conflicts);

    info!(
        platform = platform.label(),
        containers = snapshot.containers.len(),
        conflicts = conflicts.len(),
        status = status.label(),
        "analysis complete"
    );

    AnalysisResult {
        platform,
        summary: Summary {
            platform_detected: platform,
            status,
            containers_analyzed: snapshot.containers.len(),
        },
        conflicts,
        recommendations,
    }
}
