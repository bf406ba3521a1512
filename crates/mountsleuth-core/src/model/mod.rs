/// Data model for MountSleuth analysis.
///
/// Re-exports the snapshot input types and the analysis result types.
pub mod container;
pub mod conflict;
pub mod report;

pub use container::{Container, Mount, MountMode, Snapshot, SnapshotMeta};
pub use conflict::{Conflict, ConflictFix, ConflictKind, Severity};
pub use report::{AnalysisResult, HealthStatus, Priority, Recommendation, Summary};
