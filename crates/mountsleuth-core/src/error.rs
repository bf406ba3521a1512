/// Typed validation errors for snapshot data.
///
/// A rejected mount never aborts an analysis — the offending mount is
/// skipped (and logged) while the rest of the snapshot is processed.
use thiserror::Error;

/// Reasons a configured mount cannot participate in analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MountDataError {
    /// The host-side source path is empty or whitespace-only.
    #[error("mount host path is empty")]
    EmptyHostPath,

    /// The container-side destination path is empty or whitespace-only.
    #[error("mount container path is empty")]
    EmptyContainerPath,
}
