/// MountSleuth Core — snapshot model and path-mapping analysis engine.
///
/// This crate contains all business logic with zero I/O dependencies.
/// It operates on an already-captured container/mount snapshot and never
/// talks to Docker, the filesystem, or the network itself.
///
/// # Modules
///
/// - [`model`] — Snapshot input model and analysis result types.
/// - [`analysis`] — Path canonicalization, container graph, conflict rules,
///   and recommendations.
/// - [`export`] — CSV rendering of analysis results.
/// - [`error`] — Typed validation errors for snapshot data.
pub mod analysis;
pub mod error;
pub mod export;
pub mod model;
