/// MountSleuth Server — the service boundary around the analysis engine.
///
/// Everything here is thin I/O glue: the engine in `mountsleuth-core` does
/// the actual reasoning and this crate feeds it snapshots and exposes its
/// results.
///
/// # Modules
///
/// - [`docker`] — Docker engine connectivity and snapshot capture.
/// - [`api`] — HTTP API (axum) consumed by the dashboard frontend.
/// - [`jobs`] — Cancellable analysis jobs with progress streaming.
/// - [`state`] — Shared application state.
pub mod api;
pub mod docker;
pub mod jobs;
pub mod state;
