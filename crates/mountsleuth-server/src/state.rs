/// Shared application state for the HTTP API.
use crate::docker::DockerManager;
use mountsleuth_core::model::AnalysisResult;
use parking_lot::RwLock;
use std::sync::Arc;

/// State shared across request handlers.
pub struct AppState {
    pub docker: DockerManager,
    /// Most recent analysis result, backing the dashboard's reload and
    /// CSV-export affordances. Persistence is out of scope — this cache
    /// lives and dies with the process.
    latest: RwLock<Option<Arc<AnalysisResult>>>,
}

impl AppState {
    pub fn new(docker: DockerManager) -> Arc<Self> {
        Arc::new(Self {
            docker,
            latest: RwLock::new(None),
        })
    }

    /// Store a fresh result as the latest, returning the shared handle.
    pub fn store_latest(&self, result: AnalysisResult) -> Arc<AnalysisResult> {
        let shared = Arc::new(result);
        *self.latest.write() = Some(shared.clone());
        shared
    }

    pub fn latest_result(&self) -> Option<Arc<AnalysisResult>> {
        self.latest.read().clone()
    }
}
