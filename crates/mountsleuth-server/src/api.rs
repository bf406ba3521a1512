/// HTTP API — the request/response and streaming surface consumed by the
/// dashboard frontend.
///
/// Handlers hold no logic of their own: they capture a snapshot, call the
/// engine, and shape the response. Docker being unreachable is a 503 on
/// snapshot-dependent endpoints, never an engine failure.
use crate::jobs::{self, JobProgress};
use crate::state::AppState;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Response as HttpResponse, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use mountsleuth_core::analysis::analyze;
use mountsleuth_core::export::conflicts_to_csv;
use mountsleuth_core::model::Snapshot;
use serde_json::json;
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/docker/status", get(docker_status))
        .route("/api/containers", get(containers))
        .route("/api/analyze", post(analyze_now))
        .route("/api/analyze/latest", get(analyze_latest))
        .route("/api/analyze/export", get(analyze_export))
        .route("/api/analyze/stream", get(analyze_stream))
        .route("/api/recommendations", get(recommendations))
        .with_state(state)
}

/// Bind and serve the API until shutdown.
pub async fn serve(state: Arc<AppState>, bind: &str) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("serving MountSleuth API on http://{bind}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health(State(state): State<Arc<AppState>>) -> Result<Response, StatusCode> {
    json_response(
        StatusCode::OK,
        &json!({
            "status": "healthy",
            "docker_connected": state.docker.is_connected(),
            "timestamp": Utc::now().to_rfc3339(),
        }),
    )
}

async fn docker_status(State(state): State<Arc<AppState>>) -> Result<Response, StatusCode> {
    json_response(StatusCode::OK, &state.docker.status())
}

async fn containers(State(state): State<Arc<AppState>>) -> Result<Response, StatusCode> {
    if !state.docker.is_connected() {
        return docker_unavailable(&state);
    }
    match state.docker.snapshot().await {
        Ok(snapshot) => json_response(
            StatusCode::OK,
            &json!({
                "containers": snapshot.containers,
                "total": snapshot.containers.len(),
                "timestamp": Utc::now().to_rfc3339(),
            }),
        ),
        Err(err) => json_response(
            StatusCode::SERVICE_UNAVAILABLE,
            &json!({ "error": format!("{err:#}") }),
        ),
    }
}

/// Run an analysis. A JSON snapshot in the request body is analyzed as-is
/// (offline mode); otherwise the live Docker snapshot is used.
async fn analyze_now(
    State(state): State<Arc<AppState>>,
    body: Option<Json<Snapshot>>,
) -> Result<Response, StatusCode> {
    let snapshot = match body {
        Some(Json(snapshot)) => snapshot,
        None => {
            if !state.docker.is_connected() {
                return docker_unavailable(&state);
            }
            match state.docker.snapshot().await {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    return json_response(
                        StatusCode::SERVICE_UNAVAILABLE,
                        &json!({ "error": format!("{err:#}") }),
                    )
                }
            }
        }
    };

    let result = state.store_latest(analyze(&snapshot));
    json_response(StatusCode::OK, &*result)
}

async fn analyze_latest(State(state): State<Arc<AppState>>) -> Result<Response, StatusCode> {
    match state.latest_result() {
        Some(result) => json_response(StatusCode::OK, &*result),
        None => json_response(
            StatusCode::NOT_FOUND,
            &json!({ "error": "no analysis has run yet" }),
        ),
    }
}

/// Latest conflict table as CSV, for the dashboard's download button.
async fn analyze_export(State(state): State<Arc<AppState>>) -> Result<Response, StatusCode> {
    let Some(result) = state.latest_result() else {
        return json_response(
            StatusCode::NOT_FOUND,
            &json!({ "error": "no analysis has run yet" }),
        );
    };
    let csv = conflicts_to_csv(&result).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(HttpResponse::builder()
        .status(StatusCode::OK)
        .header("content-type", "text/csv")
        .header(
            "content-disposition",
            "attachment; filename=\"mountsleuth-conflicts.csv\"",
        )
        .body(Body::from(csv))
        .expect("valid HTTP response"))
}

/// Recommendations-only query. Without Docker this degrades to the
/// connect-guidance payload rather than an error.
async fn recommendations(State(state): State<Arc<AppState>>) -> Result<Response, StatusCode> {
    if !state.docker.is_connected() {
        return json_response(
            StatusCode::OK,
            &json!({
                "recommendations": [{
                    "priority": "high",
                    "title": "Connect Docker Socket",
                    "description": "MountSleuth needs access to Docker to analyze your setup",
                    "action": "Mount /var/run/docker.sock into the mountsleuth container",
                }],
            }),
        );
    }
    let snapshot = match state.docker.snapshot().await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            return json_response(
                StatusCode::SERVICE_UNAVAILABLE,
                &json!({ "error": format!("{err:#}") }),
            )
        }
    };
    let result = analyze(&snapshot);
    json_response(
        StatusCode::OK,
        &json!({
            "platform": result.platform,
            "recommendations": result.recommendations,
            "conflicts": result.conflicts,
        }),
    )
}

/// Streaming analyze: spawns a job and relays its progress as SSE events
/// (`started`, `progress`, `complete`, `cancelled`). Dropping the client
/// connection cancels the job.
async fn analyze_stream(
    State(state): State<Arc<AppState>>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, StatusCode> {
    if !state.docker.is_connected() {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    let snapshot = state
        .docker
        .snapshot()
        .await
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;

    let handle = jobs::start_analysis(snapshot);
    let (tx, rx) = tokio::sync::mpsc::channel::<JobProgress>(jobs::PROGRESS_CHANNEL_CAPACITY);

    // Bridge the job's synchronous channel into the async stream. The
    // forwarder thread outlives this handler; dropping the handle only
    // detaches it.
    let _forwarder = tokio::task::spawn_blocking(move || {
        while let Ok(progress) = handle.progress_rx.recv() {
            let terminal = matches!(
                progress,
                JobProgress::Complete { .. } | JobProgress::Cancelled
            );
            if tx.blocking_send(progress).is_err() {
                handle.cancel();
                break;
            }
            if terminal {
                break;
            }
        }
    });

    let stream = ReceiverStream::new(rx)
        .map(|progress| Event::default().event(progress.event_name()).json_data(&progress));
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// 503 with the connection error from the manager.
fn docker_unavailable(state: &AppState) -> Result<Response, StatusCode> {
    let status = state.docker.status();
    json_response(
        StatusCode::SERVICE_UNAVAILABLE,
        &json!({
            "error": status
                .error
                .unwrap_or_else(|| "Docker not connected".to_owned()),
        }),
    )
}

fn json_response<T: serde::Serialize>(
    status: StatusCode,
    payload: &T,
) -> Result<Response, StatusCode> {
    let bytes = serde_json::to_vec(payload).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(HttpResponse::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(bytes))
        .expect("valid HTTP response"))
}
