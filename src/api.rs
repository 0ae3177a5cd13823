//! REST API handlers for shift scheduling.
//!
//! A thin shell around [`RunController`]: start a run, poll its state,
//! revoke it and fetch the best schedule once it finishes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

use crate::console::{self, ConsoleListener};
use crate::constraints::ViolationScorer;
use crate::demo_data::{self, DemoData};
use crate::dto::{AnalyzeResponse, HealthResponse, InfoResponse, ScheduleDto, SolutionDto};
use crate::error::SchedulingError;
use crate::progress::{ListenerSet, ProgressEvent};
use crate::service::{RunController, RunState};

/// Application state shared across handlers.
pub struct AppState {
    pub controller: RunController,
    /// Best schedule of the most recent finished run.
    latest: RwLock<Option<SolutionDto>>,
    /// Reported generations of the current or last run.
    progress: Arc<RwLock<Vec<ProgressEvent>>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            controller: RunController::new(),
            latest: RwLock::new(None),
            progress: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl IntoResponse for SchedulingError {
    fn into_response(self) -> Response {
        let status = match &self {
            SchedulingError::Busy => StatusCode::CONFLICT,
            SchedulingError::InvalidConfiguration { .. } => StatusCode::BAD_REQUEST,
            SchedulingError::InsufficientEmployees { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            SchedulingError::TaskFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

// ============================================================================
// Router and Handlers
// ============================================================================

/// Creates the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health & Info
        .route("/health", get(health))
        .route("/info", get(info))
        // Demo data
        .route("/demo-data", get(list_demo_data))
        .route("/demo-data/{id}", get(get_demo_data))
        // Schedules
        .route("/schedules", get(get_status).post(create_schedule).delete(revoke))
        .route("/schedules/status", get(get_status))
        .route("/schedules/best", get(get_best))
        .route("/schedules/progress", get(get_progress))
        .route("/schedules/analyze", put(analyze_schedule))
        .with_state(state)
}

/// GET /health - Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "UP" })
}

/// GET /info - Application info endpoint.
async fn info() -> Json<InfoResponse> {
    Json(InfoResponse {
        name: "Shift Scheduling",
        version: env!("CARGO_PKG_VERSION"),
        solver_engine: "Genetic Algorithm",
    })
}

/// GET /demo-data - List available demo data sets.
async fn list_demo_data() -> Json<Vec<&'static str>> {
    Json(demo_data::list_demo_data())
}

/// GET /demo-data/{id} - Get a specific demo data set.
async fn get_demo_data(Path(id): Path<String>) -> Result<Json<ScheduleDto>, StatusCode> {
    match id.parse::<DemoData>() {
        Ok(demo) => Ok(Json(ScheduleDto::from_problem(&demo_data::generate(demo)))),
        Err(_) => Err(StatusCode::NOT_FOUND),
    }
}

/// POST /schedules - Start optimizing a schedule.
/// Returns the run ID as plain text, or 409 while another run is active.
async fn create_schedule(
    State(state): State<Arc<AppState>>,
    Json(dto): Json<ScheduleDto>,
) -> Result<String, SchedulingError> {
    let scorer = ViolationScorer::new(dto.scorer_config())?;
    let request = dto.to_request();
    let (slots, employees) = (request.slots.len(), request.roster.employee_count());
    let population = request.config.population_size;

    let history = Arc::clone(&state.progress);
    let listeners = ListenerSet::new()
        .with(ConsoleListener::new())
        .with(move |generation: usize, fitness: f64| {
            let mut history = history.write();
            // Generation 0 is always reported and opens a new history.
            if generation == 0 {
                history.clear();
            }
            history.push(ProgressEvent { generation, fitness });
        });

    let handle = state.controller.start(request, listeners)?;
    let id = handle.id;
    *state.latest.write() = None;
    console::print_run_started(slots, employees, population);

    let state_clone = state.clone();
    let started = Instant::now();
    tokio::spawn(async move {
        match handle.join().await {
            Ok(solution) => {
                console::print_run_ended(started.elapsed(), &solution);
                *state_clone.latest.write() = Some(SolutionDto::from_solution(&solution, &scorer));
            }
            Err(e) => warn!(run_id = %id, error = %e, "Run ended without a schedule"),
        }
    });

    Ok(id.to_string())
}

/// GET /schedules/status - Current run state.
async fn get_status(State(state): State<Arc<AppState>>) -> Json<RunState> {
    Json(state.controller.state())
}

/// GET /schedules/best - Best schedule of the last finished run.
async fn get_best(State(state): State<Arc<AppState>>) -> Result<Json<SolutionDto>, StatusCode> {
    match state.latest.read().as_ref() {
        Some(solution) => Ok(Json(solution.clone())),
        None => Err(StatusCode::NO_CONTENT),
    }
}

/// GET /schedules/progress - Reported generations so far.
async fn get_progress(State(state): State<Arc<AppState>>) -> Json<Vec<ProgressEvent>> {
    Json(state.progress.read().clone())
}

/// DELETE /schedules - Revoke the active run.
async fn revoke(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.controller.revoke() {
        StatusCode::ACCEPTED
    } else {
        StatusCode::NOT_FOUND
    }
}

/// PUT /schedules/analyze - Violation breakdown for an assigned schedule.
async fn analyze_schedule(Json(dto): Json<ScheduleDto>) -> Result<Json<AnalyzeResponse>, SchedulingError> {
    let scorer = ViolationScorer::new(dto.scorer_config())?;
    Ok(Json(AnalyzeResponse::analyze(&dto.slots, &scorer)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    async fn send(app: Router, method: Method, uri: &str, body: Option<String>) -> (StatusCode, String) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn endless_schedule() -> String {
        serde_json::json!({
            "slots": [{"id": "s1", "day": 0, "startTime": "09:00:00", "endTime": "17:00:00",
                       "requirements": [{"role": "Nurse", "count": 1}]}],
            "employees": [{"id": "n1", "role": "Nurse"}],
            "config": {"populationSize": 4, "tournamentSize": 2, "maxGenerations": 1000000, "concurrency": 1},
            "scorer": {"maxShiftsPerWeek": 0}
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(Arc::new(AppState::new()));
        let (status, body) = send(app, Method::GET, "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("UP"));
    }

    #[tokio::test]
    async fn test_unknown_demo_data() {
        let app = router(Arc::new(AppState::new()));
        let (status, _) = send(app, Method::GET, "/demo-data/HUGE", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_second_start_conflicts_until_revoked() {
        let state = Arc::new(AppState::new());

        let (status, id) = send(router(state.clone()), Method::POST, "/schedules", Some(endless_schedule())).await;
        assert_eq!(status, StatusCode::OK);
        assert!(uuid::Uuid::parse_str(&id).is_ok());

        let (status, _) = send(router(state.clone()), Method::POST, "/schedules", Some(endless_schedule())).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(router(state.clone()), Method::DELETE, "/schedules", None).await;
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_finished_run_exposes_best_and_progress() {
        let state = Arc::new(AppState::new());
        let (status, _) = send(router(state.clone()), Method::GET, "/schedules/best", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let body = serde_json::json!({
            "slots": [{"id": "s1", "day": 0, "startTime": "09:00:00", "endTime": "17:00:00",
                       "requirements": [{"role": "Nurse", "count": 1}]}],
            "employees": [{"id": "n1", "role": "Nurse"}, {"id": "n2", "role": "Nurse"}],
            "config": {"populationSize": 4, "tournamentSize": 2, "maxGenerations": 3, "concurrency": 1, "seed": 5}
        })
        .to_string();
        let (status, _) = send(router(state.clone()), Method::POST, "/schedules", Some(body)).await;
        assert_eq!(status, StatusCode::OK);

        // Any single-nurse assignment is feasible, so the run ends right away.
        let mut best = None;
        for _ in 0..200 {
            let (status, body) = send(router(state.clone()), Method::GET, "/schedules/best", None).await;
            if status == StatusCode::OK {
                best = Some(body);
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        let best: serde_json::Value = serde_json::from_str(&best.unwrap()).unwrap();
        assert_eq!(best["fitness"], 1.0);
        assert_eq!(best["termination"], "CONVERGED");

        let (_, body) = send(router(state), Method::GET, "/schedules/progress", None).await;
        let progress: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(progress[0]["generation"], 0);
    }

    #[tokio::test]
    async fn test_invalid_config_is_bad_request() {
        let state = Arc::new(AppState::new());
        let body = serde_json::json!({
            "slots": [],
            "employees": [],
            "config": {"populationSize": 3}
        })
        .to_string();

        let (status, _) = send(router(state.clone()), Method::POST, "/schedules", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(router(state), Method::GET, "/schedules/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("IDLE"));
    }

    #[tokio::test]
    async fn test_analyze() {
        let app = router(Arc::new(AppState::new()));
        let body = serde_json::json!({
            "slots": [{"id": "s1", "day": 0, "startTime": "09:00:00", "endTime": "17:00:00",
                       "requirements": [{"role": "Nurse", "count": 1}],
                       "assignedEmployees": [{"id": "n1", "role": "Nurse"}]}],
            "employees": [{"id": "n1", "role": "Nurse"}]
        })
        .to_string();

        let (status, body) = send(app, Method::PUT, "/schedules/analyze", Some(body)).await;

        assert_eq!(status, StatusCode::OK);
        let response: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(response["feasible"], true);
        assert_eq!(response["fitness"], 1.0);
    }
}
