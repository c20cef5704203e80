//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::cache::PlanKey;
use crate::planner::{PathPlanner, PathPlanningOptions, PlanError};
use crate::wire::{WireError, WirePathPlanningResult};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/network", get(network_info))
        .route("/journey/plan", post(plan_journey))
        .route("/journey/resolve", post(resolve_journey))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Entity counts for the loaded network.
async fn network_info(State(state): State<AppState>) -> Json<NetworkResponse> {
    Json(NetworkResponse {
        counts: state.network.summary(),
        hubs: state.router.as_ref().map_or(0, |r| r.hub_count()),
    })
}

fn validate(req: &PlanJourneyRequest) -> Result<(), AppError> {
    let finite = [req.from.x, req.from.y, req.to.x, req.to.y]
        .iter()
        .all(|c| c.is_finite());
    if !finite {
        return Err(AppError::BadRequest {
            message: "coordinates must be finite".to_string(),
        });
    }
    if let Some(options) = &req.options {
        check_options(options)?;
    }
    Ok(())
}

fn check_options(options: &PathPlanningOptions) -> Result<(), AppError> {
    if !(options.walking_speed_kph > 0.0) {
        return Err(AppError::BadRequest {
            message: format!("walking speed must be positive, got {}", options.walking_speed_kph),
        });
    }
    if !(options.max_walking_distance >= 0.0) {
        return Err(AppError::BadRequest {
            message: format!(
                "maximum walking distance must not be negative, got {}",
                options.max_walking_distance
            ),
        });
    }
    Ok(())
}

/// Plan a journey.
///
/// Requests without their own options are answered from the cache when
/// possible.
async fn plan_journey(
    State(state): State<AppState>,
    Json(req): Json<PlanJourneyRequest>,
) -> Result<Json<PlanJourneyResponse>, AppError> {
    validate(&req)?;

    let departure = req.departure.unwrap_or_else(|| state.clock.now());
    let key = req
        .options
        .is_none()
        .then(|| PlanKey::new(req.mode, req.from, req.to, departure, req.end_at_parking_lot));

    if let Some(key) = &key
        && let Some(hit) = state.cache.get(key).await
    {
        debug!(?key, "plan cache hit");
        return Ok(Json(respond(&state, &hit)));
    }

    let options = req
        .options
        .clone()
        .unwrap_or_else(|| state.options.as_ref().clone());
    let planning = state.clone();
    let result = tokio::task::spawn_blocking(move || {
        let mut planner = PathPlanner::new(&planning.network, options);
        if let Some(router) = &planning.router {
            planner = planner.with_router(router);
        }
        planner.plan(
            req.mode,
            req.from,
            req.to,
            req.end_at_parking_lot,
            Some(departure),
        )
    })
    .await
    .map_err(|e| AppError::Internal {
        message: format!("planner task failed: {e}"),
    })??;

    let result = Arc::new(result);
    if let Some(key) = key {
        state.cache.insert(key, result.clone()).await;
    }

    Ok(Json(respond(&state, &result)))
}

fn respond(state: &AppState, result: &crate::planner::PathPlanningResult) -> PlanJourneyResponse {
    PlanJourneyResponse {
        summary: JourneySummary::from(result),
        itinerary: result.itinerary(&state.network),
        result: WirePathPlanningResult::from(result),
    }
}

/// Check a stored journey against the loaded network.
async fn resolve_journey(
    State(state): State<AppState>,
    Json(wire): Json<WirePathPlanningResult>,
) -> Result<Json<ResolveJourneyResponse>, AppError> {
    let result = wire.resolve(&state.network)?;
    Ok(Json(ResolveJourneyResponse {
        summary: JourneySummary::from(&result),
        itinerary: result.itinerary(&state.network),
    }))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl From<PlanError> for AppError {
    fn from(e: PlanError) -> Self {
        match e {
            PlanError::NoRouteFound => AppError::NotFound {
                message: e.to_string(),
            },
            PlanError::Inconsistent(_) => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl From<WireError> for AppError {
    fn from(e: WireError) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        warn!(%status, "{message}");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::clock::FixedClock;
    use crate::domain::Point;
    use crate::fixtures;
    use crate::network::Network;
    use crate::planner::JourneyMode;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use chrono::{NaiveDate, NaiveDateTime};
    use serde::de::DeserializeOwned;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn state(net: Network) -> AppState {
        AppState::new(net, None, &CacheConfig::default()).with_clock(FixedClock(at(5, 58, 48)))
    }

    async fn call(state: AppState, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = create_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    fn post(uri: &str, body: &Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn parse<T: DeserializeOwned>(body: &[u8]) -> T {
        serde_json::from_slice(body).unwrap()
    }

    fn transit_request() -> Value {
        json!({
            "from": { "x": 0.0, "y": -100.0 },
            "to": { "x": 18000.0, "y": -100.0 },
            "mode": "transit",
        })
    }

    #[tokio::test]
    async fn health_is_ok() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = call(state(fixtures::three_stop_line()), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");
    }

    #[tokio::test]
    async fn network_counts() {
        let request = Request::get("/network").body(Body::empty()).unwrap();
        let (status, body) = call(state(fixtures::three_stop_line()), request).await;
        assert_eq!(status, StatusCode::OK);

        let info: Value = parse(&body);
        assert_eq!(info["stops"], 3);
        assert_eq!(info["routes"], 2);
        assert_eq!(info["hubs"], 0);
    }

    #[tokio::test]
    async fn plans_transit_journey_and_caches_it() {
        let app = state(fixtures::three_stop_line());
        let (status, body) = call(app.clone(), post("/journey/plan", &transit_request())).await;
        assert_eq!(status, StatusCode::OK);

        let response: PlanJourneyResponse = parse(&body);
        assert_eq!(response.summary.departure, at(5, 58, 48));
        assert_eq!(response.summary.changes, 0);
        assert_eq!(response.summary.duration_mins, 20);
        assert_eq!(response.itinerary.len(), 3);
        assert_eq!(response.result.steps.len(), 3);

        let key = PlanKey::new(
            JourneyMode::Transit,
            Point::new(0.0, -100.0),
            Point::new(18_000.0, -100.0),
            at(5, 58, 48),
            false,
        );
        assert!(app.cache.get(&key).await.is_some());
    }

    #[tokio::test]
    async fn no_route_is_not_found() {
        let request = json!({
            "from": { "x": 50.0, "y": -5.0 },
            "to": { "x": 5050.0, "y": -5.0 },
            "mode": "drive",
            "options": { "allow_walk": false },
        });
        let (status, body) = call(
            state(fixtures::disconnected_streets()),
            post("/journey/plan", &request),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let error: ErrorResponse = parse(&body);
        assert!(!error.error.is_empty());
    }

    #[tokio::test]
    async fn bad_options_are_rejected() {
        let mut request = transit_request();
        request["options"] = json!({ "walking_speed_kph": 0.0 });
        let (status, _) = call(
            state(fixtures::three_stop_line()),
            post("/journey/plan", &request),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn planned_journey_resolves() {
        let app = state(fixtures::three_stop_line());
        let (_, body) = call(app.clone(), post("/journey/plan", &transit_request())).await;
        let planned: PlanJourneyResponse = parse(&body);

        let wire = serde_json::to_value(&planned.result).unwrap();
        let (status, body) = call(app, post("/journey/resolve", &wire)).await;
        assert_eq!(status, StatusCode::OK);
        let resolved: ResolveJourneyResponse = parse(&body);
        assert_eq!(resolved.itinerary, planned.itinerary);
    }

    #[tokio::test]
    async fn resolve_rejects_foreign_ids() {
        let app = state(fixtures::three_stop_line());
        let (_, body) = call(app.clone(), post("/journey/plan", &transit_request())).await;
        let planned: PlanJourneyResponse = parse(&body);

        let mut wire = serde_json::to_value(&planned.result).unwrap();
        wire["steps"][1]["routes"] = json!([0, 7]);
        let (status, _) = call(app, post("/journey/resolve", &wire)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
