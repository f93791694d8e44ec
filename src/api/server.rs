use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{response::IntoResponse, routing::get, routing::post, Json, Router};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::api::types::{
    PositionDto, PositionsQuery, PropagateRequest, PropagationErrorDto, SatelliteDto, StateDto, TargetQuery,
};
use crate::collectors::catalog;
use crate::core::frames;
use crate::core::orbit::PropagationSettings;
use crate::core::satellite::Satellite;
use crate::core::time::{Clock, JulianDate, Target};
use crate::predictors::batch::propagate_batch;

const DEFAULT_POSITIONS_LIMIT: usize = 500;

#[derive(Clone)]
pub struct AppState {
    pub satellites: Arc<Vec<Satellite>>,
    pub settings: PropagationSettings,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(satellites: Vec<Satellite>, settings: PropagationSettings, clock: Arc<dyn Clock>) -> Self {
        Self { satellites: Arc::new(satellites), settings, clock }
    }

    fn find(&self, norad_id: u32) -> Option<&Satellite> {
        self.satellites.iter().find(|s| s.norad_id() == norad_id)
    }
}

type ApiResponse = (StatusCode, Json<Value>);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/satellites", get(list_satellites))
        .route("/satellites/positions", get(list_sat_positions))
        .route("/satellites/:norad_id/state", get(get_state))
        .route("/propagate", post(propagate_records))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
}

pub async fn run_server(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let satellites = state.satellites.len();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, satellites, "API server listening");
    axum::serve(listener, router(state)).with_graceful_shutdown(shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down API server");
}

fn error(status: StatusCode, message: impl Into<String>) -> ApiResponse {
    (status, Json(serde_json::json!({ "error": message.into() })))
}

fn resolve_target(
    at: Option<chrono::DateTime<chrono::Utc>>,
    minutes: Option<f64>,
    clock: &dyn Clock,
) -> Result<Target, ApiResponse> {
    match (at, minutes) {
        (Some(_), Some(_)) => Err(error(StatusCode::BAD_REQUEST, "give either 'at' or 'minutes', not both")),
        (Some(at), None) => Ok(Target::Utc(at)),
        (None, Some(m)) if m.is_finite() => Ok(Target::Minutes(m)),
        (None, Some(_)) => Err(error(StatusCode::BAD_REQUEST, "'minutes' must be finite")),
        (None, None) => Ok(Target::Utc(clock.now())),
    }
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok", "satellites": state.satellites.len() })))
}

async fn list_satellites(State(state): State<AppState>) -> impl IntoResponse {
    let out: Vec<SatelliteDto> = state.satellites.iter().map(SatelliteDto::from).collect();
    (StatusCode::OK, Json(serde_json::json!(out)))
}

async fn list_sat_positions(State(state): State<AppState>, Query(q): Query<PositionsQuery>) -> impl IntoResponse {
    let at = q.at.unwrap_or_else(|| state.clock.now());
    let at_jd = JulianDate::from_utc(at);
    let limit = q.limit.unwrap_or(DEFAULT_POSITIONS_LIMIT);

    let mut out = Vec::with_capacity(limit.min(state.satellites.len()));
    for sat in state.satellites.iter().take(limit) {
        match sat.propagate(Target::Julian(at_jd)) {
            Ok(pred) => {
                let g = frames::subpoint(&pred, at_jd);
                out.push(PositionDto {
                    norad_id: sat.norad_id(),
                    name: sat.name().map(str::to_string),
                    lat: g.latitude_deg,
                    lon: g.longitude_deg,
                    alt_km: g.altitude_km,
                    speed_km_s: pred.speed_km_s(),
                    minutes_since_epoch: pred.minutes_since_epoch,
                });
            }
            Err(e) => debug!(norad = sat.norad_id(), error = %e, "Skipping satellite in positions"),
        }
    }
    (StatusCode::OK, Json(serde_json::json!(out)))
}

async fn get_state(
    Path(norad_id): Path<u32>,
    Query(q): Query<TargetQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let sat = match state.find(norad_id) {
        Some(s) => s,
        None => return error(StatusCode::NOT_FOUND, "norad_id not found in loaded elements"),
    };
    let target = match resolve_target(q.at, q.minutes, state.clock.as_ref()) {
        Ok(t) => t,
        Err(response) => return response,
    };

    match sat.propagate(target) {
        Ok(pred) => {
            let at = sat.model().epoch().add_minutes(pred.minutes_since_epoch);
            let out = StateDto {
                norad_id,
                name: sat.name().map(str::to_string),
                state: pred,
                geodetic: frames::subpoint(&pred, at),
            };
            (StatusCode::OK, Json(serde_json::json!(out)))
        }
        Err(e) => {
            warn!(norad = norad_id, error = %e, "Propagation failed");
            let out = PropagationErrorDto {
                error: e.to_string(),
                kind: e.kind,
                code: e.kind.code(),
                minutes_since_epoch: e.minutes_since_epoch,
            };
            (StatusCode::UNPROCESSABLE_ENTITY, Json(serde_json::json!(out)))
        }
    }
}

async fn propagate_records(State(state): State<AppState>, Json(body): Json<PropagateRequest>) -> impl IntoResponse {
    let target = match resolve_target(body.at, body.minutes, state.clock.as_ref()) {
        Ok(t) => t,
        Err(response) => return response,
    };
    let records = catalog::parse_records(&body.records);
    let outcomes = propagate_batch(&records, target, state.settings);
    (StatusCode::OK, Json(serde_json::json!(outcomes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::FixedClock;
    use crate::core::tle::parse_with_name;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::{TimeZone, Utc};
    use tower::ServiceExt;

    const VANGUARD_L1: &str = "1 00005U 58002B   00179.78495062  .00000023  00000-0  28098-4 0  4753";
    const VANGUARD_L2: &str = "2 00005  34.2682 348.7242 1859667 331.7664  19.3264 10.82419157413667";
    const DECAYING_L1: &str = "1 99999U 24001A   24001.00000000  .01000000  00000-0  10000-1 0  9992";
    const DECAYING_L2: &str = "2 99999  90.0000   0.0000 0001000   0.0000   0.0000 16.40000000  1009";

    fn app() -> Router {
        let settings = PropagationSettings::default();
        let satellites = vec![
            Satellite::new(parse_with_name(Some("VANGUARD 1".into()), VANGUARD_L1, VANGUARD_L2).unwrap(), settings),
            Satellite::new(parse_with_name(Some("DECAYING".into()), DECAYING_L1, DECAYING_L2).unwrap(), settings),
        ];
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap());
        router(AppState::new(satellites, settings, Arc::new(clock)))
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        send(Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    #[tokio::test]
    async fn health_counts_satellites() {
        let (status, body) = get_json("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["satellites"], 2);
    }

    #[tokio::test]
    async fn lists_satellites_with_branch() {
        let (status, body) = get_json("/satellites").await;
        assert_eq!(status, StatusCode::OK);
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["norad_id"], 5);
        assert_eq!(list[0]["name"], "VANGUARD 1");
        assert_eq!(list[0]["branch"], "near_earth");
        assert_eq!(list[1]["branch"], "near_earth_simplified");
    }

    #[tokio::test]
    async fn state_by_minutes_matches_published_vector() {
        let (status, body) = get_json("/satellites/5/state?minutes=360").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["minutes_since_epoch"], 360.0);
        let x = body["position"][0].as_f64().unwrap();
        assert!((x - -7154.03120202).abs() < 1e-5, "x = {x}");
        assert!(body["geodetic"]["altitude_km"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn state_errors() {
        let (status, _) = get_json("/satellites/42/state").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = get_json("/satellites/5/state?minutes=1&at=2024-01-01T00:00:00Z").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = get_json("/satellites/99999/state?minutes=360").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "decayed");
        assert_eq!(body["code"], 6);
        assert_eq!(body["minutes_since_epoch"], 360.0);
    }

    #[tokio::test]
    async fn state_defaults_to_clock() {
        let (status, body) = get_json("/satellites/99999/state").await;
        assert_eq!(status, StatusCode::OK);
        let minutes = body["minutes_since_epoch"].as_f64().unwrap();
        assert!((minutes - 60.0).abs() < 1e-6, "minutes = {minutes}");
    }

    #[tokio::test]
    async fn positions_skip_failures() {
        let (status, body) = get_json("/satellites/positions?at=2024-01-01T06:00:00Z").await;
        assert_eq!(status, StatusCode::OK);
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["norad_id"], 5);
        let lat = list[0]["lat"].as_f64().unwrap();
        assert!(lat.abs() <= 35.0);

        let (_, body) = get_json("/satellites/positions?limit=1").await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn propagate_posted_records() {
        let request = serde_json::json!({
            "minutes": 0.0,
            "records": [
                { "OBJECT_NAME": "VANGUARD 1", "TLE_LINE1": VANGUARD_L1, "TLE_LINE2": VANGUARD_L2 },
                { "NORAD_CAT_ID": 7 }
            ]
        });
        let (status, body) = send(
            Request::builder()
                .method("POST")
                .uri("/propagate")
                .header("content-type", "application/json")
                .body(Body::from(request.to_string()))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let outcomes = body.as_array().unwrap();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0]["name"], "VANGUARD 1");
        let x = outcomes[0]["position"][0].as_f64().unwrap();
        assert!((x - 7022.46529266).abs() < 1e-5);
        assert!(outcomes[1]["error"].as_str().unwrap().contains("EPOCH"));
    }
}
