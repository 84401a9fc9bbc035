use std::net::SocketAddr;

use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::aggregate::{CustomRange, FilterKind, RangeError, RangeReport};
use crate::sinks::SnapshotReceiver;

/// Read side of the service: every request aggregates the latest snapshot.
#[derive(Clone)]
pub struct ApiState {
    pub snapshots: SnapshotReceiver,
    pub zone: Tz,
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryParams {
    pub filter: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    BadRequest(#[from] RangeError),
    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/summary", get(summary))
        .route("/healthz", get(healthz))
        .with_state(state)
}

pub async fn serve(bind_addr: &str, state: ApiState) -> anyhow::Result<()> {
    let addr: SocketAddr = bind_addr
        .parse()
        .with_context(|| format!("invalid api bind address {bind_addr}"))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind api listener on {addr}"))?;

    tracing::info!(%addr, "summary api listening");
    axum::serve(listener, router(state).into_make_service())
        .await
        .context("api server error")
}

pub async fn summary(
    State(state): State<ApiState>,
    Query(params): Query<SummaryParams>,
) -> Result<Json<Value>, ApiError> {
    metrics::counter!("summary_requests_total").increment(1);

    let filter = match params.filter.as_deref() {
        None | Some("") => FilterKind::default(),
        Some(raw) => raw.parse::<FilterKind>()?,
    };
    let custom = CustomRange::new(
        params.from.unwrap_or_default(),
        params.to.unwrap_or_default(),
    );

    // Clone the Arc so the channel lock is released right away.
    let snapshot = state.snapshots.borrow().clone();
    let now = Utc::now().with_timezone(&state.zone);
    let report = RangeReport::build(snapshot.records(), filter, Some(&custom), now);

    Ok(Json(serde_json::to_value(&report)?))
}

pub async fn healthz(State(state): State<ApiState>) -> Json<Value> {
    let snapshot = state.snapshots.borrow().clone();
    Json(json!({
        "status": "ok",
        "records": snapshot.len(),
        "fetched_at": snapshot.fetched_at(),
        "age_secs": (Utc::now() - snapshot.fetched_at()).num_seconds(),
        "digest": snapshot.digest().to_hex().to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::DateTime;
    use chrono_tz::Europe::Tallinn;
    use mffr_client::feed::parse_feed;

    use crate::pipeline::Sink;
    use crate::sinks::WatchSink;
    use crate::snapshot::Snapshot;
    use crate::transform::reconcile;

    const FEED: &str = r#"{
        "2024-03-15T10:00:00+02:00": {
            "start": "2024-03-15T10:00:02+02:00",
            "end": "2024-03-15T10:15:00+02:00",
            "signal": "UP", "energy_kwh": 10, "profit": 5
        },
        "2024-03-16T08:30:00+02:00": {
            "start": "2024-03-16T08:30:20+02:00",
            "end": "2024-03-16T08:40:00+02:00",
            "signal": "DOWN", "energy_kwh": 2, "grid_kwh": 3, "profit": 1
        }
    }"#;

    fn state() -> (WatchSink, ApiState) {
        let fetched_at = DateTime::parse_from_rfc3339("2024-03-16T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let (sink, snapshots) = WatchSink::channel(fetched_at);
        let records = parse_feed(FEED)
            .unwrap()
            .iter()
            .map(|(k, v)| reconcile(k, v, Tallinn))
            .collect();
        sink.publish(Arc::new(Snapshot::new(records, fetched_at))).unwrap();
        (sink, ApiState { snapshots, zone: Tallinn })
    }

    fn params(filter: &str, from: &str, to: &str) -> SummaryParams {
        SummaryParams {
            filter: Some(filter.to_string()),
            from: Some(from.to_string()),
            to: Some(to.to_string()),
        }
    }

    #[tokio::test]
    async fn summary_all_covers_every_record() {
        let (_sink, state) = state();
        let Json(body) = summary(State(state), Query(params("all", "", ""))).await.unwrap();

        assert_eq!(body["filter"], "all");
        assert_eq!(body["records"].as_array().unwrap().len(), 2);
        assert_eq!(body["summary"]["total"]["count"], 2);
        assert_eq!(body["records"][0]["timeslot"], "2024-03-16T08:30:00+02:00");
    }

    #[tokio::test]
    async fn summary_custom_range_is_inclusive_of_last_day() {
        let (_sink, state) = state();
        let Json(body) = summary(State(state), Query(params("custom", "2024-03-15", "2024-03-15")))
            .await
            .unwrap();

        assert_eq!(body["summary"]["total"]["count"], 1);
        assert_eq!(body["summary"]["up"]["count"], 1);
        assert_eq!(body["summary"]["down"]["count"], 0);
    }

    #[tokio::test]
    async fn unknown_filter_is_a_bad_request() {
        let (_sink, state) = state();
        let err = summary(State(state), Query(params("fortnight", "", "")))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::BadRequest(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn healthz_reports_current_snapshot() {
        let (_sink, state) = state();
        let Json(body) = healthz(State(state)).await;

        assert_eq!(body["status"], "ok");
        assert_eq!(body["records"], 2);
        assert_eq!(body["fetched_at"], "2024-03-16T12:00:00Z");
    }
}
