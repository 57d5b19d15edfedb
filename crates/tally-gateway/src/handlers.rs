// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the counter procedures.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tally_core::{Counter, HealthStatus, IncrementCounterInput, ResetCounterInput, TallyError};

use crate::server::GatewayState;

/// Response for GET /health.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "ok" when storage is healthy, "degraded" otherwise.
    pub status: String,
    /// Binary version.
    pub version: String,
    /// Seconds since the gateway state was created.
    pub uptime_secs: u64,
    /// Storage health label.
    pub storage: String,
}

/// Error body for every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

/// A [`TallyError`] on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub TallyError);

impl From<TallyError> for ApiError {
    fn from(e: TallyError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            TallyError::Validation(_) => StatusCode::BAD_REQUEST,
            TallyError::Overflow { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Decode an optional JSON body. An empty body means "all defaults".
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, TallyError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| TallyError::Validation(e.to_string()))
}

/// GET /v1/counter
pub async fn get_counter(State(state): State<GatewayState>) -> Result<Json<Counter>, ApiError> {
    Ok(Json(state.service.get().await?))
}

/// POST /v1/counter/increment
///
/// Body `{"increment": n}` with `n > 0`; the body and the field are optional.
pub async fn increment_counter(
    State(state): State<GatewayState>,
    body: Bytes,
) -> Result<Json<Counter>, ApiError> {
    let input: IncrementCounterInput = parse_body(&body)?;
    let by = input.validate()?;
    Ok(Json(state.service.increment(by).await?))
}

/// POST /v1/counter/reset
///
/// Body `{"value": n}`; the body and the field are optional.
pub async fn reset_counter(
    State(state): State<GatewayState>,
    body: Bytes,
) -> Result<Json<Counter>, ApiError> {
    let input: ResetCounterInput = parse_body(&body)?;
    Ok(Json(state.service.reset(input.value).await?))
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> (StatusCode, Json<HealthResponse>) {
    let storage = state.service.health().await;
    let code = match storage {
        HealthStatus::Unhealthy(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };
    let status = if storage == HealthStatus::Healthy {
        "ok"
    } else {
        "degraded"
    };
    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs: state.start_time.elapsed().as_secs(),
            storage: storage.label().to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_uses_defaults() {
        let input: IncrementCounterInput = parse_body(&Bytes::new()).unwrap();
        assert_eq!(input.increment, 1);
        let input: ResetCounterInput = parse_body(&Bytes::from_static(b"  \n")).unwrap();
        assert_eq!(input.value, 0);
    }

    #[test]
    fn malformed_body_is_a_validation_error() {
        let err = parse_body::<IncrementCounterInput>(&Bytes::from_static(b"{\"increment\":")).unwrap_err();
        assert!(matches!(err, TallyError::Validation(_)));

        let err = parse_body::<ResetCounterInput>(&Bytes::from_static(b"{\"value\":1.5}")).unwrap_err();
        assert!(matches!(err, TallyError::Validation(_)));

        let err = parse_body::<ResetCounterInput>(&Bytes::from_static(b"{\"value\":\"3\"}")).unwrap_err();
        assert!(matches!(err, TallyError::Validation(_)));
    }

    #[test]
    fn lenient_body_forms_decode() {
        let input: IncrementCounterInput =
            parse_body(&Bytes::from_static(b"{\"increment\":2.0,\"note\":\"x\"}")).unwrap();
        assert_eq!(input.increment, 2);
        let input: ResetCounterInput = parse_body(&Bytes::from_static(b"{\"value\":-1e1}")).unwrap();
        assert_eq!(input.value, -10);
    }

    #[test]
    fn error_status_mapping() {
        let status = |e: TallyError| ApiError(e).into_response().status();
        assert_eq!(status(TallyError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(TallyError::Overflow {
                value: i64::MAX,
                increment: 1
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(TallyError::storage(std::io::Error::other("disk full"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn health_response_serialization() {
        let resp = HealthResponse {
            status: "ok".to_string(),
            version: "0.1.0".to_string(),
            uptime_secs: 42,
            storage: "ok".to_string(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"uptime_secs\":42"));
    }
}
