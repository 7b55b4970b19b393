//! HTTP request handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use uuid::Uuid;
use xrate_common::{format_date, parse_date, Timestamp};
use xrate_rates::{EngineStats, ErrorCategory, RateError};

use crate::service::RateService;
use crate::state::ServiceState;

/// Application state shared across handlers.
pub type AppState = Arc<RateService>;

/// Build the service router.
pub fn router(service: AppState) -> Router {
    Router::new()
        .route("/convert", get(convert))
        .route("/stats", get(stats))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Query parameters of `GET /convert`.
#[derive(Debug, Default, Deserialize)]
pub struct ConvertParams {
    pub from: Option<String>,
    pub to: Option<String>,
    pub amount: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub amount: String,
    pub from: String,
    pub to: String,
    pub date: Option<String>,
    pub conversion_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub state: ServiceState,
    #[serde(flatten)]
    pub engine: EngineStats,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: ServiceState,
    pub provider: String,
    pub latest_updated_at: Option<Timestamp>,
}

/// GET /convert - Convert an amount between two currencies.
async fn convert(
    State(service): State<AppState>,
    Query(params): Query<ConvertParams>,
) -> Result<Json<ConvertResponse>, ApiError> {
    if !service.is_accepting_requests() {
        return Err(ApiError::Unavailable(service.state()));
    }

    let from = required(params.from, "from")?;
    let to = required(params.to, "to")?;
    let amount = required(params.amount, "amount")?;
    let date = match params.date.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_date(raw).ok_or(RateError::InvalidDateFormat)?),
    };

    let conversion = service
        .engine()
        .convert_detailed(&from, &to, &amount, date)
        .await?;

    Ok(Json(ConvertResponse {
        amount: conversion.result_string(),
        from: conversion.from.to_string(),
        to: conversion.to.to_string(),
        date: conversion.source.date().map(format_date),
        conversion_id: conversion.id,
    }))
}

/// GET /stats - Cache and counter statistics.
async fn stats(State(service): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        state: service.state(),
        engine: service.engine().stats(),
    })
}

/// GET /health - Service state; 503 unless running.
async fn health(State(service): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let state = service.state();
    let status = if state.is_operational() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = HealthResponse {
        status: state,
        provider: service.engine().provider_name().to_string(),
        latest_updated_at: service.engine().cache().last_updated(),
    };
    (status, Json(body))
}

fn required(value: Option<String>, name: &str) -> Result<String, RateError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| RateError::MissingParameter(name.to_string()))
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
    pub category: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<&'static str>,
}

/// Errors rendered as HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// The engine rejected or failed the request.
    Rate(RateError),
    /// The service is not accepting requests.
    Unavailable(ServiceState),
}

impl From<RateError> for ApiError {
    fn from(err: RateError) -> Self {
        ApiError::Rate(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Rate(err) => match err.category() {
                ErrorCategory::Validation => StatusCode::BAD_REQUEST,
                ErrorCategory::Upstream => StatusCode::BAD_GATEWAY,
                ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Rate(err) => ErrorBody {
                error: err.detailed_message(),
                code: err.error_code(),
                category: err.category().as_str(),
                cause: err.cause_code(),
            },
            ApiError::Unavailable(state) => ErrorBody {
                error: format!("service is not accepting requests ({state:?})"),
                code: "SERVICE_UNAVAILABLE",
                category: ErrorCategory::Internal.as_str(),
                cause: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::{Duration, NaiveDate};
    use rust_decimal_macros::dec;
    use serde_json::Value;
    use tower::ServiceExt;
    use xrate_common::{CurrencyCode, FixedClock, RateTable};
    use xrate_rates::{MockRateProvider, RateEngine, RateEngineConfig};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()
    }

    fn table() -> RateTable {
        RateTable::from_rates(
            CurrencyCode::usd(),
            [
                ("INR", dec!(83.12)),
                ("EUR", dec!(0.92)),
                ("JPY", dec!(149.50)),
                ("GBP", dec!(0.79)),
            ],
        )
    }

    async fn setup() -> (AppState, Arc<MockRateProvider>) {
        let provider = Arc::new(MockRateProvider::new("test"));
        provider.set_latest(table());
        provider.set_historical(today() - Duration::days(1), table());

        let engine = RateEngine::with_clock(
            provider.clone(),
            RateEngineConfig::default(),
            Arc::new(FixedClock::on(today())),
        );
        let service = Arc::new(RateService::new(Arc::new(engine)));
        service.start().await.unwrap();
        (service, provider)
    }

    async fn get(service: &AppState, uri: &str) -> (StatusCode, Value) {
        let response = router(service.clone())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_convert_latest() {
        let (service, _) = setup().await;

        let (status, body) = get(&service, "/convert?from=USD&to=INR&amount=100").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["amount"], "8312.00");
        assert_eq!(body["from"], "USD");
        assert_eq!(body["to"], "INR");
        assert!(body["date"].is_null());
        assert!(body["conversion_id"].is_string());
    }

    #[tokio::test]
    async fn test_convert_historical() {
        let (service, provider) = setup().await;

        let (status, body) = get(
            &service,
            "/convert?from=EUR&to=GBP&amount=100&date=2025-12-30",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["amount"], "85.87");
        assert_eq!(body["date"], "2025-12-30");
        assert_eq!(provider.historical_calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_parameters() {
        let (service, _) = setup().await;

        for (uri, param) in [
            ("/convert?to=INR&amount=1", "from"),
            ("/convert?from=USD&amount=1", "to"),
            ("/convert?from=USD&to=INR", "amount"),
            ("/convert?from=USD&to=INR&amount=", "amount"),
        ] {
            let (status, body) = get(&service, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["code"], "MISSING_PARAMETER");
            assert_eq!(body["category"], "VALIDATION_ERROR");
            assert!(body["error"].as_str().unwrap().contains(param));
        }
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let (service, _) = setup().await;

        let cases = [
            ("/convert?from=USD&to=INR&amount=1&date=31-12-2025", "INVALID_DATE_FORMAT"),
            ("/convert?from=CHF&to=INR&amount=1", "UNSUPPORTED_CURRENCY"),
            ("/convert?from=usd&to=INR&amount=1", "UNSUPPORTED_CURRENCY"),
            ("/convert?from=USD&to=INR&amount=1_000", "INVALID_AMOUNT"),
            ("/convert?from=USD&to=INR&amount=-5", "INVALID_AMOUNT"),
            ("/convert?from=USD&to=INR&amount=1&date=2026-01-01", "FUTURE_DATE"),
            ("/convert?from=USD&to=INR&amount=1&date=2025-10-01", "DATE_TOO_OLD"),
        ];

        for (uri, code) in cases {
            let (status, body) = get(&service, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["code"], code, "{uri}");
            assert!(body.get("cause").is_none(), "{uri}");
        }
    }

    #[tokio::test]
    async fn test_convert_refused_after_shutdown_begins() {
        let (service, provider) = setup().await;
        service.begin_shutdown();

        let (status, body) = get(&service, "/convert?from=USD&to=INR&amount=100").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
        assert_eq!(provider.latest_calls(), 1);
    }

    #[tokio::test]
    async fn test_upstream_error_is_bad_gateway() {
        let (service, provider) = setup().await;
        provider.set_failing(true);

        let (status, body) = get(
            &service,
            "/convert?from=USD&to=INR&amount=1&date=2025-12-01",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "API_FETCH_FAILED");
        assert_eq!(body["category"], "API_ERROR");
    }

    #[tokio::test]
    async fn test_missing_rate_is_internal_error() {
        let (service, _) = setup().await;

        let (status, body) = get(&service, "/convert?from=USD&to=BTC&amount=1").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "CONVERSION_FAILED");
        assert_eq!(body["category"], "INTERNAL_ERROR");
        assert_eq!(body["cause"], "MISSING_EXCHANGE_RATE");
        assert!(body["error"].as_str().unwrap().contains("BTC"));
    }

    #[tokio::test]
    async fn test_health_and_stats() {
        let (service, _) = setup().await;

        let (status, body) = get(&service, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "running");
        assert_eq!(body["provider"], "test");

        get(&service, "/convert?from=USD&to=EUR&amount=10").await;
        let (status, body) = get(&service, "/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "running");
        assert_eq!(body["cache"]["has_latest"], true);
        assert_eq!(body["metrics"]["conversions_success"], 1);

        service.stop().await;
        let (status, body) = get(&service, "/health").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "stopped");
    }
}
