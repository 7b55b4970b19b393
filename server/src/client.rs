//! exchangerate.host rate provider.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use xrate_common::{format_date, CurrencyCode, RateTable, SupportedCurrencies};
use xrate_rates::{RateError, RateProvider, RateResult};

/// Source currency assumed when a payload omits it.
const DEFAULT_SOURCE: &str = "USD";

/// Rate provider backed by the exchangerate.host `/live` and `/historical`
/// endpoints.
pub struct ExchangeRateHostProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    supported: SupportedCurrencies,
}

impl ExchangeRateHostProvider {
    /// Create a provider with a per-request timeout.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
        supported: SupportedCurrencies,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("xrate/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            supported,
        })
    }

    async fn fetch(&self, endpoint: &str, date: Option<NaiveDate>) -> RateResult<RateTable> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let mut query = vec![("access_key", self.api_key.clone())];
        if let Some(date) = date {
            query.push(("date", format_date(date)));
        }

        debug!(url = %url, "Requesting rates");

        // Errors are stripped of the URL, which carries the access key.
        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| RateError::FetchFailed(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RateError::BadStatus(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RateError::FetchFailed(e.without_url().to_string()))?;

        let payload: RatesPayload =
            serde_json::from_str(&body).map_err(|e| RateError::BadResponse(e.to_string()))?;
        let table = payload.into_table()?;

        let missing = table.missing_from(&self.supported);
        if !missing.is_empty() {
            warn!(
                endpoint,
                missing = ?missing,
                "Provider table does not cover every supported currency"
            );
        }

        Ok(table)
    }
}

#[async_trait]
impl RateProvider for ExchangeRateHostProvider {
    fn name(&self) -> &str {
        "exchangerate.host"
    }

    #[instrument(skip(self))]
    async fn fetch_latest(&self) -> RateResult<RateTable> {
        self.fetch("live", None).await
    }

    #[instrument(skip(self))]
    async fn fetch_historical(&self, date: NaiveDate) -> RateResult<RateTable> {
        self.fetch("historical", Some(date)).await
    }
}

/// Body shared by `/live` and `/historical`.
#[derive(Debug, Deserialize)]
struct RatesPayload {
    success: bool,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    quotes: BTreeMap<String, serde_json::Number>,
    #[serde(default)]
    error: Option<ProviderErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    info: Option<String>,
}

impl RatesPayload {
    /// Normalise `{"USDINR": 83.12}` quotes into a table anchored on the
    /// source currency.
    fn into_table(self) -> RateResult<RateTable> {
        if !self.success {
            let message = match self.error {
                Some(ProviderErrorBody {
                    code: Some(code),
                    info: Some(info),
                }) => format!("{info} (code {code})"),
                Some(ProviderErrorBody {
                    info: Some(info), ..
                }) => info,
                Some(ProviderErrorBody {
                    code: Some(code), ..
                }) => format!("code {code}"),
                _ => "request unsuccessful".to_string(),
            };
            return Err(RateError::ProviderFailure(message));
        }

        let base = CurrencyCode::new(self.source.as_deref().unwrap_or(DEFAULT_SOURCE));
        let mut table = RateTable::new(base.clone());

        for (pair, quote) in self.quotes {
            let Some(target) = pair.strip_prefix(base.code()) else {
                continue;
            };
            if target.is_empty() {
                continue;
            }
            let rate = parse_quote(&quote).ok_or_else(|| {
                RateError::BadResponse(format!("unparsable rate for {pair}: {quote}"))
            })?;
            table.insert(target, rate);
        }

        Ok(table)
    }
}

/// Quotes keep their JSON text (`arbitrary_precision`), so no digits pass
/// through `f64`.
fn parse_quote(quote: &serde_json::Number) -> Option<Decimal> {
    let text = quote.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LIVE_BODY: &str = r#"{
        "success": true,
        "source": "USD",
        "timestamp": 1735603200,
        "quotes": {
            "USDINR": 83.12,
            "USDEUR": 0.92,
            "USDGBP": 0.79,
            "USDJPY": 149.5,
            "USDBTC": 1.6e-5
        }
    }"#;

    async fn setup_mock_server(route: &str, status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(route))
            .and(query_param("access_key", "test-key"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;

        mock_server
    }

    fn provider(server: &MockServer) -> ExchangeRateHostProvider {
        ExchangeRateHostProvider::new(
            server.uri(),
            "test-key",
            Duration::from_secs(5),
            SupportedCurrencies::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_latest_normalises_quotes() {
        let server = setup_mock_server("/live", 200, LIVE_BODY).await;

        let table = provider(&server).fetch_latest().await.unwrap();

        assert_eq!(table.base, CurrencyCode::usd());
        assert_eq!(table.get(&CurrencyCode::usd()), Some(Decimal::ONE));
        assert_eq!(table.get(&CurrencyCode::inr()), Some(dec!(83.12)));
        assert_eq!(table.get(&CurrencyCode::jpy()), Some(dec!(149.5)));
        assert_eq!(table.get(&CurrencyCode::btc()), Some(dec!(0.000016)));
        assert_eq!(table.len(), 6);
    }

    #[tokio::test]
    async fn test_fetch_historical_sends_date() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/historical"))
            .and(query_param("access_key", "test-key"))
            .and(query_param("date", "2025-11-03"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LIVE_BODY))
            .expect(1)
            .mount(&mock_server)
            .await;

        let date = NaiveDate::from_ymd_opt(2025, 11, 3).unwrap();
        let table = provider(&mock_server).fetch_historical(date).await.unwrap();

        assert_eq!(table.get(&CurrencyCode::eur()), Some(dec!(0.92)));
    }

    #[tokio::test]
    async fn test_quotes_keep_full_precision() {
        let body = r#"{"success":true,"source":"USD","quotes":{"USDJPY":149.12345678901234567891}}"#;
        let server = setup_mock_server("/live", 200, body).await;

        let table = provider(&server).fetch_latest().await.unwrap();

        assert_eq!(
            table.get(&CurrencyCode::jpy()),
            Some(dec!(149.12345678901234567891))
        );
    }

    #[tokio::test]
    async fn test_foreign_prefixes_are_skipped() {
        let body = r#"{"success":true,"source":"USD","quotes":{"USDEUR":0.9,"EURGBP":0.86}}"#;
        let server = setup_mock_server("/live", 200, body).await;

        let table = provider(&server).fetch_latest().await.unwrap();

        assert_eq!(table.len(), 2);
        assert!(!table.contains(&CurrencyCode::gbp()));
    }

    #[tokio::test]
    async fn test_bad_status() {
        let server = setup_mock_server("/live", 503, "unavailable").await;

        let result = provider(&server).fetch_latest().await;

        assert!(matches!(result, Err(RateError::BadStatus(503))));
    }

    #[tokio::test]
    async fn test_provider_failure() {
        let body = r#"{"success":false,"error":{"code":101,"info":"invalid access key"}}"#;
        let server = setup_mock_server("/live", 200, body).await;

        let result = provider(&server).fetch_latest().await;

        match result {
            Err(RateError::ProviderFailure(message)) => {
                assert!(message.contains("invalid access key"));
                assert!(message.contains("101"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let server = setup_mock_server("/live", 200, "{not json").await;

        let result = provider(&server).fetch_latest().await;

        assert!(matches!(result, Err(RateError::BadResponse(_))));
    }

    #[tokio::test]
    async fn test_unreachable_provider() {
        // Nothing listens on a port once its listener is dropped.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let provider = ExchangeRateHostProvider::new(
            format!("http://127.0.0.1:{port}"),
            "test-key",
            Duration::from_secs(1),
            SupportedCurrencies::default(),
        )
        .unwrap();
        let result = provider.fetch_latest().await;

        let err = result.unwrap_err();
        assert!(matches!(err, RateError::FetchFailed(_)));
        assert!(!err.to_string().contains("test-key"));
    }
}
