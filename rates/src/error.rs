//! Rate engine error types.

use thiserror::Error;
use xrate_common::CurrencyCode;

/// Broad class of an error, used by transports to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The request itself is unacceptable.
    Validation,
    /// The rate provider could not supply a table.
    Upstream,
    /// A table was obtained but could not be used.
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "VALIDATION_ERROR",
            ErrorCategory::Upstream => "API_ERROR",
            ErrorCategory::Internal => "INTERNAL_ERROR",
        }
    }
}

/// Failures of the pure conversion step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// The table has no entry for a requested currency.
    #[error("exchange rate not available for: {0}")]
    MissingRate(CurrencyCode),

    /// The table holds a zero (or negative) rate for a requested currency.
    #[error("invalid exchange rate (zero) for: {0}")]
    InvalidRate(CurrencyCode),

    /// Decimal arithmetic overflowed.
    #[error("arithmetic overflow converting {from} to {to}")]
    Overflow { from: CurrencyCode, to: CurrencyCode },
}

impl ConversionError {
    /// Get the machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            ConversionError::MissingRate(_) => "MISSING_EXCHANGE_RATE",
            ConversionError::InvalidRate(_) => "INVALID_EXCHANGE_RATE",
            ConversionError::Overflow { .. } => "CONVERSION_OVERFLOW",
        }
    }
}

/// Errors returned by the rate engine and its providers.
#[derive(Debug, Error)]
pub enum RateError {
    /// A required request parameter was absent.
    #[error("missing required parameter: {0}")]
    MissingParameter(String),

    /// Amount is unparsable, zero or negative.
    #[error("amount must be a positive number")]
    InvalidAmount,

    /// Date is not `YYYY-MM-DD`.
    #[error("invalid date format, use YYYY-MM-DD")]
    InvalidDateFormat,

    /// Currency is not in the supported set.
    #[error("unsupported currency: {0}")]
    UnsupportedCurrency(String),

    /// Date is after the current calendar day.
    #[error("date cannot be in the future")]
    FutureDate,

    /// Date is before the retention window.
    #[error("date is too old, maximum lookback is {max_days} days")]
    DateTooOld { max_days: i64 },

    /// Transport-level failure talking to the provider.
    #[error("failed to fetch exchange rates from provider: {0}")]
    FetchFailed(String),

    /// Provider answered with a non-success HTTP status.
    #[error("rate provider returned status code: {0}")]
    BadStatus(u16),

    /// Provider payload could not be decoded.
    #[error("failed to parse rate provider response: {0}")]
    BadResponse(String),

    /// Provider reported a logical failure in an otherwise valid response.
    #[error("rate provider reported an error: {0}")]
    ProviderFailure(String),

    /// Conversion against a resolved table failed.
    #[error("currency conversion failed")]
    Conversion(#[from] ConversionError),
}

impl RateError {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            RateError::MissingParameter(_)
            | RateError::InvalidAmount
            | RateError::InvalidDateFormat
            | RateError::UnsupportedCurrency(_)
            | RateError::FutureDate
            | RateError::DateTooOld { .. } => ErrorCategory::Validation,
            RateError::FetchFailed(_)
            | RateError::BadStatus(_)
            | RateError::BadResponse(_)
            | RateError::ProviderFailure(_) => ErrorCategory::Upstream,
            RateError::Conversion(_) => ErrorCategory::Internal,
        }
    }

    /// Get the machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            RateError::MissingParameter(_) => "MISSING_PARAMETER",
            RateError::InvalidAmount => "INVALID_AMOUNT",
            RateError::InvalidDateFormat => "INVALID_DATE_FORMAT",
            RateError::UnsupportedCurrency(_) => "UNSUPPORTED_CURRENCY",
            RateError::FutureDate => "FUTURE_DATE",
            RateError::DateTooOld { .. } => "DATE_TOO_OLD",
            RateError::FetchFailed(_) => "API_FETCH_FAILED",
            RateError::BadStatus(_) => "API_BAD_STATUS",
            RateError::BadResponse(_) => "API_BAD_RESPONSE",
            RateError::ProviderFailure(_) => "API_PROVIDER_ERROR",
            RateError::Conversion(_) => "CONVERSION_FAILED",
        }
    }

    /// Code of the wrapped cause, for errors that carry one.
    pub fn cause_code(&self) -> Option<&'static str> {
        match self {
            RateError::Conversion(cause) => Some(cause.error_code()),
            _ => None,
        }
    }

    /// Check if this error came from the rate provider.
    pub fn is_upstream(&self) -> bool {
        self.category() == ErrorCategory::Upstream
    }

    /// Human-readable message including the wrapped cause, if any.
    pub fn detailed_message(&self) -> String {
        match self {
            RateError::Conversion(cause) => format!("{self}: {cause}"),
            _ => self.to_string(),
        }
    }
}

/// Result type for rate operations.
pub type RateResult<T> = Result<T, RateError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_categories() {
        assert_eq!(RateError::InvalidAmount.category(), ErrorCategory::Validation);
        assert_eq!(RateError::BadStatus(503).category(), ErrorCategory::Upstream);
        assert_eq!(
            RateError::from(ConversionError::MissingRate(CurrencyCode::eur())).category(),
            ErrorCategory::Internal
        );
    }

    #[test]
    fn test_conversion_error_keeps_cause() {
        let err = RateError::from(ConversionError::InvalidRate(CurrencyCode::eur()));

        assert_eq!(err.error_code(), "CONVERSION_FAILED");
        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("invalid exchange rate (zero) for: EUR".to_string())
        );
        assert_eq!(
            err.detailed_message(),
            "currency conversion failed: invalid exchange rate (zero) for: EUR"
        );
    }

    #[test]
    fn test_cause_codes() {
        let missing = RateError::from(ConversionError::MissingRate(CurrencyCode::btc()));
        let invalid = RateError::from(ConversionError::InvalidRate(CurrencyCode::eur()));
        let overflow = RateError::from(ConversionError::Overflow {
            from: CurrencyCode::usd(),
            to: CurrencyCode::eur(),
        });

        assert_eq!(missing.cause_code(), Some("MISSING_EXCHANGE_RATE"));
        assert_eq!(invalid.cause_code(), Some("INVALID_EXCHANGE_RATE"));
        assert_eq!(overflow.cause_code(), Some("CONVERSION_OVERFLOW"));
        assert_eq!(RateError::InvalidAmount.cause_code(), None);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            RateError::UnsupportedCurrency("CHF".into()).to_string(),
            "unsupported currency: CHF"
        );
        assert_eq!(
            RateError::DateTooOld { max_days: 90 }.to_string(),
            "date is too old, maximum lookback is 90 days"
        );
    }
}
