//! Currency codes and the fixed set of currencies the service converts between.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Upper-case currency code such as `USD`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Create a currency code, trimming whitespace and upper-casing.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_uppercase())
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }

    pub fn usd() -> Self {
        Self::new("USD")
    }

    pub fn eur() -> Self {
        Self::new("EUR")
    }

    pub fn gbp() -> Self {
        Self::new("GBP")
    }

    pub fn inr() -> Self {
        Self::new("INR")
    }

    pub fn jpy() -> Self {
        Self::new("JPY")
    }

    pub fn btc() -> Self {
        Self::new("BTC")
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// The currencies a conversion may name.
///
/// Built once at startup and handed to the engine by value; nothing mutates it
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedCurrencies {
    codes: BTreeSet<CurrencyCode>,
}

impl SupportedCurrencies {
    /// Create a set from any list of codes.
    pub fn new<I, C>(codes: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<CurrencyCode>,
    {
        Self {
            codes: codes.into_iter().map(Into::into).collect(),
        }
    }

    /// Check membership. Matching is exact: `"usd"` is not `USD`.
    pub fn contains(&self, code: &str) -> bool {
        self.resolve(code).is_some()
    }

    /// Look up a supported code by its exact spelling.
    pub fn resolve(&self, code: &str) -> Option<CurrencyCode> {
        self.codes.iter().find(|c| c.code() == code).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CurrencyCode> {
        self.codes.iter()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl Default for SupportedCurrencies {
    fn default() -> Self {
        Self::new([
            CurrencyCode::usd(),
            CurrencyCode::eur(),
            CurrencyCode::gbp(),
            CurrencyCode::inr(),
            CurrencyCode::jpy(),
            CurrencyCode::btc(),
        ])
    }
}
