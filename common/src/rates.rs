//! Rate tables anchored to a single base currency.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{CurrencyCode, SupportedCurrencies};

/// A full set of rates, each expressed as units of that currency per one unit
/// of `base`. The base itself carries a rate of one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTable {
    /// Anchor currency.
    pub base: CurrencyCode,
    /// Rate per currency, base included.
    pub rates: BTreeMap<CurrencyCode, Decimal>,
}

impl RateTable {
    /// Create a table holding only the base currency at rate one.
    pub fn new(base: CurrencyCode) -> Self {
        let mut rates = BTreeMap::new();
        rates.insert(base.clone(), Decimal::ONE);
        Self { base, rates }
    }

    /// Create a table from `(currency, rate)` pairs. The base entry is forced to one.
    pub fn from_rates<I, C>(base: CurrencyCode, rates: I) -> Self
    where
        I: IntoIterator<Item = (C, Decimal)>,
        C: Into<CurrencyCode>,
    {
        let mut table = Self::new(base);
        for (code, rate) in rates {
            table.insert(code, rate);
        }
        table
    }

    /// Insert or replace a rate. The base entry cannot be overridden.
    pub fn insert(&mut self, code: impl Into<CurrencyCode>, rate: Decimal) {
        let code = code.into();
        if code != self.base {
            self.rates.insert(code, rate);
        }
    }

    /// Get the rate for a currency.
    pub fn get(&self, code: &CurrencyCode) -> Option<Decimal> {
        self.rates.get(code).copied()
    }

    pub fn contains(&self, code: &CurrencyCode) -> bool {
        self.rates.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CurrencyCode, &Decimal)> {
        self.rates.iter()
    }

    /// Supported currencies this table has no usable (positive) rate for.
    pub fn missing_from(&self, supported: &SupportedCurrencies) -> Vec<CurrencyCode> {
        supported
            .iter()
            .filter(|code| !matches!(self.get(code), Some(rate) if rate > Decimal::ZERO))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_base_is_one() {
        let table = RateTable::from_rates(
            CurrencyCode::usd(),
            [("USD", dec!(5)), ("INR", dec!(83.12))],
        );

        assert_eq!(table.get(&CurrencyCode::usd()), Some(Decimal::ONE));
        assert_eq!(table.get(&CurrencyCode::inr()), Some(dec!(83.12)));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_missing_from() {
        let table = RateTable::from_rates(
            CurrencyCode::usd(),
            [("INR", dec!(83.12)), ("EUR", dec!(0))],
        );
        let supported = SupportedCurrencies::new(["USD", "INR", "EUR", "GBP"]);

        assert_eq!(
            table.missing_from(&supported),
            vec![CurrencyCode::eur(), CurrencyCode::gbp()]
        );
    }

    #[test]
    fn test_serializes_rates_as_strings() {
        let table = RateTable::from_rates(CurrencyCode::usd(), [("EUR", dec!(0.92))]);
        let json = serde_json::to_value(&table).unwrap();

        assert_eq!(json["base"], "USD");
        assert_eq!(json["rates"]["EUR"], "0.92");
    }
}
