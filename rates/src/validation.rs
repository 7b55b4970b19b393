//! Request validation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use xrate_common::{retention_cutoff, CurrencyCode, SupportedCurrencies};

use crate::error::{RateError, RateResult};

/// A conversion request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    /// Strictly positive amount.
    pub amount: Decimal,
    /// Calendar day for historical rates; `None` for latest.
    pub date: Option<NaiveDate>,
}

/// Validation limits.
#[derive(Debug, Clone)]
pub struct Validator<'a> {
    pub supported: &'a SupportedCurrencies,
    pub today: NaiveDate,
    pub retention_days: i64,
}

impl Validator<'_> {
    /// Check a raw request. Rules run in order and the first failure wins:
    /// source currency, target currency, amount, then date window.
    pub fn validate(
        &self,
        from: &str,
        to: &str,
        amount: &str,
        date: Option<NaiveDate>,
    ) -> RateResult<ConversionRequest> {
        let from = self
            .supported
            .resolve(from)
            .ok_or_else(|| RateError::UnsupportedCurrency(from.to_string()))?;
        let to = self
            .supported
            .resolve(to)
            .ok_or_else(|| RateError::UnsupportedCurrency(to.to_string()))?;
        let amount = parse_amount(amount)?;

        if let Some(date) = date {
            self.check_date(date)?;
        }

        Ok(ConversionRequest {
            from,
            to,
            amount,
            date,
        })
    }

    /// A date must lie within `[today - retention_days, today]`.
    pub fn check_date(&self, date: NaiveDate) -> RateResult<()> {
        if date > self.today {
            return Err(RateError::FutureDate);
        }
        if date < retention_cutoff(self.today, self.retention_days) {
            return Err(RateError::DateTooOld {
                max_days: self.retention_days,
            });
        }
        Ok(())
    }
}

/// Parse a strictly positive decimal amount, plain or scientific.
pub fn parse_amount(raw: &str) -> RateResult<Decimal> {
    let raw = raw.trim();
    // `Decimal` tolerates `_` digit separators; amounts do not.
    if raw.contains('_') {
        return Err(RateError::InvalidAmount);
    }
    let amount = Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| RateError::InvalidAmount)?;

    if amount <= Decimal::ZERO {
        return Err(RateError::InvalidAmount);
    }
    Ok(amount)
}
