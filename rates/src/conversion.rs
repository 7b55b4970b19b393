//! Currency conversion types and operations.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use uuid::Uuid;
use xrate_common::{now, CurrencyCode, RateTable, Timestamp};

use crate::error::ConversionError;

/// Fractional digits used when presenting a converted amount.
pub const DISPLAY_SCALE: u32 = 2;

/// Converts amounts through a base-anchored rate table.
///
/// `result = amount * rate(to) / rate(from)`, computed in decimal with no
/// intermediate rounding, then rounded half-up to `scale` digits.
#[derive(Debug, Clone, Copy)]
pub struct Converter {
    scale: u32,
}

impl Converter {
    /// Create a converter rounding to `scale` fractional digits.
    pub fn new(scale: u32) -> Self {
        Self { scale }
    }

    /// Fractional digits of every result.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Convert `amount` of `from` into `to`.
    ///
    /// A same-currency conversion returns `amount` untouched; only
    /// [`Converter::format`] rounds it for display.
    pub fn convert(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
        amount: Decimal,
        rates: &RateTable,
    ) -> Result<Decimal, ConversionError> {
        let from_rate = Self::usable_rate(from, rates)?;
        let to_rate = Self::usable_rate(to, rates)?;

        if from == to {
            return Ok(amount);
        }

        let converted = amount
            .checked_mul(to_rate)
            .and_then(|v| v.checked_div(from_rate))
            .ok_or_else(|| ConversionError::Overflow {
                from: from.clone(),
                to: to.clone(),
            })?;

        Ok(self.round(converted))
    }

    /// Render an amount with exactly `scale` fractional digits.
    pub fn format(&self, amount: Decimal) -> String {
        let mut value = self.round(amount);
        value.rescale(self.scale);
        value.to_string()
    }

    fn round(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.scale, RoundingStrategy::MidpointAwayFromZero)
    }

    fn usable_rate(code: &CurrencyCode, rates: &RateTable) -> Result<Decimal, ConversionError> {
        match rates.get(code) {
            None => Err(ConversionError::MissingRate(code.clone())),
            Some(rate) if rate <= Decimal::ZERO => Err(ConversionError::InvalidRate(code.clone())),
            Some(rate) => Ok(rate),
        }
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(DISPLAY_SCALE)
    }
}

/// Which table a conversion used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "date", rename_all = "snake_case")]
pub enum RateSource {
    /// The latest table.
    Latest,
    /// The table for a past calendar day.
    Historical(NaiveDate),
}

impl RateSource {
    /// The requested date, if historical.
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            RateSource::Latest => None,
            RateSource::Historical(date) => Some(*date),
        }
    }
}

/// Represents a completed currency conversion.
#[derive(Debug, Clone, Serialize)]
pub struct Conversion {
    /// Unique conversion ID.
    pub id: Uuid,
    /// Source currency.
    pub from: CurrencyCode,
    /// Target currency.
    pub to: CurrencyCode,
    /// Input amount.
    pub amount: Decimal,
    /// Converted amount, rounded to `scale` digits unless `from == to`.
    pub result: Decimal,
    /// Fractional digits of `result`.
    pub scale: u32,
    /// Table used.
    pub source: RateSource,
    /// When the conversion was executed.
    pub executed_at: Timestamp,
}

impl Conversion {
    /// Create a new conversion record.
    pub fn new(
        from: CurrencyCode,
        to: CurrencyCode,
        amount: Decimal,
        result: Decimal,
        scale: u32,
        source: RateSource,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            from,
            to,
            amount,
            result,
            scale,
            source,
            executed_at: now(),
        }
    }

    /// The result as a decimal string with exactly `scale` fractional digits.
    pub fn result_string(&self) -> String {
        Converter::new(self.scale).format(self.result)
    }

    /// Get the effective rate used.
    pub fn effective_rate(&self) -> Decimal {
        if self.amount.is_zero() {
            return Decimal::ZERO;
        }
        self.result / self.amount
    }
}
