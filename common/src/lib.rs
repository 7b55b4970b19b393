//! xrate Common Types
//!
//! Types shared across the xrate workspace: currency codes and the supported
//! currency set, base-anchored rate tables, and calendar-day helpers.

pub mod currency;
pub mod rates;
pub mod time;

pub use currency::*;
pub use rates::*;
pub use time::*;
