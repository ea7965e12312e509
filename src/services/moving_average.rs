//! Trailing moving average over persisted market records

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::instrument::Instrument;
use crate::services::store::{MarketStore, StoreError};

pub const MOVING_AVERAGE_WINDOW: u64 = 30;

#[derive(Debug, Error)]
pub enum MovingAverageError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0}")]
    Aggregation(String),
}

/// Mean of `usd_price` over the latest `MOVING_AVERAGE_WINDOW` records with
/// `trade_date <= as_of`. Fewer records than the window is fine; an empty
/// history yields `None`.
///
/// Reads persisted rows only, so a record upserted just before this call is
/// part of the window.
pub async fn moving_average_30(
    store: &dyn MarketStore,
    instrument: Instrument,
    as_of: NaiveDate,
) -> Result<Option<Decimal>, MovingAverageError> {
    let records = store
        .recent_market_data(instrument, as_of, MOVING_AVERAGE_WINDOW)
        .await?;

    let prices: Vec<Decimal> = records.iter().map(|r| r.usd_price).collect();
    mean(&prices).map_err(MovingAverageError::Aggregation)
}

fn mean(prices: &[Decimal]) -> Result<Option<Decimal>, String> {
    if prices.is_empty() {
        return Ok(None);
    }

    let mut sum = Decimal::ZERO;
    for price in prices {
        sum = sum
            .checked_add(*price)
            .ok_or_else(|| format!("sum of {} prices overflowed", prices.len()))?;
    }

    Ok(Some(sum / Decimal::from(prices.len() as u64)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_mean_of_empty_history_is_none() {
        assert_eq!(mean(&[]), Ok(None));
    }

    #[test]
    fn test_mean_over_partial_window() {
        let prices = [dec!(10), dec!(20), dec!(30), dec!(40), dec!(50)];
        assert_eq!(mean(&prices), Ok(Some(dec!(30))));
    }

    #[test]
    fn test_mean_is_exact_for_decimal_inputs() {
        let prices = [dec!(4420.5), dec!(4419.5)];
        assert_eq!(mean(&prices), Ok(Some(dec!(4420))));
    }
}
