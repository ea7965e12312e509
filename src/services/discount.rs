//! Discount values derived from the moving average

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::instrument::Instrument;
use crate::services::store::{MarketStore, StoreError};

/// Deterministic transform of the moving average by one configured rule.
pub fn discount_value(moving_average: Decimal, discount_ratio: Decimal) -> Decimal {
    moving_average * (Decimal::ONE - discount_ratio)
}

/// One value per configured setting, keyed by (trade_date, setting_id) so a
/// re-run replaces instead of appending. No settings configured is not an
/// error; zero values are produced.
pub async fn generate_discount_values(
    store: &dyn MarketStore,
    instrument: Instrument,
    trade_date: NaiveDate,
    moving_average: Decimal,
) -> Result<usize, StoreError> {
    let settings = store.list_discount_settings(instrument).await?;

    if settings.is_empty() {
        tracing::debug!("[{}] no discount settings configured", instrument);
        return Ok(0);
    }

    for setting in &settings {
        let value = discount_value(moving_average, setting.discount_ratio);
        store
            .replace_discount_value(setting, trade_date, value)
            .await?;
        tracing::debug!(
            "[{}] discount value for '{}' on {}: {}",
            instrument,
            setting.label,
            trade_date,
            value
        );
    }

    Ok(settings.len())
}
