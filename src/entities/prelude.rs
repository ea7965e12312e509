pub use super::ma_discount_settings::Entity as MaDiscountSettings;
pub use super::ma_discount_values::Entity as MaDiscountValues;
pub use super::market_data::Entity as MarketData;
