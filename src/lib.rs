// src/lib.rs

use services::ingestion::IngestionService;

#[derive(Clone)]
pub struct AppState {
    pub ingestion: IngestionService,
}

pub mod entities {
    pub mod prelude;
    pub mod ma_discount_settings;
    pub mod ma_discount_values;
    pub mod market_data;
}

pub mod services {
    pub mod discount;
    pub mod exchange_rate;
    pub mod ingestion;
    pub mod moving_average;
    pub mod store;
}

pub mod handlers;
pub mod jobs;
pub mod models;
pub mod scrapers;
