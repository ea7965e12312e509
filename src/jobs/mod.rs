pub mod price_ingestion_sync;
