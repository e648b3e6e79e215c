pub mod api;
pub mod config;
pub mod currency_rate;
pub mod error;
pub mod feed_client;
pub mod ingest;
pub mod normalize;
pub mod query;
pub mod store;
pub mod val_curs;
pub mod worker_pool;
