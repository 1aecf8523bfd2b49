pub mod analytics;
pub mod cache;
pub mod config;
pub mod errors;
pub mod filter;
pub mod model;
pub mod orchestrator;
pub mod providers;
pub mod query;
pub mod store;
pub mod tools;
