//! Demand prediction HTTP service
//!
//! Exposes health, inference, demand forecasting, feature importance and
//! Prometheus metrics over HTTP.

pub mod api;
pub mod config;
