//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository calls,
//! validation and the alias rules. Services consume repository traits and
//! provide a clean API for HTTP handlers.
//!
//! # Contents
//!
//! - [`services::url_service::UrlService`] - Creation, lookup and hit recording
//! - [`telemetry_pipeline::TelemetryPipeline`] - Starts the service together with its aggregator

pub mod services;
pub mod telemetry_pipeline;
