//! Domain layer containing business entities and logic.
//!
//! Defines entities, repository interfaces and the hit telemetry pipeline,
//! independent of infrastructure concerns.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`hit_event`] - Hit tracking event model
//! - [`hit_queue`] - Bounded queue between lookups and the aggregator
//! - [`hit_aggregator`] - Background consumer applying hits to rows
//!
//! # Hit Processing Flow
//!
//! 1. A successful lookup creates a [`hit_event::HitEvent`]
//! 2. The event is pushed onto the [`hit_queue::TelemetryQueue`]
//! 3. [`hit_aggregator::Aggregator`] dequeues it and calls
//!    [`hit_aggregator::HitRecorder::record_hit`]
//! 4. The row's hit counter and last hit time are written back via
//!    [`repositories::ShortenedUrlRepository`]

pub mod entities;
pub mod hit_aggregator;
pub mod hit_event;
pub mod hit_queue;
pub mod repositories;
