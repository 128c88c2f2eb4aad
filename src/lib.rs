//! MyGP Clearance Tracking Library
//!
//! Business rules behind the customs-clearance tracking screens: Mexican
//! business-day arithmetic, the exception-code policy for phase updates, and
//! deduplication of tracking records by core reference. The HTTP layer in
//! `handlers` exposes the same rules as a JSON API.
//!
//! # Modules
//!
//! - `api`: API-layer namespace (handlers, errors).
//! - `core`: Domain-layer namespace (pure rules).
//! - `calendar`: Holiday providers and business-day counting.
//! - `config`: Configuration management.
//! - `dedup`: Tracking-record deduplication with an audit trail.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers and router.
//! - `models`: Tracking record models.
//! - `policy`: Exception-code predicates and phase-update validation.
//! - `reference`: Core reference parsing.

pub mod api;
pub mod core;

pub mod calendar;
pub mod config;
pub mod dedup;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod policy;
pub mod reference;
