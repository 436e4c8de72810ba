//! Visit-lifecycle core for the consultant field-visit scheduler.
//!
//! Coordinates the life of a field-visit appointment between a traveling
//! consultant and a school site: creation, rescheduling, cancellation, route
//! departure, and on-site check-in/completion. Everything else around it
//! (dashboards, calendars, course players) is plain display/CRUD and lives
//! outside this crate.
//!
//! Module map:
//! - [`models`] — `VisitRecord` and friends, plus the status/type enums
//! - [`lifecycle`] — the authoritative transition state machine
//! - [`geo`] — device geolocation with a bounded wait
//! - [`datetime`] — timestamp codec (canonical explicit-offset encoding)
//! - [`store`] — REST persistence collaborator behind a trait seam
//! - [`scheduler`] — the orchestrator UI callers drive
//! - [`queries`] — pure today/this-week/this-month projections

pub mod config;
pub mod models;
pub mod geo;
pub mod datetime;
pub mod lifecycle;
pub mod store;
pub mod scheduler;
pub mod queries;
