//! The visit status state machine.
//!
//! All mutation of a [`VisitRecord`] flows through [`apply`]: one tagged
//! [`Transition`] in, an updated record plus a changed-fields-only
//! [`VisitPatch`] out. The patch is what goes on the wire (`PUT
//! /visits/{id}`); the record is what the caller keeps. A rejected
//! transition mutates nothing.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{Coordinates, VisitRecord, VisitStatus};

// ─── Transitions ──────────────────────────────────────────────────────────────

/// A caller-requested state change with its concrete inputs resolved.
///
/// Geotagged variants carry coordinates the orchestrator already acquired;
/// the state machine itself never touches the device.
#[derive(Debug, Clone)]
pub enum Transition {
    /// Consultant departs for the school.
    StartRoute {
        at: DateTime<FixedOffset>,
        coordinates: Coordinates,
    },
    /// Consultant arrives and checks in on site.
    StartVisit {
        at: DateTime<FixedOffset>,
        coordinates: Coordinates,
    },
    /// Move the visit to a new date (and optionally new planned times).
    Reschedule {
        new_date: NaiveDate,
        init_visit_time: Option<DateTime<FixedOffset>>,
        end_visit_time: Option<DateTime<FixedOffset>>,
        reason: String,
    },
    Cancel {
        reason: String,
    },
    /// Driven by the visit-form subsystem once its mandatory fields are
    /// complete; closes the state machine.
    Complete {
        visit_observations: Option<String>,
    },
}

/// Discriminant of [`Transition`], used for offerability checks and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransitionKind {
    StartRoute,
    StartVisit,
    Reschedule,
    Cancel,
    Complete,
}

impl Transition {
    pub fn kind(&self) -> TransitionKind {
        match self {
            Self::StartRoute { .. } => TransitionKind::StartRoute,
            Self::StartVisit { .. } => TransitionKind::StartVisit,
            Self::Reschedule { .. } => TransitionKind::Reschedule,
            Self::Cancel { .. } => TransitionKind::Cancel,
            Self::Complete { .. } => TransitionKind::Complete,
        }
    }
}

// ─── Errors ───────────────────────────────────────────────────────────────────

/// Caller-input problems caught before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please fill in a rescheduling reason")]
    MissingRescheduleReason,

    #[error("Please fill in the new visit date")]
    MissingRescheduleDate,

    #[error("Please fill in a cancellation reason")]
    MissingCancelReason,

    #[error("The planned end time must come after the planned start time")]
    EndBeforeStart,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// Cancelled and completed visits accept no further change.
    #[error("Visit is already {status}; no further changes are accepted")]
    Terminal { status: VisitStatus },

    #[error("Cannot apply {kind:?} while the visit is {status}")]
    NotAllowed {
        kind: TransitionKind,
        status: VisitStatus,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

// ─── Patch ────────────────────────────────────────────────────────────────────

/// Changed-fields-only body for `PUT /visits/{id}`.
///
/// Every field is optional and absent fields stay off the wire, so the
/// persistence service only ever sees what a transition actually touched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<VisitStatus>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "crate::datetime::canonical_opt::serialize"
    )]
    pub init_route_time: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_route_coordinates: Option<Coordinates>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "crate::datetime::canonical_opt::serialize"
    )]
    pub end_route_time: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_route_coordinates: Option<Coordinates>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "crate::datetime::canonical_opt::serialize"
    )]
    pub init_visit_time: Option<DateTime<FixedOffset>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "crate::datetime::canonical_opt::serialize"
    )]
    pub end_visit_time: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_visit_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_rescheduling_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rescheduling_amount: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit_observations: Option<String>,
}

/// Result of a successful [`apply`]: the record as it now stands and the
/// wire patch that makes persistence agree.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub record: VisitRecord,
    pub patch: VisitPatch,
}

// ─── State machine ────────────────────────────────────────────────────────────

/// Transitions offerable from a given status, in display order.
pub fn available_transitions(status: VisitStatus) -> Vec<TransitionKind> {
    match status {
        VisitStatus::Scheduled | VisitStatus::Rescheduled => vec![
            TransitionKind::StartRoute,
            TransitionKind::Reschedule,
            TransitionKind::Cancel,
        ],
        VisitStatus::OnCourse => vec![
            TransitionKind::StartVisit,
            TransitionKind::Reschedule,
            TransitionKind::Cancel,
        ],
        VisitStatus::InProgress => vec![
            TransitionKind::Complete,
            TransitionKind::Reschedule,
            TransitionKind::Cancel,
        ],
        VisitStatus::Cancelled | VisitStatus::Completed => vec![],
    }
}

/// Precondition check shared by [`apply`] and orchestrator pre-flight.
pub fn check_allowed(status: VisitStatus, kind: TransitionKind) -> Result<(), LifecycleError> {
    if status.is_terminal() {
        warn!(%status, ?kind, "transition rejected: visit is terminal");
        return Err(LifecycleError::Terminal { status });
    }
    if !available_transitions(status).contains(&kind) {
        warn!(%status, ?kind, "transition rejected: not allowed from this status");
        return Err(LifecycleError::NotAllowed { kind, status });
    }
    Ok(())
}

/// Apply one transition to a record.
///
/// Validates first; on any error the input record is untouched. On success
/// the outcome holds the new record and the minimal wire patch.
pub fn apply(
    record: &VisitRecord,
    transition: &Transition,
) -> Result<TransitionOutcome, LifecycleError> {
    check_allowed(record.status, transition.kind())?;

    let mut next = record.clone();
    let mut patch = VisitPatch::default();

    match transition {
        Transition::StartRoute { at, coordinates } => {
            next.init_route_time = Some(*at);
            next.init_route_coordinates = Some(*coordinates);
            next.status = VisitStatus::OnCourse;

            patch.init_route_time = Some(*at);
            patch.init_route_coordinates = Some(*coordinates);
            patch.status = Some(VisitStatus::OnCourse);
        }
        Transition::StartVisit { at, coordinates } => {
            next.end_route_time = Some(*at);
            next.end_route_coordinates = Some(*coordinates);
            next.init_visit_time = Some(*at);
            next.status = VisitStatus::InProgress;

            patch.end_route_time = Some(*at);
            patch.end_route_coordinates = Some(*coordinates);
            patch.init_visit_time = Some(*at);
            patch.status = Some(VisitStatus::InProgress);
        }
        Transition::Reschedule {
            new_date,
            init_visit_time,
            end_visit_time,
            reason,
        } => {
            if reason.trim().is_empty() {
                return Err(ValidationError::MissingRescheduleReason.into());
            }
            if let (Some(init), Some(end)) = (init_visit_time, end_visit_time) {
                if end <= init {
                    return Err(ValidationError::EndBeforeStart.into());
                }
            }

            next.last_visit_date = Some(record.visit_date);
            next.visit_date = *new_date;
            next.last_rescheduling_reason = Some(reason.clone());
            next.rescheduling_amount = record.rescheduling_amount + 1;
            next.status = VisitStatus::Rescheduled;

            patch.last_visit_date = Some(record.visit_date);
            patch.visit_date = Some(*new_date);
            patch.last_rescheduling_reason = Some(reason.clone());
            patch.rescheduling_amount = Some(next.rescheduling_amount);
            patch.status = Some(VisitStatus::Rescheduled);

            if let Some(init) = init_visit_time {
                next.init_visit_time = Some(*init);
                patch.init_visit_time = Some(*init);
            }
            if let Some(end) = end_visit_time {
                next.end_visit_time = Some(*end);
                patch.end_visit_time = Some(*end);
            }
        }
        Transition::Cancel { reason } => {
            if reason.trim().is_empty() {
                return Err(ValidationError::MissingCancelReason.into());
            }
            next.cancel_reason = Some(reason.clone());
            next.status = VisitStatus::Cancelled;

            patch.cancel_reason = Some(reason.clone());
            patch.status = Some(VisitStatus::Cancelled);
        }
        Transition::Complete { visit_observations } => {
            next.status = VisitStatus::Completed;
            patch.status = Some(VisitStatus::Completed);
            if let Some(observations) = visit_observations {
                next.visit_observations = Some(observations.clone());
                patch.visit_observations = Some(observations.clone());
            }
        }
    }

    debug!(
        from = %record.status,
        to = %next.status,
        kind = ?transition.kind(),
        "transition applied"
    );
    Ok(TransitionOutcome {
        record: next,
        patch,
    })
}
