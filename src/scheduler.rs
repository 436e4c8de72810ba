//! The workflow a caller (consultant or admin UI) drives.
//!
//! One orchestrator serves both roles; permission differences are decided
//! from the [`SessionContext`] handed in at construction, not from cookies
//! read inside components. Every transition runs the same shape: load,
//! validate, acquire a location if the transition is geotagged, apply the
//! state machine, submit the patch, confirm the write, bump the refresh
//! signal. On any failure the record stays last-known-good.

use chrono::{DateTime, FixedOffset, NaiveDate};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::datetime;
use crate::geo::{GeolocationService, LocationError, LocationProvider};
use crate::lifecycle::{self, LifecycleError, Transition, TransitionKind, ValidationError};
use crate::models::{NewVisit, Role, SessionContext, VisitRecord};
use crate::store::{StoreError, VisitStore};

/// Caller input for a reschedule, as it arrives from the form.
#[derive(Debug, Clone, Default)]
pub struct RescheduleRequest {
    pub new_date: Option<NaiveDate>,
    pub init_visit_time: Option<DateTime<FixedOffset>>,
    pub end_visit_time: Option<DateTime<FixedOffset>>,
    pub reason: String,
}

/// Everything that can go wrong while driving a visit, grouped so the UI
/// can tell "couldn't get your location" from "couldn't save" from
/// "please fill in X".
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Couldn't get your location: {0}")]
    Location(#[from] LocationError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Lifecycle(LifecycleError),

    #[error("Couldn't save the visit: {0}")]
    Persistence(#[from] StoreError),

    #[error("You don't have permission to change this visit")]
    NotPermitted,

    /// The record has no id yet, so there is nothing to update.
    #[error("This visit hasn't been saved yet")]
    Unsaved,
}

impl From<LifecycleError> for SchedulerError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Validation(v) => Self::Validation(v),
            other => Self::Lifecycle(other),
        }
    }
}

/// Drives visit records through their lifecycle on behalf of one session.
pub struct SchedulingOrchestrator<S, P> {
    store: S,
    geo: GeolocationService<P>,
    session: SessionContext,
    refresh_tx: watch::Sender<u64>,
}

impl<S: VisitStore, P: LocationProvider> SchedulingOrchestrator<S, P> {
    pub fn new(store: S, geo: GeolocationService<P>, session: SessionContext) -> Self {
        let (refresh_tx, _) = watch::channel(0);
        Self {
            store,
            geo,
            session,
            refresh_tx,
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Listing screens watch this; the value bumps after every successful
    /// create or transition.
    pub fn subscribe_refresh(&self) -> watch::Receiver<u64> {
        self.refresh_tx.subscribe()
    }

    fn signal_refresh(&self) {
        self.refresh_tx.send_modify(|generation| *generation += 1);
    }

    /// Admins act on any visit; consultants only on their own.
    fn may_edit(&self, record: &VisitRecord) -> bool {
        self.session.role == Role::Admin || record.creator_id == self.session.consultant_id
    }

    /// Submit a new-visit form. Returns the record as persistence now
    /// holds it, id included.
    pub async fn create_visit(&self, new_visit: NewVisit) -> Result<VisitRecord, SchedulerError> {
        let ack = self.store.create(&new_visit).await?;
        info!(visit = %ack.id, "visit created");
        self.signal_refresh();
        Ok(new_visit.into_record(ack.id))
    }

    pub async fn load_visit(&self, id: &str) -> Result<VisitRecord, SchedulerError> {
        Ok(self.store.fetch(id).await?)
    }

    /// Which transitions the current session may offer for this record.
    pub fn available_actions(&self, record: &VisitRecord) -> Vec<TransitionKind> {
        if !self.may_edit(record) {
            return vec![];
        }
        lifecycle::available_transitions(record.status)
    }

    /// Depart for the school: geotag and timestamp the route start.
    pub async fn start_route(&self, id: &str) -> Result<VisitRecord, SchedulerError> {
        let record = self.load_for_edit(id, TransitionKind::StartRoute).await?;
        let coordinates = self.geo.acquire().await?;
        self.submit(
            &record,
            Transition::StartRoute {
                at: datetime::now_local(),
                coordinates,
            },
        )
        .await
    }

    /// Arrive on site: close the route and open the visit.
    pub async fn start_visit(&self, id: &str) -> Result<VisitRecord, SchedulerError> {
        let record = self.load_for_edit(id, TransitionKind::StartVisit).await?;
        let coordinates = self.geo.acquire().await?;
        self.submit(
            &record,
            Transition::StartVisit {
                at: datetime::now_local(),
                coordinates,
            },
        )
        .await
    }

    /// Move the visit to a new date. Input is validated before anything
    /// touches the network.
    pub async fn reschedule(
        &self,
        id: &str,
        request: RescheduleRequest,
    ) -> Result<VisitRecord, SchedulerError> {
        if request.reason.trim().is_empty() {
            return Err(ValidationError::MissingRescheduleReason.into());
        }
        let new_date = request
            .new_date
            .ok_or(ValidationError::MissingRescheduleDate)?;

        let record = self.load_for_edit(id, TransitionKind::Reschedule).await?;
        self.submit(
            &record,
            Transition::Reschedule {
                new_date,
                init_visit_time: request.init_visit_time,
                end_visit_time: request.end_visit_time,
                reason: request.reason,
            },
        )
        .await
    }

    pub async fn cancel(&self, id: &str, reason: &str) -> Result<VisitRecord, SchedulerError> {
        if reason.trim().is_empty() {
            return Err(ValidationError::MissingCancelReason.into());
        }
        let record = self.load_for_edit(id, TransitionKind::Cancel).await?;
        self.submit(
            &record,
            Transition::Cancel {
                reason: reason.to_string(),
            },
        )
        .await
    }

    /// Called by the visit-form subsystem once its mandatory fields are
    /// filled; closes the lifecycle.
    pub async fn complete(
        &self,
        id: &str,
        visit_observations: Option<String>,
    ) -> Result<VisitRecord, SchedulerError> {
        let record = self.load_for_edit(id, TransitionKind::Complete).await?;
        self.submit(
            &record,
            Transition::Complete { visit_observations },
        )
        .await
    }

    /// Fetch and pre-flight: permission plus state-machine precondition.
    /// Runs before any device read so a visit in the wrong status never
    /// prompts for location.
    async fn load_for_edit(
        &self,
        id: &str,
        kind: TransitionKind,
    ) -> Result<VisitRecord, SchedulerError> {
        let record = self.store.fetch(id).await?;
        if !self.may_edit(&record) {
            warn!(visit = id, role = %self.session.role, "edit refused for this session");
            return Err(SchedulerError::NotPermitted);
        }
        lifecycle::check_allowed(record.status, kind)?;
        Ok(record)
    }

    async fn submit(
        &self,
        record: &VisitRecord,
        transition: Transition,
    ) -> Result<VisitRecord, SchedulerError> {
        let outcome = lifecycle::apply(record, &transition)?;
        let id = record.id.as_deref().ok_or(SchedulerError::Unsaved)?;

        let ack = self.store.update(id, &outcome.patch).await?;
        if ack.affected_rows == 0 {
            warn!(visit = id, "persistence reported zero affected rows");
            return Err(StoreError::WriteNotApplied.into());
        }

        info!(visit = id, status = %outcome.record.status, "transition persisted");
        self.signal_refresh();
        Ok(outcome.record)
    }
}
