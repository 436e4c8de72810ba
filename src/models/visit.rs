use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use super::enums::{InstitutionProfile, VisitStatus, VisitType};

/// Latitude/longitude pair captured when a transition is geotagged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A scheduled interaction between a consultant and a school.
///
/// Wire names are camelCase to match the persistence service. Lifecycle and
/// audit fields are populated exclusively by the transitions in
/// [`crate::lifecycle`]; nothing else writes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitRecord {
    /// Assigned by the persistence service on creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub college_id: String,
    /// The consultant who scheduled the visit.
    pub creator_id: String,

    pub institution_profile: InstitutionProfile,
    pub visit_type: VisitType,
    pub college_name: String,
    pub college_address: String,
    pub college_number: String,
    pub city: String,
    /// School contact chosen from the per-college roster (free text).
    pub manager: String,

    pub visit_date: NaiveDate,
    /// Planned start; overwritten with the actual arrival instant by the
    /// start-visit transition.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::datetime::canonical_opt"
    )]
    pub init_visit_time: Option<DateTime<FixedOffset>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::datetime::canonical_opt"
    )]
    pub end_visit_time: Option<DateTime<FixedOffset>>,

    /// Display names of additionally invited consultants. Order is
    /// irrelevant and duplicates carry no meaning, hence a set.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub guest_consultants: BTreeSet<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::datetime::canonical_opt"
    )]
    pub init_route_time: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init_route_coordinates: Option<Coordinates>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::datetime::canonical_opt"
    )]
    pub end_route_time: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_route_coordinates: Option<Coordinates>,

    /// Date the visit was scheduled for before the most recent reschedule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_visit_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_rescheduling_reason: Option<String>,
    /// How many times this visit has been moved. Never decremented.
    #[serde(default)]
    pub rescheduling_amount: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,

    pub status: VisitStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduling_observations: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visit_observations: Option<String>,
}

/// Creation payload: a `VisitRecord` minus lifecycle/audit fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVisit {
    pub college_id: String,
    pub creator_id: String,
    pub institution_profile: InstitutionProfile,
    pub visit_type: VisitType,
    pub college_name: String,
    pub college_address: String,
    pub college_number: String,
    pub city: String,
    pub manager: String,
    pub visit_date: NaiveDate,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::datetime::canonical_opt"
    )]
    pub init_visit_time: Option<DateTime<FixedOffset>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::datetime::canonical_opt"
    )]
    pub end_visit_time: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub guest_consultants: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduling_observations: Option<String>,
}

impl NewVisit {
    /// Materialize the record the persistence service now holds, with the
    /// id from the creation acknowledgment and a fresh lifecycle.
    pub fn into_record(self, id: String) -> VisitRecord {
        VisitRecord {
            id: Some(id),
            college_id: self.college_id,
            creator_id: self.creator_id,
            institution_profile: self.institution_profile,
            visit_type: self.visit_type,
            college_name: self.college_name,
            college_address: self.college_address,
            college_number: self.college_number,
            city: self.city,
            manager: self.manager,
            visit_date: self.visit_date,
            init_visit_time: self.init_visit_time,
            end_visit_time: self.end_visit_time,
            guest_consultants: self.guest_consultants,
            init_route_time: None,
            init_route_coordinates: None,
            end_route_time: None,
            end_route_coordinates: None,
            last_visit_date: None,
            last_rescheduling_reason: None,
            rescheduling_amount: 0,
            cancel_reason: None,
            status: VisitStatus::Scheduled,
            scheduling_observations: self.scheduling_observations,
            visit_observations: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_new_visit() -> NewVisit {
        NewVisit {
            college_id: "col-17".into(),
            creator_id: "cons-3".into(),
            institution_profile: InstitutionProfile::OnboardingYear1,
            visit_type: VisitType::InitialVisit,
            college_name: "Escola Monte Azul".into(),
            college_address: "Rua das Flores 120".into(),
            college_number: "120".into(),
            city: "Curitiba".into(),
            manager: "Dona Lúcia".into(),
            visit_date: NaiveDate::from_ymd_opt(2026, 2, 3).unwrap(),
            init_visit_time: None,
            end_visit_time: None,
            guest_consultants: BTreeSet::new(),
            scheduling_observations: None,
        }
    }

    #[test]
    fn new_visit_starts_scheduled_with_clean_audit_trail() {
        let record = sample_new_visit().into_record("v-1".into());
        assert_eq!(record.status, VisitStatus::Scheduled);
        assert_eq!(record.rescheduling_amount, 0);
        assert!(record.init_route_time.is_none());
        assert!(record.cancel_reason.is_none());
        assert_eq!(record.id.as_deref(), Some("v-1"));
    }

    #[test]
    fn guest_consultants_deduplicate() {
        let mut new_visit = sample_new_visit();
        new_visit.guest_consultants.insert("Marta".into());
        new_visit.guest_consultants.insert("Marta".into());
        new_visit.guest_consultants.insert("João".into());
        assert_eq!(new_visit.guest_consultants.len(), 2);
    }

    #[test]
    fn record_wire_names_are_camel_case() {
        let record = sample_new_visit().into_record("v-1".into());
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("collegeId").is_some());
        assert!(value.get("visitDate").is_some());
        // Unset audit fields stay off the wire entirely.
        assert!(value.get("initRouteTime").is_none());
        assert!(value.get("cancelReason").is_none());
    }

    #[test]
    fn record_round_trips_through_json() {
        let mut record = sample_new_visit().into_record("v-9".into());
        record.rescheduling_amount = 2;
        record.last_visit_date = NaiveDate::from_ymd_opt(2026, 1, 27);
        let json = serde_json::to_string(&record).unwrap();
        let back: VisitRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.rescheduling_amount, 2);
        assert_eq!(back.last_visit_date, record.last_visit_date);
        assert_eq!(back.status, VisitStatus::Scheduled);
    }
}
