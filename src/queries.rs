//! Read-side projections over visit lists.
//!
//! Admin screens fetch a broad range once and filter locally; these are the
//! pure computations they use. Nothing here mutates its input and every
//! function is safe to call repeatedly.

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::VisitRecord;

/// Monday–Sunday window containing `reference`.
pub fn week_bounds(reference: NaiveDate) -> (NaiveDate, NaiveDate) {
    let offset = reference.weekday().num_days_from_monday() as i64;
    let monday = reference - Duration::days(offset);
    (monday, monday + Duration::days(6))
}

/// Visits scheduled exactly on `date`.
pub fn by_date(visits: &[VisitRecord], date: NaiveDate) -> Vec<VisitRecord> {
    visits
        .iter()
        .filter(|v| v.visit_date == date)
        .cloned()
        .collect()
}

/// Visits on the reference calendar day.
pub fn today(visits: &[VisitRecord], reference: NaiveDate) -> Vec<VisitRecord> {
    by_date(visits, reference)
}

/// Visits whose date falls inside an inclusive range.
pub fn by_week_range(
    visits: &[VisitRecord],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<VisitRecord> {
    visits
        .iter()
        .filter(|v| v.visit_date >= start && v.visit_date <= end)
        .cloned()
        .collect()
}

/// Visits in the Monday–Sunday week containing the reference date.
pub fn this_week(visits: &[VisitRecord], reference: NaiveDate) -> Vec<VisitRecord> {
    let (monday, sunday) = week_bounds(reference);
    by_week_range(visits, monday, sunday)
}

/// Visits sharing year and month with the reference date.
pub fn this_month(visits: &[VisitRecord], reference: NaiveDate) -> Vec<VisitRecord> {
    visits
        .iter()
        .filter(|v| {
            v.visit_date.year() == reference.year() && v.visit_date.month() == reference.month()
        })
        .cloned()
        .collect()
}
