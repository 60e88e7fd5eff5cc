use crate::model::{ScheduleAssignment, StaffId, StaffMember};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashSet;

pub(super) fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Union des agents affectés dans un lot d'affectations.
pub(super) fn staff_of<'a, I>(assignments: I) -> HashSet<StaffId>
where
    I: IntoIterator<Item = &'a ScheduleAssignment>,
{
    assignments
        .into_iter()
        .flat_map(|a| a.assigned.iter().cloned())
        .collect()
}

pub(super) fn covers_location(assignment: &ScheduleAssignment, location: &str) -> bool {
    assignment.location == location || assignment.also_covers.iter().any(|l| l == location)
}

pub(super) fn previous_day(date: NaiveDate) -> Option<NaiveDate> {
    date.pred_opt()
}

pub(super) fn without(pool: &[StaffMember], excluded: &HashSet<StaffId>) -> Vec<StaffMember> {
    pool.iter()
        .filter(|s| !excluded.contains(&s.id))
        .cloned()
        .collect()
}
