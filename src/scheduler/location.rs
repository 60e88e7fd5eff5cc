use super::{eligibility, rotation, util, SkipReason, UsedStaff};
use crate::config::{LocationSpec, PlanSlot};
use crate::model::{
    AssignmentId, AssignmentStatus, ScheduleAssignment, Shift, StaffId, StaffMember, TimeWindow,
};
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::debug;

/// Un poste à pourvoir pour une date et une garde.
#[derive(Debug, Clone, Copy)]
pub struct LocationRequest<'a> {
    pub date: NaiveDate,
    pub shift: Shift,
    pub slot: &'a PlanSlot,
    pub spec: &'a LocationSpec,
    /// Plage effective du poste (celle du parloir prime sur la garde).
    pub window: TimeWindow,
}

/// Filtre, sélectionne et construit l'affectation d'un poste.
///
/// `available` a déjà traversé l'exclusion des conflits. En cas de succès,
/// les agents retenus sont ajoutés à `used`.
pub fn schedule_location(
    req: &LocationRequest<'_>,
    available: &[StaffMember],
    used: &mut UsedStaff,
    previous_day: &HashSet<StaffId>,
) -> Result<ScheduleAssignment, SkipReason> {
    let location = req.slot.location.as_str();
    let unused = util::without(available, used);

    let mut pool = eligibility::filter(&unused, req.spec);
    if pool.is_empty() {
        if req.spec.strict {
            return Err(SkipReason::NoEligibleStaff);
        }
        pool = unused;
    }

    let team = rotation::select(
        &pool,
        req.slot.required,
        req.date,
        location,
        used,
        previous_day,
    );
    if team.is_empty() {
        return Err(SkipReason::NoAvailableStaff);
    }

    debug!(
        location,
        shift = %req.shift,
        date = %req.date,
        team = team.len(),
        required = req.slot.required,
        "location staffed"
    );

    let assigned: Vec<StaffId> = team.into_iter().map(|s| s.id).collect();
    used.extend(assigned.iter().cloned());
    Ok(build_assignment(req, assigned))
}

fn build_assignment(req: &LocationRequest<'_>, assigned: Vec<StaffId>) -> ScheduleAssignment {
    let (start, end) = req.window.resolve(req.date);
    let mut title = req.slot.location.clone();
    for extra in &req.slot.also_covers {
        title.push_str(" & ");
        title.push_str(extra);
    }
    title.push_str(&format!(" ({} shift)", req.shift));

    ScheduleAssignment {
        id: AssignmentId::random(),
        location: req.slot.location.clone(),
        also_covers: req.slot.also_covers.clone(),
        shift: req.shift,
        date: req.date,
        start,
        end,
        assigned,
        title,
        kind: req.spec.kind,
        priority: req.spec.priority,
        status: AssignmentStatus::Scheduled,
        is_auto_scheduled: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScheduleConfig;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()
    }

    fn member(id: &str, dept: &str) -> StaffMember {
        let mut s = StaffMember::new(id, format!("{id}@example.org")).with_department(dept);
        s.id = StaffId::new(id);
        s
    }

    fn run(
        config: &ScheduleConfig,
        slot: &PlanSlot,
        shift: Shift,
        available: &[StaffMember],
        used: &mut UsedStaff,
    ) -> Result<ScheduleAssignment, SkipReason> {
        let spec = config.spec_for(&slot.location);
        let req = LocationRequest {
            date: date(),
            shift,
            slot,
            spec: &spec,
            window: config.window_for(&spec, shift),
        };
        schedule_location(&req, available, used, &HashSet::new())
    }

    #[test]
    fn strict_location_is_skipped_without_qualified_staff() {
        let config = ScheduleConfig::default();
        let pool = vec![member("a", "Security")];
        let mut used = UsedStaff::new();
        let res = run(&config, &PlanSlot::single("Medical Room"), Shift::Day, &pool, &mut used);
        assert_eq!(res.unwrap_err(), SkipReason::NoEligibleStaff);
        assert!(used.is_empty());
    }

    #[test]
    fn non_strict_location_falls_back_to_any_staff() {
        let config = ScheduleConfig::default();
        let pool = vec![member("a", "Kitchen")];
        let mut used = UsedStaff::new();
        let a = run(&config, &PlanSlot::single("Admin Office"), Shift::Day, &pool, &mut used)
            .unwrap();
        assert_eq!(a.assigned, vec![StaffId::new("a")]);
        assert!(used.contains(&StaffId::new("a")));
    }

    #[test]
    fn exhausted_pool_reports_no_available_staff() {
        let config = ScheduleConfig::default();
        let pool = vec![member("a", "Security")];
        let mut used: UsedStaff = [StaffId::new("a")].into_iter().collect();
        let res = run(&config, &PlanSlot::single("Kitchen"), Shift::Day, &pool, &mut used);
        assert_eq!(res.unwrap_err(), SkipReason::NoAvailableStaff);
    }

    #[test]
    fn visitor_area_uses_visiting_window() {
        let config = ScheduleConfig::default();
        let pool = vec![member("a", "Security")];
        let mut used = UsedStaff::new();
        let a = run(&config, &PlanSlot::single("Visitor Area"), Shift::Night, &pool, &mut used)
            .unwrap();
        assert_eq!(a.duration_minutes(), 8 * 60);
        assert_eq!(a.shift, Shift::Night);
        assert!(a.is_auto_scheduled);
    }

    #[test]
    fn block_pair_builds_one_record_for_both_locations() {
        let config = ScheduleConfig::default();
        let pool = vec![
            member("a", "Security"),
            member("b", "Rehabilitation"),
            member("c", "Security"),
        ];
        let slot = PlanSlot::team("Block A - Cells", 2).covering("Block A - Dining Room");
        let mut used = UsedStaff::new();
        let a = run(&config, &slot, Shift::Day, &pool, &mut used).unwrap();
        assert_eq!(a.assigned.len(), 2);
        assert_eq!(a.also_covers, vec!["Block A - Dining Room".to_string()]);
        assert!(a.title.contains("Dining Room"));
        assert_eq!(used.len(), 2);
    }
}
