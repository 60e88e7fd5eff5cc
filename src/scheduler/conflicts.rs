use super::{util, CrossShiftConflict};
use crate::model::{LeaveInterval, ScheduleAssignment, Shift, StaffId, StaffMember};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, HashSet};

/// Vue figée de ce qui est déjà planifié autour d'un poste.
#[derive(Debug, Clone, Copy)]
pub struct ExclusionContext<'a> {
    pub date: NaiveDate,
    pub shift: Shift,
    pub location: &'a str,
    /// Plage de la garde, ancrée sur `date`.
    pub window: (DateTime<Utc>, DateTime<Utc>),
    /// Affectations existantes de `date`, toutes gardes confondues.
    pub assignments: &'a [ScheduleAssignment],
    pub leave: &'a [LeaveInterval],
}

/// Retire du pool les agents déjà occupés ou absents.
pub fn exclude(pool: &[StaffMember], ctx: &ExclusionContext<'_>) -> Vec<StaffMember> {
    let busy = busy_staff(ctx);
    util::without(pool, &busy)
}

/// Union des exclusions ; l'ordre d'évaluation est indifférent.
pub fn busy_staff(ctx: &ExclusionContext<'_>) -> HashSet<StaffId> {
    let mut busy = HashSet::new();
    let (win_start, win_end) = ctx.window;

    for a in ctx.assignments.iter().filter(|a| a.date == ctx.date) {
        let same_shift_overlap =
            a.shift == ctx.shift && util::overlaps(a.start, a.end, win_start, win_end);
        let opposite_shift = a.shift == ctx.shift.opposite();
        let repeat_location = ctx.shift == Shift::Night
            && a.shift == Shift::Day
            && util::covers_location(a, ctx.location);

        if same_shift_overlap || opposite_shift || repeat_location {
            busy.extend(a.assigned.iter().cloned());
        }
    }

    busy.extend(
        ctx.leave
            .iter()
            .filter(|l| l.covers(ctx.date))
            .map(|l| l.staff.clone()),
    );
    busy
}

/// Agents affectés à la fois le jour et la nuit.
pub fn detect_cross_shift(assignments: &[ScheduleAssignment]) -> Vec<CrossShiftConflict> {
    let mut by_staff: BTreeMap<&StaffId, (Vec<_>, Vec<_>)> = BTreeMap::new();
    for a in assignments {
        for staff in &a.assigned {
            let entry = by_staff.entry(staff).or_default();
            match a.shift {
                Shift::Day => entry.0.push(a.id.clone()),
                Shift::Night => entry.1.push(a.id.clone()),
            }
        }
    }

    by_staff
        .into_iter()
        .filter(|(_, (day, night))| !day.is_empty() && !night.is_empty())
        .map(|(staff, (day, night))| CrossShiftConflict {
            staff: staff.clone(),
            day,
            night,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LeaveStatus, TimeWindow};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 14).unwrap()
    }

    fn staff(id: &str) -> StaffMember {
        let mut s = StaffMember::new(id, format!("{id}@example.org"));
        s.id = StaffId::new(id);
        s
    }

    fn assignment(location: &str, shift: Shift, window: TimeWindow, ids: &[&str]) -> ScheduleAssignment {
        let (start, end) = window.resolve(date());
        ScheduleAssignment::manual(
            location,
            shift,
            date(),
            start,
            end,
            ids.iter().map(|i| StaffId::new(*i)).collect(),
        )
        .unwrap()
    }

    fn ids(pool: &[StaffMember]) -> Vec<&str> {
        pool.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn removes_overlap_opposite_shift_and_leave() {
        let pool: Vec<_> = ["a", "b", "c", "d", "e"].into_iter().map(staff).collect();
        let assignments = vec![
            assignment("Kitchen", Shift::Day, TimeWindow::visiting(), &["a"]),
            assignment("Main Gate", Shift::Night, TimeWindow::night(), &["b"]),
        ];
        let leave = vec![
            LeaveInterval::new(StaffId::new("c"), date(), date(), LeaveStatus::Approved).unwrap(),
            LeaveInterval::new(StaffId::new("d"), date(), date(), LeaveStatus::Rejected).unwrap(),
        ];
        let ctx = ExclusionContext {
            date: date(),
            shift: Shift::Day,
            location: "Workshop",
            window: TimeWindow::day().resolve(date()),
            assignments: &assignments,
            leave: &leave,
        };
        assert_eq!(ids(&exclude(&pool, &ctx)), vec!["d", "e"]);
    }

    #[test]
    fn night_excludes_same_location_from_day() {
        let pool: Vec<_> = ["a", "b"].into_iter().map(staff).collect();
        let mut day = assignment("Block A - Cells", Shift::Day, TimeWindow::day(), &["a"]);
        day.also_covers.push("Block A - Dining Room".into());
        let assignments = vec![day];
        let ctx = ExclusionContext {
            date: date(),
            shift: Shift::Night,
            location: "Block A - Dining Room",
            window: TimeWindow::night().resolve(date()),
            assignments: &assignments,
            leave: &[],
        };
        let busy = busy_staff(&ctx);
        assert!(busy.contains(&StaffId::new("a")));
        assert_eq!(ids(&exclude(&pool, &ctx)), vec!["b"]);
    }

    #[test]
    fn detects_staff_in_both_shifts() {
        let assignments = vec![
            assignment("Kitchen", Shift::Day, TimeWindow::day(), &["a", "b"]),
            assignment("Main Gate", Shift::Night, TimeWindow::night(), &["b", "c"]),
        ];
        let conflicts = detect_cross_shift(&assignments);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].staff, StaffId::new("b"));
        assert_eq!(conflicts[0].night, vec![assignments[1].id.clone()]);
    }
}
