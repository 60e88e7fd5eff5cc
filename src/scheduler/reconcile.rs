use super::conflicts::{self, ExclusionContext};
use super::{eligibility, rotation, util, Allocator, ReconcileReport, SchedError, UsedStaff};
use crate::model::{AssignmentStatus, ScheduleAssignment, Shift, StaffId, StaffMember};
use crate::storage::{AssignmentStore, RosterProvider};
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{info, warn};

/// Garantit qu'aucun agent du jour ne reste affecté la nuit.
///
/// Seules les affectations de nuit automatiques sont modifiées. Rejouer
/// sans autre mutation ne change plus rien.
pub(super) fn reconcile<B>(
    allocator: &mut Allocator<B>,
    date: NaiveDate,
) -> Result<ReconcileReport, SchedError>
where
    B: RosterProvider + AssignmentStore,
{
    let day = allocator
        .backend
        .find_assignments(date, Some(Shift::Day), None)
        .map_err(SchedError::Store)?;
    let night = allocator
        .backend
        .find_assignments(date, Some(Shift::Night), None)
        .map_err(SchedError::Store)?;
    let day_staff = util::staff_of(&day);

    let mut report = ReconcileReport::default();

    let manual: Vec<ScheduleAssignment> = day
        .iter()
        .chain(night.iter().filter(|a| !a.is_auto_scheduled))
        .cloned()
        .collect();
    report.manual_conflicts = conflicts::detect_cross_shift(&manual);

    // première passe : on retire les agents du jour
    let mut touched = Vec::new();
    let mut cleaned = Vec::with_capacity(night.len());
    for mut a in night {
        if a.is_auto_scheduled {
            let before = a.assigned.len();
            a.assigned.retain(|id| !day_staff.contains(id));
            if a.assigned.len() != before {
                touched.push(a.id.clone());
            }
        }
        cleaned.push(a);
    }
    if touched.is_empty() {
        return Ok(report);
    }

    let mut taken: UsedStaff = util::staff_of(&cleaned);
    let staff: Vec<StaffMember> = allocator
        .backend
        .list_active_staff()
        .map_err(SchedError::Roster)?
        .into_iter()
        .filter(StaffMember::is_schedulable)
        .collect();
    let leave = allocator
        .backend
        .list_approved_leave(date, date)
        .map_err(SchedError::Roster)?;
    let view: Vec<ScheduleAssignment> = day.iter().chain(cleaned.iter()).cloned().collect();
    let window = allocator.config.shift_window(Shift::Night).resolve(date);

    for mut a in cleaned.into_iter().filter(|a| touched.contains(&a.id)) {
        if a.assigned.is_empty() {
            let ctx = ExclusionContext {
                date,
                shift: Shift::Night,
                location: &a.location,
                window,
                assignments: &view,
                leave: &leave,
            };
            match replacement(&*allocator, &staff, &ctx, &taken) {
                Some(id) => {
                    info!(location = %a.location, %date, staff = id.as_str(), "night slot refilled");
                    taken.insert(id.clone());
                    a.assigned.push(id.clone());
                    a.status = AssignmentStatus::Reconciled;
                    report.replaced.push((a.id.clone(), id));
                }
                None => {
                    warn!(location = %a.location, %date, "night slot needs attention: no replacement");
                    a.status = AssignmentStatus::NeedsAttention;
                    report.dead_ends.push(a.id.clone());
                }
            }
        } else {
            a.status = AssignmentStatus::Reconciled;
            report.trimmed.push(a.id.clone());
        }

        if let Err(err) = allocator.backend.save_assignment(&a) {
            warn!(location = %a.location, %date, "reconciled assignment not saved: {err:#}");
            report.failed.push((a.id.clone(), format!("{err:#}")));
        }
    }

    Ok(report)
}

/// Un remplaçant qualifié de préférence ; jamais hors règle pour un poste strict.
fn replacement<B>(
    allocator: &Allocator<B>,
    staff: &[StaffMember],
    ctx: &ExclusionContext<'_>,
    taken: &UsedStaff,
) -> Option<StaffId> {
    let spec = allocator.config.spec_for(ctx.location);
    let available = util::without(&conflicts::exclude(staff, ctx), taken);

    let mut pool = eligibility::filter(&available, &spec);
    if pool.is_empty() && !spec.strict {
        pool = available;
    }
    rotation::select(&pool, 1, ctx.date, ctx.location, taken, &HashSet::new())
        .into_iter()
        .next()
        .map(|s| s.id)
}
