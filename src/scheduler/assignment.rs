use super::conflicts::{self, ExclusionContext};
use super::location::{self, LocationRequest};
use super::{util, Allocator, GenerationReport, SchedError, Skip, SkipReason, UsedStaff};
use crate::model::{ScheduleAssignment, Shift, StaffId, StaffMember};
use crate::storage::{AssignmentStore, RosterProvider};
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{info, warn};

/// Brouillons d'une garde, assemblés en mémoire avant toute écriture.
pub(super) struct Draft {
    pub assignments: Vec<ScheduleAssignment>,
    pub skipped: Vec<Skip>,
}

/// Suppression des anciennes affectations automatiques, puis écriture
/// au mieux : un échec d'écriture n'interrompt pas le lot.
pub(super) fn generate<B>(
    allocator: &mut Allocator<B>,
    date: NaiveDate,
    shift: Shift,
) -> Result<GenerationReport, SchedError>
where
    B: RosterProvider + AssignmentStore,
{
    let replaced = allocator
        .backend
        .delete_assignments(date, shift, true)
        .map_err(SchedError::Store)?;

    let Draft {
        assignments,
        mut skipped,
    } = plan_shift(&*allocator, date, shift)?;

    let mut created = Vec::with_capacity(assignments.len());
    for draft in assignments {
        match allocator.backend.save_assignment(&draft) {
            Ok(()) => created.push(draft),
            Err(err) => {
                warn!(location = %draft.location, %date, %shift, "assignment not saved: {err:#}");
                skipped.push(Skip {
                    location: draft.location.clone(),
                    reason: SkipReason::PersistenceFailure(format!("{err:#}")),
                });
            }
        }
    }

    info!(
        %date,
        %shift,
        created = created.len(),
        skipped = skipped.len(),
        replaced,
        "auto schedule generated"
    );

    Ok(GenerationReport {
        date,
        shift,
        replaced,
        created,
        skipped,
    })
}

/// Parcourt le plan de la garde dans l'ordre ; n'écrit rien.
pub(super) fn plan_shift<B>(
    allocator: &Allocator<B>,
    date: NaiveDate,
    shift: Shift,
) -> Result<Draft, SchedError>
where
    B: RosterProvider + AssignmentStore,
{
    let config = &allocator.config;
    let backend = &allocator.backend;

    let staff: Vec<StaffMember> = backend
        .list_active_staff()
        .map_err(SchedError::Roster)?
        .into_iter()
        .filter(StaffMember::is_schedulable)
        .collect();
    let leave = backend
        .list_approved_leave(date, date)
        .map_err(SchedError::Roster)?;

    // les affectations auto de cette garde vont être remplacées
    let mut existing = backend
        .find_assignments(date, None, None)
        .map_err(SchedError::Store)?;
    existing.retain(|a| !(a.shift == shift && a.is_auto_scheduled));

    let shift_window = config.shift_window(shift).resolve(date);
    let cap = config.max_assignments_per_shift;
    let mut used = UsedStaff::new();
    let mut draft = Draft {
        assignments: Vec::new(),
        skipped: Vec::new(),
    };

    for slot in config.plan(shift) {
        if draft.assignments.len() >= cap {
            info!(location = %slot.location, %date, %shift, cap, "capacity reached, skipping");
            draft.skipped.push(Skip {
                location: slot.location.clone(),
                reason: SkipReason::CapacityReached,
            });
            continue;
        }

        let spec = config.spec_for(&slot.location);
        let ctx = ExclusionContext {
            date,
            shift,
            location: &slot.location,
            window: shift_window,
            assignments: &existing,
            leave: &leave,
        };
        let available = conflicts::exclude(&staff, &ctx);
        let previous = previous_day_staff(allocator, date, &slot.location)?;

        let req = LocationRequest {
            date,
            shift,
            slot,
            spec: &spec,
            window: config.window_for(&spec, shift),
        };
        match location::schedule_location(&req, &available, &mut used, &previous) {
            Ok(assignment) => draft.assignments.push(assignment),
            Err(reason) => {
                warn!(location = %slot.location, %date, %shift, %reason, "location left unstaffed");
                draft.skipped.push(Skip {
                    location: slot.location.clone(),
                    reason,
                });
            }
        }
    }

    Ok(draft)
}

/// Agents ayant tenu ce poste la veille, toutes gardes confondues.
fn previous_day_staff<B>(
    allocator: &Allocator<B>,
    date: NaiveDate,
    location: &str,
) -> Result<HashSet<StaffId>, SchedError>
where
    B: RosterProvider + AssignmentStore,
{
    let Some(previous) = util::previous_day(date) else {
        return Ok(HashSet::new());
    };
    let assignments = allocator
        .backend
        .find_assignments(previous, None, Some(location))
        .map_err(SchedError::Store)?;
    Ok(util::staff_of(&assignments))
}
