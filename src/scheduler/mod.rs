mod assignment;
pub mod conflicts;
pub mod eligibility;
pub mod location;
mod reconcile;
pub mod rotation;
mod types;
mod util;

pub use types::{
    CrossShiftConflict, DailyReport, GenerationReport, ReconcileReport, SchedError, Skip,
    SkipReason, UsedStaff,
};

use crate::config::ScheduleConfig;
use crate::model::{ScheduleAssignment, Shift};
use crate::storage::{AssignmentStore, RosterProvider};
use chrono::NaiveDate;

/// Allocateur : encapsule la configuration et le support (annuaire + affectations).
///
/// Les exécutions sont séquentielles ; deux générations concurrentes sur la
/// même date et la même garde doivent être sérialisées par l'appelant.
#[derive(Debug)]
pub struct Allocator<B> {
    config: ScheduleConfig,
    backend: B,
}

impl<B> Allocator<B>
where
    B: RosterProvider + AssignmentStore,
{
    pub fn new(config: ScheduleConfig, backend: B) -> Result<Self, SchedError> {
        config
            .validate()
            .map_err(|e| SchedError::InvalidConfig(format!("{e:#}")))?;
        Ok(Self { config, backend })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Régénère les affectations automatiques d'une date et d'une garde.
    pub fn generate(
        &mut self,
        date: NaiveDate,
        shift: Shift,
    ) -> Result<GenerationReport, SchedError> {
        assignment::generate(self, date, shift)
    }

    /// Même sélection que `generate`, sans rien supprimer ni écrire.
    pub fn preview(
        &self,
        date: NaiveDate,
        shift: Shift,
    ) -> Result<Vec<ScheduleAssignment>, SchedError> {
        assignment::plan_shift(self, date, shift).map(|draft| draft.assignments)
    }

    /// À lancer une fois les deux gardes de la date écrites.
    pub fn reconcile(&mut self, date: NaiveDate) -> Result<ReconcileReport, SchedError> {
        reconcile::reconcile(self, date)
    }

    /// Jour, nuit puis réconciliation, dans cet ordre.
    pub fn generate_date(&mut self, date: NaiveDate) -> Result<DailyReport, SchedError> {
        let day = self.generate(date, Shift::Day)?;
        let night = self.generate(date, Shift::Night)?;
        let reconcile = self.reconcile(date)?;
        Ok(DailyReport {
            date,
            day,
            night,
            reconcile,
        })
    }

    pub fn generate_range(
        &mut self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyReport>, SchedError> {
        if to < from {
            return Err(SchedError::InvalidDateRange);
        }
        from.iter_days()
            .take_while(|d| *d <= to)
            .map(|d| self.generate_date(d))
            .collect()
    }

    /// Détection seule, sans modification.
    pub fn check(&self, date: NaiveDate) -> Result<Vec<CrossShiftConflict>, SchedError> {
        let assignments = self
            .backend
            .find_assignments(date, None, None)
            .map_err(SchedError::Store)?;
        Ok(conflicts::detect_cross_shift(&assignments))
    }
}
