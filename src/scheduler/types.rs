use crate::model::{AssignmentId, ScheduleAssignment, Shift, StaffId};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Agents déjà placés pendant la passe courante.
pub type UsedStaff = HashSet<StaffId>;

/// Raison pour laquelle un poste n'a pas été pourvu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Poste strict sans agent qualifié.
    NoEligibleStaff,
    /// Aucun agent disponible, même après repli.
    NoAvailableStaff,
    /// Plafond d'affectations de la garde atteint.
    CapacityReached,
    /// L'écriture de l'affectation a échoué.
    PersistenceFailure(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEligibleStaff => f.write_str("no eligible staff"),
            Self::NoAvailableStaff => f.write_str("no available staff"),
            Self::CapacityReached => f.write_str("capacity reached"),
            Self::PersistenceFailure(msg) => write!(f, "persistence failure: {msg}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skip {
    pub location: String,
    pub reason: SkipReason,
}

/// Résultat d'une génération (date + garde).
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub date: NaiveDate,
    pub shift: Shift,
    /// Affectations automatiques supprimées avant régénération.
    pub replaced: usize,
    pub created: Vec<ScheduleAssignment>,
    pub skipped: Vec<Skip>,
}

impl GenerationReport {
    pub fn skipped_for(&self, location: &str) -> Option<&SkipReason> {
        self.skipped
            .iter()
            .find(|s| s.location == location)
            .map(|s| &s.reason)
    }

    pub fn assignment_for(&self, location: &str) -> Option<&ScheduleAssignment> {
        self.created.iter().find(|a| a.location == location)
    }
}

/// Résultat de la réconciliation jour/nuit d'une date.
#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    /// Affectations de nuit amputées mais encore pourvues.
    pub trimmed: Vec<AssignmentId>,
    /// Affectations vidées puis complétées par un remplaçant.
    pub replaced: Vec<(AssignmentId, StaffId)>,
    /// Affectations vidées sans remplaçant (`NeedsAttention`).
    pub dead_ends: Vec<AssignmentId>,
    /// Conflits portés par des affectations manuelles, non modifiées.
    pub manual_conflicts: Vec<CrossShiftConflict>,
    pub failed: Vec<(AssignmentId, String)>,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.trimmed.is_empty() && self.replaced.is_empty() && self.dead_ends.is_empty()
    }
}

/// Agent présent à la fois le jour et la nuit d'une même date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossShiftConflict {
    pub staff: StaffId,
    pub day: Vec<AssignmentId>,
    pub night: Vec<AssignmentId>,
}

/// Enchaînement jour, nuit, réconciliation pour une date.
#[derive(Debug, Clone)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub day: GenerationReport,
    pub night: GenerationReport,
    pub reconcile: ReconcileReport,
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("invalid date range: end must not be before start")]
    InvalidDateRange,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("roster provider failure: {0:#}")]
    Roster(anyhow::Error),
    #[error("assignment store failure: {0:#}")]
    Store(anyhow::Error),
}
