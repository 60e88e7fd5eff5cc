#![forbid(unsafe_code)]
//! Roulement : allocation automatique du personnel pénitentiaire par garde.
//!
//! - Règles d'éligibilité par poste, décrites en configuration.
//! - Exclusion des conflits (chevauchements, garde opposée, congés).
//! - Rotation déterministe : graine hachée sur (date, poste).
//! - Réconciliation jour/nuit après génération des deux gardes.

pub mod config;
pub mod io;
pub mod model;
pub mod scheduler;
pub mod storage;

pub use config::{
    export_config_json, load_config_from_file, render_plan, EligibilityRule, LocationSpec,
    PlanSlot, ScheduleConfig,
};
pub use model::{
    AssignmentId, AssignmentStatus, LeaveInterval, LeaveStatus, Roster, ScheduleAssignment,
    Shift, StaffId, StaffMember, TimeWindow, UserRole,
};
pub use scheduler::{
    Allocator, CrossShiftConflict, DailyReport, GenerationReport, ReconcileReport, SchedError,
    SkipReason,
};
pub use storage::{AssignmentStore, JsonStorage, RosterProvider, Storage};
