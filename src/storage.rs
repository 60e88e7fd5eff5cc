use crate::model::{
    AssignmentStatus, LeaveInterval, Roster, ScheduleAssignment, Shift, StaffMember,
};
use anyhow::{bail, Context};
use chrono::NaiveDate;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Annuaire du personnel et des congés.
pub trait RosterProvider {
    /// Agents actifs, dans un ordre stable.
    fn list_active_staff(&self) -> anyhow::Result<Vec<StaffMember>>;
    /// Congés approuvés qui touchent `[from, to]`.
    fn list_approved_leave(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<Vec<LeaveInterval>>;
}

/// Magasin des affectations.
pub trait AssignmentStore {
    fn find_assignments(
        &self,
        date: NaiveDate,
        shift: Option<Shift>,
        location: Option<&str>,
    ) -> anyhow::Result<Vec<ScheduleAssignment>>;
    /// Supprime les affectations d'une date et d'une garde ; renvoie le nombre supprimé.
    fn delete_assignments(
        &mut self,
        date: NaiveDate,
        shift: Shift,
        auto_only: bool,
    ) -> anyhow::Result<usize>;
    /// Insère ou remplace (par id).
    fn save_assignment(&mut self, assignment: &ScheduleAssignment) -> anyhow::Result<()>;
}

impl RosterProvider for Roster {
    fn list_active_staff(&self) -> anyhow::Result<Vec<StaffMember>> {
        Ok(self.staff.iter().filter(|s| s.is_active).cloned().collect())
    }

    fn list_approved_leave(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<Vec<LeaveInterval>> {
        Ok(self
            .leaves
            .iter()
            .filter(|l| l.is_approved() && l.intersects(from, to))
            .cloned()
            .collect())
    }
}

impl AssignmentStore for Roster {
    fn find_assignments(
        &self,
        date: NaiveDate,
        shift: Option<Shift>,
        location: Option<&str>,
    ) -> anyhow::Result<Vec<ScheduleAssignment>> {
        Ok(self
            .assignments
            .iter()
            .filter(|a| a.date == date)
            .filter(|a| shift.map_or(true, |s| a.shift == s))
            .filter(|a| location.map_or(true, |l| a.location == l))
            .cloned()
            .collect())
    }

    fn delete_assignments(
        &mut self,
        date: NaiveDate,
        shift: Shift,
        auto_only: bool,
    ) -> anyhow::Result<usize> {
        let before = self.assignments.len();
        self.assignments.retain(|a| {
            let targeted = a.date == date && a.shift == shift;
            !(targeted && (a.is_auto_scheduled || !auto_only))
        });
        Ok(before - self.assignments.len())
    }

    fn save_assignment(&mut self, assignment: &ScheduleAssignment) -> anyhow::Result<()> {
        validate_assignment(assignment)?;
        match self.find_assignment_mut(&assignment.id) {
            Some(existing) => *existing = assignment.clone(),
            None => self.assignments.push(assignment.clone()),
        }
        Ok(())
    }
}

/// Contrôles appliqués avant toute écriture.
pub fn validate_assignment(assignment: &ScheduleAssignment) -> anyhow::Result<()> {
    if assignment.end <= assignment.start {
        bail!(
            "assignment {} ends before it starts",
            assignment.id.as_str()
        );
    }
    if assignment.assigned.is_empty() && assignment.status != AssignmentStatus::NeedsAttention {
        bail!(
            "assignment {} for {} has no staff",
            assignment.id.as_str(),
            assignment.location
        );
    }
    Ok(())
}

pub trait Storage {
    /// Charge un roster depuis un support.
    fn load(&self) -> anyhow::Result<Roster>;
    /// Sauvegarde de manière atomique.
    fn save(&self, roster: &Roster) -> anyhow::Result<()>;
}

pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Self {
            path: path.as_ref().to_path_buf(),
        })
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl Storage for JsonStorage {
    fn load(&self) -> anyhow::Result<Roster> {
        let data =
            fs::read(&self.path).with_context(|| format!("reading {}", self.path.display()))?;
        let roster: Roster =
            serde_json::from_slice(&data).with_context(|| "parsing roster.json")?;
        Ok(roster)
    }

    fn save(&self, roster: &Roster) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(roster)?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).with_context(|| "creating temp file")?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).with_context(|| "atomic rename")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{StaffId, TimeWindow};
    use tempfile::tempdir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    fn manual(shift: Shift, auto: bool) -> ScheduleAssignment {
        let (start, end) = TimeWindow::day().resolve(date());
        let mut a = ScheduleAssignment::manual(
            "Kitchen",
            shift,
            date(),
            start,
            end,
            vec![StaffId::new("s1")],
        )
        .unwrap();
        a.is_auto_scheduled = auto;
        a
    }

    #[test]
    fn delete_auto_only_keeps_manual_records() {
        let mut roster = Roster::default();
        roster.save_assignment(&manual(Shift::Day, true)).unwrap();
        roster.save_assignment(&manual(Shift::Day, false)).unwrap();
        roster.save_assignment(&manual(Shift::Night, true)).unwrap();

        let removed = roster.delete_assignments(date(), Shift::Day, true).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(roster.assignments.len(), 2);
        assert!(roster
            .assignments
            .iter()
            .any(|a| a.shift == Shift::Day && !a.is_auto_scheduled));
    }

    #[test]
    fn empty_assignment_is_rejected_unless_flagged() {
        let mut roster = Roster::default();
        let mut a = manual(Shift::Day, true);
        a.assigned.clear();
        assert!(roster.save_assignment(&a).is_err());
        a.status = AssignmentStatus::NeedsAttention;
        roster.save_assignment(&a).unwrap();
    }

    #[test]
    fn save_replaces_by_id() {
        let mut roster = Roster::default();
        let mut a = manual(Shift::Day, true);
        roster.save_assignment(&a).unwrap();
        a.assigned = vec![StaffId::new("s2")];
        roster.save_assignment(&a).unwrap();
        assert_eq!(roster.assignments.len(), 1);
        assert_eq!(roster.assignments[0].assigned, vec![StaffId::new("s2")]);
    }

    #[test]
    fn json_storage_roundtrip() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::open(dir.path().join("roster.json")).unwrap();
        assert!(!storage.exists());
        let mut roster = Roster::default();
        roster.staff.push(StaffMember::new("Ana", "ana@example.org"));
        roster.save_assignment(&manual(Shift::Night, true)).unwrap();
        storage.save(&roster).unwrap();

        let loaded = storage.load().unwrap();
        assert_eq!(loaded.staff, roster.staff);
        assert_eq!(loaded.assignments, roster.assignments);
    }
}
