use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifiant fort pour un membre du personnel
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StaffId(String);

impl StaffId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Staff,
    Police,
    Visitor,
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "staff" => Ok(Self::Staff),
            "police" => Ok(Self::Police),
            "visitor" => Ok(Self::Visitor),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Membre du personnel, tel que fourni par l'annuaire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: StaffId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl StaffMember {
    pub fn new<N: Into<String>, E: Into<String>>(name: N, email: E) -> Self {
        Self {
            id: StaffId::random(),
            name: name.into(),
            email: email.into(),
            role: UserRole::Staff,
            department: None,
            position: None,
            is_active: true,
        }
    }

    pub fn with_department<S: Into<String>>(mut self, department: S) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn with_position<S: Into<String>>(mut self, position: S) -> Self {
        self.position = Some(position.into());
        self
    }

    /// Seuls les comptes `staff` actifs entrent dans la rotation.
    pub fn is_schedulable(&self) -> bool {
        self.role == UserRole::Staff && self.is_active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl FromStr for LeaveStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown leave status: {other}")),
        }
    }
}

/// Congé d'un membre du personnel, bornes incluses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveInterval {
    pub staff: StaffId,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub status: LeaveStatus,
}

impl LeaveInterval {
    pub fn new(
        staff: StaffId,
        start: NaiveDate,
        end: NaiveDate,
        status: LeaveStatus,
    ) -> Result<Self, String> {
        if end < start {
            return Err("leave end must not be before start".to_string());
        }
        Ok(Self {
            staff,
            start,
            end,
            status,
        })
    }

    pub fn is_approved(&self) -> bool {
        self.status == LeaveStatus::Approved
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.is_approved() && self.start <= date && date <= self.end
    }

    pub fn intersects(&self, from: NaiveDate, to: NaiveDate) -> bool {
        self.start <= to && from <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shift {
    Day,
    Night,
}

impl Shift {
    pub fn opposite(self) -> Self {
        match self {
            Self::Day => Self::Night,
            Self::Night => Self::Day,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Night => "night",
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Shift {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "night" => Ok(Self::Night),
            other => Err(format!("unknown shift: {other} (expected day|night)")),
        }
    }
}

/// Plage horaire locale ; `end <= start` signifie que la plage se termine le lendemain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, String> {
        if start == end {
            return Err("window start and end cannot be equal".to_string());
        }
        Ok(Self { start, end })
    }

    pub fn day() -> Self {
        Self::from_hours(9, 21)
    }

    pub fn night() -> Self {
        Self::from_hours(21, 9)
    }

    /// Plage du parloir, indépendante de la garde.
    pub fn visiting() -> Self {
        Self::from_hours(9, 17)
    }

    fn from_hours(start: u32, end: u32) -> Self {
        Self {
            start: NaiveTime::from_hms_opt(start, 0, 0).unwrap_or_default(),
            end: NaiveTime::from_hms_opt(end, 0, 0).unwrap_or_default(),
        }
    }

    pub fn crosses_midnight(&self) -> bool {
        self.end <= self.start
    }

    /// Ancre la plage sur une date (UTC).
    pub fn resolve(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = Utc.from_utc_datetime(&NaiveDateTime::new(date, self.start));
        let end_date = if self.crosses_midnight() {
            date.succ_opt().unwrap_or(date)
        } else {
            date
        };
        let end = Utc.from_utc_datetime(&NaiveDateTime::new(end_date, self.end));
        (start, end)
    }
}

/// Identifiant fort pour une affectation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignmentId(String);

impl AssignmentId {
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentKind {
    Security,
    Medical,
    Control,
    Administrative,
    Visitation,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentStatus {
    /// Persistée par la génération.
    Scheduled,
    /// Modifiée par la réconciliation jour/nuit.
    Reconciled,
    /// Vidée par la réconciliation sans remplaçant ; à traiter à la main.
    NeedsAttention,
}

impl AssignmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Reconciled => "reconciled",
            Self::NeedsAttention => "needs_attention",
        }
    }
}

/// Affectation d'un poste pour une date et une garde.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleAssignment {
    pub id: AssignmentId,
    pub location: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub also_covers: Vec<String>,
    pub shift: Shift,
    pub date: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub assigned: Vec<StaffId>,
    pub title: String,
    pub kind: AssignmentKind,
    pub priority: Priority,
    pub status: AssignmentStatus,
    #[serde(default)]
    pub is_auto_scheduled: bool,
}

impl ScheduleAssignment {
    /// Affectation manuelle (hors allocateur), en validant `end > start`.
    pub fn manual(
        location: &str,
        shift: Shift,
        date: NaiveDate,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        assigned: Vec<StaffId>,
    ) -> Result<Self, String> {
        if end <= start {
            return Err("end must be strictly after start".to_string());
        }
        Ok(Self {
            id: AssignmentId::random(),
            location: location.to_string(),
            also_covers: Vec::new(),
            shift,
            date,
            start,
            end,
            assigned,
            title: format!("{location} ({shift})"),
            kind: AssignmentKind::General,
            priority: Priority::Medium,
            status: AssignmentStatus::Scheduled,
            is_auto_scheduled: false,
        })
    }

    pub fn has_staff(&self, id: &StaffId) -> bool {
        self.assigned.contains(id)
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// État complet : personnel, congés, affectations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Roster {
    pub staff: Vec<StaffMember>,
    #[serde(default)]
    pub leaves: Vec<LeaveInterval>,
    #[serde(default)]
    pub assignments: Vec<ScheduleAssignment>,
}

impl Roster {
    pub fn find_staff_by_email<'a>(&'a self, email: &str) -> Option<&'a StaffMember> {
        self.staff
            .iter()
            .find(|s| s.email.eq_ignore_ascii_case(email))
    }
    pub fn find_staff_by_id<'a>(&'a self, id: &StaffId) -> Option<&'a StaffMember> {
        self.staff.iter().find(|s| &s.id == id)
    }
    pub fn find_assignment_mut(&mut self, id: &AssignmentId) -> Option<&mut ScheduleAssignment> {
        self.assignments.iter_mut().find(|a| &a.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn night_window_ends_next_morning() {
        let (start, end) = TimeWindow::night().resolve(d(2025, 3, 10));
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 3, 10, 21, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 3, 11, 9, 0, 0).unwrap());
    }

    #[test]
    fn only_approved_leave_covers() {
        let staff = StaffId::new("s1");
        let approved =
            LeaveInterval::new(staff.clone(), d(2025, 3, 1), d(2025, 3, 5), LeaveStatus::Approved)
                .unwrap();
        let pending =
            LeaveInterval::new(staff, d(2025, 3, 1), d(2025, 3, 5), LeaveStatus::Pending).unwrap();
        assert!(approved.covers(d(2025, 3, 5)));
        assert!(!approved.covers(d(2025, 3, 6)));
        assert!(!pending.covers(d(2025, 3, 3)));
    }

    #[test]
    fn inverted_leave_is_rejected() {
        let res = LeaveInterval::new(
            StaffId::new("s1"),
            d(2025, 3, 5),
            d(2025, 3, 1),
            LeaveStatus::Approved,
        );
        assert!(res.is_err());
    }

    #[test]
    fn shift_parsing() {
        assert_eq!("Night".parse::<Shift>().unwrap(), Shift::Night);
        assert_eq!(Shift::Day.opposite(), Shift::Night);
        assert!("evening".parse::<Shift>().is_err());
    }
}
