use crate::model::{LeaveInterval, LeaveStatus, Roster, ScheduleAssignment, StaffMember, UserRole};
use anyhow::{anyhow, bail, Context};
use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use std::fs;
use std::path::Path;

/// Import du personnel: header `name,email[,role][,department][,position][,is_active]`
pub fn import_staff_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<StaffMember>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let name = rec.get(0).context("missing name")?.trim();
        let email = rec.get(1).context("missing email")?.trim();
        if name.is_empty() || email.is_empty() {
            bail!("invalid staff row (empty)");
        }
        let mut member = StaffMember::new(name, email);
        if let Some(role) = non_empty(rec.get(2)) {
            member.role = role
                .parse::<UserRole>()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("invalid role for {email}"))?;
        }
        member.department = non_empty(rec.get(3)).map(str::to_string);
        member.position = non_empty(rec.get(4)).map(str::to_string);
        if let Some(flag) = non_empty(rec.get(5)) {
            member.is_active = parse_bool(flag)
                .with_context(|| format!("invalid is_active value for {email}"))?;
        }
        out.push(member);
    }
    Ok(out)
}

/// Import des congés: header `email,start,end[,status]` (dates `YYYY-MM-DD`, bornes incluses)
pub fn import_leave_csv<P: AsRef<Path>>(
    path: P,
    roster: &Roster,
) -> anyhow::Result<Vec<LeaveInterval>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let email = rec.get(0).context("missing email")?.trim();
        let staff = roster
            .find_staff_by_email(email)
            .ok_or_else(|| anyhow!("unknown staff email: {email}"))?;
        let start = parse_date(rec.get(1).context("missing start")?)?;
        let end = parse_date(rec.get(2).context("missing end")?)?;
        let status = match non_empty(rec.get(3)) {
            Some(raw) => raw.parse::<LeaveStatus>().map_err(anyhow::Error::msg)?,
            None => LeaveStatus::Approved,
        };
        let leave = LeaveInterval::new(staff.id.clone(), start, end, status)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("invalid leave for {email}"))?;
        out.push(leave);
    }
    Ok(out)
}

fn non_empty(field: Option<&str>) -> Option<&str> {
    field.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_bool(s: &str) -> anyhow::Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "oui" => Ok(true),
        "false" | "0" | "no" | "n" | "non" => Ok(false),
        _ => bail!("expected boolean"),
    }
}

pub fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date (expected YYYY-MM-DD): {raw}"))
}

/// Export JSON du roster (jolie mise en forme)
pub fn export_roster_json<P: AsRef<Path>>(path: P, roster: &Roster) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(roster)?;
    fs::write(path, s)?;
    Ok(())
}

/// Export CSV: header `id,date,shift,location,start,end,staff_emails,status,auto`
pub fn export_assignments_csv<P: AsRef<Path>>(
    path: P,
    roster: &Roster,
    assignments: &[ScheduleAssignment],
) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record([
        "id",
        "date",
        "shift",
        "location",
        "start",
        "end",
        "staff_emails",
        "status",
        "auto",
    ])?;
    for a in assignments {
        let date = a.date.to_string();
        let start = a.start.to_rfc3339();
        let end = a.end.to_rfc3339();
        let emails = staff_emails(roster, a).join(";");
        w.write_record([
            a.id.as_str(),
            date.as_str(),
            a.shift.as_str(),
            a.location.as_str(),
            start.as_str(),
            end.as_str(),
            emails.as_str(),
            a.status.as_str(),
            if a.is_auto_scheduled { "true" } else { "false" },
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Emails des agents affectés ; l'id brut si l'agent n'est plus dans le roster.
pub fn staff_emails<'a>(roster: &'a Roster, assignment: &'a ScheduleAssignment) -> Vec<&'a str> {
    assignment
        .assigned
        .iter()
        .map(|id| {
            roster
                .find_staff_by_id(id)
                .map_or(id.as_str(), |s| s.email.as_str())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn staff_csv_with_optional_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("staff.csv");
        fs::write(
            &path,
            "name,email,role,department,position,is_active\n\
             Ana,ana@example.org,staff,Medical,Nurse,yes\n\
             Ben,ben@example.org,admin,,,\n\
             Chloé,chloe@example.org\n",
        )
        .unwrap();

        let staff = import_staff_csv(&path).unwrap();
        assert_eq!(staff.len(), 3);
        assert_eq!(staff[0].department.as_deref(), Some("Medical"));
        assert_eq!(staff[1].role, UserRole::Admin);
        assert!(staff[1].department.is_none());
        assert_eq!(staff[2].role, UserRole::Staff);
        assert!(staff[2].is_active);
    }

    #[test]
    fn leave_csv_resolves_emails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("leave.csv");
        fs::write(
            &path,
            "email,start,end,status\nana@example.org,2025-02-01,2025-02-03,\n",
        )
        .unwrap();
        let mut roster = Roster::default();
        roster.staff.push(StaffMember::new("Ana", "ana@example.org"));

        let leave = import_leave_csv(&path, &roster).unwrap();
        assert_eq!(leave.len(), 1);
        assert_eq!(leave[0].staff, roster.staff[0].id);
        assert_eq!(leave[0].status, LeaveStatus::Approved);

        fs::write(&path, "email,start,end\nnobody@example.org,2025-02-01,2025-02-03\n").unwrap();
        assert!(import_leave_csv(&path, &roster).is_err());
    }
}
