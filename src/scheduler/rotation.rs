use super::UsedStaff;
use crate::model::{StaffId, StaffMember};
use chrono::NaiveDate;
use std::collections::HashSet;

/// Graine de rotation : hachage 32 bits (`h = 31 * h + c`) de `"YYYY-MM-DD|poste"`.
pub fn rotation_seed(date: NaiveDate, location: &str) -> u32 {
    let key = format!("{}|{}", date.format("%Y-%m-%d"), location);
    // unités UTF-16, comme `String.hashCode`
    key.encode_utf16()
        .fold(0i32, |h, u| {
            h.wrapping_shl(5).wrapping_sub(h).wrapping_add(i32::from(u))
        })
        .unsigned_abs()
}

/// Sélectionne jusqu'à `required` agents distincts.
///
/// Fonction pure de (date, poste, pool) : rejouer sur un pool inchangé
/// redonne la même équipe.
pub fn select(
    pool: &[StaffMember],
    required: usize,
    date: NaiveDate,
    location: &str,
    used: &UsedStaff,
    previous_day: &HashSet<StaffId>,
) -> Vec<StaffMember> {
    let mut seen = HashSet::new();
    let fresh: Vec<&StaffMember> = pool
        .iter()
        .filter(|s| !used.contains(&s.id))
        .filter(|s| seen.insert(s.id.clone()))
        .collect();

    // équité : on écarte l'équipe de la veille, sauf si cela vide le pool
    let rested: Vec<&StaffMember> = fresh
        .iter()
        .copied()
        .filter(|s| !previous_day.contains(&s.id))
        .collect();
    let candidates = if rested.is_empty() { &fresh } else { &rested };

    let len = candidates.len();
    if len == 0 {
        return Vec::new();
    }
    let start = rotation_seed(date, location) as usize % len;
    (0..required.min(len))
        .map(|offset| candidates[(start + offset) % len].clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(n: usize) -> Vec<StaffMember> {
        (0..n)
            .map(|i| {
                let mut s = StaffMember::new(format!("s{i}"), format!("s{i}@example.org"));
                s.id = StaffId::new(format!("s{i}"));
                s
            })
            .collect()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, day).unwrap()
    }

    #[test]
    fn seed_is_stable_and_date_dependent() {
        assert_eq!(rotation_seed(date(1), "Kitchen"), rotation_seed(date(1), "Kitchen"));
        assert_ne!(rotation_seed(date(1), "Kitchen"), rotation_seed(date(2), "Kitchen"));
        assert_ne!(rotation_seed(date(1), "Kitchen"), rotation_seed(date(1), "Workshop"));
    }

    #[test]
    fn seed_matches_java_string_hash() {
        let reference = "2025-05-01|Kitchen"
            .chars()
            .fold(0i32, |h, c| h.wrapping_mul(31).wrapping_add(c as i32))
            .unsigned_abs();
        assert_eq!(rotation_seed(date(1), "Kitchen"), reference);
    }

    #[test]
    fn seed_hashes_utf16_code_units() {
        // 🔒 hors BMP : deux unités UTF-16
        assert_eq!(rotation_seed(date(1), "Block 🔒"), 1_242_473_689);
    }

    #[test]
    fn selection_walks_from_rotated_start() {
        let staff = pool(5);
        let start = rotation_seed(date(3), "Main Gate") as usize % 5;
        let out = select(&staff, 2, date(3), "Main Gate", &UsedStaff::new(), &HashSet::new());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, staff[start].id);
        assert_eq!(out[1].id, staff[(start + 1) % 5].id);
    }

    #[test]
    fn used_staff_are_never_reselected() {
        let staff = pool(3);
        let used: UsedStaff = staff[..2].iter().map(|s| s.id.clone()).collect();
        let out = select(&staff, 2, date(4), "Kitchen", &used, &HashSet::new());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, staff[2].id);

        let all: UsedStaff = staff.iter().map(|s| s.id.clone()).collect();
        assert!(select(&staff, 1, date(4), "Kitchen", &all, &HashSet::new()).is_empty());
    }

    #[test]
    fn previous_day_team_is_skipped_when_possible() {
        let staff = pool(3);
        let yesterday: HashSet<StaffId> = staff[..2].iter().map(|s| s.id.clone()).collect();
        let out = select(&staff, 1, date(5), "Isolation", &UsedStaff::new(), &yesterday);
        assert_eq!(out[0].id, staff[2].id);

        let everyone: HashSet<StaffId> = staff.iter().map(|s| s.id.clone()).collect();
        let out = select(&staff, 1, date(5), "Isolation", &UsedStaff::new(), &everyone);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn empty_pool_selects_nobody() {
        assert!(select(&[], 2, date(6), "Kitchen", &UsedStaff::new(), &HashSet::new()).is_empty());
    }

    #[test]
    fn duplicated_pool_entries_count_once() {
        let mut staff = pool(1);
        staff.push(staff[0].clone());
        let out = select(&staff, 2, date(7), "Kitchen", &UsedStaff::new(), &HashSet::new());
        assert_eq!(out.len(), 1);
    }
}
