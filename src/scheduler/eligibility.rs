use crate::config::{EligibilityRule, LocationSpec};
use crate::model::StaffMember;

/// Agents autorisés à tenir le poste, dans l'ordre du pool.
///
/// Ne décide pas du repli : un résultat vide est rendu tel quel et
/// l'appelant choisit entre abandon (poste strict) et repli.
pub fn filter(pool: &[StaffMember], spec: &LocationSpec) -> Vec<StaffMember> {
    pool.iter()
        .filter(|s| is_eligible(s, &spec.rule))
        .cloned()
        .collect()
}

pub fn is_eligible(staff: &StaffMember, rule: &EligibilityRule) -> bool {
    match rule {
        EligibilityRule::Unrestricted => true,
        EligibilityRule::Match {
            departments,
            position_keywords,
        } => {
            let dept_ok = staff
                .department
                .as_deref()
                .is_some_and(|d| departments.iter().any(|want| want == d));
            dept_ok || position_matches(staff.position.as_deref(), position_keywords)
        }
    }
}

fn position_matches(position: Option<&str>, keywords: &[String]) -> bool {
    let Some(position) = position else {
        return false;
    };
    let position = position.to_lowercase();
    keywords
        .iter()
        .any(|k| position.contains(&k.to_lowercase()))
}
