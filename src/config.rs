use crate::model::{AssignmentKind, Priority, Shift, TimeWindow};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Règle d'éligibilité d'un poste.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EligibilityRule {
    /// Tout agent actif convient.
    Unrestricted,
    /// Service exact OU fonction contenant un mot-clé (insensible à la casse).
    Match {
        #[serde(default)]
        departments: Vec<String>,
        #[serde(default)]
        position_keywords: Vec<String>,
    },
}

impl EligibilityRule {
    pub fn departments<I, S>(departments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Match {
            departments: departments.into_iter().map(Into::into).collect(),
            position_keywords: Vec::new(),
        }
    }

    pub fn with_keywords<I, S>(self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let extra: Vec<String> = keywords.into_iter().map(Into::into).collect();
        match self {
            Self::Unrestricted => Self::Match {
                departments: Vec::new(),
                position_keywords: extra,
            },
            Self::Match {
                departments,
                mut position_keywords,
            } => {
                position_keywords.extend(extra);
                Self::Match {
                    departments,
                    position_keywords,
                }
            }
        }
    }
}

/// Description statique d'un poste.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSpec {
    pub name: String,
    /// `name` s'applique comme préfixe (ex. "Block A").
    #[serde(default)]
    pub prefix: bool,
    pub rule: EligibilityRule,
    /// Pas de repli sur le personnel non qualifié.
    #[serde(default)]
    pub strict: bool,
    /// Plage propre au poste, prioritaire sur celle de la garde.
    #[serde(default)]
    pub window: Option<TimeWindow>,
    pub kind: AssignmentKind,
    pub priority: Priority,
}

impl LocationSpec {
    pub fn new<S: Into<String>>(name: S, rule: EligibilityRule) -> Self {
        Self {
            name: name.into(),
            prefix: false,
            rule,
            strict: false,
            window: None,
            kind: AssignmentKind::General,
            priority: Priority::Medium,
        }
    }

    fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    fn prefixed(mut self) -> Self {
        self.prefix = true;
        self
    }

    fn window(mut self, window: TimeWindow) -> Self {
        self.window = Some(window);
        self
    }

    fn kind(mut self, kind: AssignmentKind, priority: Priority) -> Self {
        self.kind = kind;
        self.priority = priority;
        self
    }

    pub fn matches(&self, location: &str) -> bool {
        if self.prefix {
            location.starts_with(&self.name)
        } else {
            location == self.name
        }
    }
}

/// Poste à couvrir dans le plan d'une garde.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSlot {
    pub location: String,
    #[serde(default = "default_required")]
    pub required: usize,
    /// Postes tenus par la même équipe (ex. réfectoire d'un bloc).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub also_covers: Vec<String>,
}

fn default_required() -> usize {
    1
}

impl PlanSlot {
    pub fn single<S: Into<String>>(location: S) -> Self {
        Self {
            location: location.into(),
            required: 1,
            also_covers: Vec::new(),
        }
    }

    pub fn team<S: Into<String>>(location: S, required: usize) -> Self {
        Self {
            location: location.into(),
            required,
            also_covers: Vec::new(),
        }
    }

    pub fn covering<S: Into<String>>(mut self, location: S) -> Self {
        self.also_covers.push(location.into());
        self
    }

    fn validate(&self) -> Result<()> {
        if self.location.trim().is_empty() {
            bail!("slot location cannot be empty");
        }
        if self.required == 0 {
            bail!("slot {} must require at least one staff member", self.location);
        }
        Ok(())
    }
}

/// Configuration complète de l'allocateur.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub locations: Vec<LocationSpec>,
    pub day: Vec<PlanSlot>,
    pub night: Vec<PlanSlot>,
    #[serde(default = "default_cap")]
    pub max_assignments_per_shift: usize,
    #[serde(default = "TimeWindow::day")]
    pub day_window: TimeWindow,
    #[serde(default = "TimeWindow::night")]
    pub night_window: TimeWindow,
}

fn default_cap() -> usize {
    12
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        let blocks = EligibilityRule::departments(["Security", "Rehabilitation"])
            .with_keywords(["security", "officer"]);
        let locations = vec![
            LocationSpec::new("Medical Room", EligibilityRule::departments(["Medical"]))
                .strict()
                .kind(AssignmentKind::Medical, Priority::High),
            LocationSpec::new(
                "Control Room",
                EligibilityRule::Unrestricted.with_keywords(["prison control room officer"]),
            )
            .strict()
            .kind(AssignmentKind::Control, Priority::Critical),
            LocationSpec::new(
                "Admin Office",
                EligibilityRule::departments(["Administration"]).with_keywords(["admin", "clerk"]),
            )
            .kind(AssignmentKind::Administrative, Priority::Low),
            LocationSpec::new("Main Gate", EligibilityRule::Unrestricted)
                .kind(AssignmentKind::Security, Priority::High),
            LocationSpec::new("Kitchen", EligibilityRule::Unrestricted),
            LocationSpec::new("Visitor Area", EligibilityRule::Unrestricted)
                .window(TimeWindow::visiting())
                .kind(AssignmentKind::Visitation, Priority::Medium),
            LocationSpec::new("Workshop", EligibilityRule::Unrestricted),
            LocationSpec::new("Isolation", EligibilityRule::Unrestricted)
                .kind(AssignmentKind::Security, Priority::High),
            LocationSpec::new("Staff Room", EligibilityRule::Unrestricted)
                .kind(AssignmentKind::General, Priority::Low),
            LocationSpec::new("Block A", blocks.clone())
                .prefixed()
                .kind(AssignmentKind::Security, Priority::High),
            LocationSpec::new("Block B", blocks)
                .prefixed()
                .kind(AssignmentKind::Security, Priority::High),
        ];

        let day = vec![
            PlanSlot::single("Medical Room"),
            PlanSlot::single("Control Room"),
            PlanSlot::team("Block A - Cells", 2).covering("Block A - Dining Room"),
            PlanSlot::team("Block B - Cells", 2).covering("Block B - Dining Room"),
            PlanSlot::single("Main Gate"),
            PlanSlot::single("Admin Office"),
            PlanSlot::single("Visitor Area"),
            PlanSlot::single("Kitchen"),
            PlanSlot::single("Workshop"),
            PlanSlot::single("Isolation"),
            PlanSlot::single("Staff Room"),
        ];

        let night = vec![
            PlanSlot::single("Control Room"),
            PlanSlot::single("Medical Room"),
            PlanSlot::single("Main Gate"),
            PlanSlot::single("Block A - Cells"),
            PlanSlot::single("Block B - Cells"),
            PlanSlot::single("Isolation"),
        ];

        Self {
            locations,
            day,
            night,
            max_assignments_per_shift: default_cap(),
            day_window: TimeWindow::day(),
            night_window: TimeWindow::night(),
        }
    }
}

impl ScheduleConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_assignments_per_shift == 0 {
            bail!("max_assignments_per_shift must be > 0");
        }
        for spec in &self.locations {
            if spec.name.trim().is_empty() {
                bail!("location name cannot be empty");
            }
        }
        for shift in [Shift::Day, Shift::Night] {
            let plan = self.plan(shift);
            if plan.is_empty() {
                bail!("{shift} plan must contain at least one slot");
            }
            let mut seen = HashSet::new();
            for slot in plan {
                slot.validate()?;
                if !seen.insert(slot.location.as_str()) {
                    bail!("{shift} plan lists {} twice", slot.location);
                }
            }
        }
        for (label, window) in [("day", &self.day_window), ("night", &self.night_window)] {
            TimeWindow::new(window.start, window.end)
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("{label} shift window"))?;
        }
        for spec in &self.locations {
            if let Some(window) = &spec.window {
                TimeWindow::new(window.start, window.end)
                    .map_err(anyhow::Error::msg)
                    .with_context(|| format!("window of {}", spec.name))?;
            }
        }
        Ok(())
    }

    /// Liste ordonnée des postes d'une garde.
    pub fn plan(&self, shift: Shift) -> &[PlanSlot] {
        match shift {
            Shift::Day => &self.day,
            Shift::Night => &self.night,
        }
    }

    pub fn shift_window(&self, shift: Shift) -> TimeWindow {
        match shift {
            Shift::Day => self.day_window,
            Shift::Night => self.night_window,
        }
    }

    /// Recherche exacte d'abord, puis par préfixe ; à défaut, poste libre non strict.
    pub fn spec_for(&self, location: &str) -> LocationSpec {
        self.locations
            .iter()
            .find(|s| !s.prefix && s.matches(location))
            .or_else(|| self.locations.iter().find(|s| s.prefix && s.matches(location)))
            .cloned()
            .unwrap_or_else(|| LocationSpec::new(location, EligibilityRule::Unrestricted))
    }

    /// Plage effective d'un poste pour une garde.
    pub fn window_for(&self, spec: &LocationSpec, shift: Shift) -> TimeWindow {
        spec.window.unwrap_or_else(|| self.shift_window(shift))
    }
}

pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> Result<ScheduleConfig> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("reading config {}", path.display()))?;
    let config: ScheduleConfig = serde_json::from_slice(&data)
        .with_context(|| format!("parsing config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

pub fn export_config_json<P: AsRef<Path>>(path: P, config: &ScheduleConfig) -> Result<()> {
    config.validate()?;
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)?;
    Ok(())
}

/// Rendu texte du plan d'une garde, une ligne par poste.
pub fn render_plan(config: &ScheduleConfig, shift: Shift) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{shift} plan (max {} assignments)",
        config.max_assignments_per_shift
    );
    for (idx, slot) in config.plan(shift).iter().enumerate() {
        let spec = config.spec_for(&slot.location);
        let window = config.window_for(&spec, shift);
        let _ = write!(
            out,
            "{:>2}. {} x{} {}-{}",
            idx + 1,
            slot.location,
            slot.required,
            window.start.format("%H:%M"),
            window.end.format("%H:%M"),
        );
        if spec.strict {
            out.push_str(" [strict]");
        }
        for extra in &slot.also_covers {
            let _ = write!(out, " +{extra}");
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        ScheduleConfig::default().validate().unwrap();
    }

    #[test]
    fn exact_match_wins_over_prefix() {
        let config = ScheduleConfig::default();
        assert!(config.spec_for("Medical Room").strict);
        assert!(config.spec_for("Block A - Dining Room").prefix);
        let unknown = config.spec_for("Laundry");
        assert_eq!(unknown.rule, EligibilityRule::Unrestricted);
        assert!(!unknown.strict);
    }

    #[test]
    fn visitor_area_keeps_its_window_at_night() {
        let config = ScheduleConfig::default();
        let spec = config.spec_for("Visitor Area");
        assert_eq!(config.window_for(&spec, Shift::Night), TimeWindow::visiting());
    }

    #[test]
    fn duplicated_slot_is_rejected() {
        let mut config = ScheduleConfig::default();
        config.night.push(PlanSlot::single("Main Gate"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_location_window_is_rejected() {
        let mut config = ScheduleConfig::default();
        let visitor = config
            .locations
            .iter_mut()
            .find(|l| l.name == "Visitor Area")
            .unwrap();
        let nine = visitor.window.unwrap().start;
        visitor.window = Some(TimeWindow { start: nine, end: nine });
        let err = config.validate().unwrap_err();
        assert!(format!("{err:#}").contains("window of Visitor Area"));
    }

    #[test]
    fn zero_cap_is_rejected() {
        let config = ScheduleConfig {
            max_assignments_per_shift: 0,
            ..ScheduleConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
