#![forbid(unsafe_code)]
use anyhow::{Context, Result};
use roulement::{
    config::{self, ScheduleConfig},
    io,
    model::{Roster, Shift},
    scheduler::{Allocator, GenerationReport},
    storage::{AssignmentStore, JsonStorage, Storage},
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de planification automatique du personnel (sans base de données)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON de roster
    #[arg(long, global = true, default_value = "roster.json")]
    roster: String,

    /// Configuration JSON des postes (défaut : configuration de référence)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Importer le personnel depuis un CSV
    ImportStaff {
        #[arg(long)]
        csv: String,
    },

    /// Importer des congés depuis un CSV
    ImportLeave {
        #[arg(long)]
        csv: String,
    },

    /// Générer une garde (day|night) pour une date
    Generate {
        /// YYYY-MM-DD
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
        #[arg(long, value_parser = parse_shift)]
        shift: Shift,
        /// N'écrit rien, affiche la sélection
        #[arg(long)]
        dry_run: bool,
    },

    /// Générer jour puis nuit, puis réconcilier, sur une période
    GenerateDays {
        #[arg(long, value_parser = parse_date)]
        from: NaiveDate,
        /// Défaut : `from`
        #[arg(long, value_parser = parse_date)]
        to: Option<NaiveDate>,
    },

    /// Réconcilier jour/nuit pour une date
    Reconcile {
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
    },

    /// Vérifier les conflits jour/nuit
    Check {
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
    },

    /// Lister les affectations d'une date
    List {
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
        #[arg(long)]
        out_csv: Option<String>,
    },

    /// Afficher le plan d'une garde
    Plan {
        #[arg(long, value_parser = parse_shift)]
        shift: Shift,
    },

    /// Exporter la configuration courante
    ExportConfig {
        #[arg(long)]
        out: String,
    },

    /// Exporter le roster complet en JSON
    ExportRoster {
        #[arg(long)]
        out: String,
    },
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    io::parse_date(raw).map_err(|e| format!("{e:#}"))
}

fn parse_shift(raw: &str) -> Result<Shift, String> {
    raw.parse()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let schedule_config = match &cli.config {
        Some(path) => config::load_config_from_file(path)?,
        None => ScheduleConfig::default(),
    };

    let storage = JsonStorage::open(&cli.roster)?;
    let roster = if storage.exists() {
        storage.load()?
    } else {
        Roster::default()
    };

    let code = match cli.cmd {
        Commands::ImportStaff { csv } => {
            let mut roster = roster;
            let staff = io::import_staff_csv(csv)?;
            println!("{} staff member(s) imported", staff.len());
            roster.staff.extend(staff);
            storage.save(&roster)?;
            0
        }
        Commands::ImportLeave { csv } => {
            let mut roster = roster;
            let leave = io::import_leave_csv(csv, &roster)?;
            println!("{} leave interval(s) imported", leave.len());
            roster.leaves.extend(leave);
            storage.save(&roster)?;
            0
        }
        Commands::Generate {
            date,
            shift,
            dry_run,
        } => {
            let mut allocator = Allocator::new(schedule_config, roster)?;
            if dry_run {
                for a in allocator.preview(date, shift)? {
                    print_assignment(allocator.backend(), &a);
                }
            } else {
                let report = allocator.generate(date, shift)?;
                print_report(allocator.backend(), &report);
                storage.save(allocator.backend())?;
            }
            0
        }
        Commands::GenerateDays { from, to } => {
            let mut allocator = Allocator::new(schedule_config, roster)?;
            let reports = allocator.generate_range(from, to.unwrap_or(from))?;
            let mut attention = 0;
            for daily in &reports {
                print_report(allocator.backend(), &daily.day);
                print_report(allocator.backend(), &daily.night);
                attention += daily.reconcile.dead_ends.len();
            }
            storage.save(allocator.backend())?;
            if attention > 0 {
                eprintln!("{attention} night assignment(s) need attention");
                2
            } else {
                0
            }
        }
        Commands::Reconcile { date } => {
            let mut allocator = Allocator::new(schedule_config, roster)?;
            let report = allocator.reconcile(date)?;
            storage.save(allocator.backend())?;
            println!(
                "trimmed: {} | replaced: {} | needs attention: {}",
                report.trimmed.len(),
                report.replaced.len(),
                report.dead_ends.len()
            );
            for c in &report.manual_conflicts {
                eprintln!("manual conflict: {}", c.staff.as_str());
            }
            if report.dead_ends.is_empty() {
                0
            } else {
                2
            }
        }
        Commands::Check { date } => {
            let allocator = Allocator::new(schedule_config, roster)?;
            let conflicts = allocator.check(date)?;
            if conflicts.is_empty() {
                println!("OK: no cross-shift conflicts");
                0
            } else {
                eprintln!("Found {} cross-shift conflict(s)", conflicts.len());
                for c in &conflicts {
                    let who = allocator
                        .backend()
                        .find_staff_by_id(&c.staff)
                        .map_or(c.staff.as_str(), |s| s.email.as_str());
                    eprintln!("  {who}: day {} / night {}", c.day.len(), c.night.len());
                }
                // Code 2 = WARNING/INCOMPLETE
                2
            }
        }
        Commands::List { date, out_csv } => {
            let assignments = roster
                .find_assignments(date, None, None)
                .context("listing assignments")?;
            if let Some(path) = out_csv {
                io::export_assignments_csv(path, &roster, &assignments)?;
            }
            for a in &assignments {
                print_assignment(&roster, a);
            }
            0
        }
        Commands::Plan { shift } => {
            print!("{}", config::render_plan(&schedule_config, shift));
            0
        }
        Commands::ExportConfig { out } => {
            config::export_config_json(out, &schedule_config)?;
            0
        }
        Commands::ExportRoster { out } => {
            io::export_roster_json(out, &roster)?;
            0
        }
    };

    std::process::exit(code);
}

fn print_assignment(roster: &Roster, a: &roulement::ScheduleAssignment) {
    let staff = io::staff_emails(roster, a);
    println!(
        "{} | {} | {} | {} → {} | {} | {}",
        a.date,
        a.shift,
        a.location,
        a.start.format("%H:%M"),
        a.end.format("%H:%M"),
        if staff.is_empty() {
            "-".to_string()
        } else {
            staff.join(",")
        },
        a.status.as_str()
    );
}

fn print_report(roster: &Roster, report: &GenerationReport) {
    println!(
        "{} {}: {} created, {} skipped, {} replaced",
        report.date,
        report.shift,
        report.created.len(),
        report.skipped.len(),
        report.replaced
    );
    for a in &report.created {
        print_assignment(roster, a);
    }
    for s in &report.skipped {
        println!("  skipped {}: {}", s.location, s.reason);
    }
}
