use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use semester_planner::{
    AppConfig, ConsoleNotifier, ExportFormat, Planner, PersistenceError, ScheduleStore,
    SnapshotFile, SystemClock, write_occurrences,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "semester-planner")]
#[command(about = "Parse university timetables and build a conflict-free schedule")]
struct Args {
    /// Snapshot file (overrides storage.snapshot_path)
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Term year anchoring week 1 (overrides term.year)
    #[arg(long, global = true)]
    year: Option<i32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a timetable export ("-" reads stdin) and replace the catalog
    Parse { input: PathBuf },
    /// Select a class for a subject
    Select { subject: String, class_code: String },
    /// Drop the selected class of a subject
    Deselect { subject: String },
    /// Forget the catalog and all selections
    Clear,
    /// List subjects, classes and advisory conflicts
    Show,
    /// List committed occurrences
    Occurrences {
        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,
        /// Only this subject
        #[arg(long)]
        subject: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::level_filters::LevelFilter::WARN.into())
        .parse_lossy("semester_planner=info");

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    let mut config = AppConfig::load().context("Failed to load configuration")?;
    if args.year.is_some() {
        config.term.year = args.year;
    }
    if args.snapshot.is_some() {
        config.storage.snapshot_path = args.snapshot.clone();
    }

    let file = SnapshotFile::new(config.storage.resolve_snapshot_path());
    let mut planner = Planner::from_config(&config, &SystemClock, Arc::new(ConsoleNotifier));

    match file.load() {
        Ok(snapshot) => planner.restore(&snapshot),
        Err(PersistenceError::FileNotFound(_)) => {
            tracing::debug!("No snapshot at {}, starting empty", file.path().display());
        }
        Err(e) => return Err(e).context("Failed to load snapshot"),
    }

    let dirty = match args.command {
        Command::Parse { input } => {
            let raw = read_input(&input)?;
            planner.parse_text(&raw).is_ok()
        }
        Command::Select { subject, class_code } => planner
            .select(&subject, &class_code)
            .is_ok_and(|outcome| outcome.is_committed()),
        Command::Deselect { subject } => planner.deselect(&subject).is_ok(),
        Command::Clear => {
            planner.clear();
            true
        }
        Command::Show => {
            print_catalog(planner.store());
            false
        }
        Command::Occurrences { format, subject } => {
            let store = planner.store();
            let occurrences = match subject {
                Some(subject) => store.occurrences_for(&subject).to_vec(),
                None => store.occurrences(),
            };
            write_occurrences(&occurrences, format, io::stdout().lock())?;
            false
        }
    };

    if dirty {
        file.save(&planner.snapshot())
            .with_context(|| format!("Failed to save snapshot to {}", file.path().display()))?;
    }

    Ok(())
}

fn read_input(input: &Path) -> Result<String> {
    if input.as_os_str() == "-" {
        let mut raw = String::new();
        io::stdin()
            .read_to_string(&mut raw)
            .context("Failed to read stdin")?;
        return Ok(raw);
    }
    std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input.display()))
}

fn print_catalog(store: &ScheduleStore) {
    if store.catalog().is_empty() {
        println!("No subjects parsed yet.");
        return;
    }

    for subject in store.catalog().subjects() {
        println!("{}", subject.name);
        let selected = store.selected_class(&subject.name);
        for (code, class) in &subject.classes {
            let marker = if selected == Some(code.as_str()) { "*" } else { " " };
            println!("  {} {}", marker, code);
            for (index, slot) in class.time_slots.iter().enumerate() {
                println!("      {}", slot.summary());
                let advisory = store
                    .advisory_for(&subject.name, code)
                    .and_then(|slots| slots.iter().find(|a| a.slot_index == index));
                if let Some(advisory) = advisory {
                    for message in advisory.messages() {
                        println!("        ! {}", message);
                    }
                }
            }
        }
    }
}
