use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use kaff_core::*;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "kaff")]
#[command(about = "Caffeine intake tracker with elimination kinetics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show current level and bedtime projections (default)
    Status,

    /// Log a drink
    Add {
        /// Drink name or catalog id (e.g. "espresso", "Drip Coffee")
        drink: String,

        /// Serving size variant (e.g. "double", "large")
        #[arg(long)]
        size: Option<String>,

        /// Caffeine amount in mg, for drinks not in the catalog
        #[arg(long, conflicts_with = "size")]
        mg: Option<f64>,

        /// Consumption time today as HH:MM (default: now)
        #[arg(long)]
        at: Option<String>,
    },

    /// List logged drinks, newest first
    Log,

    /// Remove a logged drink by id (or unambiguous id prefix)
    Remove { id: String },

    /// Correct the time-of-day of a logged drink (keeps its date)
    Retime {
        /// Entry id (or unambiguous id prefix)
        id: String,
        /// New time as HH:MM
        time: String,
    },

    /// Show or set your bedtime (HH:MM)
    Bedtime { time: Option<String> },

    /// List the drink catalog
    Drinks,

    /// Print the projected level curve
    Curve {
        /// Minutes between samples
        #[arg(long, default_value_t = 30)]
        step_minutes: u32,
    },

    /// Export the consumption log to CSV
    Export {
        /// Output path (default: <data-dir>/export.csv)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    kaff_core::logging::init();

    let cli = Cli::parse();

    // Determine data directory
    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    match cli.command {
        Some(Commands::Status) | None => cmd_status(data_dir, &config),
        Some(Commands::Add { drink, size, mg, at }) => {
            cmd_add(data_dir, &config, drink, size, mg, at)
        }
        Some(Commands::Log) => cmd_log(data_dir, &config),
        Some(Commands::Remove { id }) => cmd_remove(data_dir, &config, &id),
        Some(Commands::Retime { id, time }) => cmd_retime(data_dir, &config, &id, &time),
        Some(Commands::Bedtime { time }) => cmd_bedtime(&config, time),
        Some(Commands::Drinks) => cmd_drinks(),
        Some(Commands::Curve { step_minutes }) => cmd_curve(data_dir, &config, step_minutes),
        Some(Commands::Export { out }) => cmd_export(data_dir, &config, out),
    }
}

fn load_tracker(data_dir: &PathBuf, config: &Config) -> Result<(EntryStore, Tracker)> {
    std::fs::create_dir_all(data_dir)?;
    let store = EntryStore::new(data_dir.join("entries.json"));
    let entries = store.load()?;
    let tracker = Tracker::new(Kinetics::new(config.kinetics.half_life_hours), entries);
    Ok((store, tracker))
}

/// Resolve today's local HH:MM to an instant
fn today_at(time: NaiveTime, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let local_date = now.with_timezone(&Local).date_naive();
    Local
        .from_local_datetime(&local_date.and_time(time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| Error::Time(format!("{} does not exist today (DST gap)", time)))
}

/// Match a full entry id or an unambiguous prefix
fn resolve_entry_id(entries: &[DoseEvent], id: &str) -> Result<Uuid> {
    if let Ok(uuid) = Uuid::parse_str(id) {
        return Ok(uuid);
    }

    let matches: Vec<Uuid> = entries
        .iter()
        .filter(|e| e.id.to_string().starts_with(id))
        .map(|e| e.id)
        .collect();

    match matches.as_slice() {
        [only] => Ok(*only),
        [] => Err(Error::Store(format!("No entry matches id '{}'", id))),
        _ => Err(Error::Store(format!(
            "Id prefix '{}' is ambiguous ({} matches)",
            id,
            matches.len()
        ))),
    }
}

fn format_hours(hours: f64) -> String {
    if hours <= 0.0 {
        return "now".to_string();
    }
    let h = hours.floor() as i64;
    let m = ((hours - h as f64) * 60.0).round() as i64;
    if h == 0 {
        format!("{}min", m)
    } else {
        format!("{}h {}m", h, m)
    }
}

fn local_clock(t: DateTime<Utc>) -> String {
    t.with_timezone(&Local).format("%H:%M").to_string()
}

fn cmd_status(data_dir: PathBuf, config: &Config) -> Result<()> {
    let (_store, tracker) = load_tracker(&data_dir, config)?;
    let now = SystemClock.now();

    let level = tracker.level_at(now);
    let band = tracker.level_band_at(now);

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  CAFFEINE STATUS");
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Current level: {:.0}mg", level);
    println!("  {}", band.status_text());
    println!(
        "  Half-life: {}h ({} entries logged)",
        tracker.kinetics().half_life_hours(),
        tracker.entries().len()
    );
    println!();

    let threshold = config.bedtime.threshold_mg;
    match tracker.time_until_threshold(threshold, now) {
        Some(when) => println!(
            "  Drops below {:.0}mg around {} ({})",
            threshold,
            local_clock(when),
            format_hours(kinetics::hours_between(now, when))
        ),
        None => println!("  Already at or below the {:.0}mg target", threshold),
    }

    let bedtime = next_bedtime(parse_bedtime(&config.bedtime.time)?, &now);
    let insights = tracker.bedtime_insights(bedtime, threshold, now);

    println!();
    println!("  Bedtime {} (in {})", local_clock(bedtime), format_hours(insights.hours_until_bed));
    println!("  Projected at bedtime: {:.0}mg", insights.projected_at_bed_mg);
    if insights.on_track {
        println!("  ✓ On track for good sleep (target <{:.0}mg)", threshold);
        if insights.max_additional_mg > 0.0 {
            println!(
                "  You can have up to {:.0}mg more before bed",
                insights.max_additional_mg
            );
        }
    } else {
        println!(
            "  ⚠ May affect sleep quality ({:.0}mg over target)",
            insights.projected_at_bed_mg - threshold
        );
    }

    println!();
    Ok(())
}

fn cmd_add(
    data_dir: PathBuf,
    config: &Config,
    drink: String,
    size: Option<String>,
    mg: Option<f64>,
    at: Option<String>,
) -> Result<()> {
    let (store, mut tracker) = load_tracker(&data_dir, config)?;
    let now = SystemClock.now();

    let timestamp = match at {
        Some(hhmm) => today_at(parse_bedtime(&hhmm)?, now)?,
        None => now,
    };

    let entry = match mg {
        Some(mg) => tracker.add(drink, mg, timestamp, "☕")?,
        None => tracker.add_from_catalog(
            get_default_catalog(),
            &drink,
            size.as_deref(),
            timestamp,
        )?,
    };

    println!(
        "✓ Logged {} {}mg at {}",
        entry.drink,
        entry.caffeine_mg,
        local_clock(entry.timestamp)
    );

    let level = tracker.level_at(now);
    println!("  Current level: {:.0}mg", level);

    store.save(tracker.entries())?;
    Ok(())
}

fn cmd_log(data_dir: PathBuf, config: &Config) -> Result<()> {
    let (_store, tracker) = load_tracker(&data_dir, config)?;

    if tracker.entries().is_empty() {
        println!("No drinks logged yet.");
        return Ok(());
    }

    println!();
    for entry in tracker.log_newest_first() {
        let short_id = &entry.id.to_string()[..8];
        println!(
            "  {}  {}  {}  {} • {:.0}mg",
            short_id,
            entry.icon,
            local_clock(entry.timestamp),
            entry.drink,
            entry.caffeine_mg
        );
    }
    println!();
    Ok(())
}

fn cmd_remove(data_dir: PathBuf, config: &Config, id: &str) -> Result<()> {
    let (store, mut tracker) = load_tracker(&data_dir, config)?;

    let uuid = resolve_entry_id(tracker.entries(), id)?;
    let removed = tracker.remove(uuid)?;
    store.save(tracker.entries())?;

    println!("✓ Removed {} ({:.0}mg)", removed.drink, removed.caffeine_mg);
    Ok(())
}

fn cmd_retime(data_dir: PathBuf, config: &Config, id: &str, time: &str) -> Result<()> {
    let (store, mut tracker) = load_tracker(&data_dir, config)?;

    let uuid = resolve_entry_id(tracker.entries(), id)?;
    let new_time = parse_bedtime(time)?;

    // Time-of-day correction only: keep the entry's original local date.
    let entry = tracker
        .entries()
        .iter()
        .find(|e| e.id == uuid)
        .ok_or_else(|| Error::Store(format!("No entry with id {}", uuid)))?;
    let local_date = entry.timestamp.with_timezone(&Local).date_naive();
    let new_timestamp = Local
        .from_local_datetime(&local_date.and_time(new_time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| Error::Time(format!("{} does not exist on that date (DST gap)", time)))?;

    let updated = tracker.retime(uuid, new_timestamp)?;
    println!(
        "✓ Retimed {} to {}",
        updated.drink,
        local_clock(updated.timestamp)
    );

    store.save(tracker.entries())?;
    Ok(())
}

fn cmd_bedtime(config: &Config, time: Option<String>) -> Result<()> {
    match time {
        None => {
            println!(
                "Bedtime is {} (target <{:.0}mg)",
                config.bedtime.time, config.bedtime.threshold_mg
            );
        }
        Some(hhmm) => {
            // Validate before persisting
            parse_bedtime(&hhmm)?;
            let mut updated = config.clone();
            updated.bedtime.time = hhmm.clone();
            updated.save()?;
            println!("✓ Bedtime set to {}", hhmm);
        }
    }
    Ok(())
}

fn cmd_drinks() -> Result<()> {
    let catalog = get_default_catalog();
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::Catalog("Invalid catalog".into()));
    }

    let mut drinks: Vec<_> = catalog.drinks.values().collect();
    drinks.sort_by(|a, b| a.name.cmp(&b.name));

    println!();
    for drink in drinks {
        println!("  {}  {} — {:.0}mg", drink.icon, drink.name, drink.caffeine_mg);
        for size in &drink.sizes {
            println!("      {} — {:.0}mg", size.name, size.caffeine_mg);
        }
    }
    println!();
    Ok(())
}

fn cmd_curve(data_dir: PathBuf, config: &Config, step_minutes: u32) -> Result<()> {
    let (_store, tracker) = load_tracker(&data_dir, config)?;
    let now = SystemClock.now();

    if tracker.entries().is_empty() {
        println!("No drinks logged yet - nothing to chart.");
        return Ok(());
    }

    let window = tracker.default_window(now);
    let points: Vec<_> = tracker
        .sample_curve(window.start, window.end, step_minutes)
        .collect();

    let peak = points.iter().map(|p| p.level_mg).fold(0.0, f64::max).max(1.0);
    const BAR_WIDTH: f64 = 40.0;

    println!();
    let mut now_marked = false;
    for point in &points {
        if !now_marked && point.time >= now {
            println!("  ─────  ── now ──");
            now_marked = true;
        }
        let bar_len = (point.level_mg / peak * BAR_WIDTH).round() as usize;
        println!(
            "  {}  {:>5.1}mg  {}",
            local_clock(point.time),
            point.level_mg,
            "█".repeat(bar_len)
        );
    }
    println!();
    Ok(())
}

fn cmd_export(data_dir: PathBuf, config: &Config, out: Option<PathBuf>) -> Result<()> {
    let (_store, tracker) = load_tracker(&data_dir, config)?;
    let out_path = out.unwrap_or_else(|| data_dir.join("export.csv"));

    let count = export_entries_csv(tracker.entries(), &out_path)?;

    println!("✓ Exported {} entries to CSV", count);
    println!("  CSV: {}", out_path.display());
    Ok(())
}
