#![forbid(unsafe_code)]
//! Operator tool for a beaconfield record store: inspect scores, export and
//! import state, probe who controls a point.

use beaconfield::config::{load_config, Config};
use beaconfield::engine::{BeaconRecord, Engine, RebuildReport};
use beaconfield::geometry::Point;
use beaconfield::persistence::Database;
use clap::{Parser, Subcommand};
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Color as TableColor;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "beaconfield.toml")]
    config: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuilds the stored state and prints per-faction scores
    Scores,
    /// Prints the rebuilt state as JSON
    Export {
        #[arg(long)]
        pretty: bool,
    },
    /// Replaces the stored records with a JSON array of beacon records
    Import {
        /// File containing the records
        file: String,
    },
    /// Lists the fields covering a point, given as x:y
    Probe { point: Point },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let db = Database::open(&config.database.path)?;

    match &cli.command {
        Commands::Scores => scores(&config, &db)?,
        Commands::Export { pretty } => export(&config, &db, *pretty)?,
        Commands::Import { file } => import(&config, &db, file)?,
        Commands::Probe { point } => probe(&config, &db, *point)?,
    }

    Ok(())
}

fn load(config: &Config, db: &Database) -> Result<Engine, Box<dyn std::error::Error>> {
    let (engine, report) = Engine::load_from(config.engine.clone(), db)?;
    print_skipped(&report);
    Ok(engine)
}

fn print_skipped(report: &RebuildReport) {
    if report.skipped.is_empty() {
        return;
    }
    eprintln!(
        "{}",
        format!("⚠️  {} record(s) could not be restored:", report.skipped.len()).yellow()
    );
    for skipped in &report.skipped {
        eprintln!("  {} {} {:?}", "•".yellow(), skipped.coord, skipped.reason);
    }
}

fn header(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|t| {
            Cell::new(t)
                .fg(TableColor::Cyan)
                .add_attribute(Attribute::Bold)
        })
        .collect()
}

fn scores(config: &Config, db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    let engine = load(config, db)?;

    println!("{}", "📊 Faction Scores".bright_cyan().bold());
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&["Faction", "Beacons", "Links", "Fields", "Area"]));

    for (faction, score) in engine.scores() {
        let name = engine.roster().name(faction).unwrap_or("?");
        table.add_row(vec![
            Cell::new(name).fg(TableColor::White),
            Cell::new(score.beacons),
            Cell::new(score.links),
            Cell::new(score.fields),
            Cell::new(format!("{:.1}", score.area)).fg(TableColor::Green),
        ]);
    }

    println!("{}", table);
    Ok(())
}

fn export(config: &Config, db: &Database, pretty: bool) -> Result<(), Box<dyn std::error::Error>> {
    let engine = load(config, db)?;
    let state = engine.export_state();
    let json = if pretty {
        serde_json::to_string_pretty(&state)?
    } else {
        serde_json::to_string(&state)?
    };
    println!("{}", json);
    Ok(())
}

fn import(config: &Config, db: &Database, file: &str) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(file)
        .map_err(|e| format!("Failed to read {}: {}", file, e))?;
    let records: Vec<BeaconRecord> = serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse records in {}: {}", file, e))?;

    let mut engine = Engine::new(config.engine.clone())?;
    let report = engine.rebuild(&records);
    print_skipped(&report);

    // Store the normalized state, not the raw input.
    engine.save_to(db)?;
    println!(
        "{}",
        format!(
            "✅ Imported {} beacons, {} links, {} fields",
            report.beacons,
            report.links_replayed,
            report.fields_created + report.fields_recovered
        )
        .bright_green()
    );
    Ok(())
}

fn probe(config: &Config, db: &Database, point: Point) -> Result<(), Box<dyn std::error::Error>> {
    let engine = load(config, db)?;
    let fields = engine.fields_at(point);

    if fields.is_empty() {
        println!("{}", format!("No field covers {}", point).yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&["Field", "Owner", "Vertices", "Area"]));

    for field in fields {
        let [a, b, c] = field.vertices();
        let id = field.id_str();
        table.add_row(vec![
            Cell::new(format!("{}...", &id[..12])).fg(TableColor::Grey),
            Cell::new(engine.roster().name(field.owner).unwrap_or("?")).fg(TableColor::White),
            Cell::new(format!("{} {} {}", a, b, c)),
            Cell::new(format!("{:.1}", field.area())).fg(TableColor::Green),
        ]);
    }

    println!("{}", table);
    Ok(())
}
