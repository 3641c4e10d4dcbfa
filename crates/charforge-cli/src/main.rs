//! Charforge CLI
//!
//! Command-line interface for inspecting and maintaining a character database.

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use charforge_core::{
    CharacterConcept, CharacterDatabase, Cliche, CoreMotivation, DatabaseConfig, MetadataEntry,
    ThematicDirection, DATA_DIR_ENV,
};

/// Charforge - Character Database CLI
#[derive(Parser)]
#[command(name = "charforge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CLI for the Charforge character database")]
struct Cli {
    /// Directory holding the database file
    #[arg(long, global = true, env = DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show record counts per collection
    Stats,

    /// List character concepts
    Concepts,

    /// List thematic directions
    Directions {
        /// Only directions of this concept
        #[arg(long)]
        concept: Option<String>,
    },

    /// List core motivations of a direction, newest first
    Motivations {
        /// Direction id
        #[arg(long)]
        direction: String,
    },

    /// Find thematic directions whose concept no longer exists
    Orphans {
        /// Delete the orphaned directions
        #[arg(long)]
        clean: bool,
    },

    /// Delete a concept and all of its thematic directions
    DeleteConcept {
        /// Concept id
        id: String,
        /// Skip confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Export every collection as pretty-printed JSON
    Export {
        /// Output file path
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let db = open_database(cli.data_dir)?;
    let result = match cli.command {
        Commands::Stats => run_stats(&db),
        Commands::Concepts => run_concepts(&db),
        Commands::Directions { concept } => run_directions(&db, concept.as_deref()),
        Commands::Motivations { direction } => run_motivations(&db, &direction),
        Commands::Orphans { clean } => run_orphans(&db, clean),
        Commands::DeleteConcept { id, yes } => run_delete_concept(&db, &id, yes),
        Commands::Export { output } => run_export(&db, &output),
    };
    db.close();
    result
}

/// Logs go to stderr so command output stays clean
fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(false)
        .init();
}

fn open_database(data_dir: Option<PathBuf>) -> anyhow::Result<CharacterDatabase> {
    let config = DatabaseConfig {
        data_dir,
        ..Default::default()
    };
    let db = CharacterDatabase::sqlite(config)?;
    db.initialize()?;
    Ok(db)
}

/// Run stats command
fn run_stats(db: &CharacterDatabase) -> anyhow::Result<()> {
    let stats = db.get_stats()?;

    println!("{}", "=== Charforge Database Statistics ===".cyan().bold());
    println!();
    if let Some(version) = db.schema_version() {
        println!("{}: v{}", "Schema Version".white().bold(), version);
    }
    println!("{}: {}", "Character Concepts".white().bold(), stats.character_concepts);
    println!("{}: {}", "Thematic Directions".white().bold(), stats.thematic_directions);
    println!("{}: {}", "Cliches".white().bold(), stats.cliches);
    println!("{}: {}", "Core Motivations".white().bold(), stats.core_motivations);
    println!("{}: {}", "Metadata Entries".white().bold(), stats.metadata_entries);

    Ok(())
}

fn run_concepts(db: &CharacterDatabase) -> anyhow::Result<()> {
    let mut concepts = db.get_all_character_concepts()?;
    concepts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    println!("{}", "=== Character Concepts ===".cyan().bold());
    println!();
    if concepts.is_empty() {
        println!("{}", "No concepts found.".dimmed());
        return Ok(());
    }

    for concept in &concepts {
        let directions = db.get_thematic_directions_by_concept_id(&concept.id)?;
        println!(
            "{} [{:?}] {}",
            concept.id.yellow(),
            concept.status,
            format_time(&concept.created_at).dimmed()
        );
        println!("  {}", truncate(&concept.concept, 72));
        println!("  {} thematic directions", directions.len());
    }

    Ok(())
}

fn run_directions(db: &CharacterDatabase, concept_id: Option<&str>) -> anyhow::Result<()> {
    let directions = match concept_id {
        Some(id) => db.get_thematic_directions_by_concept_id(id)?,
        None => db.get_all_thematic_directions()?,
    };

    println!("{}", "=== Thematic Directions ===".cyan().bold());
    if let Some(id) = concept_id {
        println!("{}: {}", "Concept".white().bold(), id);
    }
    println!();
    if directions.is_empty() {
        println!("{}", "No directions found.".dimmed());
        return Ok(());
    }

    for direction in &directions {
        let motivations = db.get_core_motivations_count(&direction.id);
        println!("{} {}", direction.id.yellow(), direction.title.white().bold());
        println!(
            "  concept {}, {} core motivations",
            direction.concept_id, motivations
        );
        if !direction.description.is_empty() {
            println!("  {}", truncate(&direction.description, 72).dimmed());
        }
    }

    Ok(())
}

fn run_motivations(db: &CharacterDatabase, direction_id: &str) -> anyhow::Result<()> {
    let motivations = db.get_core_motivations_by_direction_id(direction_id)?;

    println!("{}", "=== Core Motivations ===".cyan().bold());
    println!("{}: {}", "Direction".white().bold(), direction_id);
    println!();
    if motivations.is_empty() {
        println!("{}", "No core motivations found.".dimmed());
        return Ok(());
    }

    for motivation in &motivations {
        let created = motivation
            .created_at
            .as_ref()
            .map(format_time)
            .unwrap_or_else(|| "undated".to_string());
        println!(
            "{} {}",
            motivation.id.as_deref().unwrap_or("-").yellow(),
            created.dimmed()
        );
        println!("  {}: {}", "Desire".green(), motivation.core_desire);
        if let Some(contradiction) = &motivation.internal_contradiction {
            println!("  {}: {}", "Contradiction".magenta(), contradiction);
        }
        if let Some(question) = &motivation.central_question {
            println!("  {}: {}", "Question".blue(), question);
        }
    }

    Ok(())
}

fn run_orphans(db: &CharacterDatabase, clean: bool) -> anyhow::Result<()> {
    println!("{}", "=== Orphaned Directions ===".cyan().bold());
    println!();

    let orphaned = db.find_orphaned_directions()?;
    if orphaned.is_empty() {
        println!("{}", "No orphaned directions.".green());
        return Ok(());
    }

    for direction in &orphaned {
        println!(
            "  {} {} (missing concept {})",
            "!".yellow().bold(),
            direction.title,
            direction.concept_id.red()
        );
    }

    if clean {
        let removed = db.remove_orphaned_directions()?;
        println!();
        println!(
            "{}",
            format!("Removed {} of {} orphaned directions", removed, orphaned.len())
                .green()
                .bold()
        );
    } else {
        println!();
        println!("{}", "Run with --clean to delete them.".dimmed());
    }

    Ok(())
}

fn run_delete_concept(db: &CharacterDatabase, id: &str, yes: bool) -> anyhow::Result<()> {
    let Some(concept) = db.get_character_concept(id)? else {
        anyhow::bail!("Concept {} not found", id);
    };
    let directions = db.get_thematic_directions_by_concept_id(id)?;

    println!("{}: {}", "Concept".white().bold(), truncate(&concept.concept, 72));
    println!("{}: {}", "Thematic Directions".white().bold(), directions.len());

    // Confirmation prompt (unless --yes)
    if !yes {
        println!();
        print!(
            "{} Delete this concept and {} directions? This cannot be undone. [y/N] ",
            "WARNING:".red().bold(),
            directions.len()
        );
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim().to_lowercase();

        if input != "y" && input != "yes" {
            println!("{}", "Aborted.".yellow());
            return Ok(());
        }
    }

    db.delete_character_concept(id)?;
    println!(
        "{}",
        format!("Deleted concept {} and {} directions", id, directions.len())
            .green()
            .bold()
    );

    Ok(())
}

/// Snapshot of every collection
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportDocument {
    exported_at: DateTime<Utc>,
    schema_version: Option<u32>,
    character_concepts: Vec<CharacterConcept>,
    thematic_directions: Vec<ThematicDirection>,
    cliches: Vec<Cliche>,
    core_motivations: Vec<CoreMotivation>,
    metadata: Vec<MetadataEntry>,
}

fn build_export(db: &CharacterDatabase) -> anyhow::Result<ExportDocument> {
    Ok(ExportDocument {
        exported_at: Utc::now(),
        schema_version: db.schema_version(),
        character_concepts: db.get_all_character_concepts()?,
        thematic_directions: db.get_all_thematic_directions()?,
        cliches: db.get_all_cliches()?,
        core_motivations: db.get_all_core_motivations()?,
        metadata: db.get_all_metadata()?,
    })
}

fn run_export(db: &CharacterDatabase, output: &Path) -> anyhow::Result<()> {
    println!("{}", "=== Charforge Export ===".cyan().bold());
    println!();

    let document = build_export(db)?;

    // Create parent directories if needed
    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::File::create(output)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &document)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    println!(
        "{}",
        format!(
            "Exported {} concepts, {} directions, {} cliches, {} motivations and {} metadata entries to {}",
            document.character_concepts.len(),
            document.thematic_directions.len(),
            document.cliches.len(),
            document.core_motivations.len(),
            document.metadata.len(),
            output.display()
        )
        .green()
        .bold()
    );

    Ok(())
}

fn format_time(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", head)
}
