use clap::{Parser, Subcommand};
use log::{error, info};
use savegame::save::{SaveDocument, SaveError, SaveManager, SpawnRegistry};
use savegame::SaveConfig;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(author, version, about = "Inspect and maintain save files")]
struct Cli {
    /// JSON file with save settings (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print a summary of a save file
    Inspect {
        file: PathBuf,
        /// Dump the whole document as JSON instead
        #[arg(long)]
        json: bool,
    },
    /// Load a save file and report whether it is usable
    Check { file: PathBuf },
    /// Load a save file and write it back in the current format
    Rewrite { input: PathBuf, output: PathBuf },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => match SaveConfig::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load config {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => SaveConfig::default(),
    };
    let manager = SaveManager::new(config);
    let registry = SpawnRegistry::create_default();

    match run(cli.command, &manager, &registry) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, manager: &SaveManager, registry: &SpawnRegistry) -> Result<(), SaveError> {
    match command {
        Command::Inspect { file, json } => {
            let document = manager.load_game(&file, registry)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&document)?);
            } else {
                print_summary(&document);
            }
        }
        Command::Check { file } => {
            let document = manager.load_game(&file, registry)?;
            println!(
                "{}: ok (version {}, {} warnings)",
                file.display(),
                document.information.version,
                document.warnings.len()
            );
            for warning in &document.warnings {
                println!("  warning: {}", warning);
            }
        }
        Command::Rewrite { input, output } => {
            let document = manager.load_game(&input, registry)?;
            let written = manager.save_game(&document, &output)?;
            info!("{} rewritten to {}", input.display(), written.display());
        }
    }
    Ok(())
}

fn print_summary(document: &SaveDocument) {
    let info = &document.information;
    let saved = chrono::DateTime::from_timestamp(info.save_time, 0)
        .map(|time| time.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| info.save_time.to_string());

    println!("Save version: {} (level engine {})", info.version, info.level_engine_version);
    println!("Saved:        {}", saved);
    println!("Description:  {}", info.description);
    println!(
        "Player:       {} properties, {} return entries",
        document.player.properties.len(),
        document.player.returns.len()
    );

    for level in &document.levels {
        println!(
            "Level {}: {} overrides, {} spawned{}",
            level.name,
            level.objects.len(),
            level.spawned.len(),
            if level.script_data.is_some() { ", script data" } else { "" }
        );
    }
    for overworld in &document.overworlds {
        let completed = overworld.waypoints.iter().filter(|wp| wp.completed).count();
        println!(
            "Overworld {}: {}/{} waypoints completed",
            overworld.name,
            completed,
            overworld.waypoints.len()
        );
    }
    for warning in &document.warnings {
        println!("Warning: {}", warning);
    }
}
