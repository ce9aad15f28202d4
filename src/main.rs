use clap::{Parser, Subcommand};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use isleground::config::GameConfig;
use isleground::player::Player;
use isleground::save;
use isleground::world::generation::{generate_world, print_world_summary, render_map_layers};

#[derive(Parser)]
#[command(name = "isleground")]
#[command(about = "A seeded island world generator with a fixed-layout binary save format")]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "isleground.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a world and print its map layers
    Generate {
        /// World seed (at least 6 printable ASCII characters)
        #[arg(short, long)]
        seed: Option<String>,
    },

    /// Start a new game: generate a world and write an initial save
    New {
        /// Player name (1-16 printable ASCII characters)
        #[arg(short, long)]
        name: String,

        /// World seed; a random one is generated when omitted
        #[arg(short, long)]
        seed: Option<String>,

        /// Save file path (defaults to the configured save_path)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Decode a save file and show the restored session
    Inspect {
        /// Path to the save file
        file: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = match GameConfig::load_or_default(Path::new(&cli.config)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Generate { seed } => {
            let seed = seed.or_else(|| config.seed.clone());
            let world = match generate_world(seed.as_deref(), config.max_placement_attempts) {
                Ok(w) => w,
                Err(e) => {
                    eprintln!("Generation error: {}", e);
                    std::process::exit(1);
                }
            };
            print_world_summary(&world);
            println!("\n{}", render_map_layers(&world));
        }

        Commands::New { name, seed, output } => {
            let seed = seed.or_else(|| config.seed.clone());
            let world = match generate_world(seed.as_deref(), config.max_placement_attempts) {
                Ok(w) => w,
                Err(e) => {
                    eprintln!("Generation error: {}", e);
                    std::process::exit(1);
                }
            };
            let player = match Player::new(&name, world.spawn_point()) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("Invalid player: {}", e);
                    std::process::exit(1);
                }
            };

            let save_path = output.unwrap_or_else(|| config.save_path.clone());
            if let Err(e) = save::save_to_path(Path::new(&save_path), &player, &world) {
                eprintln!("Cannot write save: {}", e);
                std::process::exit(1);
            }
            print_world_summary(&world);
            println!(
                "\nNew game for {} (seed {}) saved to {}",
                player.name(),
                world.seed(),
                save_path
            );
        }

        Commands::Inspect { file } => {
            let (player, world) = match save::load_from_path(Path::new(&file)) {
                Ok(session) => session,
                Err(e) => {
                    eprintln!("Cannot load {}: {}", file, e);
                    std::process::exit(1);
                }
            };

            println!("=== Player ===");
            println!("Name: {}", player.name());
            println!(
                "Region: ({}, {})",
                player.region.row, player.region.col
            );
            println!("Score: {}", player.score());
            println!("Tier: {}", player.tier());
            println!("Can swim: {}", player.can_swim);
            let active: Vec<&str> = player
                .inventory
                .active()
                .iter()
                .map(|item| item.name())
                .collect();
            println!(
                "Active items: {}",
                if active.is_empty() {
                    "(none)".to_string()
                } else {
                    active.join(", ")
                }
            );
            println!();
            print_world_summary(&world);
        }
    }
}
