use clap::{Parser, Subcommand};
use colored::Colorize;
use directories::ProjectDirs;
use env_logger::Env;
use log::error;
use std::fs::create_dir_all;
use std::process;

mod config;
mod display;
mod license;
mod store;

use config::{CONFIG_FILE, Settings};
use store::STATUS_FILE;

/// CLI definition
#[derive(Parser)]
#[command(name = "botkit-admin")]
#[command(about = "AI BotKit license manager", long_about = None)]
struct Cli {
    /// Licensing endpoint, overrides the config file
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Security token issued by the site, overrides the config file
    #[arg(long, global = true)]
    nonce: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Activate a license key on this machine
    Activate {
        /// License key, prompted for when missing
        #[arg(long)]
        key: Option<String>,
    },
    /// Deactivate the license on this machine
    Deactivate {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Re-check the license with the server
    Check,
    /// Show the last known license status
    Status,
    /// Show the effective configuration
    Config {
        /// Write the effective configuration back to the config file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize logging (default to "info")
    env_logger::Builder::from_env(Env::default().default_filter_or("info,botkit_core=debug")).init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Determine & prepare config and data directories
    let Some(proj_dirs) = ProjectDirs::from("", "AI BotKit", "botkit-admin") else {
        error!("Cannot determine data directory via ProjectDirs");
        process::exit(1);
    };

    for dir in [proj_dirs.config_dir(), proj_dirs.data_dir()] {
        if let Err(e) = create_dir_all(dir) {
            error!("Failed to create directory {}: {e}", dir.display());
            process::exit(1);
        }
    }

    let config_path = proj_dirs.config_dir().join(CONFIG_FILE);
    let status_path = proj_dirs.data_dir().join(STATUS_FILE);

    let settings = match Settings::load(&config_path) {
        Ok(s) => s.with_overrides(cli.endpoint, cli.nonce),
        Err(e) => {
            error!("Failed to read config {}: {e}", config_path.display());
            process::exit(1);
        }
    };

    // Dispatch on subcommands
    match cli.command {
        Commands::Activate { key } => {
            if let Err(e) = license::activate_wizard(&settings, &status_path, key).await {
                error!("Error in activate-license flow: {e}");
                process::exit(1);
            }
        }
        Commands::Deactivate { yes } => {
            if let Err(e) = license::deactivate_wizard(&settings, &status_path, yes).await {
                error!("Error in deactivate-license flow: {e}");
                process::exit(1);
            }
        }
        Commands::Check => {
            if let Err(e) = license::check_wizard(&settings, &status_path).await {
                error!("Error in check-license flow: {e}");
                process::exit(1);
            }
        }
        Commands::Status => license::show_status(&status_path),
        Commands::Config { save } => {
            println!("{}", format!("# {}", config_path.display()).dimmed());
            match toml::to_string_pretty(&settings) {
                Ok(rendered) => println!("{rendered}"),
                Err(e) => {
                    error!("Failed to render config: {e}");
                    process::exit(1);
                }
            }

            if save {
                if let Err(e) = settings.save(&config_path) {
                    error!("Failed to write config {}: {e}", config_path.display());
                    process::exit(1);
                }
            }
        }
    }
}
