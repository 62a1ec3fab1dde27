//! Fortuna - festive prediction oracle.
//!
//! Command-line presentation layer for the prediction session core: it
//! forwards user intent to the session controller and renders whichever
//! phase comes back.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use fortuna::config::FortunaConfig;
use fortuna::session::{Phase, SessionController};
use fortuna::source::create_source;
use fortuna::stats::StatsClient;

#[derive(Parser)]
#[command(name = "fortuna")]
#[command(version = "0.1.0")]
#[command(about = "Ask the crystal ball for a prediction", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Directory containing fortuna.json (defaults to current directory)
    #[arg(short, long, global = true, default_value = ".")]
    project: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Request one prediction and display it
    Predict {
        /// Override the configured source: gemini or local
        #[arg(short, long, value_name = "KIND")]
        source: Option<String>,

        /// Skip the global counter increment
        #[arg(long)]
        no_stats: bool,
    },

    /// Show how many predictions have been served globally
    Stats,

    /// Write a starter fortuna.json
    Init,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "fortuna=debug,info"
    } else {
        "fortuna=info,warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let project_path = cli.project.canonicalize().unwrap_or(cli.project.clone());

    if !project_path.exists() {
        eprintln!(
            "{} Project directory does not exist: {}",
            "Error:".red().bold(),
            project_path.display()
        );
        std::process::exit(1);
    }

    match cli.command {
        Commands::Predict { source, no_stats } => {
            let mut config = load_config(&project_path);
            if let Some(kind) = source {
                config.source.kind = kind;
                if let Err(e) = config.validate() {
                    eprintln!("{} {}", "Error:".red().bold(), e);
                    std::process::exit(e.exit_code());
                }
            }

            run_predict(&config, no_stats).await;
        }

        Commands::Stats => {
            let config = load_config(&project_path);
            let stats = StatsClient::new(&config.stats.endpoint)
                .with_timeout(config.stats.timeout_secs);

            match stats.read_total().await {
                Some(total) => {
                    println!(
                        "{} {} predictions served so far",
                        "✨".yellow(),
                        total.to_string().bold()
                    );
                }
                None => {
                    println!("{} predictions served so far: unknown", "✨".yellow());
                }
            }
        }

        Commands::Init => match FortunaConfig::write_starter(&project_path) {
            Ok(path) => {
                println!("{} wrote {}", "✓".green().bold(), path.display());
            }
            Err(e) => {
                eprintln!("{} {}", "Error:".red().bold(), e);
                std::process::exit(e.exit_code());
            }
        },
    }

    Ok(())
}

fn load_config(project_path: &std::path::Path) -> FortunaConfig {
    match FortunaConfig::load_or_default(project_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(e.exit_code());
        }
    }
}

/// Drive one full prediction session: request, spinner while pending,
/// themed result card or retry hint, and the fire-and-forget counter bump.
async fn run_predict(config: &FortunaConfig, no_stats: bool) {
    let source = match create_source(&config.source) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(e.exit_code());
        }
    };

    let controller = Arc::new(SessionController::new(source));

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Consulting the cosmos...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    controller.request_prediction().await;
    spinner.finish_and_clear();

    match controller.phase() {
        Phase::Fulfilled(result) => {
            println!();
            println!("  {}  {}", result.theme.icon(), "The year ahead holds...".yellow().bold());
            println!();
            println!("  \"{}\"", result.text.italic());
            println!();

            if !no_stats {
                // Fire-and-forget: failures are logged inside and ignored.
                let stats = StatsClient::new(&config.stats.endpoint)
                    .with_timeout(config.stats.timeout_secs);
                stats.increment().await;
            }
        }
        Phase::Failed => {
            eprintln!();
            eprintln!("  {} {}", "☾".red(), "The stars are silent.".red().bold());
            eprintln!("  Magic is temporarily unavailable. Try again later!");
            std::process::exit(2);
        }
        // A fresh controller settles on Fulfilled or Failed.
        other => {
            eprintln!(
                "{} unexpected session phase: {}",
                "Error:".red().bold(),
                other.name()
            );
            std::process::exit(1);
        }
    }
}
