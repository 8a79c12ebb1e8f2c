//! SheetWatch CLI
//!
//! Command-line interface for SheetWatch

use clap::{Parser, Subcommand};
use sheetwatch_core::logging_facility::{init, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "sheetwatch")]
#[command(about = "SheetWatch - character sheet change notifications", long_about = None)]
struct Cli {
    /// Emit logs to stderr: `development` (human) or `production` (JSON)
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compare two snapshot files and print the filtered changes
    Diff(commands::diff::DiffArgs),
    /// List field groups, or resolve group names to patterns
    Groups(commands::groups::GroupsArgs),
    /// List filter presets
    Presets,
    /// Check a webhook URL and probe the endpoint
    ValidateWebhook(commands::validate::ValidateArgs),
    /// Run a monitor cycle (or poll) from a configuration file
    Run(commands::run::RunArgs),
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Some(name) = &cli.log {
        match Profile::from_name(name) {
            Some(profile) => init(profile),
            None => eprintln!("warning: unknown log profile `{}`, logging disabled", name),
        }
    }

    let result = match cli.command {
        Commands::Diff(args) => commands::diff::execute(args),
        Commands::Groups(args) => commands::groups::execute(args),
        Commands::Presets => commands::groups::execute_presets(),
        Commands::ValidateWebhook(args) => commands::validate::execute(args),
        Commands::Run(args) => commands::run::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
