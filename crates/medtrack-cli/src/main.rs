use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "medtrack", version, about = "MedTrack CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Medication catalogue management
    Catalog {
        #[command(subcommand)]
        action: commands::catalog::CatalogAction,
    },
    /// Dose scheduling and the dose ledger
    Dose {
        #[command(subcommand)]
        action: commands::dose::DoseAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print the application disclaimer
    About,
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Catalog { action } => commands::catalog::run(action),
        Commands::Dose { action } => commands::dose::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::About => {
            println!("{}", medtrack_core::catalog::DISCLAIMER);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
