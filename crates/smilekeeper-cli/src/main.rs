use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "smilekeeper-cli", version, about = "Smilekeeper CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Replay a smile-ratio trace deterministically
    Simulate(commands::simulate::SimulateArgs),
    /// Run an interactive session fed from stdin
    Run(commands::run::RunArgs),
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Config { action } => commands::config::run(action),
        Commands::Simulate(args) => commands::simulate::run(args),
        Commands::Run(args) => commands::run::run(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
