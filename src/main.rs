use clap::Parser;
use std::sync::Arc;
use symdex::Settings;
use symdex::cli::commands::{index, init, retrieve};
use symdex::cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let mut config = Settings::load().unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        eprintln!("Using default configuration");
        Settings::default()
    });
    config.index_path = match &cli.index_path {
        Some(index_path) => index_path.clone(),
        None => config.index_dir(),
    };

    symdex::logging::init_with_config(&config.logging);
    symdex::debug_event!("cli", "settings", "index at {}", config.index_path.display());

    let index_path = config.index_path.clone();
    let result = match cli.command {
        Commands::Init { force } => init::run_init(force),
        Commands::Config => init::run_config(&config),
        Commands::Index { files, force } => index::run_index(&config, &index_path, &files, force),
        Commands::IndexDocs { dir, threads } => {
            index::run_index_docs(Arc::new(config), &index_path, &dir, threads)
        }
        Commands::Retrieve { query } => retrieve::run_retrieve(&index_path, query),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
