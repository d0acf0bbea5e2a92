mod cli;

use clap::Parser;
use cli::{Args, Command};
use photobooth_kiosk::config::Config;
use std::future::Future;

/// Load the .env file without overriding variables already set.
fn load_env() {
    // dotenv::dotenv() returns Err if .env doesn't exist, which is fine
    let _ = dotenv::dotenv();
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

/// Drive `task` to completion on a single-threaded runtime.
fn block_on<F: Future<Output = Result<(), String>>>(task: F) -> Result<(), String> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to create async runtime: {}", e))?;
    rt.block_on(task)
}

fn main() {
    load_env();
    init_logging();

    let args = Args::parse();

    // An explicit --config must load; the default path may be absent.
    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) if args.config.is_some() => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Warning: Failed to load config file: {}", e);
            eprintln!("Using default settings.\n");
            Config::default()
        }
    };
    let server = args.server.as_deref();

    let result = match args.command.unwrap_or(Command::Run) {
        Command::Run => block_on(cli::run_kiosk(&config, server)),
        Command::Swap { photo, character } => {
            block_on(cli::run_swap(&config, server, &photo, &character))
        }
        Command::Status { prediction_id } => {
            block_on(cli::run_status(&config, server, &prediction_id))
        }
        Command::Characters => {
            cli::list_characters(&config);
            Ok(())
        }
        Command::Health => block_on(cli::run_health(&config, server)),
        Command::Config { action } => {
            cli::handle_config_action(action, &config, args.config.as_ref())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
