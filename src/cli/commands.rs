//! Subcommand handlers.

use std::path::{Path, PathBuf};

use photobooth_kiosk::camera::{file_to_capture, CaptureManager, FfmpegCamera};
use photobooth_kiosk::config::{default_path, Config, DEFAULT_CONFIG_TOML};
use photobooth_kiosk::kiosk::{Command, Kiosk};
use photobooth_kiosk::selection::{CharacterId, SelectionController};
use photobooth_kiosk::swap::{
    JobUpdate, SwapClient, SwapError, SwapOrchestrator, TokioSleeper, SERVER_URL_ENV,
};
use reqwest::Url;
use tokio::sync::mpsc;

use super::args::ConfigAction;
use super::input::{forward_commands, HELP};
use super::surface::TerminalSurface;

/// `--server` beats `PHOTOBOOTH_SERVER_URL`, which beats the config file.
fn server_url(config: &Config, server: Option<&str>) -> String {
    server
        .map(str::to_string)
        .unwrap_or_else(|| config.server_url())
}

fn build_client(config: &Config, server: Option<&str>) -> Result<SwapClient, String> {
    let url = server_url(config, server);
    SwapClient::with_timeout(&url, config.request_timeout()).map_err(|e| match e {
        SwapError::InvalidUrl(_) => format!(
            "{}\n\nSet a valid service URL with --server, {} or [server] base_url.",
            e, SERVER_URL_ENV
        ),
        _ => format!("Failed to create service client: {}", e),
    })
}

/// Run the interactive kiosk until `quit` or Ctrl+C.
pub async fn run_kiosk(config: &Config, server: Option<&str>) -> Result<(), String> {
    let client = build_client(config, server)?;
    let origin = match &config.server.origin {
        Some(origin) => {
            Url::parse(origin).map_err(|e| format!("Invalid [server] origin '{}': {}", origin, e))?
        }
        None => client.base_url().clone(),
    };

    let camera = CaptureManager::new(FfmpegCamera::new(config.ffmpeg_settings())).with_origin(origin);
    let swapper = SwapOrchestrator::new(client, TokioSleeper, config.poll_settings());
    let selection = SelectionController::new(config.catalog(), config.debounce());

    let mut kiosk = Kiosk::new(camera, swapper, selection)
        .with_printer(config.printer())
        .with_cache(config.result_cache(), config.cache.max_size_mb);

    let (tx, rx) = mpsc::unbounded_channel();

    let stdin_tx = tx.clone();
    // Detached: the process exits without waiting for a read that may never return.
    std::thread::spawn(move || forward_commands(std::io::stdin().lock(), stdin_tx));

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\nShutting down...");
            let _ = tx.send(Command::Quit);
        }
    });

    println!("{}", HELP);
    let mut surface = TerminalSurface::default();
    kiosk.run(rx, &mut surface).await;
    println!("Goodbye.");
    Ok(())
}

/// Headless swap of a photo file.
pub async fn run_swap(
    config: &Config,
    server: Option<&str>,
    photo: &Path,
    character: &str,
) -> Result<(), String> {
    let catalog = config.catalog();
    if !catalog.contains(character) {
        return Err(format!(
            "Unknown character '{}'. Run `photobooth-kiosk characters` to list them.",
            character
        ));
    }

    let capture = file_to_capture(photo).map_err(|e| e.to_string())?;
    let client = build_client(config, server)?;
    let swapper = SwapOrchestrator::new(client, TokioSleeper, config.poll_settings());
    let character = CharacterId::new(character);

    println!("Swapping {} onto {}", photo.display(), character);
    let mut last_message = "";
    let result_url = swapper
        .perform_face_swap(Some(&capture), Some(&character), |progress| {
            let message = progress.message();
            if message != last_message {
                println!("  {}", message);
                last_message = message;
            }
        })
        .await
        .map_err(|e| e.to_string())?;

    println!();
    println!("Result: {}", result_url);
    Ok(())
}

pub async fn run_status(config: &Config, server: Option<&str>, prediction_id: &str) -> Result<(), String> {
    let client = build_client(config, server)?;
    match client.status(prediction_id).await.map_err(|e| e.to_string())? {
        JobUpdate::Pending { status } => println!("{}: {}", prediction_id, status),
        JobUpdate::Succeeded { result_url } => {
            println!("{}: succeeded", prediction_id);
            println!("Result: {}", result_url);
        }
        JobUpdate::Failed { error } => {
            println!(
                "{}: failed ({})",
                prediction_id,
                error.as_deref().unwrap_or("no error message")
            );
        }
    }
    Ok(())
}

pub async fn run_health(config: &Config, server: Option<&str>) -> Result<(), String> {
    let client = build_client(config, server)?;
    let report = client
        .health()
        .await
        .map_err(|e| format!("Service at {} is not healthy: {}", client.base_url(), e))?;
    println!("Service at {} is up.", client.base_url());
    println!(
        "{}",
        serde_json::to_string_pretty(&report).unwrap_or_else(|_| report.to_string())
    );
    Ok(())
}

pub fn list_characters(config: &Config) {
    println!("Available characters:");
    for character in config.catalog().iter() {
        println!("  {:<28} {}", character.id, character.name);
    }
}

/// Handle config subcommand actions.
pub fn handle_config_action(
    action: ConfigAction,
    config: &Config,
    config_path: Option<&PathBuf>,
) -> Result<(), String> {
    let path = config_path.cloned().unwrap_or_else(default_path);

    match action {
        ConfigAction::Show => {
            let poll = config.poll_settings();
            println!("Current configuration:");
            println!("  Server: {}", config.server_url());
            println!(
                "  Origin: {}",
                config.server.origin.as_deref().unwrap_or("(server URL)")
            );
            println!(
                "  Poll: every {:?}, up to {} times",
                poll.interval, poll.max_attempts
            );
            println!("  Debounce: {:?}", config.debounce());
            let ffmpeg = config.ffmpeg_settings();
            println!(
                "  Camera: {} -f {} -i {}",
                ffmpeg.ffmpeg, ffmpeg.input_format, ffmpeg.device
            );
            println!("  Print command: {}", config.printer().command());
            let cache = config.result_cache();
            let used_mb = cache.total_size_bytes().unwrap_or(0) as f64 / (1024.0 * 1024.0);
            println!(
                "  Result cache: {} ({:.1} of {} MB used)",
                cache.cache_dir().display(),
                used_mb,
                config.cache.max_size_mb
            );
            println!("  Characters: {}", config.catalog().len());
            println!();

            if path.exists() {
                println!("Config file: {} (exists)", path.display());
            } else {
                println!("Config file: {} (not found)", path.display());
            }
            Ok(())
        }
        ConfigAction::Init => {
            if path.exists() {
                return Err(format!(
                    "Config file already exists: {}\nUse 'photobooth-kiosk config show' to view current settings.",
                    path.display()
                ));
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("Error creating config directory: {}", e))?;
            }

            std::fs::write(&path, DEFAULT_CONFIG_TOML)
                .map_err(|e| format!("Error writing config file: {}", e))?;

            println!("Created config file: {}", path.display());
            Ok(())
        }
    }
}
