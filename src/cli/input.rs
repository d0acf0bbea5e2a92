//! Parsing of interactive kiosk commands typed on stdin.

use std::io::BufRead;
use std::path::PathBuf;

use photobooth_kiosk::kiosk::Command;
use tokio::sync::mpsc::UnboundedSender;

pub const HELP: &str = "Commands: capture | upload [path] | select <id> | retake | print | quit";

/// Parse one input line. `Ok(None)` for a blank line.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "capture" | "c" | "snap" => Command::Capture,
        "upload" | "u" => {
            Command::Upload((!rest.is_empty()).then(|| PathBuf::from(rest)))
        }
        "select" | "s" => {
            if rest.is_empty() {
                return Err("Usage: select <character-id>".to_string());
            }
            Command::Select(rest.to_string())
        }
        "retake" | "r" => Command::Retake,
        "print" | "p" => Command::Print,
        "quit" | "q" | "exit" => Command::Quit,
        other => return Err(format!("Unknown command '{}'. {}", other, HELP)),
    };

    Ok(Some(command))
}

/// Forward parsed lines from `reader` until `quit`, end of input, or the
/// kiosk going away. Never reads again after sending `Quit`.
pub fn forward_commands<R: BufRead>(reader: R, commands: UnboundedSender<Command>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::error!("Failed to read stdin: {}", e);
                break;
            }
        };

        match parse_command(&line) {
            Ok(Some(command)) => {
                let quit = command == Command::Quit;
                if commands.send(command).is_err() || quit {
                    return;
                }
            }
            Ok(None) => {}
            Err(e) => eprintln!("{}", e),
        }
    }

    let _ = commands.send(Command::Quit);
}
