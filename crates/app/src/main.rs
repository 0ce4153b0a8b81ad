//! Deskhand CLI shell.
//!
//! A headless front end over the agent core: reads user messages from
//! stdin, runs one cycle per submission, and prints the transcript and
//! action log as they grow. Slash commands cover the history and
//! attachment features the session exposes.

use agent_host::{ExportFormat, Session, SessionError};
use anyhow::Result;
use executors::HeadlessDesktop;
use providers::AnthropicClient;
use shared::settings::AppSettings;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
Commands:
  /history            show the persisted conversation history
  /clear              clear the conversation history
  /export <path>      export history (.json = structured, else text)
  /screenshot         capture the screen for the next message
  /page               attach the current page's text to the next message
  /stop               emergency stop: halt future automation actions
  /resume             re-arm automation after an emergency stop
  /log                show the action log
  /help               show this help
  /quit               exit
Anything else is sent to the assistant.";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let settings = AppSettings::from_env();
    if let Err(e) = settings.validate() {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let gateway = match AnthropicClient::from_settings(&settings) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let mut session = Session::new(&settings, Box::new(gateway), Box::new(HeadlessDesktop))?;

    println!("Deskhand ready. {} messages of history loaded.", session.history().len());
    println!("Type /help for commands.");

    let stdin = io::stdin();
    let mut printed_transcript = session.transcript().len();
    let mut printed_log = 0usize;

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            "/quit" | "/exit" => break,
            "/help" => println!("{}", HELP),
            "/history" => {
                println!("{}", session.history().context_snippet());
            }
            "/clear" => {
                session.history_mut().clear();
                println!("Conversation history cleared.");
            }
            "/screenshot" => match session.capture_screen() {
                Ok(()) => println!("Screenshot armed for the next message."),
                Err(e) => println!("Screenshot failed: {}", e),
            },
            "/page" => match session.attach_page_text() {
                Ok(()) => println!("Page content armed for the next message."),
                Err(e) => println!("Could not attach page content: {}", e),
            },
            "/stop" => {
                session.emergency_stop();
                println!("Automation halted.");
            }
            "/resume" => {
                session.resume_automation();
                println!("Automation re-armed.");
            }
            "/log" => {
                for entry in session.action_log().entries() {
                    println!("{}", entry.display_line());
                }
            }
            _ if input.starts_with("/export") => {
                let path = input
                    .strip_prefix("/export")
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(PathBuf::from);
                match path {
                    Some(path) => {
                        let format = ExportFormat::from_path(&path);
                        match session.history().export(&path, format) {
                            Ok(()) => println!("History exported to: {}", path.display()),
                            Err(e) => println!("Export failed: {}", e),
                        }
                    }
                    None => println!("Usage: /export <path>"),
                }
            }
            _ if input.starts_with('/') => {
                println!("Unknown command: {} (try /help)", input);
            }
            message => {
                match session.submit(message).await {
                    Ok(_) | Err(SessionError::Gateway(_)) => {
                        // Both paths leave their record in the transcript.
                    }
                    Err(e) => {
                        error!(error = %e, "submission rejected");
                        println!("Error: {}", e);
                    }
                }
                print_new_output(&session, &mut printed_transcript, &mut printed_log);
            }
        }
    }

    println!("Goodbye.");
    Ok(())
}

/// Print transcript and action-log entries added since the last call.
fn print_new_output(session: &Session, printed_transcript: &mut usize, printed_log: &mut usize) {
    let entries = session.transcript().entries();
    for entry in &entries[*printed_transcript..] {
        let marker = if entry.has_attachment { " [attachment]" } else { "" };
        println!(
            "[{}] {}:{} {}",
            entry.timestamp.format("%H:%M:%S"),
            entry.sender.display_name(),
            marker,
            entry.message
        );
    }
    *printed_transcript = entries.len();

    let log: Vec<_> = session.action_log().entries().collect();
    for entry in &log[(*printed_log).min(log.len())..] {
        println!("  {}", entry.display_line());
    }
    *printed_log = log.len();
}
