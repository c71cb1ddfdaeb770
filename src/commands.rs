//! Slash-command parsing for the chat loop. Anything that is not a command
//! is processed as a regular chat message.

use chrono::Utc;

use crate::core::analytics::compute_analytics;
use crate::core::app::App;
use crate::core::export::{export_session, ExportFormat};
use crate::core::message::Turn;
use crate::core::persona::{builtin_personas, find_persona};
use crate::core::template::{builtin_templates, find_template, placeholders};

pub enum CommandResult {
    Continue,
    ProcessAsMessage(String),
    Quit,
}

const HELP_TEXT: &str = "\
Commands:
  /new                    Start a new session
  /sessions               List sessions
  /switch <name>          Switch to a session
  /delete <name>          Delete a session (not the active one, must be non-empty)
  /export <md|json|html> [path]  Export the current session
  /search <query>         Search across all sessions
  /stats                  Show statistics across all sessions
  /persona [id]           Show or switch the active persona
  /template [id]          List prompt templates, or load one into the input
  /attach <path>          Attach an image to the next message
  /log [file]             Enable transcript logging, or toggle pause/resume
  /quit                   Exit";

pub fn process_input(app: &mut App, input: &str) -> CommandResult {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return CommandResult::ProcessAsMessage(input.to_string());
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let command = parts.next().unwrap_or_default();
    let rest = parts.next().unwrap_or("").trim();

    match command {
        "/help" => {
            app.append_banner(Turn::app_info(HELP_TEXT));
        }
        "/quit" | "/exit" => return CommandResult::Quit,
        "/new" => {
            let name = app.store.create_session();
            app.append_banner(Turn::app_info(format!("Started {name}")));
        }
        "/sessions" => {
            let current = app.store.current_name().to_string();
            let listing: Vec<String> = app
                .store
                .sessions()
                .map(|s| {
                    let marker = if s.name == current { "*" } else { " " };
                    format!("{marker} {} ({} turns)", s.name, s.conversation_len())
                })
                .collect();
            app.append_banner(Turn::app_info(format!("Sessions:\n{}", listing.join("\n"))));
        }
        "/switch" | "/session" => {
            if rest.is_empty() {
                app.append_banner(Turn::app_error("Usage: /switch <session name>"));
            } else if app.store.select_session(rest) {
                app.append_banner(Turn::app_info(format!("Switched to {rest}")));
            } else {
                app.append_banner(Turn::app_error(format!("No session named '{rest}'")));
            }
        }
        "/delete" => {
            if rest.is_empty() {
                app.append_banner(Turn::app_error("Usage: /delete <session name>"));
            } else if app.store.delete_session(rest) {
                app.append_banner(Turn::app_info(format!("Deleted {rest}")));
            } else {
                app.append_banner(Turn::app_error(format!(
                    "Cannot delete '{rest}': it must exist, be non-empty, and not be the active session"
                )));
            }
        }
        "/export" => return export_command(app, rest),
        "/search" => {
            if rest.is_empty() {
                app.append_banner(Turn::app_error("Usage: /search <query>"));
            } else {
                let hits = app.store.search(rest);
                if hits.is_empty() {
                    app.append_banner(Turn::app_info(format!("No matches for '{rest}'")));
                } else {
                    let listing: Vec<String> = hits
                        .iter()
                        .map(|h| {
                            format!("[{}] #{} {}: {}", h.session, h.turn_index, h.role.as_str(), h.snippet)
                        })
                        .collect();
                    app.append_banner(Turn::app_info(format!(
                        "{} match(es):\n{}",
                        hits.len(),
                        listing.join("\n")
                    )));
                }
            }
        }
        "/stats" => {
            let summary = compute_analytics(&app.store).summary();
            app.append_banner(Turn::app_info(summary));
        }
        "/template" | "/templates" => {
            if rest.is_empty() {
                let listing: Vec<String> = builtin_templates()
                    .iter()
                    .map(|t| format!("  {:<12} {} [{}]", t.id, t.title, t.category))
                    .collect();
                app.append_banner(Turn::app_info(format!(
                    "Templates (use /template <id> to load one):\n{}",
                    listing.join("\n")
                )));
            } else {
                match find_template(rest) {
                    Some(template) => {
                        app.input = template.template.to_string();
                        let fields = placeholders(template.template);
                        app.append_banner(Turn::app_info(format!(
                            "Loaded '{}' into the input; fill in: {}",
                            template.title,
                            fields.join(", ")
                        )));
                    }
                    None => {
                        app.append_banner(Turn::app_error(format!(
                            "No template named '{rest}' (try /template)"
                        )));
                    }
                }
            }
        }
        "/persona" => {
            if rest.is_empty() {
                let listing: Vec<String> = builtin_personas()
                    .iter()
                    .map(|p| {
                        let marker = if p.id == app.persona.id { "*" } else { " " };
                        format!("{marker} {} — {}", p.id, p.description)
                    })
                    .collect();
                app.append_banner(Turn::app_info(format!(
                    "Active persona: {}\n{}",
                    app.persona.display_name,
                    listing.join("\n")
                )));
            } else {
                match find_persona(rest) {
                    Some(persona) => {
                        app.append_banner(Turn::app_info(format!(
                            "Persona switched to {}",
                            persona.display_name
                        )));
                        app.persona = persona;
                    }
                    None => {
                        app.append_banner(Turn::app_error(format!("No persona named '{rest}'")));
                    }
                }
            }
        }
        "/attach" => {
            if rest.is_empty() {
                app.append_banner(Turn::app_error("Usage: /attach <image path>"));
            } else {
                match app.attach_image(rest) {
                    Ok(name) => app.append_banner(Turn::app_info(format!(
                        "Attached {name}; it will be sent with your next message"
                    ))),
                    Err(e) => {
                        app.append_banner(Turn::app_error(format!("Could not attach '{rest}': {e}")))
                    }
                }
            }
        }
        "/log" => {
            let result = if rest.is_empty() {
                app.logging.toggle_logging()
            } else {
                app.logging.set_log_file(rest.to_string())
            };
            match result {
                Ok(message) => app.append_banner(Turn::app_info(message)),
                Err(e) => app.append_banner(Turn::app_error(format!("Logging error: {e}"))),
            }
        }
        other => {
            app.append_banner(Turn::app_error(format!(
                "Unknown command: {other} (try /help)"
            )));
        }
    }

    CommandResult::Continue
}

fn export_command(app: &mut App, rest: &str) -> CommandResult {
    let mut parts = rest.split_whitespace();
    let format = parts.next().and_then(ExportFormat::from_str);
    let Some(format) = format else {
        app.append_banner(Turn::app_error("Usage: /export <md|json|html> [path]"));
        return CommandResult::Continue;
    };

    let path = parts.next().map(str::to_string).unwrap_or_else(|| {
        format!(
            "hexaloy-export-{}.{}",
            Utc::now().format("%Y%m%d-%H%M%S"),
            format.extension()
        )
    });

    let contents = export_session(app.store.current(), format, Utc::now());
    match std::fs::write(&path, contents) {
        Ok(()) => app.append_banner(Turn::app_info(format!("Exported session to {path}"))),
        Err(e) => app.append_banner(Turn::app_error(format!("Export failed: {e}"))),
    }
    CommandResult::Continue
}
