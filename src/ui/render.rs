//! Transcript rendering: turns become styled lines for the chat pane.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::core::app::App;
use crate::core::message::TurnRole;

/// Build the full transcript for the current session, including the
/// response currently being streamed.
pub fn build_display_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for turn in &app.store.current().turns {
        match turn.role {
            TurnRole::User => {
                lines.push(Line::from(vec![
                    Span::styled(
                        "You: ",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(turn.content.clone(), Style::default().fg(Color::Cyan)),
                ]));
                lines.push(Line::from(""));
            }
            TurnRole::Assistant => {
                push_content_lines(&mut lines, &turn.content, Style::default().fg(Color::White));
                lines.push(Line::from(""));
            }
            TurnRole::AppInfo => {
                push_content_lines(&mut lines, &turn.content, Style::default().fg(Color::DarkGray));
                lines.push(Line::from(""));
            }
            TurnRole::AppWarning => {
                push_content_lines(&mut lines, &turn.content, Style::default().fg(Color::Yellow));
                lines.push(Line::from(""));
            }
            TurnRole::AppError => {
                push_content_lines(&mut lines, &turn.content, Style::default().fg(Color::Red));
                lines.push(Line::from(""));
            }
        }
    }

    if let Some(pending) = app.pending_response() {
        if pending.is_empty() {
            lines.push(Line::from(Span::styled(
                "…",
                Style::default().fg(Color::DarkGray),
            )));
        } else {
            push_content_lines(&mut lines, pending, Style::default().fg(Color::White));
        }
        lines.push(Line::from(""));
    }

    lines
}

fn push_content_lines(lines: &mut Vec<Line<'static>>, content: &str, style: Style) {
    for content_line in content.lines() {
        if content_line.trim().is_empty() {
            lines.push(Line::from(""));
        } else {
            lines.push(Line::from(Span::styled(content_line.to_string(), style)));
        }
    }
}

/// Title shown above the transcript: session name, engine, persona.
pub fn title_line(app: &App) -> String {
    format!(
        "HEXALOY — {} [{} · {}]",
        app.store.current_name(),
        app.primary.engine.display_name,
        app.persona.display_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::core::engine::{find_engine, ResolvedEngine};
    use crate::core::message::Turn;
    use crate::core::persona::default_persona;
    use crate::utils::logging::LoggingState;

    fn test_app() -> App {
        let engine = find_engine("gemini").unwrap();
        let model = engine.model.to_string();
        App::new(
            ResolvedEngine {
                engine,
                api_key: "k".into(),
                model,
            },
            None,
            default_persona(),
            Config::default(),
            LoggingState::new(None),
        )
    }

    #[test]
    fn user_turns_get_a_prefix_and_spacing() {
        let mut app = test_app();
        app.store.append_to_current(Turn::user("hello"));
        let lines = build_display_lines(&app);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans[0].content, "You: ");
        assert_eq!(lines[0].spans[1].content, "hello");
    }

    #[test]
    fn multiline_assistant_turns_expand_to_lines() {
        let mut app = test_app();
        app.store
            .append_to_current(Turn::assistant("first\n\nsecond"));
        let lines = build_display_lines(&app);
        // three content lines plus trailing spacer
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn title_names_session_and_engine() {
        let app = test_app();
        let title = title_line(&app);
        assert!(title.contains("Session 1"));
        assert!(title.contains("Google Gemini"));
        assert!(title.contains("HEXALOY"));
    }
}
