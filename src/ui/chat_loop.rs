//! Interactive terminal event loop.
//!
//! One iteration = draw, poll for a key or mouse event, drain stream frames.
//! All state changes go through [`App`] handlers; this module only wires the
//! terminal and the stream service together.

use std::error::Error;
use std::io;
use std::time::Duration;

use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;

use crate::commands::{process_input, CommandResult};
use crate::core::app::{App, StreamOutcome, SubmitOutcome};
use crate::core::chat_stream::{ChatStreamService, StreamMessage, StreamParams};
use crate::core::message::Turn;
use crate::ui::render::{build_display_lines, title_line};

/// Rows taken by the input box (border + one text row + border).
const INPUT_AREA_HEIGHT: u16 = 3;

pub async fn run_chat(mut app: App) -> Result<(), Box<dyn Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (service, mut rx) = ChatStreamService::new();
    let result = event_loop(&mut terminal, &mut app, &service, &mut rx).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    service: &ChatStreamService,
    rx: &mut mpsc::UnboundedReceiver<(StreamMessage, u64)>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| draw(f, app))?;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(());
                    }
                    KeyCode::Enter => {
                        if app.input.trim().is_empty() {
                            continue;
                        }
                        match handle_enter(app) {
                            EnterAction::Quit => return Ok(()),
                            EnterAction::Dispatch(params) => service.spawn_request(params),
                            EnterAction::Handled => {}
                        }
                        app.auto_scroll = true;
                    }
                    KeyCode::Char(c) => app.input.push(c),
                    KeyCode::Backspace => {
                        app.input.pop();
                    }
                    KeyCode::Up => scroll_up(terminal, app, 1),
                    KeyCode::Down => scroll_down(terminal, app, 1),
                    _ => {}
                },
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollUp => scroll_up(terminal, app, 3),
                    MouseEventKind::ScrollDown => scroll_down(terminal, app, 3),
                    _ => {}
                },
                _ => {}
            }
        }

        // Drain all pending stream frames before the next draw.
        while let Ok((message, stream_id)) = rx.try_recv() {
            match app.handle_stream_event(message, stream_id) {
                StreamOutcome::Fallback(params) => service.spawn_request(params),
                StreamOutcome::Updated => {
                    if app.auto_scroll {
                        snap_to_bottom(terminal, app);
                    }
                }
                StreamOutcome::Completed | StreamOutcome::Ignored => {}
            }
        }
    }
}

/// What the event loop should do with one submitted input line.
enum EnterAction {
    Quit,
    Dispatch(StreamParams),
    Handled,
}

/// Process one submitted input line. A message rejected because a generation
/// is already in flight is restored to the input buffer, so pressing Enter
/// mid-generation never loses what the user typed.
fn handle_enter(app: &mut App) -> EnterAction {
    let input = std::mem::take(&mut app.input);
    match process_input(app, &input) {
        CommandResult::Quit => EnterAction::Quit,
        CommandResult::Continue => EnterAction::Handled,
        CommandResult::ProcessAsMessage(text) => match app.submit_message(text) {
            SubmitOutcome::Dispatch(params) => EnterAction::Dispatch(params),
            SubmitOutcome::ImageAppended => EnterAction::Handled,
            SubmitOutcome::Busy(text) => {
                app.append_banner(Turn::app_warning(
                    "Still generating; wait for the current response",
                ));
                app.input = text;
                EnterAction::Handled
            }
        },
    }
}

fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(INPUT_AREA_HEIGHT)])
        .split(f.area());

    let lines = build_display_lines(app);
    let available_height = chunks[0].height.saturating_sub(1);
    let total_lines = lines.len() as u16;
    let max_offset = total_lines.saturating_sub(available_height);
    let scroll_offset = if app.auto_scroll {
        max_offset
    } else {
        app.scroll_offset.min(max_offset)
    };

    let transcript = Paragraph::new(lines)
        .block(Block::default().title(title_line(app)))
        .wrap(Wrap { trim: true })
        .scroll((scroll_offset, 0));
    f.render_widget(transcript, chunks[0]);

    let input_title = if app.is_awaiting() {
        "Generating… (Ctrl+C to quit)"
    } else {
        "Ask Hexaloy anything (Enter to send, /help for commands)"
    };
    let input = Paragraph::new(app.input.as_str())
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title(input_title))
        .wrap(Wrap { trim: true });
    f.render_widget(input, chunks[1]);

    f.set_cursor_position((
        chunks[1].x + 1 + input_cursor_col(&app.input, chunks[1].width),
        chunks[1].y + 1,
    ));
}

/// Cursor column inside the input box: a char count (byte length misplaces
/// the cursor on multibyte input) clamped to the drawable width.
fn input_cursor_col(input: &str, area_width: u16) -> u16 {
    let max = usize::from(area_width.saturating_sub(2));
    input.chars().count().min(max) as u16
}

fn available_transcript_height(
    terminal: &Terminal<CrosstermBackend<io::Stdout>>,
) -> u16 {
    let terminal_height = terminal.size().map(|s| s.height).unwrap_or_default();
    terminal_height
        .saturating_sub(INPUT_AREA_HEIGHT)
        .saturating_sub(1)
}

fn max_scroll_offset(terminal: &Terminal<CrosstermBackend<io::Stdout>>, app: &App) -> u16 {
    let total_lines = build_display_lines(app).len() as u16;
    total_lines.saturating_sub(available_transcript_height(terminal))
}

fn scroll_up(terminal: &Terminal<CrosstermBackend<io::Stdout>>, app: &mut App, step: u16) {
    if app.auto_scroll {
        app.scroll_offset = max_scroll_offset(terminal, app);
    }
    app.auto_scroll = false;
    app.scroll_offset = app.scroll_offset.saturating_sub(step);
}

fn scroll_down(terminal: &Terminal<CrosstermBackend<io::Stdout>>, app: &mut App, step: u16) {
    let max_scroll = max_scroll_offset(terminal, app);
    app.scroll_offset = app.scroll_offset.saturating_add(step).min(max_scroll);
    if app.scroll_offset >= max_scroll {
        app.auto_scroll = true;
    }
}

fn snap_to_bottom(terminal: &Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) {
    app.scroll_offset = max_scroll_offset(terminal, app);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::core::engine::{find_engine, ResolvedEngine};
    use crate::core::message::TurnRole;
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
    fn rejected_submission_restores_the_input() {
        let mut app = test_app();
        app.input = "first question".into();
        assert!(matches!(handle_enter(&mut app), EnterAction::Dispatch(_)));
        assert!(app.input.is_empty());

        app.input = "second question".into();
        assert!(matches!(handle_enter(&mut app), EnterAction::Handled));
        assert_eq!(app.input, "second question");
        let last = app.store.current().turns.last().unwrap();
        assert_eq!(last.role, TurnRole::AppWarning);
    }

    #[test]
    fn quit_command_stops_the_loop() {
        let mut app = test_app();
        app.input = "/quit".into();
        assert!(matches!(handle_enter(&mut app), EnterAction::Quit));
    }

    #[test]
    fn cursor_column_counts_chars_and_clamps() {
        assert_eq!(input_cursor_col("héllo", 80), 5);
        assert_eq!(input_cursor_col("", 80), 0);
        assert_eq!(input_cursor_col(&"x".repeat(500), 20), 18);
    }
}
