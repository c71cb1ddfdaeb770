//! Transcript export: render a session as Markdown, pretty JSON, or a
//! standalone HTML page.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::message::TurnRole;
use crate::core::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Markdown,
    Json,
    Html,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "md" | "markdown" => Some(ExportFormat::Markdown),
            "json" => Some(ExportFormat::Json),
            "html" => Some(ExportFormat::Html),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Json => "json",
            ExportFormat::Html => "html",
        }
    }
}

#[derive(Serialize)]
struct ExportedTurn<'a> {
    role: &'a str,
    content: &'a str,
    timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
struct ExportedSession<'a> {
    session_name: &'a str,
    exported_at: DateTime<Utc>,
    message_count: usize,
    messages: Vec<ExportedTurn<'a>>,
}

/// Render the session in the requested format. Only user/assistant turns
/// are exported; app banners are transient UI state.
pub fn export_session(session: &Session, format: ExportFormat, now: DateTime<Utc>) -> String {
    match format {
        ExportFormat::Markdown => export_markdown(session, now),
        ExportFormat::Json => export_json(session, now),
        ExportFormat::Html => export_html(session, now),
    }
}

fn export_markdown(session: &Session, now: DateTime<Utc>) -> String {
    let turns: Vec<_> = session.turns.iter().filter(|t| t.is_conversation()).collect();
    let mut lines = vec![
        "# HEXALOY — Chat Export".to_string(),
        String::new(),
        format!("**Session:** {}", session.name),
        format!("**Exported:** {}", now.format("%B %d, %Y at %H:%M UTC")),
        format!("**Messages:** {}", turns.len()),
        String::new(),
        "---".to_string(),
        String::new(),
    ];

    for turn in &turns {
        let heading = match turn.role {
            TurnRole::User => "### You",
            _ => "### HEXALOY",
        };
        lines.push(format!(
            "{heading} · {}",
            turn.timestamp.format("%Y-%m-%d %H:%M")
        ));
        lines.push(String::new());
        lines.push(turn.content.clone());
        lines.push(String::new());
        lines.push("---".to_string());
        lines.push(String::new());
    }

    lines.join("\n")
}

fn export_json(session: &Session, now: DateTime<Utc>) -> String {
    let messages: Vec<ExportedTurn> = session
        .turns
        .iter()
        .filter(|t| t.is_conversation())
        .map(|t| ExportedTurn {
            role: t.role.as_str(),
            content: &t.content,
            timestamp: t.timestamp,
        })
        .collect();

    let exported = ExportedSession {
        session_name: &session.name,
        exported_at: now,
        message_count: messages.len(),
        messages,
    };

    serde_json::to_string_pretty(&exported).unwrap_or_else(|_| "{}".to_string())
}

fn export_html(session: &Session, now: DateTime<Utc>) -> String {
    let turns: Vec<_> = session.turns.iter().filter(|t| t.is_conversation()).collect();
    let mut body = String::new();
    for turn in &turns {
        let (label, class) = match turn.role {
            TurnRole::User => ("You", "user"),
            _ => ("HEXALOY", "assistant"),
        };
        body.push_str(&format!(
            "    <div class=\"turn {class}\">\n      <div class=\"who\">{label} \
             <span class=\"ts\">{ts}</span></div>\n      <div class=\"body\">{content}</div>\n    </div>\n",
            ts = turn.timestamp.format("%Y-%m-%d %H:%M"),
            content = escape_html(&turn.content),
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width,initial-scale=1.0">
  <title>HEXALOY Chat Export — {name}</title>
  <style>
    body {{ font-family: sans-serif; background: #f0f4ff; color: #0d1b4b; margin: 0; }}
    .container {{ max-width: 820px; margin: 0 auto; padding: 40px 20px; }}
    .header {{ text-align: center; padding: 24px; background: #fff; border-radius: 12px; border: 1px solid #e8eeff; }}
    .header h1 {{ margin: 0 0 8px; font-size: 1.6rem; }}
    .meta {{ color: #7a8bb0; font-size: 0.85rem; }}
    .turn {{ border: 1px solid #e2e8f0; border-radius: 12px; padding: 16px 20px; margin-top: 14px; }}
    .turn.user {{ background: #eef2ff; border-color: #c7d7ff; }}
    .turn.assistant {{ background: #fff; }}
    .who {{ font-weight: 700; margin-bottom: 6px; }}
    .ts {{ font-weight: 400; font-size: 0.75rem; color: #7a8bb0; margin-left: 8px; }}
    .body {{ line-height: 1.6; white-space: pre-wrap; }}
  </style>
</head>
<body>
  <div class="container">
    <div class="header">
      <h1>HEXALOY Chat Export</h1>
      <div class="meta">Session: <strong>{name}</strong> · {count} messages · {date}</div>
    </div>
{body}  </div>
</body>
</html>
"#,
        name = escape_html(&session.name),
        count = turns.len(),
        date = now.format("%B %d, %Y"),
        body = body,
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
