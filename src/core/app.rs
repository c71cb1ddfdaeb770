//! Application state and the single control path between one user action
//! and its resulting transcript append.
//!
//! Every UI event becomes exactly one state transition here: submit a
//! message, apply a stream event, switch or delete a session. The session
//! store is append-only; a streaming response accumulates in [`App`] and is
//! appended as one assistant turn only when the stream ends successfully,
//! so a failed generation never leaves a partial turn behind.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::ChatMessage;
use crate::core::chat_stream::{StreamMessage, StreamParams};
use crate::core::config::Config;
use crate::core::engine::ResolvedEngine;
use crate::core::image::{build_image_url, enhance_prompt, image_markdown, PromptBoost};
use crate::core::message::Turn;
use crate::core::persona::Persona;
use crate::core::router::{classify, Route};
use crate::core::session::SessionStore;
use crate::utils::logging::LoggingState;

/// An image file staged for the next message, sent as a base64 data URL.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub data_url: String,
}

struct InFlight {
    stream_id: u64,
    messages: Vec<ChatMessage>,
    has_attachment: bool,
    fallback_attempted: bool,
    cancel_token: CancellationToken,
}

/// What the chat loop should do after feeding a stream event into the app.
pub enum StreamOutcome {
    /// Frame belonged to a superseded stream; nothing changed.
    Ignored,
    /// Pending response text grew; redraw.
    Updated,
    /// The exchange is over (success or surfaced failure).
    Completed,
    /// Primary engine failed before producing output; dispatch this request
    /// against the fallback engine.
    Fallback(StreamParams),
}

/// What happened to a submitted message.
pub enum SubmitOutcome {
    /// Image request handled synchronously; the transcript already holds the
    /// assistant turn.
    ImageAppended,
    /// Text request; dispatch this completion request.
    Dispatch(StreamParams),
    /// Rejected because a generation is already in flight. Carries the
    /// message text back so the caller can restore it to the input buffer.
    Busy(String),
}

pub struct App {
    pub store: SessionStore,
    pub primary: ResolvedEngine,
    pub fallback: Option<ResolvedEngine>,
    pub persona: Persona,
    pub config: Config,
    pub logging: LoggingState,
    pub client: reqwest::Client,
    pub pending_attachment: Option<Attachment>,

    // UI state owned here so event handlers stay pure state transitions.
    pub input: String,
    pub scroll_offset: u16,
    pub auto_scroll: bool,

    current_response: String,
    in_flight: Option<InFlight>,
    stream_seq: u64,
}

impl App {
    pub fn new(
        primary: ResolvedEngine,
        fallback: Option<ResolvedEngine>,
        persona: Persona,
        config: Config,
        logging: LoggingState,
    ) -> Self {
        Self {
            store: SessionStore::new(),
            primary,
            fallback,
            persona,
            config,
            logging,
            client: reqwest::Client::new(),
            pending_attachment: None,
            input: String::new(),
            scroll_offset: 0,
            auto_scroll: true,
            current_response: String::new(),
            in_flight: None,
            stream_seq: 0,
        }
    }

    pub fn is_awaiting(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Text accumulated for the response currently being streamed.
    pub fn pending_response(&self) -> Option<&str> {
        self.in_flight.as_ref().map(|_| self.current_response.as_str())
    }

    pub fn append_banner(&mut self, turn: Turn) {
        self.store.append_to_current(turn);
    }

    /// Stage an image file to ride along with the next message.
    pub fn attach_image(&mut self, path: &str) -> Result<String, Box<dyn std::error::Error>> {
        let bytes = std::fs::read(path)?;
        let mime = match path.rsplit('.').next().map(str::to_ascii_lowercase) {
            Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
            Some(ext) if ext == "gif" => "image/gif",
            Some(ext) if ext == "webp" => "image/webp",
            _ => "image/png",
        };
        let data_url = format!("data:{mime};base64,{}", BASE64.encode(&bytes));
        let file_name = std::path::Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string());
        self.pending_attachment = Some(Attachment {
            file_name: file_name.clone(),
            data_url,
        });
        Ok(file_name)
    }

    /// Handle one submitted user message: rename a placeholder session on
    /// its first message, append the user turn, then route it.
    pub fn submit_message(&mut self, text: String) -> SubmitOutcome {
        if self.is_awaiting() {
            return SubmitOutcome::Busy(text);
        }

        let current = self.store.current_name().to_string();
        self.store.rename_if_placeholder(&current, &text);

        let attachment = self.pending_attachment.take();
        // History window is fixed before the new turn lands, so the current
        // message is never duplicated in the payload.
        let history = self.history_messages();

        self.store.append_to_current(Turn::user(text.clone()));
        if let Err(e) = self.logging.log_message(&format!("You: {text}")) {
            debug!("transcript log write failed: {e}");
        }

        if attachment.is_none() && classify(&text) == Route::Image {
            let boost = PromptBoost {
                style: self.config.image_style.clone(),
                mood: self.config.image_mood.clone(),
            };
            let url = build_image_url(&enhance_prompt(&text, &boost));
            let markdown = image_markdown(&text, &url);
            self.store.append_to_current(Turn::assistant(markdown.clone()));
            if let Err(e) = self.logging.log_message(&markdown) {
                debug!("transcript log write failed: {e}");
            }
            return SubmitOutcome::ImageAppended;
        }

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::text("system", self.persona.prompt));
        messages.extend(history);
        let has_attachment = attachment.is_some();
        messages.push(match attachment {
            Some(att) => ChatMessage::with_attachment(text, att.data_url),
            None => ChatMessage::text("user", text),
        });

        let params = self.begin_stream(self.primary.clone(), messages, has_attachment, false);
        SubmitOutcome::Dispatch(params)
    }

    fn history_messages(&self) -> Vec<ChatMessage> {
        self.store
            .current()
            .trimmed_history()
            .into_iter()
            .filter_map(|turn| {
                turn.role
                    .to_api_role()
                    .map(|role| ChatMessage::text(role, turn.content.clone()))
            })
            .collect()
    }

    fn begin_stream(
        &mut self,
        engine: ResolvedEngine,
        messages: Vec<ChatMessage>,
        has_attachment: bool,
        fallback_attempted: bool,
    ) -> StreamParams {
        self.stream_seq += 1;
        let stream_id = self.stream_seq;
        let cancel_token = CancellationToken::new();
        self.current_response.clear();
        // Fallback requests are always non-streaming; the primary follows
        // the configured delivery mode.
        let streaming = !fallback_attempted && self.config.stream_responses;

        self.in_flight = Some(InFlight {
            stream_id,
            messages: messages.clone(),
            has_attachment,
            fallback_attempted,
            cancel_token: cancel_token.clone(),
        });

        StreamParams {
            client: self.client.clone(),
            engine,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            streaming,
            has_attachment,
            cancel_token,
            stream_id,
        }
    }

    /// Apply one stream event. Frames from superseded streams are dropped.
    pub fn handle_stream_event(&mut self, message: StreamMessage, stream_id: u64) -> StreamOutcome {
        let Some(in_flight) = self.in_flight.as_ref() else {
            return StreamOutcome::Ignored;
        };
        if in_flight.stream_id != stream_id {
            return StreamOutcome::Ignored;
        }

        match message {
            StreamMessage::Chunk(content) => {
                self.current_response.push_str(&content);
                StreamOutcome::Updated
            }
            StreamMessage::Error(text) => self.handle_stream_error(text),
            StreamMessage::End => {
                if self.current_response.is_empty() {
                    // Stream ended without content and without a surfaced
                    // error (e.g. End following a handled Error frame).
                    self.in_flight = None;
                    return StreamOutcome::Completed;
                }
                let content = std::mem::take(&mut self.current_response);
                self.store.append_to_current(Turn::assistant(content.clone()));
                if let Err(e) = self.logging.log_message(&content) {
                    debug!("transcript log write failed: {e}");
                }
                self.in_flight = None;
                StreamOutcome::Completed
            }
        }
    }

    fn handle_stream_error(&mut self, text: String) -> StreamOutcome {
        let in_flight = self.in_flight.as_mut().expect("checked by caller");
        let can_fall_back = self.current_response.is_empty()
            && !in_flight.fallback_attempted
            && self.fallback.is_some();

        if can_fall_back {
            debug!("primary engine failed, switching to fallback: {text}");
            let messages = in_flight.messages.clone();
            let has_attachment = in_flight.has_attachment;
            in_flight.cancel_token.cancel();
            let fallback = self.fallback.clone().expect("checked above");
            self.store.append_to_current(Turn::app_warning(format!(
                "Primary engine busy. Switching to fallback engine ({})...",
                fallback.engine.display_name
            )));
            // Same system prompt and trimmed history go to the fallback.
            let params = self.begin_stream(fallback, messages, has_attachment, true);
            return StreamOutcome::Fallback(params);
        }

        // Partial output is discarded: the persisted assistant turn is
        // always the final concatenation of a completed stream.
        self.current_response.clear();
        self.in_flight = None;
        self.store.append_to_current(Turn::app_error(text));
        StreamOutcome::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::{find_engine, ResolvedEngine};
    use crate::core::message::TurnRole;
    use crate::core::persona::default_persona;

    fn engine(id: &str) -> ResolvedEngine {
        let engine = find_engine(id).unwrap();
        let model = engine.model.to_string();
        ResolvedEngine {
            engine,
            api_key: "test-key".into(),
            model,
        }
    }

    fn test_app(with_fallback: bool) -> App {
        App::new(
            engine("gemini"),
            with_fallback.then(|| engine("groq")),
            default_persona(),
            Config::default(),
            LoggingState::new(None),
        )
    }

    fn conversation(app: &App) -> Vec<(TurnRole, String)> {
        app.store
            .current()
            .turns
            .iter()
            .map(|t| (t.role, t.content.clone()))
            .collect()
    }

    #[test]
    fn text_submit_appends_user_turn_and_dispatches() {
        let mut app = test_app(true);
        let outcome = app.submit_message("explain gravity".into());
        let SubmitOutcome::Dispatch(params) = outcome else {
            panic!("expected dispatch");
        };
        assert_eq!(params.engine.engine.id, "gemini");
        assert!(params.streaming);
        assert_eq!(params.messages.len(), 2); // system + current user message
        assert!(app.is_awaiting());

        let turns = conversation(&app);
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].0, TurnRole::User);
    }

    #[test]
    fn image_submit_appends_markdown_assistant_turn() {
        let mut app = test_app(true);
        let outcome = app.submit_message("draw a red fox".into());
        assert!(matches!(outcome, SubmitOutcome::ImageAppended));
        assert!(!app.is_awaiting());

        let turns = conversation(&app);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].0, TurnRole::Assistant);
        assert!(turns[1].1.starts_with("![draw a red fox]("));
        assert!(turns[1].1.contains("image.pollinations.ai/prompt/"));
        assert!(turns[1].1.contains("width=800"));
        assert!(turns[1].1.contains("height=400"));
    }

    #[test]
    fn first_message_renames_placeholder_session() {
        let mut app = test_app(true);
        app.submit_message("Explain quantum computing in simple terms".into());
        assert_eq!(app.store.current_name(), "Explain quantum computing in…");
        assert_eq!(app.store.current().turns.len(), 1);
    }

    #[test]
    fn successful_stream_appends_one_assistant_turn() {
        let mut app = test_app(true);
        let SubmitOutcome::Dispatch(params) = app.submit_message("hello there".into()) else {
            panic!("expected dispatch");
        };
        let id = params.stream_id;

        assert!(matches!(
            app.handle_stream_event(StreamMessage::Chunk("Hi ".into()), id),
            StreamOutcome::Updated
        ));
        assert!(matches!(
            app.handle_stream_event(StreamMessage::Chunk("friend".into()), id),
            StreamOutcome::Updated
        ));
        assert!(matches!(
            app.handle_stream_event(StreamMessage::End, id),
            StreamOutcome::Completed
        ));

        let turns = conversation(&app);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1], (TurnRole::Assistant, "Hi friend".to_string()));
        assert!(!app.is_awaiting());
    }

    #[test]
    fn primary_failure_falls_back_with_same_messages() {
        let mut app = test_app(true);
        let SubmitOutcome::Dispatch(params) = app.submit_message("hello".into()) else {
            panic!("expected dispatch");
        };
        let primary_messages = params.messages.len();

        let outcome = app.handle_stream_event(StreamMessage::Error("boom".into()), params.stream_id);
        let StreamOutcome::Fallback(fallback_params) = outcome else {
            panic!("expected fallback");
        };
        assert_eq!(fallback_params.engine.engine.id, "groq");
        assert_eq!(fallback_params.messages.len(), primary_messages);
        assert!(!fallback_params.streaming);

        // Warning banner surfaced, user turn intact, no assistant turn yet.
        let turns = conversation(&app);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].0, TurnRole::AppWarning);

        // Fallback succeeds with "OK".
        let id = fallback_params.stream_id;
        app.handle_stream_event(StreamMessage::Chunk("OK".into()), id);
        assert!(matches!(
            app.handle_stream_event(StreamMessage::End, id),
            StreamOutcome::Completed
        ));
        let turns = conversation(&app);
        assert_eq!(turns.last().unwrap(), &(TurnRole::Assistant, "OK".to_string()));
    }

    #[test]
    fn double_failure_surfaces_error_without_assistant_turn() {
        let mut app = test_app(true);
        let SubmitOutcome::Dispatch(params) = app.submit_message("hello".into()) else {
            panic!("expected dispatch");
        };

        let StreamOutcome::Fallback(fallback_params) =
            app.handle_stream_event(StreamMessage::Error("boom".into()), params.stream_id)
        else {
            panic!("expected fallback");
        };

        assert!(matches!(
            app.handle_stream_event(
                StreamMessage::Error("also down".into()),
                fallback_params.stream_id
            ),
            StreamOutcome::Completed
        ));

        let turns = conversation(&app);
        assert_eq!(turns[0].0, TurnRole::User);
        assert_eq!(turns[1].0, TurnRole::AppWarning);
        assert_eq!(turns[2].0, TurnRole::AppError);
        assert!(!turns.iter().any(|(role, _)| *role == TurnRole::Assistant));
        assert!(!app.is_awaiting());
    }

    #[test]
    fn failure_without_fallback_surfaces_error_directly() {
        let mut app = test_app(false);
        let SubmitOutcome::Dispatch(params) = app.submit_message("hello".into()) else {
            panic!("expected dispatch");
        };
        assert!(matches!(
            app.handle_stream_event(StreamMessage::Error("down".into()), params.stream_id),
            StreamOutcome::Completed
        ));
        let turns = conversation(&app);
        assert_eq!(turns[1].0, TurnRole::AppError);
    }

    #[test]
    fn stale_stream_frames_are_ignored() {
        let mut app = test_app(true);
        let SubmitOutcome::Dispatch(params) = app.submit_message("hello".into()) else {
            panic!("expected dispatch");
        };
        assert!(matches!(
            app.handle_stream_event(StreamMessage::Chunk("ghost".into()), params.stream_id + 10),
            StreamOutcome::Ignored
        ));
        assert_eq!(app.pending_response(), Some(""));
    }

    #[test]
    fn submit_while_awaiting_is_rejected_and_returns_the_text() {
        let mut app = test_app(true);
        app.submit_message("first".into());
        let SubmitOutcome::Busy(rejected) = app.submit_message("second".into()) else {
            panic!("expected busy");
        };
        assert_eq!(rejected, "second");
        assert_eq!(conversation(&app).len(), 1);
    }

    #[test]
    fn history_window_is_forwarded_to_the_engine() {
        let mut app = test_app(true);
        for i in 0..3 {
            let SubmitOutcome::Dispatch(params) = app.submit_message(format!("question {i}"))
            else {
                panic!("expected dispatch");
            };
            let id = params.stream_id;
            app.handle_stream_event(StreamMessage::Chunk(format!("answer {i}")), id);
            app.handle_stream_event(StreamMessage::End, id);
        }

        let SubmitOutcome::Dispatch(params) = app.submit_message("final question".into()) else {
            panic!("expected dispatch");
        };
        // system + 6 history turns + current message
        assert_eq!(params.messages.len(), 8);
        assert_eq!(params.messages[0].role, "system");
        assert_eq!(params.messages.last().unwrap().role, "user");
    }

    #[test]
    fn attachment_switches_to_vision_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, b"fake-png-bytes").unwrap();

        let mut app = test_app(true);
        let name = app.attach_image(path.to_str().unwrap()).unwrap();
        assert_eq!(name, "photo.png");

        // Attachment forces the text route even for keyword-y messages.
        let SubmitOutcome::Dispatch(params) =
            app.submit_message("describe this image".into())
        else {
            panic!("expected dispatch");
        };
        assert!(params.has_attachment);
        assert!(app.pending_attachment.is_none());

        let last = params.messages.last().unwrap();
        let json = serde_json::to_value(last).unwrap();
        assert_eq!(json["content"][1]["type"], "image_url");
        assert!(json["content"][1]["image_url"]["url"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,"));
    }
}
