//! Completion engine registry.
//!
//! Hexaloy speaks to two hosted OpenAI-compatible engines: a primary and an
//! optional fallback. Credentials come from the environment; an engine whose
//! key is missing is unavailable, and selecting it is a configuration error
//! rather than a failed request later.

use std::env;
use std::fmt;

/// Static description of a built-in engine.
#[derive(Debug, Clone)]
pub struct Engine {
    pub id: &'static str,
    pub display_name: &'static str,
    pub base_url: &'static str,
    pub model: &'static str,
    /// Model variant used whenever the outgoing message carries an image
    /// attachment, regardless of the configured model.
    pub vision_model: &'static str,
    pub key_env: &'static str,
}

/// An engine paired with the credential it was resolved against.
#[derive(Debug, Clone)]
pub struct ResolvedEngine {
    pub engine: Engine,
    pub api_key: String,
    /// Model override from config or the command line.
    pub model: String,
}

impl ResolvedEngine {
    /// Model to put on the wire for this request.
    pub fn model_for(&self, has_attachment: bool) -> String {
        if has_attachment {
            self.engine.vision_model.to_string()
        } else {
            self.model.clone()
        }
    }
}

/// Credential missing for a selected engine. Fatal at startup.
#[derive(Debug)]
pub struct MissingKeyError {
    pub engine_id: String,
    pub key_env: String,
}

impl fmt::Display for MissingKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "engine '{}' requires the {} environment variable; set it before starting a chat",
            self.engine_id, self.key_env
        )
    }
}

impl std::error::Error for MissingKeyError {}

const ENGINES: &[Engine] = &[
    Engine {
        id: "gemini",
        display_name: "Google Gemini",
        base_url: "https://generativelanguage.googleapis.com/v1beta/openai",
        model: "gemini-1.5-flash",
        vision_model: "gemini-1.5-flash",
        key_env: "GEMINI_API_KEY",
    },
    Engine {
        id: "groq",
        display_name: "Groq",
        base_url: "https://api.groq.com/openai/v1",
        model: "llama-3.3-70b-versatile",
        vision_model: "llama-3.2-11b-vision-preview",
        key_env: "GROQ_API_KEY",
    },
];

pub fn builtin_engines() -> &'static [Engine] {
    ENGINES
}

/// Find a built-in engine by id (case-insensitive).
pub fn find_engine(id: &str) -> Option<Engine> {
    ENGINES
        .iter()
        .find(|e| e.id.eq_ignore_ascii_case(id))
        .cloned()
}

/// True when the engine's credential is present in the environment.
pub fn engine_available(engine: &Engine) -> bool {
    env::var(engine.key_env).map(|v| !v.is_empty()).unwrap_or(false)
}

/// Resolve an engine id against the environment, failing fast when the
/// credential is absent.
pub fn resolve_engine(
    id: &str,
    model_override: Option<&str>,
) -> Result<ResolvedEngine, Box<dyn std::error::Error>> {
    let engine = find_engine(id).ok_or_else(|| format!("unknown engine: {id}"))?;
    let api_key = env::var(engine.key_env)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| MissingKeyError {
            engine_id: engine.id.to_string(),
            key_env: engine.key_env.to_string(),
        })?;
    let model = model_override
        .filter(|m| !m.is_empty())
        .unwrap_or(engine.model)
        .to_string();
    Ok(ResolvedEngine {
        engine,
        api_key,
        model,
    })
}
