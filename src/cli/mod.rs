//! Command-line interface parsing and startup.
//!
//! Resolves configuration and engine credentials before the terminal UI is
//! entered, so a missing API key is a clean startup diagnostic instead of a
//! failed request mid-chat.

use std::error::Error;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::core::app::App;
use crate::core::config::Config;
use crate::core::engine::{builtin_engines, engine_available, resolve_engine};
use crate::core::persona::{builtin_personas, default_persona, find_persona};
use crate::ui::chat_loop::run_chat;
use crate::utils::logging::LoggingState;

#[derive(Parser)]
#[command(name = "hexaloy")]
#[command(about = "A terminal chat interface for the HEXALOY dual-engine AI assistant")]
#[command(
    long_about = "Hexaloy is a full-screen terminal chat client backed by two hosted \
completion engines: a primary and a fallback that is tried once when the primary fails. \
Messages containing drawing keywords are routed to a hosted image generator instead.\n\n\
Environment Variables:\n\
  GEMINI_API_KEY    API key for the Gemini engine\n\
  GROQ_API_KEY      API key for the Groq engine\n\n\
Controls:\n\
  Type              Enter your message in the input field\n\
  Enter             Send the message\n\
  Up/Down/Mouse     Scroll through chat history\n\
  Ctrl+C            Quit\n\n\
Commands: /help inside the chat lists session, export, search, persona,\n\
attach, and logging commands."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model override for the primary engine
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Primary engine id (gemini or groq)
    #[arg(short = 'e', long, global = true, value_name = "ENGINE")]
    pub engine: Option<String>,

    /// Disable the fallback engine
    #[arg(long, global = true)]
    pub no_fallback: bool,

    /// Persona id for the system prompt
    #[arg(long, global = true, value_name = "PERSONA")]
    pub persona: Option<String>,

    /// Enable transcript logging to the given file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat (default)
    Chat,
    /// List built-in engines and whether their credentials are present
    Engines,
    /// List built-in personas
    Personas,
    /// Print the configuration file location and current values
    Config,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Engines => {
            for engine in builtin_engines() {
                let status = if engine_available(engine) {
                    "available"
                } else {
                    "unavailable (set the key to enable)"
                };
                println!(
                    "{:<8} {} — model {}, key {}: {}",
                    engine.id, engine.display_name, engine.model, engine.key_env, status
                );
            }
            Ok(())
        }
        Commands::Personas => {
            for persona in builtin_personas() {
                println!("{:<12} {} — {}", persona.id, persona.display_name, persona.description);
            }
            Ok(())
        }
        Commands::Config => {
            let config = Config::load()?;
            println!("Config file: {}", Config::config_path().display());
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        Commands::Chat => {
            let config = Config::load()?;
            let engine_id = args
                .engine
                .as_deref()
                .unwrap_or_else(|| config.engine_id())
                .to_string();
            let model_override = args.model.as_deref().or(config.default_model.as_deref());

            let primary = match resolve_engine(&engine_id, model_override) {
                Ok(engine) => engine,
                Err(e) => {
                    eprintln!("Cannot start chat: {e}");
                    std::process::exit(1);
                }
            };

            let fallback = if args.no_fallback {
                None
            } else {
                match config.fallback_id().filter(|id| *id != primary.engine.id) {
                    Some(id) => match resolve_engine(id, None) {
                        Ok(engine) => Some(engine),
                        Err(e) => {
                            eprintln!("Note: fallback engine disabled: {e}");
                            None
                        }
                    },
                    None => None,
                }
            };

            let persona_id = args.persona.as_deref().or(config.persona.as_deref());
            let persona = match persona_id {
                Some(id) => find_persona(id)
                    .ok_or_else(|| format!("unknown persona: {id}"))?,
                None => default_persona(),
            };

            let logging = LoggingState::new(args.log);
            let app = App::new(primary, fallback, persona, config, logging);
            run_chat(app).await
        }
    }
}
