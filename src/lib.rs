//! Hexaloy is a terminal-first chat client for the HEXALOY dual-engine AI
//! assistant.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns runtime state: the session store, the turn router, the
//!   completion engines and their fallback policy, streaming orchestration,
//!   personas, and transcript export.
//! - [`ui`] renders the terminal interface and runs the interactive event
//!   loop that drives user input and display updates.
//! - [`commands`] implements slash-command parsing used by the chat loop for
//!   session management, export, search, and logging.
//! - [`api`] defines the OpenAI-compatible chat payloads shared by the
//!   engine clients.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which resolves engine credentials and
//! dispatches into [`ui::chat_loop`] for interactive sessions.

pub mod api;
pub mod cli;
pub mod commands;
pub mod core;
pub mod ui;
pub mod utils;
