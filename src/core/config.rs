//! On-disk configuration: engine selection and sampling parameters.
//!
//! The config file lives under the platform config directory and only holds
//! defaults; API keys always come from the environment.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Primary engine id. Defaults to "gemini" when unset.
    pub default_engine: Option<String>,
    /// Fallback engine id, tried once after a primary failure. Set to an
    /// empty string to disable. Defaults to "groq" when unset.
    pub fallback_engine: Option<String>,
    /// Model override for the primary engine.
    pub default_model: Option<String>,
    /// Persona id whose prompt becomes the system message.
    pub persona: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Stream responses from the primary engine. The fallback request is
    /// always non-streaming.
    #[serde(default = "default_true")]
    pub stream_responses: bool,
    /// Style modifier folded into image prompts.
    pub image_style: Option<String>,
    /// Mood modifier folded into image prompts.
    pub image_mood: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_engine: None,
            fallback_engine: None,
            default_model: None,
            persona: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            stream_responses: true,
            image_style: None,
            image_mood: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Config, Box<dyn std::error::Error>> {
        Self::load_from_path(&Self::config_path())
    }

    pub fn load_from_path(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .map_err(|e| format!("failed to read config at {}: {e}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .map_err(|e| format!("failed to parse config at {}: {e}", path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.save_to_path(&Self::config_path())
    }

    pub(crate) fn save_to_path(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.parent().filter(|dir| !dir.as_os_str().is_empty());
        if let Some(dir) = parent {
            fs::create_dir_all(dir)?;
        }

        let contents = toml::to_string_pretty(self)?;
        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir)?,
            None => NamedTempFile::new()?,
        };
        temp_file.write_all(contents.as_bytes())?;
        temp_file.as_file_mut().sync_all()?;
        temp_file
            .persist(path)
            .map_err(|err| -> Box<dyn std::error::Error> { Box::new(err) })?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        let proj_dirs = ProjectDirs::from("org", "hexaloy", "hexaloy")
            .expect("failed to determine config directory");
        proj_dirs.config_dir().join("config.toml")
    }

    pub fn engine_id(&self) -> &str {
        self.default_engine.as_deref().unwrap_or("gemini")
    }

    /// Fallback engine id, or `None` when explicitly disabled.
    pub fn fallback_id(&self) -> Option<&str> {
        match self.fallback_engine.as_deref() {
            Some("") => None,
            Some(id) => Some(id),
            None => Some("groq"),
        }
    }
}
