//! Engine configuration: where durable state lives and how the
//! prediction oracle is reached.

use std::path::PathBuf;

use anyhow::Result;

/// Default Gemini model used for risk assessments.
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory holding the four durable state blobs.
    pub data_dir: PathBuf,
    /// Oracle credential. `None` selects the offline stand-in oracle.
    pub api_key: Option<String>,
    /// Oracle model name.
    pub model: String,
}

impl EngineConfig {
    /// Build a configuration from the environment.
    ///
    /// - `CARELOOP_DATA_DIR` overrides the data directory, which
    ///   defaults to `$HOME/Documents/Careloop`.
    /// - `GEMINI_API_KEY` (or the legacy `API_KEY`) enables the live
    ///   oracle; absence selects the offline stand-in.
    /// - `CARELOOP_MODEL` overrides the model name.
    pub fn from_env() -> Result<Self> {
        let data_dir = match std::env::var("CARELOOP_DATA_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => Self::default_data_dir()?,
        };

        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());

        let model =
            std::env::var("CARELOOP_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Ok(EngineConfig {
            data_dir,
            api_key,
            model,
        })
    }

    /// Configuration rooted at an explicit data directory, offline
    /// oracle. Mainly for tests and embedded hosts.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        EngineConfig {
            data_dir: data_dir.into(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    fn default_data_dir() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| anyhow::anyhow!("could not determine home directory"))?;

        Ok(PathBuf::from(home).join("Documents").join("Careloop"))
    }
}
