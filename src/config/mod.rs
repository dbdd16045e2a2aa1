use crate::core::error::DoloresError;
use std::env;
use std::fmt;

pub const API_KEY_VAR: &str = "DOLORES_API_KEY";
pub const MODEL_ID_VAR: &str = "DOLORES_MODEL_ID";
pub const BASE_URL_VAR: &str = "DOLORES_BASE_URL";
pub const ENABLE_EMOJI_VAR: &str = "DOLORES_ENABLE_EMOJI";
pub const ENABLE_COLOR_VAR: &str = "DOLORES_ENABLE_COLOR";
pub const SYSTEM_PROMPT_VAR: &str = "DOLORES_SYSTEM_PROMPT";
pub const TRANSLATE_LANGUAGE_VAR: &str = "DOLORES_TRANSLATE_LANGUAGE";

pub const DEFAULT_MODEL_ID: &str = "deepseek-chat";
pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
pub const DEFAULT_TRANSLATE_LANGUAGE: &str = "Chinese";

/// Settings resolved once at startup and passed to every component that
/// needs them.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub api_key: String,
    pub model_id: String,
    pub base_url: String,
    pub enable_emoji: bool,
    pub enable_color: bool,
    pub system_prompt: Option<String>,
    pub translate_language: String,
}

impl Config {
    /// Reads the process environment.
    pub fn from_env() -> Result<Config, DoloresError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a configuration from any variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, DoloresError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = non_blank(API_KEY_VAR).ok_or_else(|| {
            DoloresError::Config(format!(
                "API key is not set; export {} or add it to a .env file",
                API_KEY_VAR
            ))
        })?;

        Ok(Config {
            api_key,
            model_id: non_blank(MODEL_ID_VAR).unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
            base_url: non_blank(BASE_URL_VAR)
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            enable_emoji: parse_flag(ENABLE_EMOJI_VAR, lookup(ENABLE_EMOJI_VAR), true),
            enable_color: parse_flag(ENABLE_COLOR_VAR, lookup(ENABLE_COLOR_VAR), true),
            system_prompt: non_blank(SYSTEM_PROMPT_VAR),
            translate_language: non_blank(TRANSLATE_LANGUAGE_VAR)
                .unwrap_or_else(|| DEFAULT_TRANSLATE_LANGUAGE.to_string()),
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("model_id", &self.model_id)
            .field("base_url", &self.base_url)
            .field("enable_emoji", &self.enable_emoji)
            .field("enable_color", &self.enable_color)
            .field("system_prompt", &self.system_prompt)
            .field("translate_language", &self.translate_language)
            .finish()
    }
}

fn parse_flag(name: &str, value: Option<String>, default: bool) -> bool {
    let Some(value) = value else {
        return default;
    };

    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "y" => true,
        "0" | "false" | "no" | "off" | "n" => false,
        other => {
            tracing::warn!(variable = name, value = other, "unrecognized boolean, using default");
            default
        }
    }
}
