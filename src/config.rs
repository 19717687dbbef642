use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::welcome::Trigger;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub links: Links,
    #[serde(default)]
    pub welcome: WelcomeConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub chat_id: i64,
    /// Forum topic to post into. 0 means the chat itself.
    #[serde(default)]
    pub thread_id: i64,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            webhook_path: default_webhook_path(),
        }
    }
}

/// URLs behind the inline keyboard buttons.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Links {
    pub prices: String,
    pub soap: String,
    pub distillate: String,
    #[serde(default)]
    pub ubtan: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WelcomeConfig {
    #[serde(default = "default_triggers")]
    pub triggers: Vec<Trigger>,
    #[serde(default = "default_keyword")]
    pub keyword: String,
    /// Word placed before the last name in a list of greeted users.
    #[serde(default = "default_conjunction")]
    pub conjunction: String,
    /// Greeting text; `{mention}` is replaced with the greeted users.
    #[serde(default = "default_template")]
    pub template: String,
}

impl Default for WelcomeConfig {
    fn default() -> Self {
        Self {
            triggers: default_triggers(),
            keyword: default_keyword(),
            conjunction: default_conjunction(),
            template: default_template(),
        }
    }
}

pub const MENTION_PLACEHOLDER: &str = "{mention}";

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_request_timeout_secs() -> u64 {
    5
}

fn default_port() -> u16 {
    8080
}

fn default_webhook_path() -> String {
    "/bot".to_string()
}

fn default_triggers() -> Vec<Trigger> {
    vec![Trigger::Keyword, Trigger::Join]
}

fn default_keyword() -> String {
    "ботик".to_string()
}

fn default_conjunction() -> String {
    "и".to_string()
}

fn default_template() -> String {
    "Привет, {mention}!\n\n\
     Вы пришли в мастерскую крафтового мыла «Мыльная Мама», которая специализируется \
     на натуральной и безопасной продукции. Делаем своими руками, из своих трав и по своим рецептам."
        .to_string()
}

impl Config {
    /// Read the TOML file, apply `.env` and process environment overrides, validate.
    pub fn load(path: &Path) -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(env_path) => tracing::debug!("Loaded environment from {}", env_path.display()),
            Err(e) => tracing::debug!("No .env file loaded: {}", e),
        }

        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Like [`Config::load`], with environment lookups going through `lookup`.
    pub fn load_with<F>(path: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config = Self::parse(&content)?;
        config.apply_env_overrides(lookup)?;
        config.validate()?;

        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Environment variables win over the file: `TOKEN`, `CHAT_ID`, `THREAD_ID`, `PORT`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("TOKEN") {
            self.telegram.bot_token = token;
        }
        if let Some(chat_id) = lookup("CHAT_ID") {
            self.telegram.chat_id = chat_id
                .trim()
                .parse()
                .with_context(|| format!("Invalid CHAT_ID: {}", chat_id))?;
        }
        if let Some(thread_id) = lookup("THREAD_ID") {
            self.telegram.thread_id = thread_id
                .trim()
                .parse()
                .with_context(|| format!("Invalid THREAD_ID: {}", thread_id))?;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT: {}", port))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            anyhow::bail!("TOKEN not set: provide telegram.bot_token or the TOKEN environment variable");
        }
        if !self.welcome.template.contains(MENTION_PLACEHOLDER) {
            anyhow::bail!(
                "welcome.template must contain the {} placeholder",
                MENTION_PLACEHOLDER
            );
        }
        if self.telegram.request_timeout_secs == 0 {
            anyhow::bail!("telegram.request_timeout_secs must be greater than 0");
        }
        if self.welcome.triggers.contains(&Trigger::Keyword)
            && self.welcome.keyword.trim().is_empty()
        {
            anyhow::bail!("welcome.keyword must not be empty while the keyword trigger is enabled");
        }
        if !self.server.webhook_path.starts_with('/') {
            anyhow::bail!(
                "server.webhook_path must start with '/': {}",
                self.server.webhook_path
            );
        }
        if self.server.webhook_path.contains([':', '{', '}', '*']) {
            anyhow::bail!(
                "server.webhook_path must be a literal path without captures: {}",
                self.server.webhook_path
            );
        }
        Ok(())
    }
}
