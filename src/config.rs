use anyhow::{bail, Context, Result};
use std::str::FromStr;
use std::time::Duration;

use crate::i18n::Language;
use crate::translation::HttpTranslatorConfig;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
const DEFAULT_SWEEP_SCHEDULE: &str = "0 */10 * * * *";
const DEFAULT_TRANSLATOR_TIMEOUT_SECS: u64 = 10;

/// Which cache backend sits behind the field and response caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackendKind {
    Memory,
    None,
}

impl FromStr for CacheBackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(CacheBackendKind::Memory),
            "none" | "off" => Ok(CacheBackendKind::None),
            other => bail!("Unknown CACHE_BACKEND '{}'. Expected 'memory' or 'none'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,
    pub port: u16,

    // Storage; in-memory when unset
    pub database_url: Option<String>,

    // Translation targets
    pub languages: Vec<Language>,

    // Cache
    pub cache_ttl: Duration,
    pub cache_backend: CacheBackendKind,
    pub cache_sweep_schedule: String,

    // Translation provider; translations fall back to English when no key is set
    pub translator_api_url: String,
    pub translator_api_key: Option<String>,
    pub translator_model: String,
    pub translator_timeout: Duration,

    // Admin routes are mounted only when set
    pub admin_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: DEFAULT_PORT,
            database_url: None,
            languages: Language::translation_targets(),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            cache_backend: CacheBackendKind::Memory,
            cache_sweep_schedule: DEFAULT_SWEEP_SCHEDULE.to_string(),
            translator_api_url: crate::translation::DEFAULT_API_URL.to_string(),
            translator_api_key: None,
            translator_model: crate::translation::DEFAULT_MODEL.to_string(),
            translator_timeout: Duration::from_secs(DEFAULT_TRANSLATOR_TIMEOUT_SECS),
            admin_api_key: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let languages = match optional_var("FAQ_LANGUAGES") {
            Some(raw) => parse_languages(&raw).context("Invalid FAQ_LANGUAGES")?,
            None => defaults.languages,
        };

        let cache_backend = match optional_var("CACHE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => defaults.cache_backend,
        };

        Ok(Self {
            environment: optional_var("ENVIRONMENT").unwrap_or(defaults.environment),
            port: parsed_var("PORT")?.unwrap_or(DEFAULT_PORT),

            database_url: optional_var("DATABASE_URL"),

            languages,

            cache_ttl: Duration::from_secs(
                parsed_var("CACHE_TTL")?.unwrap_or(DEFAULT_CACHE_TTL_SECS),
            ),
            cache_backend,
            cache_sweep_schedule: optional_var("CACHE_SWEEP_SCHEDULE")
                .unwrap_or(defaults.cache_sweep_schedule),

            translator_api_url: optional_var("TRANSLATOR_API_URL")
                .unwrap_or(defaults.translator_api_url),
            translator_api_key: optional_var("TRANSLATOR_API_KEY"),
            translator_model: optional_var("TRANSLATOR_MODEL").unwrap_or(defaults.translator_model),
            translator_timeout: Duration::from_secs(
                parsed_var("TRANSLATOR_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TRANSLATOR_TIMEOUT_SECS),
            ),

            admin_api_key: optional_var("ADMIN_API_KEY"),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// HTTP translator settings, or `None` when no API key is configured.
    pub fn translator(&self) -> Option<HttpTranslatorConfig> {
        let api_key = self.translator_api_key.clone()?;
        Some(HttpTranslatorConfig {
            api_url: self.translator_api_url.clone(),
            model: self.translator_model.clone(),
            timeout: self.translator_timeout,
            ..HttpTranslatorConfig::new(api_key)
        })
    }
}

/// Unset and blank values are both treated as absent.
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parsed_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    optional_var(name)
        .map(|raw| {
            raw.parse::<T>()
                .with_context(|| format!("{} has an invalid value: '{}'", name, raw))
        })
        .transpose()
}

/// Parse a comma-separated list of translation target codes.
fn parse_languages(raw: &str) -> Result<Vec<Language>> {
    let mut languages = Vec::new();

    for code in raw.split(',').map(str::trim).filter(|code| !code.is_empty()) {
        let language = Language::from_code(&code.to_ascii_lowercase())?;
        if language.is_canonical() {
            bail!("'{}' is the source language and cannot be a translation target", code);
        }
        if !languages.contains(&language) {
            languages.push(language);
        }
    }

    Ok(languages)
}
