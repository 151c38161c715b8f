//! Settings and credentials for a trawl run.
//!
//! Non-secret settings come from an optional YAML file overlaid with
//! `TRAWL__<SECTION>__<KEY>` environment variables. The two session cookies are
//! secrets and are only ever read from the environment, see [`Credentials`].
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Public bearer token of the X web client; every browser session sends it.
pub const WEB_BEARER_TOKEN: &str = "AAAAAAAAAAAAAAAAAAAAANRILgAAAAAAnNwIzUejRCOuH5E6I8xnZz4puTs%3D1Zv7ttfk8LF81IUq16cHjhLTvJu4FA33AGWWjCpTnA";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// Primary name first, alias second.
pub const AUTH_TOKEN_VARS: [&str; 2] = ["TWITTER_AUTH_TOKEN", "AUTH_TOKEN"];
pub const CT0_VARS: [&str; 2] = ["TWITTER_CT0", "CT0"];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TrawlConfig {
    pub twitter: TwitterSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TwitterSettings {
    pub base_url: String,
    pub locale: String,
    pub bearer_token: String,
    pub search_query_id: String,
    pub timeout_secs: u64,
    pub page_size: u32,
    pub trend_category: String,
    pub user_agent: String,
}

impl Default for TwitterSettings {
    fn default() -> Self {
        Self {
            base_url: "https://x.com".into(),
            locale: "en-US".into(),
            bearer_token: WEB_BEARER_TOKEN.into(),
            search_query_id: "flaR-PUMshxFWZWPNpq4zA".into(),
            timeout_secs: 15,
            page_size: 20,
            trend_category: "trending".into(),
            user_agent: DEFAULT_USER_AGENT.into(),
        }
    }
}

impl TwitterSettings {
    /// Language part of the locale (`en-US` -> `en`).
    pub fn language(&self) -> &str {
        self.locale
            .split(['-', '_'])
            .next()
            .filter(|lang| !lang.is_empty())
            .unwrap_or("en")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub dir: Option<String>,
    pub stderr: bool,
    pub format: String,
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            dir: None,
            stderr: false,
            format: "text".into(),
            filter: "info".into(),
        }
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct TrawlConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for TrawlConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl TrawlConfigLoader {
    /// Start from the built-in defaults; `TRAWL__` env overrides are applied on [`load`](Self::load).
    ///
    /// ```
    /// use trawl_config::TrawlConfigLoader;
    ///
    /// let config = TrawlConfigLoader::new()
    ///     .with_yaml_str("twitter:\n  locale: ja-JP")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.twitter.locale, "ja-JP");
    /// assert_eq!(config.twitter.language(), "ja");
    /// assert_eq!(config.twitter.page_size, 20);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P, required: bool) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(required));
        self
    }

    /// Merge an inline YAML snippet (tests, `--config` contents).
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources.
    pub fn load(self) -> Result<TrawlConfig, ConfigError> {
        // env is added last so it wins over every file source
        let typed: TrawlConfig = self
            .builder
            .add_source(
                Environment::with_prefix("TRAWL")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        if typed.twitter.page_size == 0 {
            return Err(ConfigError::Message(
                "twitter.page_size must be at least 1".into(),
            ));
        }
        Ok(typed)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("{}", missing_detail(.0))]
    Missing(Vec<&'static str>),
}

fn missing_detail(vars: &[&'static str]) -> String {
    format!("set {} in the environment", vars.join(" and "))
}

/// The two session cookies, copied verbatim from the environment.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub auth_token: String,
    pub ct0: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("auth_token", &"<redacted>")
            .field("ct0", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(auth_token: impl Into<String>, ct0: impl Into<String>) -> Self {
        Self {
            auth_token: auth_token.into(),
            ct0: ct0.into(),
        }
    }

    /// Read both cookies from the process environment.
    pub fn from_env() -> Result<Self, CredentialError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve both cookies through `lookup`; empty values fall through to the alias.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CredentialError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |names: &[&str]| {
            names
                .iter()
                .filter_map(|name| lookup(*name))
                .find(|value| !value.is_empty())
        };

        match (first(&AUTH_TOKEN_VARS[..]), first(&CT0_VARS[..])) {
            (Some(auth_token), Some(ct0)) => Ok(Self { auth_token, ct0 }),
            (auth, ct0) => {
                let mut missing = Vec::new();
                if auth.is_none() {
                    missing.push(AUTH_TOKEN_VARS[0]);
                }
                if ct0.is_none() {
                    missing.push(CT0_VARS[0]);
                }
                Err(CredentialError::Missing(missing))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn primary_names_win_over_aliases() {
        let creds = Credentials::from_lookup(lookup_from(&[
            ("TWITTER_AUTH_TOKEN", "primary"),
            ("AUTH_TOKEN", "alias"),
            ("TWITTER_CT0", "csrf"),
        ]))
        .unwrap();
        assert_eq!(creds, Credentials::new("primary", "csrf"));
    }

    #[test]
    fn aliases_fill_in_for_missing_or_empty_primaries() {
        let creds = Credentials::from_lookup(lookup_from(&[
            ("TWITTER_AUTH_TOKEN", ""),
            ("AUTH_TOKEN", "alias"),
            ("CT0", "csrf-alias"),
        ]))
        .unwrap();
        assert_eq!(creds, Credentials::new("alias", "csrf-alias"));
    }

    #[test]
    fn reports_every_missing_cookie() {
        let err = Credentials::from_lookup(lookup_from(&[])).unwrap_err();
        assert_eq!(
            err,
            CredentialError::Missing(vec!["TWITTER_AUTH_TOKEN", "TWITTER_CT0"])
        );
        assert_eq!(
            err.to_string(),
            "set TWITTER_AUTH_TOKEN and TWITTER_CT0 in the environment"
        );

        let err = Credentials::from_lookup(lookup_from(&[("AUTH_TOKEN", "a")])).unwrap_err();
        assert_eq!(err, CredentialError::Missing(vec!["TWITTER_CT0"]));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let shown = format!("{:?}", Credentials::new("very-secret", "also-secret"));
        assert!(!shown.contains("secret"));
    }

    #[test]
    fn language_falls_back_to_english() {
        let mut settings = TwitterSettings::default();
        assert_eq!(settings.language(), "en");
        settings.locale = "zh_CN".into();
        assert_eq!(settings.language(), "zh");
        settings.locale = String::new();
        assert_eq!(settings.language(), "en");
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let err = TrawlConfigLoader::new()
            .with_yaml_str("twitter:\n  page_size: 0")
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("page_size"));
    }
}
