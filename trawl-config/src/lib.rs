//! Configuration loader: one YAML credentials file, `TRAWL__` environment
//! overrides, then `${VAR}` expansion over every string value.
//!
//! ```yaml
//! mastodon:
//!   api_base_url: "https://mastodon.social"
//!   access_token: "${MASTODON_TOKEN}"
//! output_dir: "data/raw"
//! logging:
//!   format: json
//! ```
//!
//! Environment keys nest with a double underscore, so
//! `TRAWL__MASTODON__ACCESS_TOKEN` overrides `mastodon.access_token`.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use trawl_common::observability::LogFormat;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

/// Where the loader looks when no path is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "config/credentials.yaml";

#[derive(Debug, Deserialize)]
pub struct TrawlConfig {
    pub mastodon: MastodonConfig,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// API credentials. Only `api_base_url` and `access_token` are used for
/// requests; the client pair is kept so one file can hold the whole app
/// registration.
#[derive(Debug, Deserialize)]
pub struct MastodonConfig {
    pub api_base_url: String,
    pub access_token: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_true")]
    pub stderr: bool,
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            format: LogFormat::default(),
            stderr: true,
            filter: default_filter(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/raw")
}
fn default_true() -> bool {
    true
}
fn default_filter() -> String {
    "info".into()
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) if s.contains('$') => {
            let mut cur = std::mem::take(s);
            for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                let expanded = shellexpand::env(&cur)
                    .map(|cow| cow.into_owned())
                    .unwrap_or_else(|_| cur.clone());
                if expanded == cur {
                    break;
                }
                cur = expanded;
            }
            *s = cur;
        }
        Value::Array(items) => items.iter_mut().for_each(expand_env_in_value),
        Value::Object(fields) => fields.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Wraps the `config` crate builder.
pub struct TrawlConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for TrawlConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl TrawlConfigLoader {
    /// Empty loader. `TRAWL__` environment overrides are applied by
    /// [`load`](Self::load) on top of every other source.
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a required file; the format follows the file suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use trawl_config::TrawlConfigLoader;
    ///
    /// let cfg = TrawlConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// mastodon:
    ///   api_base_url: "https://mastodon.example"
    ///   access_token: "abc"
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.mastodon.access_token, "abc");
    /// assert_eq!(cfg.output_dir, std::path::PathBuf::from("data/raw"));
    /// assert!(cfg.logging.stderr);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge all sources, with `TRAWL__` variables last so they win over any
    /// file, then expand `${VAR}` placeholders and deserialize.
    pub fn load(self) -> Result<TrawlConfig, ConfigError> {
        let merged = self
            .builder
            .add_source(Environment::with_prefix("TRAWL").separator("__"))
            .build()?;
        let mut raw: Value = merged.try_deserialize()?;
        expand_env_in_value(&mut raw);
        let typed: TrawlConfig =
            serde_json::from_value(raw).map_err(|e| ConfigError::Message(e.to_string()))?;
        if typed.mastodon.access_token.trim().is_empty() {
            return Err(ConfigError::Message(
                "mastodon.access_token must not be empty".into(),
            ));
        }
        Ok(typed)
    }
}
