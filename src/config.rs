use crate::error::{Error, Result};
use crate::feed::{FeedOptions, DEFAULT_INTERVAL, DEFAULT_MAX_JITTER_MS};
use crate::logging::LogConfig;
use crate::roster::{NodeDescriptor, Roster};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 環境変数のプレフィックス（例: RELAY_STATUS_FEED__INTERVAL_MS=1000）
pub const ENV_PREFIX: &str = "RELAY_STATUS";

/// 設定ファイルの探索パス
const CONFIG_PATHS: [&str; 2] = ["relay-status.toml", "config/relay-status.toml"];

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FeedConfig {
    pub feed: FeedSection,
    pub logging: LoggingSection,
    /// 省略時は既定名簿を使用
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<NodeDescriptor>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FeedSection {
    pub interval_ms: u64,
    pub max_jitter_ms: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingSection {
    pub level: String,
    pub json: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            feed: FeedSection {
                interval_ms: DEFAULT_INTERVAL.as_millis() as u64,
                max_jitter_ms: DEFAULT_MAX_JITTER_MS,
                seed: None,
            },
            logging: LoggingSection {
                level: "info".to_string(),
                json: false,
                directory: None,
            },
            nodes: None,
        }
    }
}

impl FeedConfig {
    /// 設定ファイルから読み込み、環境変数で上書き
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// 環境変数ソースを差し替えて読み込み（`None` ならプロセス環境）
    pub fn load_with_env(
        path: Option<&Path>,
        env_source: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        let mut settings = config::Config::builder();

        // デフォルト値を設定
        settings = settings.add_source(config::Config::try_from(&FeedConfig::default())?);

        match path {
            Some(path) => {
                info!("Loading configuration file: {}", path.display());
                settings = settings.add_source(
                    config::File::from(path)
                        .format(config::FileFormat::Toml)
                        .required(true),
                );
            }
            None => {
                if let Some(found) = CONFIG_PATHS.iter().map(Path::new).find(|p| p.exists()) {
                    info!("Loading configuration file: {}", found.display());
                    settings = settings
                        .add_source(config::File::from(found).format(config::FileFormat::Toml));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env_source),
        );

        let config: FeedConfig = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.feed.interval_ms == 0 {
            return Err(Error::Config("feed.interval_ms must be > 0".to_string()));
        }
        if self.logging.level.trim().is_empty() {
            return Err(Error::Config("logging.level must not be empty".to_string()));
        }
        if let Err(e) = EnvFilter::try_new(&self.logging.level) {
            return Err(Error::Config(format!(
                "logging.level '{}' is not a valid filter: {}",
                self.logging.level, e
            )));
        }
        if let Some(ref nodes) = self.nodes {
            Roster::new(nodes.clone())?;
        }
        Ok(())
    }

    /// 検証済みの名簿を構築
    pub fn roster(&self) -> Result<Roster> {
        match self.nodes {
            Some(ref nodes) => Roster::new(nodes.clone()),
            None => Ok(Roster::reference()),
        }
    }

    pub fn feed_options(&self) -> FeedOptions {
        FeedOptions {
            interval: Duration::from_millis(self.feed.interval_ms),
            max_jitter_ms: self.feed.max_jitter_ms,
            seed: self.feed.seed,
        }
    }

    pub fn log_config(&self) -> LogConfig {
        let mut log = LogConfig::default()
            .with_level(&self.logging.level)
            .with_json(self.logging.json);
        if let Some(ref dir) = self.logging.directory {
            log = log.with_directory(dir);
        }
        log
    }

    /// サンプル設定ファイルの内容を生成
    pub fn sample_toml() -> Result<String> {
        let sample = FeedConfig {
            nodes: Some(Roster::reference().to_vec()),
            ..FeedConfig::default()
        };
        let toml_content = toml::to_string_pretty(&sample)?;

        Ok(format!(
            r#"# relay-status configuration
#
# Save as relay-status.toml (or pass --config <PATH>).
# Environment overrides use the {prefix}_ prefix and "__" between sections,
# e.g. {prefix}_FEED__INTERVAL_MS=1000
#
# [feed]
# interval_ms   = refresh period in milliseconds
# max_jitter_ms = largest offset added to a node's base latency (inclusive);
#                 the landing page uses 2, larger values deliberately widen
#                 the displayed range to base..=base+max_jitter_ms
# seed          = optional RNG seed for a reproducible sequence
#
# [logging]
# level     = trace, debug, info, warn, error (RUST_LOG takes precedence)
# json      = emit JSON log lines
# directory = optional directory for daily-rolling log files
#
# [[nodes]] entries replace the built-in roster when present.

{toml_content}"#,
            prefix = ENV_PREFIX,
        ))
    }
}
