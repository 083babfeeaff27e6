use crate::error::{Error, Result};
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

/// ログファイル名のプレフィックス
pub const LOG_FILE_NAME: &str = "relay-status.log";

/// ログ設定
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    /// ログレベル (trace, debug, info, warn, error)
    pub level: String,
    /// JSON 形式で出力
    pub json: bool,
    /// コンソール出力有効
    pub console_enabled: bool,
    /// ファイル出力先（`None` ならファイル出力なし）
    pub directory: Option<PathBuf>,
    /// ファイルローテーション設定
    pub rotation: LogRotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRotation {
    /// 日次ローテーション
    Daily,
    /// 時間毎ローテーション
    Hourly,
    /// ローテーションなし
    Never,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            console_enabled: true,
            directory: None,
            rotation: LogRotation::Daily,
        }
    }
}

impl LogConfig {
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn with_console(mut self, enabled: bool) -> Self {
        self.console_enabled = enabled;
        self
    }

    /// ファイル出力先を設定
    pub fn with_directory<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.directory = Some(dir.into());
        self
    }

    pub fn with_rotation(mut self, rotation: LogRotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// `RUST_LOG` が設定されていればそちらを優先
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// ログシステムを初期化
///
/// ファイル出力時は返される `WorkerGuard` を保持している間だけ書き込まれます。
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    let mut guard = None;

    if config.console_enabled {
        let console: Box<dyn Layer<Registry> + Send + Sync> = if config.json {
            fmt::layer().json().with_writer(std::io::stderr).boxed()
        } else {
            fmt::layer().with_target(false).with_writer(std::io::stderr).boxed()
        };
        layers.push(console);
    }

    if let Some(ref dir) = config.directory {
        fs::create_dir_all(dir)?;

        let appender = match config.rotation {
            LogRotation::Daily => rolling::daily(dir, LOG_FILE_NAME),
            LogRotation::Hourly => rolling::hourly(dir, LOG_FILE_NAME),
            LogRotation::Never => rolling::never(dir, LOG_FILE_NAME),
        };
        let (writer, worker_guard) = non_blocking(appender);
        guard = Some(worker_guard);

        let file: Box<dyn Layer<Registry> + Send + Sync> = if config.json {
            fmt::layer().json().with_ansi(false).with_writer(writer).boxed()
        } else {
            fmt::layer().with_ansi(false).with_writer(writer).boxed()
        };
        layers.push(file);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(config.env_filter())
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))?;

    Ok(guard)
}
