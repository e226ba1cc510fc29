use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::config::Config;

/// 日志配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: Level,
    pub format: LogFormat,
    pub output: LogOutput,
    pub include_file_location: bool,
    pub include_span_events: bool,
    /// 完整的过滤指令，优先于 `level`
    pub filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Compact,
            output: LogOutput::Stderr,
            include_file_location: false,
            include_span_events: false,
            filter: None,
        }
    }
}

impl LoggingConfig {
    /// 由进程配置派生：debug 模式提高级别，带上源码位置和每次分析的耗时；
    /// 显式设置的格式优先于 debug 模式的默认格式
    pub fn from_config(config: &Config) -> Self {
        let mut logging = Self {
            filter: config.log_filter.clone(),
            ..Self::default()
        };
        if config.debug {
            logging.level = Level::DEBUG;
            logging.format = LogFormat::Pretty;
            logging.include_file_location = true;
            logging.include_span_events = true;
        }
        if let Some(format) = config.log_format.as_deref().and_then(|f| f.parse().ok()) {
            logging.format = format;
        }
        if let Some(path) = &config.log_file {
            logging.output = LogOutput::File(path.clone());
        }
        logging
    }

    fn build_filter(&self) -> anyhow::Result<EnvFilter> {
        let filter = match &self.filter {
            Some(filter) => EnvFilter::try_new(filter)?,
            None => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn"))
                .add_directive(format!("ai_lint={}", self.level).parse()?),
        };
        Ok(filter)
    }
}

/// 日志格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 人类可读的格式
    Pretty,
    /// 紧凑格式
    Compact,
    /// JSON 格式
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("Unknown log format: {} (expected pretty, compact or json)", other),
        }
    }
}

/// 日志输出目标；标准输出留给分析报告
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutput {
    Stderr,
    /// 追加写入文件
    File(PathBuf),
}

/// 设置日志系统
pub fn setup_logging(config: LoggingConfig) -> anyhow::Result<()> {
    let env_filter = config.build_filter()?;
    let fmt_layer = output_layer(&config)?;

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(env_filter))
        .try_init()?;

    Ok(())
}

fn output_layer(config: &LoggingConfig) -> anyhow::Result<Box<dyn Layer<Registry> + Send + Sync>> {
    let layer = match &config.output {
        LogOutput::Stderr => create_fmt_layer(config, std::io::stderr),
        LogOutput::File(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| anyhow::anyhow!("Cannot open log file {}: {}", path.display(), e))?;
            create_fmt_layer(config, Mutex::new(file))
        }
    };
    Ok(layer)
}

fn create_fmt_layer<W>(config: &LoggingConfig, make_writer: W) -> Box<dyn Layer<Registry> + Send + Sync>
where
    W: for<'writer> fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
    let mut layer = fmt::layer()
        .with_writer(make_writer)
        .with_target(true)
        .with_level(true);

    if config.include_file_location {
        layer = layer.with_file(true).with_line_number(true);
    }

    if config.include_span_events {
        layer = layer.with_span_events(FmtSpan::CLOSE);
    }

    match config.format {
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
        LogFormat::Json => layer.json().boxed(),
    }
}
