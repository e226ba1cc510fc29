use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::ai::{ProviderConfig, ProviderFactory};
use crate::infrastructure::logging::LogFormat;

/// 进程级配置，启动时构建一次，之后只读
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub provider: String,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    pub ai_timeout_secs: u64,
    pub ai_enabled: bool,
    pub python: String,
    pub pylintrc: Option<PathBuf>,
    pub cxx: String,
    pub cxx_std: String,
    /// OCR 命令，用于图片上传
    pub tesseract: String,
    pub temp_dir: PathBuf,
    /// 未设置时不限制外部工具的运行时间
    pub tool_timeout_secs: Option<u64>,
    pub js_rules: Option<PathBuf>,
    pub log_filter: Option<String>,
    /// pretty / compact / json
    pub log_format: Option<String>,
    pub log_file: Option<PathBuf>,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: None,
            api_key: None,
            api_url: None,
            ai_timeout_secs: 60,
            ai_enabled: true,
            python: "python3".to_string(),
            pylintrc: None,
            cxx: "g++".to_string(),
            cxx_std: "c++17".to_string(),
            tesseract: "tesseract".to_string(),
            temp_dir: env::temp_dir(),
            tool_timeout_secs: None,
            js_rules: None,
            log_filter: None,
            log_format: None,
            log_file: None,
            debug: false,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        let mut config = Config::default();

        // 加载配置文件
        #[cfg(not(test))]
        config.load_from_env_file();
        // 加载环境变量（覆盖配置文件）
        config.load_from_env();

        config
    }

    pub fn load_from_env_file(&mut self) {
        // 先加载用户主目录，dotenvy 不覆盖已存在的变量
        if let Ok(home) = env::var("HOME") {
            let user_env_path = PathBuf::from(home).join(".ai-lint").join(".env");
            if user_env_path.exists() {
                dotenvy::from_path(user_env_path).ok();
            }
        }

        // 再尝试当前目录
        dotenvy::dotenv().ok();
    }

    pub fn load_from_env(&mut self) {
        if let Some(provider) = env_value("AI_LINT_PROVIDER") {
            self.provider = provider.to_lowercase();
        }
        if let Some(model) = env_value("AI_LINT_MODEL") {
            self.model = Some(model);
        }
        if let Some(api_key) = env_value("AI_LINT_API_KEY") {
            self.api_key = Some(api_key);
        }
        if let Some(url) = env_value("AI_LINT_API_URL") {
            self.api_url = Some(url);
        }
        if let Some(secs) = env_value("AI_LINT_AI_TIMEOUT_SECS") {
            match secs.parse() {
                Ok(secs) => self.ai_timeout_secs = secs,
                Err(_) => tracing::warn!("Ignoring invalid AI_LINT_AI_TIMEOUT_SECS: {}", secs),
            }
        }
        if let Some(python) = env_value("AI_LINT_PYTHON") {
            self.python = python;
        }
        if let Some(path) = env_value("AI_LINT_PYLINTRC") {
            self.pylintrc = Some(PathBuf::from(path));
        }
        if let Some(cxx) = env_value("AI_LINT_CXX") {
            self.cxx = cxx;
        }
        if let Some(std) = env_value("AI_LINT_CXX_STD") {
            self.cxx_std = std;
        }
        if let Some(tesseract) = env_value("AI_LINT_TESSERACT") {
            self.tesseract = tesseract;
        }
        if let Some(dir) = env_value("AI_LINT_TEMP_DIR") {
            self.temp_dir = PathBuf::from(dir);
        }
        if let Some(secs) = env_value("AI_LINT_TOOL_TIMEOUT_SECS") {
            match secs.parse() {
                Ok(secs) => self.tool_timeout_secs = Some(secs),
                Err(_) => tracing::warn!("Ignoring invalid AI_LINT_TOOL_TIMEOUT_SECS: {}", secs),
            }
        }
        if let Some(path) = env_value("AI_LINT_JS_RULES") {
            self.js_rules = Some(PathBuf::from(path));
        }
        if let Some(filter) = env_value("AI_LINT_LOG") {
            self.log_filter = Some(filter);
        }
        if let Some(format) = env_value("AI_LINT_LOG_FORMAT") {
            self.log_format = Some(format);
        }
        if let Some(path) = env_value("AI_LINT_LOG_FILE") {
            self.log_file = Some(PathBuf::from(path));
        }
        if let Some(debug) = env_value("AI_LINT_DEBUG") {
            self.debug = matches!(debug.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
    }

    pub fn update_from_args(&mut self, args: &crate::cli::args::Args) {
        // 命令行参数优先级最高
        if !args.provider.is_empty() {
            self.provider = args.provider.to_lowercase();
        }
        if !args.model.is_empty() {
            self.model = Some(args.model.clone());
        }
        if args.no_ai {
            self.ai_enabled = false;
        }
        if args.debug {
            self.debug = true;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if ProviderFactory::defaults(&self.provider).is_none() {
            anyhow::bail!(
                "Unsupported provider: {} (expected one of: {})",
                self.provider,
                ProviderFactory::list_providers().join(", ")
            );
        }
        if self.ai_timeout_secs == 0 {
            anyhow::bail!("AI_LINT_AI_TIMEOUT_SECS must be greater than 0");
        }
        if self.tool_timeout_secs == Some(0) {
            anyhow::bail!("AI_LINT_TOOL_TIMEOUT_SECS must be greater than 0 when set");
        }
        if self.python.trim().is_empty() || self.cxx.trim().is_empty() || self.tesseract.trim().is_empty() {
            anyhow::bail!("Tool commands must not be empty");
        }
        if let Some(api_url) = &self.api_url {
            url::Url::parse(api_url)
                .map_err(|e| anyhow::anyhow!("Invalid AI_LINT_API_URL {}: {}", api_url, e))?;
        }
        if let Some(format) = &self.log_format {
            format
                .parse::<LogFormat>()
                .map_err(|e| anyhow::anyhow!("Invalid AI_LINT_LOG_FORMAT: {}", e))?;
        }
        if let Some(path) = &self.js_rules {
            if !path.is_file() {
                anyhow::bail!("JavaScript rules file not found: {}", path.display());
            }
        }
        Ok(())
    }

    /// 当前提供商的请求配置，未设置的项使用提供商默认值
    pub fn provider_config(&self) -> ProviderConfig {
        let mut config = ProviderConfig::for_provider(&self.provider);
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(url) = &self.api_url {
            config.api_url = url.clone();
        }
        config.api_key = self.api_key.clone();
        config.timeout_secs = self.ai_timeout_secs;
        config
    }

    pub fn tool_timeout(&self) -> Option<Duration> {
        self.tool_timeout_secs.map(Duration::from_secs)
    }
}

fn env_value(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // 环境变量是进程级共享状态
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const KEYS: &[&str] = &[
        "AI_LINT_PROVIDER",
        "AI_LINT_MODEL",
        "AI_LINT_API_KEY",
        "AI_LINT_API_URL",
        "AI_LINT_AI_TIMEOUT_SECS",
        "AI_LINT_PYTHON",
        "AI_LINT_PYLINTRC",
        "AI_LINT_CXX",
        "AI_LINT_CXX_STD",
        "AI_LINT_TESSERACT",
        "AI_LINT_TEMP_DIR",
        "AI_LINT_TOOL_TIMEOUT_SECS",
        "AI_LINT_JS_RULES",
        "AI_LINT_LOG",
        "AI_LINT_LOG_FORMAT",
        "AI_LINT_LOG_FILE",
        "AI_LINT_DEBUG",
    ];

    fn clear_env() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_config_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        let config = Config::new();
        assert_eq!(config.provider, "openai");
        assert_eq!(config.python, "python3");
        assert_eq!(config.cxx, "g++");
        assert_eq!(config.cxx_std, "c++17");
        assert!(config.tool_timeout().is_none());
        assert!(config.ai_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_env() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        env::set_var("AI_LINT_PROVIDER", "Claude");
        env::set_var("AI_LINT_API_KEY", "test-key");
        env::set_var("AI_LINT_CXX", "clang++");
        env::set_var("AI_LINT_TOOL_TIMEOUT_SECS", "15");
        env::set_var("AI_LINT_AI_TIMEOUT_SECS", "not-a-number");
        env::set_var("AI_LINT_DEBUG", "true");
        env::set_var("AI_LINT_LOG_FORMAT", "json");
        env::set_var("AI_LINT_LOG_FILE", "/var/log/ai-lint.log");

        let config = Config::new();
        assert_eq!(config.provider, "claude");
        assert_eq!(config.api_key.as_deref(), Some("test-key"));
        assert_eq!(config.cxx, "clang++");
        assert_eq!(config.tool_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(config.ai_timeout_secs, 60);
        assert!(config.debug);
        assert_eq!(config.log_format.as_deref(), Some("json"));
        assert_eq!(config.log_file, Some(PathBuf::from("/var/log/ai-lint.log")));

        clear_env();
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.provider = "unsupported".to_string();
        assert!(config.validate().is_err());

        config.provider = "ollama".to_string();
        config.tool_timeout_secs = Some(0);
        assert!(config.validate().is_err());

        config.tool_timeout_secs = None;
        config.api_url = Some("not a url".to_string());
        assert!(config.validate().is_err());

        config.api_url = Some("http://localhost:11434/api/generate".to_string());
        assert!(config.validate().is_ok());

        config.log_format = Some("xml".to_string());
        assert!(config.validate().is_err());

        config.log_format = Some("json".to_string());
        assert!(config.validate().is_ok());

        config.js_rules = Some(PathBuf::from("/definitely/not/here.toml"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_provider_config_overrides() {
        let config = Config {
            provider: "deepseek".to_string(),
            model: Some("deepseek-coder".to_string()),
            api_key: Some("k".to_string()),
            ai_timeout_secs: 10,
            ..Config::default()
        };
        let provider = config.provider_config();
        assert_eq!(provider.model, "deepseek-coder");
        assert_eq!(provider.api_url, "https://api.deepseek.com/v1/chat/completions");
        assert_eq!(provider.api_key.as_deref(), Some("k"));
        assert_eq!(provider.timeout_secs, 10);
    }

    #[test]
    fn test_update_from_args() {
        let mut config = Config::default();
        let args = crate::cli::args::Args {
            provider: "Gemini".to_string(),
            model: "gemini-pro".to_string(),
            no_ai: true,
            ..Default::default()
        };
        config.update_from_args(&args);
        assert_eq!(config.provider, "gemini");
        assert_eq!(config.model.as_deref(), Some("gemini-pro"));
        assert!(!config.ai_enabled);
    }
}
