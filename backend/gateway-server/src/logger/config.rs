//! Logging configuration (`[log]` section of `config/*.toml`), written
//! directly against the sink split (console/file) `setup.rs` consumes.

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Log {
    pub console: ConsoleConfig,
    pub file: FileConfig,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ConsoleConfig {
    pub enabled: bool,
    #[serde(default)]
    pub level: Level,
    #[serde(default)]
    pub log_format: LogFormat,
    pub filtering_directive: Option<String>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct FileConfig {
    pub enabled: bool,
    #[serde(default)]
    pub level: Level,
    #[serde(default = "default_log_dir")]
    pub path: String,
    #[serde(default = "default_log_file_name")]
    pub file_name: String,
}

fn default_log_dir() -> String {
    "logs".to_owned()
}

fn default_log_file_name() -> String {
    "gateway-server.log".to_owned()
}

#[derive(Debug, Clone, Copy, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Default,
    Json,
}

#[derive(Debug, Clone, Copy, Default, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl Level {
    pub fn into_level(self) -> tracing::Level {
        match self {
            Self::Error => tracing::Level::ERROR,
            Self::Warn => tracing::Level::WARN,
            Self::Info => tracing::Level::INFO,
            Self::Debug => tracing::Level::DEBUG,
            Self::Trace => tracing::Level::TRACE,
        }
    }
}
