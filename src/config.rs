// Configuration management

use crate::error::{PiwatchError, Result};
use crate::state::Metric;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

/// The three independently scheduled areas, each with its own logs and state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    DownAlert,
    Monitor,
    Maintenance,
}

impl Domain {
    pub fn name(&self) -> &'static str {
        match self {
            Domain::DownAlert => "down_alert",
            Domain::Monitor => "monitor",
            Domain::Maintenance => "maintenance",
        }
    }

    pub fn state_file_name(&self) -> String {
        format!("{}_state.json", self.name())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default, deserialize_with = "chat_id_from_any")]
    pub chat_id: Option<String>,
    #[serde(default = "TelegramConfig::default_api_base")]
    pub api_base: String,
    #[serde(default = "TelegramConfig::default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "TelegramConfig::default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base: Self::default_api_base(),
            timeout_secs: Self::default_timeout_secs(),
            poll_timeout_secs: Self::default_poll_timeout_secs(),
        }
    }
}

impl TelegramConfig {
    fn default_api_base() -> String {
        "https://api.telegram.org".to_string()
    }

    fn default_timeout_secs() -> u64 {
        10
    }

    fn default_poll_timeout_secs() -> u64 {
        30
    }

    /// Bot token, treating blank strings as missing
    pub fn token(&self) -> Option<&str> {
        self.bot_token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    pub fn chat(&self) -> Option<&str> {
        self.chat_id.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }
}

/// Telegram chat ids show up as numbers or strings depending on who wrote the file
fn chat_id_from_any<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Text(String),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Int(id) => id.to_string(),
        Raw::Text(id) => id,
    }))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainPaths {
    pub logs: PathBuf,
    pub state: PathBuf,
}

impl DomainPaths {
    fn for_domain(domain: Domain) -> Self {
        Self {
            logs: PathBuf::from(domain.name()).join("logs"),
            state: PathBuf::from(domain.name()).join("state"),
        }
    }

    fn down_alert() -> Self {
        Self::for_domain(Domain::DownAlert)
    }

    fn monitor() -> Self {
        Self::for_domain(Domain::Monitor)
    }

    fn maintenance() -> Self {
        Self::for_domain(Domain::Maintenance)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "DomainPaths::down_alert")]
    pub down_alert: DomainPaths,
    #[serde(default = "DomainPaths::monitor")]
    pub monitor: DomainPaths,
    #[serde(default = "DomainPaths::maintenance")]
    pub maintenance: DomainPaths,
    /// Executable used by the bot to launch one-shot checks
    #[serde(default)]
    pub launcher: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            down_alert: DomainPaths::down_alert(),
            monitor: DomainPaths::monitor(),
            maintenance: DomainPaths::maintenance(),
            launcher: None,
        }
    }
}

/// Per-metric alert limits (percent, temperature in °C)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub cpu: f64,
    pub ram: f64,
    pub disk: f64,
    pub temp: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cpu: 85.0,
            ram: 90.0,
            disk: 90.0,
            temp: 75.0,
        }
    }
}

impl Thresholds {
    pub fn limit(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Cpu => self.cpu,
            Metric::Ram => self.ram,
            Metric::Disk => self.disk,
            Metric::Temp => self.temp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub unit: String,
    pub display_name: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            unit: "pihole-FTL.service".to_string(),
            display_name: "Pi-hole".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    pub host: String,
    pub timeout_secs: u64,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            host: "1.1.1.1".to_string(),
            timeout_secs: 2,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub connectivity: ConnectivityConfig,

    /// Absolute path of the file this config was read from
    #[serde(skip)]
    pub source: PathBuf,
    /// Directory that relative paths are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Config {
    /// Load config from `path`. A missing or unreadable file is fatal.
    ///
    /// The parser is YAML, which also accepts plain JSON config files.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PiwatchError::Config(format!(
                "Config file not found: {}",
                path.display()
            ))
            .into());
        }

        let source = path.canonicalize()?;
        let contents = std::fs::read_to_string(&source)?;
        let mut config: Config = serde_yaml::from_str(&contents).map_err(|e| {
            PiwatchError::Config(format!("Failed to parse {}: {}", source.display(), e))
        })?;

        // Project root sits one level above the directory holding the config
        let config_dir = source.parent().unwrap_or_else(|| Path::new("/"));
        config.base_dir = config_dir.parent().unwrap_or(config_dir).to_path_buf();
        config.source = source;

        Ok(config)
    }

    /// Fail unless outbound alerts can actually be delivered
    pub fn require_telegram(&self) -> Result<()> {
        if self.telegram.token().is_none() {
            return Err(PiwatchError::MissingCredential("telegram.bot_token").into());
        }
        if self.telegram.chat().is_none() {
            return Err(PiwatchError::MissingCredential("telegram.chat_id").into());
        }
        Ok(())
    }

    /// Resolve a configured path against the project root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn domain_paths(&self, domain: Domain) -> &DomainPaths {
        match domain {
            Domain::DownAlert => &self.paths.down_alert,
            Domain::Monitor => &self.paths.monitor,
            Domain::Maintenance => &self.paths.maintenance,
        }
    }

    pub fn log_dir(&self, domain: Domain) -> PathBuf {
        self.resolve(&self.domain_paths(domain).logs)
    }

    pub fn state_file(&self, domain: Domain) -> PathBuf {
        self.resolve(&self.domain_paths(domain).state)
            .join(domain.state_file_name())
    }

    /// Executable the bot re-invokes for forced checks
    pub fn launcher(&self) -> Result<PathBuf> {
        match &self.paths.launcher {
            Some(path) => Ok(self.resolve(path)),
            None => Ok(std::env::current_exe()?),
        }
    }
}
