use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use courier_core::{AppIdentity, CoreConfig, NumberPolicy, ScreenProfile, Timings};
use courier_engine::EngineConfig;
use engine_logging::{engine_info, engine_warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
}

/// Timeouts in milliseconds, as written in config files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingsMs {
    pub contact_open: u64,
    pub confirm_send: u64,
    pub return_home: u64,
    pub advance: u64,
}

impl Default for TimingsMs {
    fn default() -> Self {
        let defaults = Timings::default();
        Self {
            contact_open: millis(defaults.contact_open_timeout),
            confirm_send: millis(defaults.confirm_send_timeout),
            return_home: millis(defaults.return_home_timeout),
            advance: millis(defaults.advance_delay),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl From<&TimingsMs> for Timings {
    fn from(ms: &TimingsMs) -> Self {
        Timings {
            contact_open_timeout: Duration::from_millis(ms.contact_open),
            confirm_send_timeout: Duration::from_millis(ms.confirm_send),
            return_home_timeout: Duration::from_millis(ms.return_home),
            advance_delay: Duration::from_millis(ms.advance),
        }
    }
}

/// Contents of `courier.ron`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub target_package: String,
    pub deep_link_base: String,
    pub jid_suffix: String,
    pub default_country_code: String,
    pub national_length: usize,
    pub timings: TimingsMs,
    pub profile: ScreenProfile,
}

impl Default for AppConfig {
    fn default() -> Self {
        let identity = AppIdentity::whatsapp();
        let policy = NumberPolicy::default();
        Self {
            target_package: identity.package,
            deep_link_base: identity.deep_link_base,
            jid_suffix: identity.jid_suffix,
            default_country_code: policy.default_country_code,
            national_length: policy.national_length,
            timings: TimingsMs::default(),
            profile: ScreenProfile::default(),
        }
    }
}

impl AppConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            core: CoreConfig {
                identity: AppIdentity {
                    package: self.target_package.clone(),
                    deep_link_base: self.deep_link_base.clone(),
                    jid_suffix: self.jid_suffix.clone(),
                },
                profile: self.profile.clone(),
                timings: Timings::from(&self.timings),
            },
            number_policy: NumberPolicy {
                default_country_code: self.default_country_code.clone(),
                national_length: self.national_length,
            },
        }
    }
}

/// A broadcast to run: raw numbers, message text and attachment URIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFile {
    pub recipients: Vec<String>,
    pub message: String,
    #[serde(default)]
    pub attachments: Vec<String>,
}

/// Loads the app config. A missing file means defaults.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };
    match fs::read_to_string(path) {
        Ok(text) => {
            let config = parse(path, &text)?;
            engine_info!("Loaded config from {:?}", path);
            Ok(config)
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            engine_warn!("Config {:?} not found; using defaults", path);
            Ok(AppConfig::default())
        }
        Err(source) => Err(ConfigError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

pub fn load_job(path: &Path) -> Result<JobFile, ConfigError> {
    load_ron(path)
}

pub(crate) fn load_ron<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(path, &text)
}

fn parse<T: DeserializeOwned>(path: &Path, text: &str) -> Result<T, ConfigError> {
    ron::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
