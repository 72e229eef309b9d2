use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

const DEFAULT_ENABLED_KINDS: [&str; 13] = [
    "SyntaxError",
    "TypeError",
    "ValueError",
    "AttributeError",
    "NameError",
    "ImportError",
    "IndexError",
    "KeyError",
    "FileNotFoundError",
    "404Error",
    "500Error",
    "DatabaseError",
    "ConnectionError",
];

/// Monitor settings as persisted in the JSON config file. Keys missing
/// from the file keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub language: String,
    pub email_notifications: bool,
    pub email_address: String,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub enabled_error_types: Vec<String>,
    pub log_retention_days: u32,
    pub max_logs_per_file: u32,
    /// Seconds between poll cycles.
    pub monitoring_interval: u64,
    pub solution_lookup: bool,
    pub lookup_timeout_secs: u64,
    /// Begin each watched file at its current end instead of offset 0.
    pub start_from_end: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            language: "en".into(),
            email_notifications: false,
            email_address: String::new(),
            smtp_server: "smtp.gmail.com".into(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            enabled_error_types: DEFAULT_ENABLED_KINDS
                .iter()
                .map(|kind| kind.to_string())
                .collect(),
            log_retention_days: 30,
            max_logs_per_file: 10_000,
            monitoring_interval: 2,
            solution_lookup: true,
            lookup_timeout_secs: 5,
            start_from_end: false,
        }
    }
}

impl MonitorConfig {
    pub fn enabled_kinds(&self) -> HashSet<String> {
        self.enabled_error_types.iter().cloned().collect()
    }

    /// Never zero, so the poll loop cannot spin.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.monitoring_interval.max(1))
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }
}

pub struct ConfigStore {
    path: PathBuf,
    data: RwLock<MonitorConfig>,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!(
                    "Ignoring malformed config {} ({err}); using defaults",
                    path.display()
                );
                MonitorConfig::default()
            })
        } else {
            MonitorConfig::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn get(&self) -> MonitorConfig {
        self.read_guard().clone()
    }

    pub fn update(&self, config: MonitorConfig) -> Result<()> {
        let mut guard = self.write_guard();
        self.persist(&config)?;
        *guard = config;
        Ok(())
    }

    pub fn reset_to_defaults(&self) -> Result<()> {
        self.update(MonitorConfig::default())
    }

    fn persist(&self, data: &MonitorConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create config directory {}", parent.display())
                })?;
            }
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write config to {}", self.path.display()))
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, MonitorConfig> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, MonitorConfig> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
