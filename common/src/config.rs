// Configuration management with layered configuration (file, env)

use crate::errors::SettingsError;
use crate::scheduler::SchedulerConfig;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    pub triggers: TriggersConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSettings {
    /// Wall-clock interval between cycles, in hours.
    #[serde(default = "default_interval_hours")]
    pub interval_hours: u64,
    /// Pause after a failed cycle before the loop resumes.
    #[serde(default = "default_cooldown_seconds")]
    pub cooldown_seconds: u64,
    /// Optional bound on a single trigger deploy. Absent means unbounded,
    /// matching the legacy batch runner.
    #[serde(default)]
    pub trigger_timeout_seconds: Option<u64>,
    /// Whether a restart begins counting cycles from 1 again.
    #[serde(default)]
    pub reset_cycle_on_start: bool,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            interval_hours: default_interval_hours(),
            cooldown_seconds: default_cooldown_seconds(),
            trigger_timeout_seconds: None,
            reset_cycle_on_start: false,
        }
    }
}

fn default_interval_hours() -> u64 {
    2
}

fn default_cooldown_seconds() -> u64 {
    300
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggersConfig {
    pub enrichment: TriggerConfig,
    pub prediction: TriggerConfig,
    pub validation: TriggerConfig,
}

/// Deploy command for one batch job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

fn default_log_level() -> String {
    "scheduler=info,common=info".to_string()
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default configuration
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add local configuration (not committed to git)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // Add environment-specific configuration
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.scheduler.interval_hours == 0 {
            return Err(SettingsError::ZeroInterval);
        }

        for (name, trigger) in [
            ("enrichment", &self.triggers.enrichment),
            ("prediction", &self.triggers.prediction),
            ("validation", &self.triggers.validation),
        ] {
            if trigger.command.trim().is_empty() {
                return Err(SettingsError::EmptyTriggerCommand(name.to_string()));
            }
        }

        Ok(())
    }
}

impl SchedulerSettings {
    /// Convert the file-level settings into the engine's runtime config.
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            interval: Duration::from_secs(self.interval_hours * 3600),
            cooldown: Duration::from_secs(self.cooldown_seconds),
            trigger_timeout: self.trigger_timeout_seconds.map(Duration::from_secs),
            reset_cycle_on_start: self.reset_cycle_on_start,
            ..SchedulerConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &Path, contents: &str) {
        let mut file = std::fs::File::create(dir.join("default.toml")).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    const MINIMAL: &str = r#"
[triggers.enrichment]
command = "scripts/deploy_enrichment_job.sh"

[triggers.prediction]
command = "scripts/deploy_prediction_job.sh"

[triggers.validation]
command = "scripts/deploy_validation_job.sh"
"#;

    #[test]
    fn minimal_config_gets_defaults() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), MINIMAL);

        let settings = Settings::load_from_path(dir.path()).unwrap();
        assert_eq!(settings.scheduler.interval_hours, 2);
        assert_eq!(settings.scheduler.cooldown_seconds, 300);
        assert_eq!(settings.scheduler.trigger_timeout_seconds, None);
        assert!(!settings.scheduler.reset_cycle_on_start);
        assert!(!settings.observability.json_logs);
        settings.validate().unwrap();
    }

    #[test]
    fn scheduler_section_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            &format!(
                r#"
[scheduler]
interval_hours = 6
cooldown_seconds = 60
trigger_timeout_seconds = 900
reset_cycle_on_start = true
{MINIMAL}"#
            ),
        );

        let settings = Settings::load_from_path(dir.path()).unwrap();
        assert_eq!(settings.scheduler.interval_hours, 6);
        assert_eq!(settings.scheduler.cooldown_seconds, 60);
        assert_eq!(settings.scheduler.trigger_timeout_seconds, Some(900));
        assert!(settings.scheduler.reset_cycle_on_start);

        let config = settings.scheduler.scheduler_config();
        assert_eq!(config.interval, Duration::from_secs(6 * 3600));
        assert_eq!(config.cooldown, Duration::from_secs(60));
        assert_eq!(config.trigger_timeout, Some(Duration::from_secs(900)));
        assert!(config.reset_cycle_on_start);
    }

    #[test]
    fn zero_interval_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            &format!(
                r#"
[scheduler]
interval_hours = 0
{MINIMAL}"#
            ),
        );

        let settings = Settings::load_from_path(dir.path()).unwrap();
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::ZeroInterval)
        ));
    }

    #[test]
    fn empty_trigger_command_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            r#"
[triggers.enrichment]
command = ""

[triggers.prediction]
command = "scripts/deploy_prediction_job.sh"

[triggers.validation]
command = "scripts/deploy_validation_job.sh"
"#,
        );

        let settings = Settings::load_from_path(dir.path()).unwrap();
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::EmptyTriggerCommand(name)) if name == "enrichment"
        ));
    }
}
