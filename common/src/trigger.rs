// Job trigger abstraction and the command-backed implementation

use crate::config::{TriggerConfig, TriggersConfig};
use crate::errors::TriggerError;
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Capability interface for deploying one external batch job.
///
/// Fire-and-forget: the scheduler only learns success or failure, never a
/// payload. Implementations that need richer status reporting should go
/// through the external job system, not through the scheduler.
#[async_trait]
pub trait JobTrigger: Send + Sync {
    /// Human-readable trigger name, used in logs.
    fn name(&self) -> &str;

    /// Deploy the job. Blocks until the deploy command itself finishes.
    async fn deploy(&self) -> Result<(), TriggerError>;
}

/// Trigger that deploys a job by running an external command, the way the
/// legacy batch runner shelled out to its deploy scripts.
pub struct CommandTrigger {
    name: String,
    program: String,
    args: Vec<String>,
}

impl CommandTrigger {
    pub fn new(name: impl Into<String>, config: &TriggerConfig) -> Self {
        Self {
            name: name.into(),
            program: config.command.clone(),
            args: config.args.clone(),
        }
    }

    fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

#[async_trait]
impl JobTrigger for CommandTrigger {
    fn name(&self) -> &str {
        &self.name
    }

    async fn deploy(&self) -> Result<(), TriggerError> {
        debug!(trigger = %self.name, command = %self.command_line(), "spawning deploy command");

        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| TriggerError::Spawn {
                command: self.command_line(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                trigger = %self.name,
                status = %output.status,
                stderr = %stderr.trim(),
                "deploy command failed"
            );
            return Err(TriggerError::CommandFailed {
                command: self.command_line(),
                status: output.status,
            });
        }

        info!(trigger = %self.name, "job deployed");
        Ok(())
    }
}

/// The three batch jobs the scheduler drives.
#[derive(Clone)]
pub struct TriggerSet {
    pub enrichment: Arc<dyn JobTrigger>,
    pub prediction: Arc<dyn JobTrigger>,
    pub validation: Arc<dyn JobTrigger>,
}

impl TriggerSet {
    pub fn new(
        enrichment: Arc<dyn JobTrigger>,
        prediction: Arc<dyn JobTrigger>,
        validation: Arc<dyn JobTrigger>,
    ) -> Self {
        Self {
            enrichment,
            prediction,
            validation,
        }
    }

    /// Build command-backed triggers from the configured deploy scripts.
    pub fn from_settings(config: &TriggersConfig) -> Self {
        Self {
            enrichment: Arc::new(CommandTrigger::new("enrichment", &config.enrichment)),
            prediction: Arc::new(CommandTrigger::new("prediction", &config.prediction)),
            validation: Arc::new(CommandTrigger::new("validation", &config.validation)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trigger_config(command: &str, args: &[&str]) -> TriggerConfig {
        TriggerConfig {
            command: command.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn successful_command_deploys() {
        let trigger = CommandTrigger::new("enrichment", &trigger_config("true", &[]));
        trigger.deploy().await.unwrap();
    }

    #[tokio::test]
    async fn failing_command_reports_status() {
        let trigger = CommandTrigger::new("prediction", &trigger_config("false", &[]));
        let err = trigger.deploy().await.unwrap_err();
        assert!(matches!(err, TriggerError::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn missing_command_reports_spawn_error() {
        let trigger = CommandTrigger::new(
            "validation",
            &trigger_config("/nonexistent/deploy_script.sh", &[]),
        );
        let err = trigger.deploy().await.unwrap_err();
        assert!(matches!(err, TriggerError::Spawn { .. }));
    }

    #[test]
    fn command_line_includes_args() {
        let trigger = CommandTrigger::new(
            "enrichment",
            &trigger_config("scripts/deploy.sh", &["--env", "prod"]),
        );
        assert_eq!(trigger.command_line(), "scripts/deploy.sh --env prod");
        assert_eq!(trigger.name(), "enrichment");
    }
}
