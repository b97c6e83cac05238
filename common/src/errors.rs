// Error handling framework

use thiserror::Error;

/// Errors raised by job trigger deployments.
///
/// The scheduler loop treats every variant uniformly: log, cool down,
/// resume at the next cycle. The distinctions exist for log readability,
/// not for differentiated handling.
#[derive(Error, Debug)]
pub enum TriggerError {
    #[error("failed to spawn deploy command '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("deploy command '{command}' exited with {status}")]
    CommandFailed {
        command: String,
        status: std::process::ExitStatus,
    },

    #[error("trigger '{trigger}' timed out after {seconds}s")]
    Timeout { trigger: String, seconds: u64 },

    #[error("deploy failed: {0}")]
    DeployFailed(String),
}

/// Configuration validation errors surfaced at startup.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("scheduler interval must be greater than 0")]
    ZeroInterval,

    #[error("trigger '{0}' has an empty deploy command")]
    EmptyTriggerCommand(String),
}
