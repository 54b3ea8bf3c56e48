use std::path::PathBuf;
use thiserror::Error;

/// Exit code used when a program cannot be found, matching the shell.
pub const EXIT_COMMAND_NOT_FOUND: i32 = 127;

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Step '{step}' failed: `{program}` exited with code {code}")]
    StepFailed {
        step: String,
        program: String,
        code: i32,
    },

    #[error("Failed to start `{program}`: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Activation script not found: {}", path.display())]
    ActivationScriptMissing { path: PathBuf },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BootstrapError {
    /// 對應到程序的退出碼
    pub fn exit_code(&self) -> i32 {
        match self {
            BootstrapError::StepFailed { code, .. } => {
                if *code == 0 {
                    1
                } else {
                    *code
                }
            }
            BootstrapError::SpawnFailed { source, .. }
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                EXIT_COMMAND_NOT_FOUND
            }
            _ => 1,
        }
    }

    /// Name of the step that failed, when the error came from a child process.
    pub fn failed_step(&self) -> Option<&str> {
        match self {
            BootstrapError::StepFailed { step, .. } => Some(step),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BootstrapError>;
