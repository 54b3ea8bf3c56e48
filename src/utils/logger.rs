use crate::utils::error::{BootstrapError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// 建立過濾器：RUST_LOG 優先，其次是預設值加上設定檔中的個別 target 等級
pub fn build_filter(verbose: bool, levels: &BTreeMap<String, String>) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut directives = if verbose {
        "venv_bootstrap=debug,info".to_string()
    } else {
        "venv_bootstrap=info".to_string()
    };
    for (target, level) in levels {
        directives.push(',');
        directives.push_str(&format!("{}={}", target, level));
    }

    EnvFilter::try_new(&directives).map_err(|e| BootstrapError::InvalidConfigValueError {
        field: "logging.levels".to_string(),
        value: directives.clone(),
        reason: e.to_string(),
    })
}

/// Checks one `[logging.levels]` entry.
pub fn validate_level(target: &str, level: &str) -> Result<()> {
    let invalid = |reason: &str| BootstrapError::InvalidConfigValueError {
        field: format!("logging.levels.{}", target),
        value: level.to_string(),
        reason: reason.to_string(),
    };

    if target.trim().is_empty() || target.contains([',', '=', '[', ']', ' ']) {
        return Err(invalid("Target must be a module path"));
    }
    LevelFilter::from_str(level)
        .map(|_| ())
        .map_err(|_| invalid("Expected one of off, error, warn, info, debug, trace"))
}

pub fn init_cli_logger(
    verbose: bool,
    format: LogFormat,
    log_file: Option<&Path>,
    levels: &BTreeMap<String, String>,
) -> Result<()> {
    let filter = build_filter(verbose, levels)?;

    let layer = match log_file {
        Some(path) => {
            // 與 shell 的 >> 一樣以附加模式寫入
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let base = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            match format {
                LogFormat::Compact => base.compact().boxed(),
                LogFormat::Json => base.json().boxed(),
            }
        }
        None => {
            let base = tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_writer(std::io::stderr);
            match format {
                LogFormat::Compact => base.compact().boxed(),
                LogFormat::Json => base.json().boxed(),
            }
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|e| BootstrapError::ConfigError {
            message: format!("Logger already initialised: {}", e),
        })
}
