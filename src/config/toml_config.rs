use crate::utils::error::{BootstrapError, Result};
use crate::utils::logger::LogFormat;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "venv-bootstrap.toml";

/// Contents of `venv-bootstrap.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    pub venv_dir: Option<PathBuf>,
    pub python: Option<String>,
    pub installer: Option<String>,
    pub project_dir: Option<String>,
    pub extras: Option<Vec<String>>,
    pub editable: Option<bool>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub format: Option<LogFormat>,
    #[serde(default)]
    pub levels: BTreeMap<String, String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| BootstrapError::ConfigError {
            message: format!("Cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置；環境變數只在解析後的字串值中替換
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut table: toml::Table = toml::from_str(content)?;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| BootstrapError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;
        for (_, value) in table.iter_mut() {
            Self::substitute_env_vars(&re, value);
        }
        Ok(toml::Value::Table(table).try_into()?)
    }

    /// 要載入的設定檔：明確指定的檔案 (必須存在)，或存在時的預設檔案
    pub fn discover_path(explicit: Option<&Path>) -> Option<PathBuf> {
        match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                default_path.is_file().then(|| default_path.to_path_buf())
            }
        }
    }

    /// 替換環境變數 (例如 ${PYTHON})，未設定的變數保持原樣
    fn substitute_env_vars(re: &Regex, value: &mut toml::Value) {
        match value {
            toml::Value::String(text) => {
                let replaced = re.replace_all(text, |caps: &regex::Captures| {
                    let var_name = &caps[1];
                    std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
                });
                *text = replaced.into_owned();
            }
            toml::Value::Array(items) => {
                for item in items {
                    Self::substitute_env_vars(re, item);
                }
            }
            toml::Value::Table(table) => {
                for (_, item) in table.iter_mut() {
                    Self::substitute_env_vars(re, item);
                }
            }
            _ => {}
        }
    }

    pub fn log_levels(&self) -> BTreeMap<String, String> {
        self.logging
            .as_ref()
            .map(|l| l.levels.clone())
            .unwrap_or_default()
    }

    pub fn log_format(&self) -> Option<LogFormat> {
        self.logging.as_ref().and_then(|l| l.format)
    }
}
