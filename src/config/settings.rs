use crate::config::toml_config::TomlConfig;
use crate::core::{ConfigProvider, InstallSpec};
use crate::utils::error::Result;
use crate::utils::logger;
use crate::utils::validation::{self, Validate};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_VENV_DIR: &str = ".venv";
pub const DEFAULT_PYTHON: &str = "python3";
pub const DEFAULT_INSTALLER: &str = "pip";

/// Resolved settings after the TOML file and command-line overrides are
/// merged.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub venv_dir: PathBuf,
    pub python: String,
    pub installer: String,
    pub install: InstallSpec,
    pub log_levels: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            venv_dir: PathBuf::from(DEFAULT_VENV_DIR),
            python: DEFAULT_PYTHON.to_string(),
            installer: DEFAULT_INSTALLER.to_string(),
            install: InstallSpec::default(),
            log_levels: BTreeMap::new(),
        }
    }
}

impl Settings {
    pub fn from_toml(file: &TomlConfig) -> Self {
        let defaults = Self::default();
        let install = InstallSpec {
            project_dir: file
                .project_dir
                .clone()
                .unwrap_or(defaults.install.project_dir),
            extras: file.extras.clone().unwrap_or(defaults.install.extras),
            editable: file.editable.unwrap_or(defaults.install.editable),
        };

        Self {
            venv_dir: file.venv_dir.clone().unwrap_or(defaults.venv_dir),
            python: file.python.clone().unwrap_or(defaults.python),
            installer: file.installer.clone().unwrap_or(defaults.installer),
            install,
            log_levels: file.log_levels(),
        }
    }

    pub fn with_venv_dir(mut self, venv_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = venv_dir {
            self.venv_dir = dir;
        }
        self
    }

    pub fn with_python(mut self, python: Option<String>) -> Self {
        if let Some(python) = python {
            self.python = python;
        }
        self
    }

    pub fn with_installer(mut self, installer: Option<String>) -> Self {
        if let Some(installer) = installer {
            self.installer = installer;
        }
        self
    }
}

impl ConfigProvider for Settings {
    fn venv_dir(&self) -> &Path {
        &self.venv_dir
    }

    fn python(&self) -> &str {
        &self.python
    }

    fn installer(&self) -> &str {
        &self.installer
    }

    fn install_spec(&self) -> InstallSpec {
        self.install.clone()
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validation::validate_path("venv_dir", &self.venv_dir.to_string_lossy())?;
        validation::validate_non_empty_string("python", &self.python)?;
        validation::validate_non_empty_string("installer", &self.installer)?;
        validation::validate_path("project_dir", &self.install.project_dir)?;
        for extra in &self.install.extras {
            validation::validate_extra_name("extras", extra)?;
        }
        for (target, level) in &self.log_levels {
            logger::validate_level(target, level)?;
        }
        Ok(())
    }
}
