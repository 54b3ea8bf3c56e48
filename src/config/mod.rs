pub mod settings;
pub mod toml_config;

pub use settings::Settings;
pub use toml_config::TomlConfig;

#[cfg(feature = "cli")]
use crate::core::engine::Command;
#[cfg(feature = "cli")]
use crate::utils::{error::Result, logger::LogFormat, validation::Validate};
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use std::path::PathBuf;

// 選項只在子命令之前解析；`install` 之後的參數全部轉交給套件管理器
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "venv-bootstrap", version)]
#[command(about = "Create, activate and install into a project's Python virtual environment")]
pub struct CliConfig {
    /// Path to a TOML configuration file (default: ./venv-bootstrap.toml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Virtual environment directory
    #[arg(long)]
    pub venv_dir: Option<PathBuf>,

    /// Interpreter used to create the environment
    #[arg(long)]
    pub python: Option<String>,

    /// Package manager used for the install step
    #[arg(long)]
    pub installer: Option<String>,

    /// Print the commands that would run without executing them
    #[arg(long)]
    pub dry_run: bool,

    /// Output format of the dry-run plan
    #[arg(long, value_enum, default_value_t = OutputFormat::Shell)]
    pub plan_format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Log output format (overrides the config file)
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Create the virtual environment if it does not exist
    CreateVenv,

    /// Print the variables that activate the environment, for `eval`
    ActivateVenv {
        #[arg(long, value_enum, default_value_t = OutputFormat::Shell)]
        format: OutputFormat,
    },

    /// Editable install of the project with its extras into the environment
    Install {
        /// Arguments forwarded verbatim to the package manager
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Shell,
    Json,
}

#[cfg(feature = "cli")]
impl From<&Commands> for Command {
    fn from(command: &Commands) -> Self {
        match command {
            Commands::CreateVenv => Command::CreateVenv,
            Commands::ActivateVenv { .. } => Command::ActivateVenv,
            Commands::Install { args } => Command::Install { args: args.clone() },
        }
    }
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 合併設定檔與命令列覆蓋設定，並驗證結果
    pub fn settings(&self, file: &TomlConfig) -> Result<Settings> {
        let settings = Settings::from_toml(file)
            .with_venv_dir(self.venv_dir.clone())
            .with_python(self.python.clone())
            .with_installer(self.installer.clone());
        settings.validate()?;
        Ok(settings)
    }

    pub fn log_format(&self, file: &TomlConfig) -> LogFormat {
        self.log_format
            .or_else(|| file.log_format())
            .unwrap_or_default()
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_install_forwards_hyphenated_args() {
        let cli =
            CliConfig::try_parse_from(["venv-bootstrap", "install", "--upgrade", "-q"]).unwrap();
        match &cli.command {
            Commands::Install { args } => assert_eq!(args, &["--upgrade", "-q"]),
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(
            Command::from(&cli.command),
            Command::Install {
                args: vec!["--upgrade".to_string(), "-q".to_string()]
            }
        );
    }

    #[test]
    fn test_install_without_args() {
        let cli = CliConfig::try_parse_from(["venv-bootstrap", "install"]).unwrap();
        assert_eq!(Command::from(&cli.command), Command::Install { args: vec![] });
    }

    #[test]
    fn test_unknown_subcommand_is_rejected() {
        assert!(CliConfig::try_parse_from(["venv-bootstrap", "frobnicate"]).is_err());
        assert!(CliConfig::try_parse_from(["venv-bootstrap"]).is_err());
    }

    #[test]
    fn test_options_before_subcommand() {
        let cli = CliConfig::try_parse_from([
            "venv-bootstrap",
            "--venv-dir",
            "env",
            "--dry-run",
            "--plan-format",
            "json",
            "create-venv",
        ])
        .unwrap();
        assert!(cli.dry_run);
        assert_eq!(cli.plan_format, OutputFormat::Json);

        let settings = cli.settings(&TomlConfig::default()).unwrap();
        assert_eq!(settings.venv_dir, PathBuf::from("env"));
        assert_eq!(cli.log_format(&TomlConfig::default()), LogFormat::Compact);
    }

    #[test]
    fn test_install_args_shadowing_own_options_are_forwarded() {
        let cli = CliConfig::try_parse_from([
            "venv-bootstrap",
            "install",
            "-c",
            "constraints.txt",
            "--dry-run",
            "-v",
            "--python",
            "/usr/bin/python3.11",
        ])
        .unwrap();

        match &cli.command {
            Commands::Install { args } => assert_eq!(
                args,
                &[
                    "-c",
                    "constraints.txt",
                    "--dry-run",
                    "-v",
                    "--python",
                    "/usr/bin/python3.11"
                ]
            ),
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(cli.config.is_none());
        assert!(!cli.dry_run);
        assert!(!cli.verbose);
        assert!(cli.python.is_none());
    }

    #[test]
    fn test_activate_format_flag() {
        let cli =
            CliConfig::try_parse_from(["venv-bootstrap", "activate-venv", "--format", "json"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Commands::ActivateVenv {
                format: OutputFormat::Json
            }
        ));
    }
}
