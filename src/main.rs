use anyhow::Context;
use clap::Parser;
use venv_bootstrap::config::{Commands, OutputFormat};
use venv_bootstrap::utils::logger;
use venv_bootstrap::{
    BootstrapContext, BootstrapEngine, BootstrapError, Bootstrapper, CliConfig, Command,
    RunOutcome, SystemRunner, TomlConfig,
};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    let exit_code = match run(&cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            // 子程序失敗時沿用其退出碼，與 shell 的 set -e 行為一致
            e.downcast_ref::<BootstrapError>()
                .map(BootstrapError::exit_code)
                .unwrap_or(1)
        }
    };

    std::process::exit(exit_code);
}

async fn run(cli: &CliConfig) -> anyhow::Result<()> {
    // 載入並驗證配置；日誌尚未初始化，錯誤只由 main 輸出一次
    let config_path = TomlConfig::discover_path(cli.config.as_deref());
    let file = match &config_path {
        Some(path) => TomlConfig::from_file(path).context("Failed to load configuration")?,
        None => TomlConfig::default(),
    };
    let settings = cli.settings(&file).context("Invalid configuration")?;

    // 初始化日誌
    logger::init_cli_logger(
        cli.verbose,
        cli.log_format(&file),
        cli.log_file.as_deref(),
        &file.log_levels(),
    )
    .context("Failed to initialise logging")?;

    match &config_path {
        Some(path) => tracing::debug!("Loaded configuration from {}", path.display()),
        None => tracing::debug!("No configuration file, using defaults"),
    }
    tracing::debug!("CLI config: {:?}", cli);
    tracing::debug!("Resolved settings: {:?}", settings);

    let bootstrapper = Bootstrapper::new(SystemRunner::new(), settings)?;
    let mut engine = BootstrapEngine::new(bootstrapper, BootstrapContext::from_process_env());
    let command = Command::from(&cli.command);

    if cli.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No commands will be executed");
        let plan = engine.plan(&command);
        match cli.plan_format {
            OutputFormat::Shell => {
                for invocation in &plan {
                    println!("+ {}", invocation.command_line());
                }
            }
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
        }
        return Ok(());
    }

    match engine.run(&command).await? {
        RunOutcome::Created { created: true } => {
            tracing::info!(
                "✅ Virtual environment created at {}",
                engine.bootstrapper().layout().root().display()
            );
        }
        RunOutcome::Created { created: false } => {
            tracing::info!(
                "Virtual environment already exists at {}",
                engine.bootstrapper().layout().root().display()
            );
        }
        RunOutcome::Activated { environment } => {
            let format = match &cli.command {
                Commands::ActivateVenv { format } => *format,
                _ => OutputFormat::Shell,
            };
            match format {
                OutputFormat::Shell => print!("{}", environment.to_shell()),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&environment)?),
            }
        }
        RunOutcome::Installed => {
            tracing::info!("✅ Install completed successfully!");
        }
    }

    Ok(())
}
