use crate::core::{
    Activation, ActivationEnv, CommandRunner, ConfigProvider, Invocation, VenvLayout,
};
use crate::utils::error::{BootstrapError, Result};
use std::ffi::{OsStr, OsString};

pub const STEP_CREATE: &str = "create-venv";
pub const STEP_INSTALL: &str = "install";

/// Per-run activation state, owned by the caller.
///
/// Replaces a process-wide "already activated" flag: activation only
/// touches this object and the environment of the children it spawns.
#[derive(Debug, Clone, Default)]
pub struct BootstrapContext {
    activated: bool,
    inherited_path: Option<OsString>,
    environment: ActivationEnv,
}

impl BootstrapContext {
    /// Context seeded with the current process's `PATH`.
    pub fn from_process_env() -> Self {
        Self::with_path(std::env::var_os("PATH"))
    }

    pub fn with_path(inherited_path: Option<OsString>) -> Self {
        Self {
            activated: false,
            inherited_path,
            environment: ActivationEnv::default(),
        }
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// Variables set by activation; empty until `activate` succeeds.
    pub fn environment(&self) -> &ActivationEnv {
        &self.environment
    }

    pub fn inherited_path(&self) -> Option<&OsStr> {
        self.inherited_path.as_deref()
    }
}

pub struct Bootstrapper<R: CommandRunner, C: ConfigProvider> {
    runner: R,
    config: C,
    layout: VenvLayout,
}

impl<R: CommandRunner, C: ConfigProvider> Bootstrapper<R, C> {
    pub fn new(runner: R, config: C) -> Result<Self> {
        let root = std::path::absolute(config.venv_dir())?;
        Ok(Self {
            runner,
            config,
            layout: VenvLayout::new(root),
        })
    }

    pub fn layout(&self) -> &VenvLayout {
        &self.layout
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn create_invocation(&self) -> Invocation {
        Invocation::new(STEP_CREATE, self.config.python())
            .args(["-m", "venv"])
            .arg(self.layout.root().to_string_lossy())
    }

    pub fn install_invocation(&self, env: &ActivationEnv, extra_args: &[String]) -> Invocation {
        let program = self.layout.resolve_program(self.config.installer());
        Invocation::new(STEP_INSTALL, program)
            .args(self.config.install_spec().install_args())
            .args(extra_args.iter().cloned())
            .with_environment(env)
    }

    /// Creates the environment if its directory is absent. Returns whether a
    /// creation ran.
    pub async fn ensure_venv(&self) -> Result<bool> {
        if self.layout.exists() {
            tracing::debug!(
                "Virtual environment already present at {}",
                self.layout.root().display()
            );
            return Ok(false);
        }

        tracing::info!(
            "🐍 Creating virtual environment at {}",
            self.layout.root().display()
        );
        let invocation = self.create_invocation();
        self.run_step(&invocation).await?;
        Ok(true)
    }

    pub async fn activate(&self, ctx: &mut BootstrapContext) -> Result<Activation> {
        if ctx.activated {
            tracing::debug!("Virtual environment already active");
            return Ok(Activation::AlreadyActive);
        }

        self.ensure_venv().await?;

        let script = self.layout.activation_script();
        if !script.is_file() {
            return Err(BootstrapError::ActivationScriptMissing { path: script });
        }

        ctx.environment = ActivationEnv::for_layout(&self.layout, ctx.inherited_path.as_deref());
        ctx.activated = true;
        tracing::info!(
            "✅ Activated virtual environment {}",
            self.layout.root().display()
        );
        Ok(Activation::Activated)
    }

    /// Editable install of the project with its extras, plus `extra_args`
    /// passed through unchanged.
    pub async fn install(&self, ctx: &mut BootstrapContext, extra_args: &[String]) -> Result<()> {
        self.activate(ctx).await?;

        let invocation = self.install_invocation(&ctx.environment, extra_args);
        tracing::info!("📦 Installing {}", self.config.install_spec().requirement());
        self.run_step(&invocation).await
    }

    async fn run_step(&self, invocation: &Invocation) -> Result<()> {
        tracing::debug!("Running: {}", invocation.command_line());
        let code = self.runner.run(invocation).await?;
        if code != 0 {
            return Err(BootstrapError::StepFailed {
                step: invocation.step.clone(),
                program: invocation.program.clone(),
                code,
            });
        }
        Ok(())
    }
}
