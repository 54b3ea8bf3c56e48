use crate::core::bootstrap::{BootstrapContext, Bootstrapper};
use crate::core::{ActivationEnv, CommandRunner, ConfigProvider, Invocation};
use crate::utils::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreateVenv,
    ActivateVenv,
    Install { args: Vec<String> },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateVenv => "create-venv",
            Command::ActivateVenv => "activate-venv",
            Command::Install { .. } => "install",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Created { created: bool },
    Activated { environment: ActivationEnv },
    Installed,
}

pub struct BootstrapEngine<R: CommandRunner, C: ConfigProvider> {
    bootstrapper: Bootstrapper<R, C>,
    context: BootstrapContext,
}

impl<R: CommandRunner, C: ConfigProvider> BootstrapEngine<R, C> {
    pub fn new(bootstrapper: Bootstrapper<R, C>, context: BootstrapContext) -> Self {
        Self {
            bootstrapper,
            context,
        }
    }

    pub fn bootstrapper(&self) -> &Bootstrapper<R, C> {
        &self.bootstrapper
    }

    pub fn context(&self) -> &BootstrapContext {
        &self.context
    }

    pub async fn run(&mut self, command: &Command) -> Result<RunOutcome> {
        tracing::info!("🚀 Running {}", command.name());

        let result = match command {
            Command::CreateVenv => self
                .bootstrapper
                .ensure_venv()
                .await
                .map(|created| RunOutcome::Created { created }),
            Command::ActivateVenv => {
                self.bootstrapper.activate(&mut self.context).await.map(|_| {
                    RunOutcome::Activated {
                        environment: self.context.environment().clone(),
                    }
                })
            }
            Command::Install { args } => self
                .bootstrapper
                .install(&mut self.context, args)
                .await
                .map(|_| RunOutcome::Installed),
        };

        if let Err(e) = &result {
            tracing::debug!(
                "{} stopped at step '{}': {}",
                command.name(),
                e.failed_step().unwrap_or(command.name()),
                e
            );
        }
        result
    }

    /// Invocations `command` would run against the current filesystem state.
    /// Nothing is executed.
    pub fn plan(&self, command: &Command) -> Vec<Invocation> {
        let mut steps = Vec::new();
        let needs_creation = !self.context.is_activated() && !self.bootstrapper.layout().exists();
        if needs_creation {
            steps.push(self.bootstrapper.create_invocation());
        }

        if let Command::Install { args } = command {
            let environment = if self.context.is_activated() {
                self.context.environment().clone()
            } else {
                ActivationEnv::for_layout(self.bootstrapper.layout(), self.context.inherited_path())
            };
            steps.push(self.bootstrapper.install_invocation(&environment, args));
        }
        steps
    }
}
