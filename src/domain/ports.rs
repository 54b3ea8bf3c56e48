use crate::domain::model::{InstallSpec, Invocation};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Runs child processes. Returns the exit code; a non-zero code is not an
/// error at this level.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> Result<i32>;
}

pub trait ConfigProvider: Send + Sync {
    fn venv_dir(&self) -> &Path;
    fn python(&self) -> &str;
    fn installer(&self) -> &str;
    fn install_spec(&self) -> InstallSpec;
}
