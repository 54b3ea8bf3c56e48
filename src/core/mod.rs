pub mod bootstrap;
pub mod engine;

pub use crate::domain::model::{Activation, ActivationEnv, InstallSpec, Invocation, VenvLayout};
pub use crate::domain::ports::{CommandRunner, ConfigProvider};
pub use crate::utils::error::Result;
