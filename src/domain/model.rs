use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

#[cfg(windows)]
const BIN_DIR: &str = "Scripts";
#[cfg(not(windows))]
const BIN_DIR: &str = "bin";

#[cfg(windows)]
const ACTIVATE_SCRIPT: &str = "activate.bat";
#[cfg(not(windows))]
const ACTIVATE_SCRIPT: &str = "activate";

#[cfg(windows)]
const PATH_SEPARATOR: char = ';';
#[cfg(not(windows))]
const PATH_SEPARATOR: char = ':';

/// Paths inside a virtual environment directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenvLayout {
    root: PathBuf,
}

impl VenvLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join(BIN_DIR)
    }

    pub fn activation_script(&self) -> PathBuf {
        self.bin_dir().join(ACTIVATE_SCRIPT)
    }

    /// Program path inside the venv when it is installed there, otherwise the
    /// bare name so the caller's PATH resolves it.
    pub fn resolve_program(&self, program: &str) -> String {
        if program.contains('/') || program.contains('\\') {
            return program.to_string();
        }

        let candidates = if cfg!(windows) {
            vec![format!("{}.exe", program), program.to_string()]
        } else {
            vec![program.to_string()]
        };
        for candidate in candidates {
            let path = self.bin_dir().join(&candidate);
            if path.is_file() {
                return path.to_string_lossy().into_owned();
            }
        }
        program.to_string()
    }

    /// Prompt name shown by shells, the same as the venv directory name.
    pub fn prompt(&self) -> String {
        self.root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| ".venv".to_string())
    }
}

/// A single child process to run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub step: String,
    pub program: String,
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub env: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub env_remove: Vec<String>,
}

impl Invocation {
    pub fn new(step: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_environment(mut self, env: &ActivationEnv) -> Self {
        self.env.extend(env.set.clone());
        self.env_remove.extend(env.unset.iter().cloned());
        self
    }

    /// Shell-style rendering, used for logs and dry runs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(shell_quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// What to install into the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallSpec {
    pub project_dir: String,
    pub extras: Vec<String>,
    pub editable: bool,
}

impl Default for InstallSpec {
    fn default() -> Self {
        Self {
            project_dir: ".".to_string(),
            extras: vec!["dev".to_string()],
            editable: true,
        }
    }
}

impl InstallSpec {
    /// Requirement string, e.g. `.[dev]`.
    pub fn requirement(&self) -> String {
        if self.extras.is_empty() {
            self.project_dir.clone()
        } else {
            format!("{}[{}]", self.project_dir, self.extras.join(","))
        }
    }

    /// Arguments for `pip install`, without the caller's extra arguments.
    pub fn install_args(&self) -> Vec<String> {
        let mut args = vec!["install".to_string()];
        if self.editable {
            args.push("-e".to_string());
        }
        args.push(self.requirement());
        args
    }
}

/// Environment variables the activation script would set in a shell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationEnv {
    pub set: BTreeMap<String, String>,
    pub unset: Vec<String>,
}

impl ActivationEnv {
    /// A non-UTF-8 inherited `PATH` is left out of `set`, so children keep the
    /// caller's `PATH` unchanged; the installer is still resolved through
    /// [`VenvLayout::resolve_program`].
    pub fn for_layout(layout: &VenvLayout, inherited_path: Option<&OsStr>) -> Self {
        let bin_dir = layout.bin_dir().to_string_lossy().into_owned();
        let path = match inherited_path.map(|p| p.to_str()) {
            Some(Some(existing)) if !existing.is_empty() => Some(format!(
                "{}{}{}",
                bin_dir, PATH_SEPARATOR, existing
            )),
            Some(None) => {
                tracing::warn!("PATH is not valid UTF-8; leaving it unchanged");
                None
            }
            _ => Some(bin_dir),
        };

        let mut set = BTreeMap::new();
        set.insert(
            "VIRTUAL_ENV".to_string(),
            layout.root().to_string_lossy().into_owned(),
        );
        set.insert("VIRTUAL_ENV_PROMPT".to_string(), layout.prompt());
        if let Some(path) = path {
            set.insert("PATH".to_string(), path);
        }

        Self {
            set,
            unset: vec!["PYTHONHOME".to_string()],
        }
    }

    /// `export`/`unset` lines for `eval` in a POSIX shell.
    pub fn to_shell(&self) -> String {
        let mut out = String::new();
        for name in &self.unset {
            out.push_str(&format!("unset {}\n", name));
        }
        for (name, value) in &self.set {
            out.push_str(&format!("export {}={}\n", name, shell_quote(value)));
        }
        out
    }
}

/// Outcome of an activation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Activated,
    AlreadyActive,
}

fn shell_quote(value: &str) -> String {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%[]".contains(c));
    if plain {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', "'\\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirement_with_and_without_extras() {
        let spec = InstallSpec::default();
        assert_eq!(spec.requirement(), ".[dev]");
        assert_eq!(spec.install_args(), vec!["install", "-e", ".[dev]"]);

        let plain = InstallSpec {
            project_dir: "pkg".to_string(),
            extras: vec![],
            editable: false,
        };
        assert_eq!(plain.install_args(), vec!["install", "pkg"]);

        let multi = InstallSpec {
            extras: vec!["dev".to_string(), "docs".to_string()],
            ..Default::default()
        };
        assert_eq!(multi.requirement(), ".[dev,docs]");
    }

    #[cfg(unix)]
    #[test]
    fn test_activation_env_prepends_bin_dir() {
        let layout = VenvLayout::new("/work/.venv");
        let env = ActivationEnv::for_layout(&layout, Some(OsStr::new("/usr/bin:/bin")));

        assert_eq!(env.set["PATH"], "/work/.venv/bin:/usr/bin:/bin");
        assert_eq!(env.set["VIRTUAL_ENV"], "/work/.venv");
        assert_eq!(env.set["VIRTUAL_ENV_PROMPT"], ".venv");
        assert_eq!(env.unset, vec!["PYTHONHOME"]);

        let empty = ActivationEnv::for_layout(&layout, None);
        assert_eq!(empty.set["PATH"], "/work/.venv/bin");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_path_is_left_unchanged() {
        use std::os::unix::ffi::OsStrExt;

        let layout = VenvLayout::new("/work/.venv");
        let inherited = OsStr::from_bytes(b"/usr/\xffbin:/bin");
        let env = ActivationEnv::for_layout(&layout, Some(inherited));

        assert!(!env.set.contains_key("PATH"));
        assert_eq!(env.set["VIRTUAL_ENV"], "/work/.venv");
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_export_quotes_values() {
        let layout = VenvLayout::new("/tmp/my env/.venv");
        let env = ActivationEnv::for_layout(&layout, None);
        let script = env.to_shell();

        assert!(script.starts_with("unset PYTHONHOME\n"));
        assert!(script.contains("export VIRTUAL_ENV='/tmp/my env/.venv'\n"));
    }

    #[test]
    fn test_command_line_quotes_spaces() {
        let invocation = Invocation::new("install", "pip")
            .args(["install", "-e", ".[dev]"])
            .arg("--index-url=http://a b");
        assert_eq!(
            invocation.command_line(),
            "pip install -e .[dev] '--index-url=http://a b'"
        );
    }

    #[test]
    fn test_resolve_program_falls_back_to_bare_name() {
        let dir = tempfile::TempDir::new().unwrap();
        let layout = VenvLayout::new(dir.path().join(".venv"));
        assert_eq!(layout.resolve_program("pip"), "pip");
        assert_eq!(layout.resolve_program("/opt/pip"), "/opt/pip");
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_program_prefers_venv_bin() {
        let dir = tempfile::TempDir::new().unwrap();
        let layout = VenvLayout::new(dir.path().join(".venv"));
        std::fs::create_dir_all(layout.bin_dir()).unwrap();
        std::fs::write(layout.bin_dir().join("pip"), "").unwrap();

        let resolved = layout.resolve_program("pip");
        assert_eq!(resolved, layout.bin_dir().join("pip").to_string_lossy());
    }
}
