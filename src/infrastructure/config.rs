use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub const STATE_DIR_ENV: &str = "ESQ_STATE_DIR";
pub const LOG_ENV: &str = "ESQ_LOG";
const STATE_FILE: &str = "state.json";

/// Runtime configuration resolved from the command line and environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Key under which this workspace's state is stored
    pub workspace: String,
    pub state_file: PathBuf,
    pub verbose: bool,
}

impl AppConfig {
    pub fn load(workspace: Option<&Path>, verbose: bool) -> Result<Self> {
        let state_dir = std::env::var_os(STATE_DIR_ENV).map(PathBuf::from);
        Self::resolve(workspace, state_dir, verbose)
    }

    fn resolve(
        workspace: Option<&Path>,
        state_dir: Option<PathBuf>,
        verbose: bool,
    ) -> Result<Self> {
        let workspace = match workspace {
            Some(path) => path.to_path_buf(),
            None => std::env::current_dir().context("Failed to determine current directory")?,
        };
        let workspace = workspace
            .canonicalize()
            .with_context(|| format!("Workspace `{}` does not exist", workspace.display()))?;

        let state_dir = state_dir.unwrap_or_else(default_state_dir);

        Ok(Self {
            workspace: workspace.display().to_string(),
            state_file: state_dir.join(STATE_FILE),
            verbose,
        })
    }

    /// Filter directive for the log subscriber when `ESQ_LOG` is unset
    pub fn default_log_directive(&self) -> &'static str {
        if self.verbose { "esq=debug" } else { "warn" }
    }
}

fn default_state_dir() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .map(|dir| dir.join("esq"))
        .unwrap_or_else(|| PathBuf::from(".esq"))
}
