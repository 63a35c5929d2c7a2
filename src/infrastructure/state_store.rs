use crate::application::endpoint::StateStore;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// On-disk layout: workspace -> key -> value
#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    workspaces: BTreeMap<String, BTreeMap<String, String>>,
}

/// JSON-file backed state, scoped to a single workspace
pub struct FileStateStore {
    path: PathBuf,
    workspace: String,
}

impl FileStateStore {
    pub fn new(path: PathBuf, workspace: String) -> Self {
        Self { path, workspace }
    }

    fn load(&self) -> Result<StateFile> {
        if !self.path.exists() {
            return Ok(StateFile::default());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read state file `{}`", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse state file `{}`", self.path.display()))
    }

    fn save(&self, state: &StateFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create state directory `{}`", parent.display())
            })?;
        }
        let raw = serde_json::to_string_pretty(state).context("Failed to serialize state")?;
        fs::write(&self.path, raw)
            .with_context(|| format!("Failed to write state file `{}`", self.path.display()))
    }
}

impl StateStore for FileStateStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let state = self.load()?;
        Ok(state
            .workspaces
            .get(&self.workspace)
            .and_then(|values| values.get(key))
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut state = self.load()?;
        state
            .workspaces
            .entry(self.workspace.clone())
            .or_default()
            .insert(key.to_string(), value.to_string());
        self.save(&state)?;
        debug!(path = %self.path.display(), workspace = %self.workspace, key, "state saved");
        Ok(())
    }
}
