use std::path::{Path, PathBuf};

/// All well-known paths under `.baton/`.
#[derive(Debug, Clone)]
pub struct BatonPaths {
    pub root: PathBuf,
    pub baton_dir: PathBuf,
    pub config_json: PathBuf,
    /// Directory backing the state store: one `<key>.json` per record.
    pub states_dir: PathBuf,
    pub unified_view_json: PathBuf,
}

impl BatonPaths {
    /// Derive all paths from a repo root. Pure computation, no I/O.
    pub fn discover(repo_root: impl Into<PathBuf>) -> Self {
        let root = repo_root.into();
        let baton_dir = root.join(".baton");
        let states_dir = baton_dir.join("agent-states");
        Self {
            config_json: baton_dir.join("config.json"),
            unified_view_json: states_dir.join("unified-view.json"),
            states_dir,
            baton_dir,
            root,
        }
    }

    /// Create all required directories. Idempotent.
    pub fn ensure_layout(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.states_dir)
    }

    /// Check whether `.baton/` exists.
    pub fn is_initialized(&self) -> bool {
        self.baton_dir.is_dir()
    }

    /// Record file of one agent.
    pub fn agent_state(&self, agent: &str) -> PathBuf {
        self.states_dir.join(format!("{agent}.json"))
    }

    /// Walk up from `start` looking for a directory containing `.baton/`.
    /// Returns `None` if not found.
    pub fn find_root(start: &Path) -> Option<PathBuf> {
        let mut cur = start.to_path_buf();
        loop {
            if cur.join(".baton").is_dir() {
                return Some(cur);
            }
            if !cur.pop() {
                return None;
            }
        }
    }
}
