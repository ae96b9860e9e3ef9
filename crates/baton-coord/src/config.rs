use baton_core::{AgentId, AgentProfile, Expertise};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use time::Duration;

use crate::error::CoordError;

// ── Defaults ──

/// Heartbeat age beyond which a blocking owner loses its claim to a new claimant.
pub const DEFAULT_CLAIM_STALE_SECS: u64 = 30;
/// Heartbeat age beyond which the reconciliation pass marks an agent stale.
pub const DEFAULT_BACKGROUND_STALE_SECS: u64 = 30 * 60;
/// Cached unified view older than this is rebuilt before a claim.
pub const DEFAULT_VIEW_FRESH_SECS: u64 = 60;
pub const DEFAULT_HANDOFF_RETENTION: usize = 10;

/// Record names the state store uses for shared records.
pub const RESERVED_NAMES: &[&str] = &["unified-view", "handoffs", "config"];

/// Coordination settings, stored in `.baton/config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordConfig {
    /// Known agents, in reconciliation order.
    pub agents: Vec<AgentProfile>,
    pub claim_stale_secs: u64,
    pub background_stale_secs: u64,
    pub view_fresh_secs: u64,
    pub handoff_retention: usize,
}

impl Default for CoordConfig {
    fn default() -> Self {
        Self {
            agents: default_roster(),
            claim_stale_secs: DEFAULT_CLAIM_STALE_SECS,
            background_stale_secs: DEFAULT_BACKGROUND_STALE_SECS,
            view_fresh_secs: DEFAULT_VIEW_FRESH_SECS,
            handoff_retention: DEFAULT_HANDOFF_RETENTION,
        }
    }
}

impl CoordConfig {
    /// Load from `path` (defaults if missing), apply `BATON_*` environment
    /// overrides, then validate.
    pub fn load(path: &Path) -> Result<Self, CoordError> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| CoordError::Config(format!("reading {}: {e}", path.display())))?;
            serde_json::from_str::<Self>(&content)
                .map_err(|e| CoordError::Config(format!("parsing {}: {e}", path.display())))?
        } else {
            Self::default()
        };
        let config = config.with_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in `load`).
    /// Unparseable values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let num = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());
        if let Some(v) = num("BATON_CLAIM_STALE_SECS") {
            self.claim_stale_secs = v;
        }
        if let Some(v) = num("BATON_BACKGROUND_STALE_SECS") {
            self.background_stale_secs = v;
        }
        if let Some(v) = num("BATON_VIEW_FRESH_SECS") {
            self.view_fresh_secs = v;
        }
        if let Some(v) = num("BATON_HANDOFF_RETENTION") {
            self.handoff_retention = v as usize;
        }
        self
    }

    pub fn validate(&self) -> Result<(), CoordError> {
        if self.agents.is_empty() {
            return Err(CoordError::Config("agent roster is empty".into()));
        }
        let mut seen = HashSet::new();
        for profile in &self.agents {
            let name = profile.name.as_str();
            if !is_valid_agent_name(name) {
                return Err(CoordError::Config(format!(
                    "invalid agent name {name:?}: use letters, digits, '-' or '_'"
                )));
            }
            if RESERVED_NAMES.contains(&name) {
                return Err(CoordError::Config(format!(
                    "agent name {name:?} is reserved"
                )));
            }
            if !seen.insert(name) {
                return Err(CoordError::Config(format!("duplicate agent {name:?}")));
            }
            for pattern in &profile.expertise.file_patterns {
                globset::Glob::new(pattern).map_err(|e| {
                    CoordError::Config(format!("agent {name}: bad file pattern {pattern:?}: {e}"))
                })?;
            }
        }
        if self.claim_stale_secs > self.background_stale_secs {
            return Err(CoordError::Config(format!(
                "claim_stale_secs ({}) must not exceed background_stale_secs ({})",
                self.claim_stale_secs, self.background_stale_secs
            )));
        }
        if self.handoff_retention == 0 {
            return Err(CoordError::Config(
                "handoff_retention must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn claim_threshold(&self) -> Duration {
        secs(self.claim_stale_secs)
    }

    pub fn background_threshold(&self) -> Duration {
        secs(self.background_stale_secs)
    }

    pub fn view_freshness(&self) -> Duration {
        secs(self.view_fresh_secs)
    }

    /// Known agent identities in roster order.
    pub fn roster(&self) -> impl Iterator<Item = &AgentId> {
        self.agents.iter().map(|p| &p.name)
    }

    /// Map a name onto a known identity.
    pub fn resolve_agent(&self, name: &str) -> Result<AgentId, CoordError> {
        self.roster()
            .find(|id| id.as_str() == name)
            .cloned()
            .ok_or_else(|| CoordError::UnknownAgent {
                agent: name.to_string(),
                known: self.roster().map(|id| id.to_string()).collect(),
            })
    }
}

fn secs(v: u64) -> Duration {
    Duration::seconds(i64::try_from(v).unwrap_or(i64::MAX))
}

fn is_valid_agent_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// The three agents of the original deployment and what they are good at.
pub fn default_roster() -> Vec<AgentProfile> {
    vec![
        AgentProfile::new(
            "claudeCode",
            Expertise {
                primary: strings(&["architecture", "foundation", "refactoring", "documentation"]),
                secondary: strings(&["tests", "config", "build"]),
                file_patterns: strings(&[
                    "*.md",
                    "*architecture*",
                    "*config*",
                    "CLAUDE.md",
                    "package.json",
                    "*.yml",
                    "*.yaml",
                ]),
                task_keywords: strings(&[
                    "architect",
                    "foundation",
                    "refactor",
                    "document",
                    "structure",
                    "design",
                    "organize",
                ]),
            },
        ),
        AgentProfile::new(
            "copilot",
            Expertise {
                primary: strings(&["ml", "algorithms", "data-processing", "optimization"]),
                secondary: strings(&["tests", "config", "performance"]),
                file_patterns: strings(&[
                    "*/ml/*",
                    "*machine*learning*",
                    "*neural*",
                    "*algorithm*",
                    "*probabilistic*",
                    "*inference*",
                    "*markov*",
                ]),
                task_keywords: strings(&[
                    "ml",
                    "machine learning",
                    "neural",
                    "algorithm",
                    "inference",
                    "model",
                    "training",
                    "optimization",
                ]),
            },
        ),
        AgentProfile::new(
            "cursor",
            Expertise {
                primary: strings(&["ui", "integration", "testing", "frontend"]),
                secondary: strings(&["config", "api"]),
                file_patterns: strings(&[
                    "*/components/*",
                    "*/ui/*",
                    "*.test.*",
                    "*.spec.*",
                    "*integration*",
                    "*.ts",
                    "*.tsx",
                    "*hooks*",
                    "*pages*",
                ]),
                task_keywords: strings(&[
                    "ui",
                    "component",
                    "test",
                    "integration",
                    "frontend",
                    "interface",
                    "user",
                    "visual",
                    "react",
                ]),
            },
        ),
    ]
}
