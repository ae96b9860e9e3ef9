use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a coordinating agent (e.g. "claudeCode", "cursor").
///
/// Agents are data, not types: the set of known identities comes from the
/// roster in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AgentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for AgentId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for AgentId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// What an agent is good at. Consumed only by the assignment advisor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Expertise {
    /// Primary areas; keywords containing one of these score double.
    #[serde(default)]
    pub primary: Vec<String>,
    #[serde(default)]
    pub secondary: Vec<String>,
    /// Glob patterns matched against claimed paths (e.g. `*.md`).
    #[serde(default)]
    pub file_patterns: Vec<String>,
    /// Lower-case substrings looked up in task descriptions.
    #[serde(default)]
    pub task_keywords: Vec<String>,
}

/// One roster entry: identity plus expertise metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub name: AgentId,
    #[serde(default)]
    pub expertise: Expertise,
}

impl AgentProfile {
    pub fn new(name: &str, expertise: Expertise) -> Self {
        Self {
            name: AgentId::from(name),
            expertise,
        }
    }
}
