use baton_core::AgentId;
use baton_store::StoreError;
use std::fmt;

/// A requested file held by another live agent.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockingClaim {
    pub file: String,
    pub owner: AgentId,
    pub task: String,
    /// Minutes since the owner claimed the file.
    pub claimed_mins: i64,
    /// Seconds since the owner's last heartbeat.
    pub last_seen_secs: u64,
}

impl fmt::Display for BlockingClaim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} is claimed by {} (task: {}, {} min, last seen {}s ago)",
            self.file, self.owner, self.task, self.claimed_mins, self.last_seen_secs
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoordError {
    /// A persisted record exists but is not a valid record.
    #[error("corrupt state record {key:?}: {source}")]
    CorruptState {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot access state record {key:?}: {source}")]
    Persistence {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("cannot encode state record {key:?}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("claim conflict: {}", join_conflicts(.conflicts))]
    ClaimConflict { conflicts: Vec<BlockingClaim> },

    #[error("{agent} has no active work to {action}")]
    NoActiveWork { agent: AgentId, action: &'static str },

    #[error("unknown agent {agent:?} (known agents: {})", .known.join(", "))]
    UnknownAgent { agent: String, known: Vec<String> },

    #[error("a claim needs at least one file")]
    EmptyClaim,

    #[error("invalid configuration: {0}")]
    Config(String),
}

fn join_conflicts(conflicts: &[BlockingClaim]) -> String {
    conflicts
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_message_names_file_owner_and_duration() {
        let err = CoordError::ClaimConflict {
            conflicts: vec![BlockingClaim {
                file: "a.ts".into(),
                owner: AgentId::from("alpha"),
                task: "refactor".into(),
                claimed_mins: 12,
                last_seen_secs: 4,
            }],
        };
        let msg = err.to_string();
        assert!(msg.contains("a.ts"));
        assert!(msg.contains("alpha"));
        assert!(msg.contains("12 min"));
    }

    #[test]
    fn no_active_work_message() {
        let err = CoordError::NoActiveWork {
            agent: AgentId::from("beta"),
            action: "complete",
        };
        assert_eq!(err.to_string(), "beta has no active work to complete");
    }
}
