use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

use crate::agent::AgentId;
use crate::clock::age_secs;
use crate::state::{AgentState, CompletedWork, CurrentWork, ReleasedWork, ViewStatus};

/// Who holds a file, since when, and for what.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOwner {
    pub agent: AgentId,
    #[serde(with = "time::serde::rfc3339")]
    pub since: OffsetDateTime,
    pub task: String,
}

/// Two active agents claiming the same file. `agents[0]` keeps ownership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictRecord {
    pub file: String,
    pub agents: [AgentId; 2],
    #[serde(with = "time::serde::rfc3339")]
    pub detected: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaleAgent {
    pub agent: AgentId,
    #[serde(with = "time::serde::rfc3339")]
    pub last_seen: OffsetDateTime,
    pub minutes_ago: i64,
}

/// An agent's entry in the unified view: its persisted state with the
/// view-time status, or an error marker when the record was unreadable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentView {
    pub agent: AgentId,
    pub status: ViewStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_work: Option<CurrentWork>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_heartbeat: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_completed: Option<CompletedWork>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_released: Option<ReleasedWork>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentView {
    pub fn from_state(state: AgentState, status: ViewStatus) -> Self {
        Self {
            agent: state.agent,
            status,
            current_work: state.current_work,
            last_heartbeat: Some(state.last_heartbeat),
            last_completed: state.last_completed,
            last_released: state.last_released,
            error: None,
        }
    }

    pub fn error(agent: AgentId, message: String) -> Self {
        Self {
            agent,
            status: ViewStatus::Error,
            current_work: None,
            last_heartbeat: None,
            last_completed: None,
            last_released: None,
            error: Some(message),
        }
    }

    /// Seconds since the last heartbeat, if one is known.
    pub fn heartbeat_age_secs(&self, now: OffsetDateTime) -> Option<u64> {
        self.last_heartbeat.map(|hb| age_secs(hb, now))
    }
}

/// Counts printed after a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewSummary {
    pub active: usize,
    pub conflicts: usize,
    pub stale: usize,
}

/// Reconciled snapshot of every known agent. Rebuilt from scratch each pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedView {
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
    pub agents: BTreeMap<AgentId, AgentView>,
    pub file_ownership: BTreeMap<String, FileOwner>,
    pub conflicts: Vec<ConflictRecord>,
    pub stale_agents: Vec<StaleAgent>,
}

impl UnifiedView {
    pub fn empty(now: OffsetDateTime) -> Self {
        Self {
            last_updated: now,
            agents: BTreeMap::new(),
            file_ownership: BTreeMap::new(),
            conflicts: Vec::new(),
            stale_agents: Vec::new(),
        }
    }

    pub fn owner_of(&self, file: &str) -> Option<&FileOwner> {
        self.file_ownership.get(file)
    }

    /// Every agent the view has holding `file`: the owner first, then the
    /// other side of each conflict over it.
    pub fn holders_of(&self, file: &str) -> Vec<&AgentId> {
        let mut holders: Vec<&AgentId> =
            self.owner_of(file).map(|o| &o.agent).into_iter().collect();
        for c in self.conflicts.iter().filter(|c| c.file == file) {
            for agent in &c.agents {
                if !holders.contains(&agent) {
                    holders.push(agent);
                }
            }
        }
        holders
    }

    pub fn status_of(&self, agent: &AgentId) -> Option<ViewStatus> {
        self.agents.get(agent).map(|a| a.status)
    }

    /// Entries currently classified active (stale ones excluded).
    pub fn active_agents(&self) -> impl Iterator<Item = &AgentView> {
        self.agents
            .values()
            .filter(|a| a.status == ViewStatus::Active)
    }

    pub fn summary(&self) -> ViewSummary {
        ViewSummary {
            active: self.active_agents().count(),
            conflicts: self.conflicts.len(),
            stale: self.stale_agents.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AgentStatus;
    use time::macros::datetime;

    #[test]
    fn error_entry_roundtrips_without_heartbeat() {
        let v = AgentView::error(AgentId::from("cursor"), "bad json".into());
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["status"], "error");
        assert!(json.get("lastHeartbeat").is_none());
        let back: AgentView = serde_json::from_value(json).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn summary_counts_only_active() {
        let now = datetime!(2026-03-01 10:00 UTC);
        let mut view = UnifiedView::empty(now);
        let idle = AgentState::idle(AgentId::from("a"), now);
        assert_eq!(idle.status, AgentStatus::Idle);
        view.agents.insert(
            AgentId::from("a"),
            AgentView::from_state(idle.clone(), ViewStatus::Idle),
        );
        let mut busy = AgentState::idle(AgentId::from("b"), now);
        busy.activate(CurrentWork::new(&["x".to_string()], "t", now));
        view.agents.insert(
            AgentId::from("b"),
            AgentView::from_state(busy, ViewStatus::Active),
        );
        let s = view.summary();
        assert_eq!(s.active, 1);
        assert_eq!(s.conflicts, 0);
        assert_eq!(s.stale, 0);
    }

    #[test]
    fn holders_include_conflicting_agents() {
        let now = datetime!(2026-03-01 10:00 UTC);
        let mut view = UnifiedView::empty(now);
        view.file_ownership.insert(
            "a.ts".to_string(),
            FileOwner {
                agent: AgentId::from("alpha"),
                since: now,
                task: "one".to_string(),
            },
        );
        for (file, other) in [("a.ts", "beta"), ("a.ts", "gamma"), ("b.ts", "delta")] {
            view.conflicts.push(ConflictRecord {
                file: file.to_string(),
                agents: [AgentId::from("alpha"), AgentId::from(other)],
                detected: now,
            });
        }
        let holders: Vec<&str> = view.holders_of("a.ts").iter().map(|a| a.as_str()).collect();
        assert_eq!(holders, vec!["alpha", "beta", "gamma"]);
        assert!(view.holders_of("c.ts").is_empty());
    }

    #[test]
    fn view_keys_are_camel_case() {
        let view = UnifiedView::empty(datetime!(2026-03-01 10:00 UTC));
        let json = serde_json::to_value(&view).unwrap();
        for key in ["lastUpdated", "agents", "fileOwnership", "conflicts", "staleAgents"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }
}
