//! Per-agent persisted state and the view-time status classification.
//!
//! The persisted form only ever knows `idle` and `active`. `stale` (and
//! `error`) exist solely in [`ViewStatus`], which is computed at read time.

use serde::{Deserialize, Serialize};
use std::fmt;
use time::{Duration, OffsetDateTime};

use crate::agent::AgentId;
use crate::clock::minutes_between;

// ── Status ──

/// Status as written by the owning agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Idle,
    Active,
}

/// Status as shown in the unified view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewStatus {
    Idle,
    Active,
    Stale,
    /// The agent's record could not be read.
    Error,
}

impl fmt::Display for ViewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Active => write!(f, "active"),
            Self::Stale => write!(f, "stale"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Classify a persisted state at `now`: an active agent whose heartbeat is
/// older than `threshold` is stale.
pub fn classify(state: &AgentState, now: OffsetDateTime, threshold: Duration) -> ViewStatus {
    match state.status {
        AgentStatus::Idle => ViewStatus::Idle,
        AgentStatus::Active if now - state.last_heartbeat > threshold => ViewStatus::Stale,
        AgentStatus::Active => ViewStatus::Active,
    }
}

// ── Work records ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Always within 0..=100.
    pub percentage: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated: OffsetDateTime,
}

impl Progress {
    /// Build a progress record, clamping `percentage` to 0..=100.
    pub fn clamped(percentage: i64, message: Option<String>, updated: OffsetDateTime) -> Self {
        Self {
            percentage: percentage.clamp(0, 100) as u8,
            message,
            updated,
        }
    }
}

/// The claim an active agent is working under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWork {
    /// Claimed paths in claim order, without duplicates.
    pub files: Vec<String>,
    pub task: String,
    #[serde(with = "time::serde::rfc3339")]
    pub started: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
}

impl CurrentWork {
    /// Trims paths, drops empties and duplicates (first occurrence wins).
    pub fn new(files: &[String], task: &str, started: OffsetDateTime) -> Self {
        Self {
            files: normalize_files(files),
            task: task.to_string(),
            started,
            progress: None,
        }
    }

    pub fn holds(&self, file: &str) -> bool {
        self.files.iter().any(|f| f == file)
    }
}

/// Normalize a requested file list: trimmed, non-empty, de-duplicated, order kept.
pub fn normalize_files(files: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(files.len());
    for f in files {
        let f = f.trim();
        if f.is_empty() || out.iter().any(|o| o == f) {
            continue;
        }
        out.push(f.to_string());
    }
    out
}

/// Last finished work episode. Informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedWork {
    pub files: Vec<String>,
    pub task: String,
    /// Minutes from claim to completion.
    #[serde(rename = "duration")]
    pub duration_mins: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub completed: OffsetDateTime,
}

/// Last released (handed-off, unfinished) work episode. Informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleasedWork {
    pub files: Vec<String>,
    pub task: String,
    pub reason: String,
    #[serde(rename = "duration")]
    pub duration_mins: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub released: OffsetDateTime,
}

// ── AgentState ──

/// One agent's persisted record.
///
/// `current_work` is present exactly when `status` is active; deserializing a
/// record that breaks this fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "AgentStateRecord")]
pub struct AgentState {
    pub agent: AgentId,
    pub status: AgentStatus,
    pub current_work: Option<CurrentWork>,
    #[serde(with = "time::serde::rfc3339")]
    pub last_heartbeat: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_completed: Option<CompletedWork>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_released: Option<ReleasedWork>,
}

/// Wire shape accepted before the status/work invariant is checked.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AgentStateRecord {
    agent: AgentId,
    status: AgentStatus,
    #[serde(default)]
    current_work: Option<CurrentWork>,
    #[serde(with = "time::serde::rfc3339")]
    last_heartbeat: OffsetDateTime,
    #[serde(default)]
    last_completed: Option<CompletedWork>,
    #[serde(default)]
    last_released: Option<ReleasedWork>,
}

impl TryFrom<AgentStateRecord> for AgentState {
    type Error = String;

    fn try_from(r: AgentStateRecord) -> Result<Self, Self::Error> {
        match (r.status, &r.current_work) {
            (AgentStatus::Active, None) => {
                return Err(format!("agent {} is active without currentWork", r.agent))
            }
            (AgentStatus::Idle, Some(_)) => {
                return Err(format!("agent {} is idle but has currentWork", r.agent))
            }
            (AgentStatus::Active, Some(w)) if w.files.is_empty() => {
                return Err(format!("agent {} claims an empty file set", r.agent))
            }
            _ => {}
        }
        Ok(Self {
            agent: r.agent,
            status: r.status,
            current_work: r.current_work,
            last_heartbeat: r.last_heartbeat,
            last_completed: r.last_completed,
            last_released: r.last_released,
        })
    }
}

impl AgentState {
    /// Fresh idle record (first touch).
    pub fn idle(agent: AgentId, now: OffsetDateTime) -> Self {
        Self {
            agent,
            status: AgentStatus::Idle,
            current_work: None,
            last_heartbeat: now,
            last_completed: None,
            last_released: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AgentStatus::Active
    }

    /// Enter the active state with `work`. History fields are preserved.
    pub fn activate(&mut self, work: CurrentWork) {
        self.status = AgentStatus::Active;
        self.current_work = Some(work);
    }

    /// Finish the current work: record it as completed and go idle.
    /// Returns the finished work, or `None` if there was none.
    pub fn complete(&mut self, now: OffsetDateTime) -> Option<CurrentWork> {
        let work = self.take_work()?;
        self.last_completed = Some(CompletedWork {
            files: work.files.clone(),
            task: work.task.clone(),
            duration_mins: minutes_between(work.started, now),
            completed: now,
        });
        Some(work)
    }

    /// Abandon the current work with `reason` and go idle.
    pub fn release(&mut self, reason: &str, now: OffsetDateTime) -> Option<CurrentWork> {
        let work = self.take_work()?;
        self.last_released = Some(ReleasedWork {
            files: work.files.clone(),
            task: work.task.clone(),
            reason: reason.to_string(),
            duration_mins: minutes_between(work.started, now),
            released: now,
        });
        Some(work)
    }

    fn take_work(&mut self) -> Option<CurrentWork> {
        if self.status != AgentStatus::Active {
            return None;
        }
        let work = self.current_work.take()?;
        self.status = AgentStatus::Idle;
        Some(work)
    }
}
