//! The claim protocol: what one agent does to its own record.
//!
//! An agent only ever writes its own record. Ownership of other agents'
//! files is judged from the unified view, with the blocking owner's live
//! record re-read and held to the short claim threshold before a claim is
//! refused.

use baton_core::clock::{age_secs, minutes_between};
use baton_core::handoff::{REASON_COMPLETED, REASON_MANUAL};
use baton_core::state::normalize_files;
use baton_core::{
    classify, AgentId, AgentState, AgentStatus, CurrentWork, HandoffEntry, Progress, UnifiedView,
    ViewStatus,
};
use serde::Serialize;
use time::OffsetDateTime;

use crate::advisor::Recommendation;
use crate::agent_state::AgentStateStore;
use crate::board::Board;
use crate::error::{BlockingClaim, CoordError};

/// A file taken over from an owner whose heartbeat had gone quiet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Takeover {
    pub file: String,
    pub from: AgentId,
    /// Seconds since the previous owner's last heartbeat; `None` if its
    /// record could not be read.
    pub last_seen_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClaimOutcome {
    pub agent: AgentId,
    pub files: Vec<String>,
    pub task: String,
    pub started: OffsetDateTime,
    /// Live owners overridden with `force`.
    pub overridden: Vec<BlockingClaim>,
    /// Files reclaimed from stale owners.
    pub reclaimed: Vec<Takeover>,
    /// The claim this one replaced, if the agent was already active.
    pub replaced: Option<CurrentWork>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HeartbeatOutcome {
    Sent { progress: Option<u8> },
    /// Idle agents have nothing to keep alive; the record is left untouched.
    SkippedIdle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HandoffOutcome {
    pub agent: AgentId,
    /// Files handed off.
    pub files: Vec<String>,
    pub task: String,
    pub reason: String,
    pub duration_mins: i64,
    /// Files still claimed after a partial release.
    pub remaining: Vec<String>,
    pub suggestion: Option<Recommendation>,
    /// False if the handoff log could not be written.
    pub logged: bool,
}

/// Everything `check` reports, captured at one instant.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub agent: AgentId,
    pub state: AgentState,
    pub view: UnifiedView,
    pub now: OffsetDateTime,
}

enum OwnerCheck {
    /// The owner no longer holds the file.
    Released,
    Stale { last_seen_secs: Option<u64> },
    Live(BlockingClaim),
}

/// One roster agent acting on the board.
pub struct Claimant<'a> {
    board: &'a Board,
    agent: AgentId,
}

impl<'a> Claimant<'a> {
    pub fn new(board: &'a Board, agent: AgentId) -> Self {
        Self { board, agent }
    }

    pub fn agent(&self) -> &AgentId {
        &self.agent
    }

    fn store(&self) -> AgentStateStore<'a> {
        self.board.agent_store(self.agent.clone())
    }

    /// This agent's record; a corrupt one reads as idle.
    pub fn state(&self) -> Result<AgentState, CoordError> {
        self.store().read_or_reset()
    }

    /// Claim `files` for `task`. All or nothing: if any requested file is
    /// held by a live agent the whole claim fails unless `force` is set.
    /// Every holder of a file counts, including the losing side of a
    /// recorded conflict.
    pub fn start(
        &self,
        files: &[String],
        task: &str,
        force: bool,
    ) -> Result<ClaimOutcome, CoordError> {
        let files = normalize_files(files);
        if files.is_empty() {
            return Err(CoordError::EmptyClaim);
        }
        let store = self.store();
        let mut state = store.read_or_reset()?;
        let view = self.board.fresh_view();
        let now = self.board.now();

        let mut blocking = Vec::new();
        let mut reclaimed = Vec::new();
        for file in &files {
            for holder in view.holders_of(file) {
                if *holder == self.agent {
                    continue;
                }
                match self.check_owner(holder, file, now) {
                    OwnerCheck::Released => {}
                    OwnerCheck::Stale { last_seen_secs } => reclaimed.push(Takeover {
                        file: file.clone(),
                        from: holder.clone(),
                        last_seen_secs,
                    }),
                    OwnerCheck::Live(claim) => blocking.push(claim),
                }
            }
        }

        if !blocking.is_empty() && !force {
            tracing::info!(agent = %self.agent, conflicts = blocking.len(), "claim refused");
            return Err(CoordError::ClaimConflict {
                conflicts: blocking,
            });
        }
        for claim in &blocking {
            tracing::warn!(agent = %self.agent, file = %claim.file, owner = %claim.owner, "forced claim override");
        }
        for t in &reclaimed {
            tracing::warn!(agent = %self.agent, file = %t.file, from = %t.from, "reclaiming file from stale owner");
        }

        let work = CurrentWork::new(&files, task, now);
        let replaced = state.current_work.take();
        state.activate(work);
        store.write(&mut state)?;
        tracing::info!(agent = %self.agent, files = files.len(), task = %task, "claimed files");
        self.board.refresh_view();

        Ok(ClaimOutcome {
            agent: self.agent.clone(),
            files,
            task: task.to_string(),
            started: now,
            overridden: blocking,
            reclaimed,
            replaced,
        })
    }

    /// Judge the owner of `file` from its live record, held to the claim
    /// threshold.
    fn check_owner(&self, owner: &AgentId, file: &str, now: OffsetDateTime) -> OwnerCheck {
        let state = match self.board.agent_store(owner.clone()).read() {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(owner = %owner, error = %e, "owner record unreadable, treating as stale");
                return OwnerCheck::Stale {
                    last_seen_secs: None,
                };
            }
        };
        let Some(work) = state.current_work.as_ref().filter(|w| w.holds(file)) else {
            return OwnerCheck::Released;
        };
        let last_seen_secs = age_secs(state.last_heartbeat, now);
        match classify(&state, now, self.board.config().claim_threshold()) {
            ViewStatus::Active => OwnerCheck::Live(BlockingClaim {
                file: file.to_string(),
                owner: owner.clone(),
                task: work.task.clone(),
                claimed_mins: minutes_between(work.started, now),
                last_seen_secs,
            }),
            _ => OwnerCheck::Stale {
                last_seen_secs: Some(last_seen_secs),
            },
        }
    }

    /// Record progress on the current claim. `percentage` is clamped to 0..=100.
    pub fn progress(&self, percentage: i64, message: Option<&str>) -> Result<Progress, CoordError> {
        let store = self.store();
        let mut state = store.read_or_reset()?;
        let now = self.board.now();
        let progress = Progress::clamped(percentage, message.map(str::to_string), now);
        match state.current_work.as_mut() {
            Some(work) if state.status == AgentStatus::Active => {
                work.progress = Some(progress.clone());
            }
            _ => {
                return Err(CoordError::NoActiveWork {
                    agent: self.agent.clone(),
                    action: "update progress",
                })
            }
        }
        store.write(&mut state)?;
        tracing::debug!(agent = %self.agent, percentage = progress.percentage, "progress recorded");
        Ok(progress)
    }

    /// Refresh the heartbeat of an active claim. Idle agents are skipped.
    pub fn heartbeat(&self) -> Result<HeartbeatOutcome, CoordError> {
        let store = self.store();
        let mut state = store.read_or_reset()?;
        if !state.is_active() {
            tracing::debug!(agent = %self.agent, "heartbeat skipped, agent idle");
            return Ok(HeartbeatOutcome::SkippedIdle);
        }
        store.write(&mut state)?;
        let progress = state
            .current_work
            .as_ref()
            .and_then(|w| w.progress.as_ref())
            .map(|p| p.percentage);
        Ok(HeartbeatOutcome::Sent { progress })
    }

    /// Finish the current claim and hand its files off.
    pub fn complete(&self) -> Result<HandoffOutcome, CoordError> {
        let store = self.store();
        let mut state = store.read_or_reset()?;
        let now = self.board.now();
        let Some(work) = state.complete(now) else {
            return Err(CoordError::NoActiveWork {
                agent: self.agent.clone(),
                action: "complete",
            });
        };
        store.write(&mut state)?;
        tracing::info!(agent = %self.agent, task = %work.task, "work completed");
        let outcome = self.hand_off(work.files, work.task, work.started, REASON_COMPLETED, now, Vec::new(), false);
        self.board.refresh_view();
        Ok(outcome)
    }

    /// Abandon the current claim, handing every file off with `reason`.
    pub fn release(&self, reason: &str) -> Result<HandoffOutcome, CoordError> {
        let reason = reason_or_default(reason);
        let store = self.store();
        let mut state = store.read_or_reset()?;
        let now = self.board.now();
        let Some(work) = state.release(reason, now) else {
            return Err(CoordError::NoActiveWork {
                agent: self.agent.clone(),
                action: "release",
            });
        };
        store.write(&mut state)?;
        tracing::info!(agent = %self.agent, task = %work.task, reason = %reason, "work released");
        let outcome = self.hand_off(work.files, work.task, work.started, reason, now, Vec::new(), true);
        self.board.refresh_view();
        Ok(outcome)
    }

    /// Hand off part of the current claim. Requested files not held are
    /// ignored; `None` if none of them were held. Releasing every held file
    /// is a full [`release`](Self::release).
    pub fn release_files(
        &self,
        files: &[String],
        reason: &str,
    ) -> Result<Option<HandoffOutcome>, CoordError> {
        let reason = reason_or_default(reason);
        let store = self.store();
        let mut state = store.read_or_reset()?;
        let now = self.board.now();

        let work = match state.current_work.as_mut() {
            Some(work) if state.status == AgentStatus::Active => work,
            _ => {
                return Err(CoordError::NoActiveWork {
                    agent: self.agent.clone(),
                    action: "release",
                })
            }
        };
        let dropped: Vec<String> = normalize_files(files)
            .into_iter()
            .filter(|f| work.holds(f))
            .collect();
        if dropped.is_empty() {
            return Ok(None);
        }
        if dropped.len() == work.files.len() {
            return self.release(reason).map(Some);
        }

        work.files.retain(|f| !dropped.contains(f));
        let remaining = work.files.clone();
        let task = work.task.clone();
        let started = work.started;
        store.write(&mut state)?;
        tracing::info!(agent = %self.agent, files = dropped.len(), reason = %reason, "files released");
        let outcome = self.hand_off(dropped, task, started, reason, now, remaining, true);
        self.board.refresh_view();
        Ok(Some(outcome))
    }

    #[allow(clippy::too_many_arguments)]
    fn hand_off(
        &self,
        files: Vec<String>,
        task: String,
        started: OffsetDateTime,
        reason: &str,
        now: OffsetDateTime,
        remaining: Vec<String>,
        suggest: bool,
    ) -> HandoffOutcome {
        let entry = HandoffEntry::new(self.agent.clone(), files.clone(), reason, now);
        let logged = match self.board.handoffs().append(entry) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(agent = %self.agent, error = %e, "could not record handoff");
                false
            }
        };
        let suggestion = if suggest {
            self.board.suggest_successor(&files, &task, &self.agent)
        } else {
            None
        };
        HandoffOutcome {
            agent: self.agent.clone(),
            files,
            task,
            reason: reason.to_string(),
            duration_mins: minutes_between(started, now),
            remaining,
            suggestion,
            logged,
        }
    }

    /// Own record plus a freshly rebuilt view.
    pub fn check(&self) -> Result<StatusReport, CoordError> {
        let state = self.state()?;
        let view = self.board.refresh_view();
        Ok(StatusReport {
            agent: self.agent.clone(),
            state,
            view,
            now: self.board.now(),
        })
    }
}

fn reason_or_default(reason: &str) -> &str {
    let reason = reason.trim();
    if reason.is_empty() {
        REASON_MANUAL
    } else {
        reason
    }
}
