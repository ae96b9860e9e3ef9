//! Unified view reconciliation.
//!
//! The view is a pure function of the agent records and "now": every pass
//! starts from an empty view, so concurrent rebuilds can race freely and the
//! next one corrects whatever the last writer left behind.

use baton_core::clock::minutes_between;
use baton_core::{
    classify, AgentId, AgentState, AgentView, ConflictRecord, FileOwner, StaleAgent, UnifiedView,
    ViewStatus,
};
use time::{Duration, OffsetDateTime};

use crate::board::Board;
use crate::error::CoordError;

pub const UNIFIED_VIEW_KEY: &str = "unified-view";

/// Reconcile agent records into a view.
///
/// Records are processed in the given order; for a file claimed by several
/// active agents the first one keeps ownership and each later one adds a
/// conflict. An `Err` record becomes an error entry and claims nothing.
pub fn build_view<I>(records: I, now: OffsetDateTime, stale_after: Duration) -> UnifiedView
where
    I: IntoIterator<Item = (AgentId, Result<AgentState, String>)>,
{
    let mut view = UnifiedView::empty(now);

    for (agent, record) in records {
        let state = match record {
            Ok(state) => state,
            Err(message) => {
                view.agents
                    .insert(agent.clone(), AgentView::error(agent, message));
                continue;
            }
        };

        let status = classify(&state, now, stale_after);
        if status == ViewStatus::Stale {
            view.stale_agents.push(StaleAgent {
                agent: agent.clone(),
                last_seen: state.last_heartbeat,
                minutes_ago: minutes_between(state.last_heartbeat, now),
            });
        }

        if status == ViewStatus::Active {
            if let Some(work) = &state.current_work {
                for file in &work.files {
                    match view.file_ownership.get(file) {
                        None => {
                            view.file_ownership.insert(
                                file.clone(),
                                FileOwner {
                                    agent: agent.clone(),
                                    since: work.started,
                                    task: work.task.clone(),
                                },
                            );
                        }
                        Some(owner) if owner.agent != agent => {
                            view.conflicts.push(ConflictRecord {
                                file: file.clone(),
                                agents: [owner.agent.clone(), agent.clone()],
                                detected: now,
                            });
                        }
                        Some(_) => {}
                    }
                }
            }
        }

        view.agents
            .insert(agent, AgentView::from_state(state, status));
    }

    view
}

impl Board {
    /// Rebuild the view from every roster agent's record, classifying with
    /// the background threshold. Nothing is persisted.
    pub fn rebuild_view(&self) -> UnifiedView {
        let records = self.config().roster().map(|agent| {
            let record = self.agent_store(agent.clone()).read().map_err(|e| {
                tracing::warn!(agent = %agent, error = %e, "unreadable agent state");
                e.to_string()
            });
            (agent.clone(), record)
        });
        let view = build_view(records, self.now(), self.config().background_threshold());
        let summary = view.summary();
        tracing::debug!(
            active = summary.active,
            conflicts = summary.conflicts,
            stale = summary.stale,
            "rebuilt unified view"
        );
        view
    }

    /// Rebuild and persist the view.
    pub fn update_view(&self) -> Result<UnifiedView, CoordError> {
        let view = self.rebuild_view();
        let data = serde_json::to_vec_pretty(&view).map_err(|source| CoordError::Encode {
            key: UNIFIED_VIEW_KEY.to_string(),
            source,
        })?;
        self.store()
            .put(UNIFIED_VIEW_KEY, &data)
            .map_err(|source| CoordError::Persistence {
                key: UNIFIED_VIEW_KEY.to_string(),
                source,
            })?;
        Ok(view)
    }

    /// Rebuild and persist, downgrading a failed write to a warning. Used
    /// after an operation whose own state write already succeeded.
    pub fn refresh_view(&self) -> UnifiedView {
        match self.update_view() {
            Ok(view) => view,
            Err(e) => {
                tracing::warn!(error = %e, "could not persist unified view");
                self.rebuild_view()
            }
        }
    }

    /// The last persisted view, if there is a readable one.
    pub fn cached_view(&self) -> Option<UnifiedView> {
        let data = match self.store().get(UNIFIED_VIEW_KEY) {
            Ok(data) => data?,
            Err(e) => {
                tracing::warn!(error = %e, "cannot read unified view");
                return None;
            }
        };
        match serde_json::from_slice(&data) {
            Ok(view) => Some(view),
            Err(e) => {
                tracing::warn!(error = %e, "corrupt unified view, rebuilding");
                None
            }
        }
    }

    /// The cached view if it is younger than the freshness threshold,
    /// otherwise a rebuilt (and persisted) one.
    pub fn fresh_view(&self) -> UnifiedView {
        let now = self.now();
        if let Some(view) = self.cached_view() {
            if now - view.last_updated <= self.config().view_freshness() {
                return view;
            }
        }
        self.refresh_view()
    }
}
