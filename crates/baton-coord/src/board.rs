use std::sync::Arc;

use baton_core::{AgentId, AgentState, Clock, SystemClock};
use baton_store::{BatonPaths, FsStore, StateStore};
use time::OffsetDateTime;

use crate::advisor::{self, Recommendation};
use crate::agent_state::AgentStateStore;
use crate::claim::Claimant;
use crate::config::CoordConfig;
use crate::error::CoordError;
use crate::handoff::HandoffLog;

/// Shared coordination state: the record store, the clock and the settings.
///
/// Cheap to construct; every CLI invocation opens one, performs a single
/// operation and exits.
pub struct Board {
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
    config: CoordConfig,
}

impl Board {
    pub fn new(store: Arc<dyn StateStore>, clock: Arc<dyn Clock>, config: CoordConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Open the board of an on-disk workspace, loading its configuration.
    pub fn open(paths: &BatonPaths) -> Result<Self, CoordError> {
        let config = CoordConfig::load(&paths.config_json)?;
        Ok(Self::new(
            Arc::new(FsStore::new(&paths.states_dir)),
            Arc::new(SystemClock),
            config,
        ))
    }

    pub fn config(&self) -> &CoordConfig {
        &self.config
    }

    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    pub fn store(&self) -> &dyn StateStore {
        &*self.store
    }

    pub fn agent_store(&self, agent: AgentId) -> AgentStateStore<'_> {
        AgentStateStore::new(&*self.store, &*self.clock, agent)
    }

    /// Act as the roster agent called `name`.
    pub fn agent(&self, name: &str) -> Result<Claimant<'_>, CoordError> {
        let agent = self.config.resolve_agent(name)?;
        Ok(Claimant::new(self, agent))
    }

    pub fn handoffs(&self) -> HandoffLog<'_> {
        HandoffLog::new(&*self.store, self.config.handoff_retention)
    }

    /// Write an idle record for every roster agent that has none yet.
    /// Returns the agents that were created.
    pub fn init_agents(&self) -> Result<Vec<AgentId>, CoordError> {
        let mut created = Vec::new();
        for agent in self.config.roster() {
            let store = self.agent_store(agent.clone());
            if store.exists()? {
                continue;
            }
            let mut state = AgentState::idle(agent.clone(), self.now());
            store.write(&mut state)?;
            created.push(agent.clone());
        }
        Ok(created)
    }

    /// Rank roster agents for taking over `files` for `task`.
    pub fn recommend(&self, files: &[String], task: &str) -> Vec<Recommendation> {
        let view = self.fresh_view();
        advisor::recommend(&self.config.agents, files, task, Some(&view))
    }

    /// Best-scoring agent other than `exclude`.
    pub fn suggest_successor(
        &self,
        files: &[String],
        task: &str,
        exclude: &AgentId,
    ) -> Option<Recommendation> {
        self.recommend(files, task)
            .into_iter()
            .find(|r| &r.agent != exclude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baton_core::{AgentStatus, ManualClock};
    use baton_store::MemoryStore;
    use time::macros::datetime;

    fn board() -> (Board, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(datetime!(2026-03-01 10:00 UTC)));
        (
            Board::new(store.clone(), clock, CoordConfig::default()),
            store,
        )
    }

    #[test]
    fn init_creates_missing_records_once() {
        let (board, store) = board();
        let created = board.init_agents().unwrap();
        assert_eq!(created.len(), 3);
        assert_eq!(store.keys(), vec!["claudeCode", "copilot", "cursor"]);

        assert!(board.init_agents().unwrap().is_empty());
        let state = board.agent_store(AgentId::from("cursor")).read().unwrap();
        assert_eq!(state.status, AgentStatus::Idle);
    }

    #[test]
    fn unknown_agent_is_rejected() {
        let (board, _) = board();
        assert!(matches!(
            board.agent("gemini"),
            Err(CoordError::UnknownAgent { .. })
        ));
        assert_eq!(board.agent("copilot").unwrap().agent(), "copilot");
    }

    #[test]
    fn open_reads_workspace_config() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = BatonPaths::discover(tmp.path());
        paths.ensure_layout().unwrap();
        std::fs::write(
            &paths.config_json,
            r#"{"agents":[{"name":"alpha"}],"handoff_retention":3}"#,
        )
        .unwrap();
        let board = Board::open(&paths).unwrap();
        assert_eq!(board.config().handoff_retention, 3);
        assert!(board.agent("alpha").is_ok());
    }
}
