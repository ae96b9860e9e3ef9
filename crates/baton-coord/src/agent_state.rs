use baton_core::{AgentId, AgentState, Clock};
use baton_store::StateStore;

use crate::error::CoordError;

/// Typed access to one agent's record.
///
/// Only the owning agent's process writes through this; everyone else reads.
pub struct AgentStateStore<'a> {
    store: &'a dyn StateStore,
    clock: &'a dyn Clock,
    agent: AgentId,
}

impl<'a> AgentStateStore<'a> {
    pub fn new(store: &'a dyn StateStore, clock: &'a dyn Clock, agent: AgentId) -> Self {
        Self {
            store,
            clock,
            agent,
        }
    }

    pub fn agent(&self) -> &AgentId {
        &self.agent
    }

    /// Whether a record was ever written for this agent.
    pub fn exists(&self) -> Result<bool, CoordError> {
        let key = self.agent.as_str();
        self.store
            .get(key)
            .map(|data| data.is_some())
            .map_err(|source| CoordError::Persistence {
                key: key.to_string(),
                source,
            })
    }

    /// Current record, or a fresh idle one if none was ever written.
    pub fn read(&self) -> Result<AgentState, CoordError> {
        let key = self.agent.as_str();
        let data = self
            .store
            .get(key)
            .map_err(|source| CoordError::Persistence {
                key: key.to_string(),
                source,
            })?;
        let Some(data) = data else {
            return Ok(AgentState::idle(self.agent.clone(), self.clock.now()));
        };
        let mut state: AgentState =
            serde_json::from_slice(&data).map_err(|source| CoordError::CorruptState {
                key: key.to_string(),
                source,
            })?;
        if state.agent != self.agent {
            tracing::debug!(record = %key, found = %state.agent, "agent field does not match record");
            state.agent = self.agent.clone();
        }
        Ok(state)
    }

    /// Like [`read`](Self::read), but a corrupt record is reported and
    /// replaced by a fresh idle state instead of failing.
    pub fn read_or_reset(&self) -> Result<AgentState, CoordError> {
        match self.read() {
            Err(CoordError::CorruptState { key, source }) => {
                tracing::warn!(record = %key, error = %source, "corrupt agent state, starting from idle");
                Ok(AgentState::idle(self.agent.clone(), self.clock.now()))
            }
            other => other,
        }
    }

    /// Persist `state`, stamping the agent identity and a fresh heartbeat.
    pub fn write(&self, state: &mut AgentState) -> Result<(), CoordError> {
        state.agent = self.agent.clone();
        state.last_heartbeat = self.clock.now();
        let key = self.agent.as_str();
        let data = serde_json::to_vec_pretty(state).map_err(|source| CoordError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.store
            .put(key, &data)
            .map_err(|source| CoordError::Persistence {
                key: key.to_string(),
                source,
            })
    }
}
