use baton_core::HandoffEntry;
use baton_store::StateStore;

use crate::error::CoordError;

pub const HANDOFFS_KEY: &str = "handoffs";

/// Bounded append-only log of handoffs, oldest first on disk.
///
/// Any agent may append, so two near-simultaneous appends can lose one
/// entry; the log is informational and nothing in the protocol reads it.
pub struct HandoffLog<'a> {
    store: &'a dyn StateStore,
    retention: usize,
}

impl<'a> HandoffLog<'a> {
    pub fn new(store: &'a dyn StateStore, retention: usize) -> Self {
        Self {
            store,
            retention: retention.max(1),
        }
    }

    /// All retained entries, oldest first.
    pub fn entries(&self) -> Result<Vec<HandoffEntry>, CoordError> {
        let data = self
            .store
            .get(HANDOFFS_KEY)
            .map_err(|source| CoordError::Persistence {
                key: HANDOFFS_KEY.to_string(),
                source,
            })?;
        match data {
            None => Ok(Vec::new()),
            Some(data) => {
                serde_json::from_slice(&data).map_err(|source| CoordError::CorruptState {
                    key: HANDOFFS_KEY.to_string(),
                    source,
                })
            }
        }
    }

    /// Newest first, at most `limit` entries.
    pub fn recent(&self, limit: usize) -> Result<Vec<HandoffEntry>, CoordError> {
        let mut entries = self.entries()?;
        entries.reverse();
        entries.truncate(limit);
        Ok(entries)
    }

    /// Append `entry`, evicting the oldest entries beyond the retention count.
    /// A corrupt log is discarded and restarted.
    pub fn append(&self, entry: HandoffEntry) -> Result<(), CoordError> {
        let mut entries = match self.entries() {
            Ok(e) => e,
            Err(CoordError::CorruptState { source, .. }) => {
                tracing::warn!(error = %source, "corrupt handoff log, starting a new one");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        entries.push(entry);
        if entries.len() > self.retention {
            let excess = entries.len() - self.retention;
            entries.drain(..excess);
        }
        let data = serde_json::to_vec_pretty(&entries).map_err(|source| CoordError::Encode {
            key: HANDOFFS_KEY.to_string(),
            source,
        })?;
        self.store
            .put(HANDOFFS_KEY, &data)
            .map_err(|source| CoordError::Persistence {
                key: HANDOFFS_KEY.to_string(),
                source,
            })
    }
}
