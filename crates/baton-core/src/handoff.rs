use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::agent::AgentId;

/// Reason recorded when an agent finishes its work normally.
pub const REASON_COMPLETED: &str = "completed";

/// Reason used when a release gives none.
pub const REASON_MANUAL: &str = "manual";

/// One entry of the bounded handoff log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffEntry {
    /// `hof_<ulid>`; absent in entries written by older tooling.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub from: AgentId,
    pub files: Vec<String>,
    pub reason: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl HandoffEntry {
    pub fn new(from: AgentId, files: Vec<String>, reason: &str, now: OffsetDateTime) -> Self {
        Self {
            id: format!("hof_{}", ulid::Ulid::new()),
            from,
            files,
            reason: reason.to_string(),
            timestamp: now,
        }
    }

    pub fn is_completion(&self) -> bool {
        self.reason == REASON_COMPLETED
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn new_entry_has_prefixed_id() {
        let e = HandoffEntry::new(
            AgentId::from("alpha"),
            vec!["a.ts".into()],
            REASON_COMPLETED,
            datetime!(2026-03-01 10:00 UTC),
        );
        assert!(e.id.starts_with("hof_"));
        assert!(e.is_completion());
    }

    #[test]
    fn legacy_entry_without_id_parses() {
        let raw = r#"{"from":"cursor","files":["x.tsx"],"reason":"blocked",
                      "timestamp":"2026-03-01T10:00:00Z"}"#;
        let e: HandoffEntry = serde_json::from_str(raw).unwrap();
        assert!(e.id.is_empty());
        assert_eq!(e.reason, "blocked");
        assert!(!e.is_completion());
    }
}
