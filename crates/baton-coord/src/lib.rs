//! File-claim coordination between agents sharing one working tree.
//!
//! Each agent writes only its own record; the unified view is rebuilt from
//! all records on demand and is safe to recompute at any time.

pub mod advisor;
pub mod agent_state;
pub mod board;
pub mod claim;
pub mod config;
pub mod error;
pub mod handoff;
pub mod render;
pub mod view;

pub use advisor::{recommend, Recommendation, ScoreBreakdown};
pub use agent_state::AgentStateStore;
pub use board::Board;
pub use claim::{
    ClaimOutcome, Claimant, HandoffOutcome, HeartbeatOutcome, StatusReport, Takeover,
};
pub use config::CoordConfig;
pub use error::{BlockingClaim, CoordError};
pub use handoff::HandoffLog;
pub use view::build_view;
