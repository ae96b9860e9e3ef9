pub mod agent;
pub mod clock;
pub mod handoff;
pub mod state;
pub mod view;

pub use agent::{AgentId, AgentProfile, Expertise};
pub use clock::{Clock, ManualClock, SystemClock};
pub use handoff::HandoffEntry;
pub use state::{
    classify, AgentState, AgentStatus, CompletedWork, CurrentWork, Progress, ReleasedWork,
    ViewStatus,
};
pub use view::{AgentView, ConflictRecord, FileOwner, StaleAgent, UnifiedView, ViewSummary};
