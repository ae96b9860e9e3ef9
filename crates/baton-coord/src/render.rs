//! Plain-text reports for the command surface.

use baton_core::clock::{age_secs, format_age, format_rfc3339, minutes_between};
use baton_core::{HandoffEntry, UnifiedView, ViewStatus, ViewSummary};
use time::OffsetDateTime;

use crate::advisor::Recommendation;
use crate::claim::{ClaimOutcome, HandoffOutcome, StatusReport};
use crate::error::BlockingClaim;

/// The `check` report: own status, other agents, ownership and conflicts.
pub fn render_check(report: &StatusReport) -> String {
    let now = report.now;
    let view = &report.view;
    let me = &report.agent;
    let mut lines = vec![format!("## {me}")];

    match &report.state.current_work {
        Some(work) if report.state.is_active() => {
            lines.push(format!(
                "Status: active for {} min, task: {}",
                minutes_between(work.started, now),
                work.task
            ));
            if let Some(p) = &work.progress {
                match &p.message {
                    Some(msg) => lines.push(format!("Progress: {}% ({msg})", p.percentage)),
                    None => lines.push(format!("Progress: {}%", p.percentage)),
                }
            }
            lines.push(format!("Files: {}", work.files.join(", ")));
            if view.status_of(me) == Some(ViewStatus::Stale) {
                lines.push("Warning: your heartbeat is stale; send `baton heartbeat`".to_string());
            }
        }
        _ => {
            lines.push("Status: idle".to_string());
            if let Some(done) = &report.state.last_completed {
                lines.push(format!(
                    "Last completed: {} ({} min, {})",
                    done.task,
                    done.duration_mins,
                    format_age(age_secs(done.completed, now))
                ));
            }
            if let Some(rel) = &report.state.last_released {
                lines.push(format!(
                    "Last released: {} ({}, {})",
                    rel.task,
                    rel.reason,
                    format_age(age_secs(rel.released, now))
                ));
            }
        }
    }

    let others: Vec<String> = view
        .active_agents()
        .filter(|a| &a.agent != me)
        .filter_map(|a| {
            let work = a.current_work.as_ref()?;
            let progress = work
                .progress
                .as_ref()
                .map(|p| format!(" [{}%]", p.percentage))
                .unwrap_or_default();
            let seen = a
                .heartbeat_age_secs(now)
                .map(format_age)
                .unwrap_or_else(|| "never".to_string());
            Some(format!(
                "- {}: {} ({} min, seen {seen}){progress}",
                a.agent,
                work.task,
                minutes_between(work.started, now)
            ))
        })
        .collect();
    lines.push(String::new());
    if others.is_empty() {
        lines.push("No other active agents.".to_string());
    } else {
        lines.push(format!("## Active agents ({})", others.len()));
        lines.extend(others);
    }

    if !view.stale_agents.is_empty() {
        lines.push(String::new());
        lines.push("## Stale agents".to_string());
        for s in &view.stale_agents {
            lines.push(format!("- {} (last seen {} min ago)", s.agent, s.minutes_ago));
        }
    }

    let errors: Vec<String> = view
        .agents
        .values()
        .filter(|a| a.status == ViewStatus::Error)
        .map(|a| format!("- {}: {}", a.agent, a.error.as_deref().unwrap_or("unreadable")))
        .collect();
    if !errors.is_empty() {
        lines.push(String::new());
        lines.push("## Unreadable agent records".to_string());
        lines.extend(errors);
    }

    if !view.file_ownership.is_empty() {
        lines.push(String::new());
        lines.push(format!("## File ownership ({})", view.file_ownership.len()));
        for (file, owner) in &view.file_ownership {
            if &owner.agent == me {
                lines.push(format!("- {file}: held by you"));
            } else {
                lines.push(format!("- {file}: locked by {} ({})", owner.agent, owner.task));
            }
        }
    }

    if !view.conflicts.is_empty() {
        lines.push(String::new());
        lines.push(format!("## Conflicts ({})", view.conflicts.len()));
        for c in &view.conflicts {
            lines.push(format!(
                "- {}: {} and {}",
                c.file, c.agents[0], c.agents[1]
            ));
        }
    }

    lines.join("\n")
}

pub fn render_claim(outcome: &ClaimOutcome) -> String {
    let mut lines = vec![format!(
        "{} claimed {} file(s) for: {}",
        outcome.agent,
        outcome.files.len(),
        outcome.task
    )];
    for f in &outcome.files {
        lines.push(format!("  {f}"));
    }
    if let Some(prev) = &outcome.replaced {
        lines.push(format!("Replaced previous claim: {}", prev.task));
    }
    for t in &outcome.reclaimed {
        let seen = t
            .last_seen_secs
            .map(format_age)
            .unwrap_or_else(|| "unknown".to_string());
        lines.push(format!(
            "Reclaimed {} from stale {} (last seen {seen})",
            t.file, t.from
        ));
    }
    for c in &outcome.overridden {
        lines.push(format!("Overrode {} (task: {})", c.owner, c.task));
        lines.push(format!("  {}", c.file));
    }
    lines.join("\n")
}

/// Actionable text for a refused claim.
pub fn render_conflicts(conflicts: &[BlockingClaim]) -> String {
    let mut lines = vec![format!("Claim refused: {} file(s) are held", conflicts.len())];
    for c in conflicts {
        lines.push(format!(
            "- {} is held by {} for {} min (task: {}, last seen {})",
            c.file,
            c.owner,
            c.claimed_mins,
            c.task,
            format_age(c.last_seen_secs)
        ));
    }
    lines.push("Wait for the owner to finish, coordinate, or retry with --force.".to_string());
    lines.join("\n")
}

pub fn render_handoff(outcome: &HandoffOutcome) -> String {
    let verb = if outcome.reason == baton_core::handoff::REASON_COMPLETED {
        "completed"
    } else {
        "released"
    };
    let mut lines = vec![format!(
        "{} {verb} {} ({} min)",
        outcome.agent, outcome.task, outcome.duration_mins
    )];
    lines.push(format!("Handed off: {}", outcome.files.join(", ")));
    if verb == "released" {
        lines.push(format!("Reason: {}", outcome.reason));
    }
    if !outcome.remaining.is_empty() {
        lines.push(format!("Still claimed: {}", outcome.remaining.join(", ")));
    }
    if let Some(s) = &outcome.suggestion {
        lines.push(format!("Suggested successor: {} (score {:.1})", s.agent, s.score));
    }
    if !outcome.logged {
        lines.push("Warning: the handoff log could not be updated".to_string());
    }
    lines.join("\n")
}

pub fn render_summary(summary: ViewSummary) -> String {
    format!(
        "Unified view updated: {} active, {} conflict(s), {} stale",
        summary.active, summary.conflicts, summary.stale
    )
}

/// One line per change between two views, for the watch loop.
pub fn render_changes(before: Option<&UnifiedView>, after: &UnifiedView) -> Vec<String> {
    let mut lines = Vec::new();
    let ts = format_rfc3339(after.last_updated);

    for (file, owner) in &after.file_ownership {
        let prev = before.and_then(|v| v.owner_of(file));
        if prev.map(|p| &p.agent) != Some(&owner.agent) {
            lines.push(format!("{ts}  claim     {file} -> {}", owner.agent));
        }
    }
    if let Some(before) = before {
        for (file, owner) in &before.file_ownership {
            if after.owner_of(file).is_none() {
                lines.push(format!("{ts}  free      {file} (was {})", owner.agent));
            }
        }
    }

    let had_conflict = |file: &str, agents: &[baton_core::AgentId; 2]| {
        before.is_some_and(|v| {
            v.conflicts
                .iter()
                .any(|c| c.file == file && &c.agents == agents)
        })
    };
    for c in &after.conflicts {
        if !had_conflict(c.file.as_str(), &c.agents) {
            lines.push(format!(
                "{ts}  conflict  {} ({} vs {})",
                c.file, c.agents[0], c.agents[1]
            ));
        }
    }

    for s in &after.stale_agents {
        let was_stale = before.is_some_and(|v| v.stale_agents.iter().any(|p| p.agent == s.agent));
        if !was_stale {
            lines.push(format!(
                "{ts}  stale     {} (last seen {} min ago)",
                s.agent, s.minutes_ago
            ));
        }
    }
    lines
}

/// Handoff log entries, newest first as given.
pub fn render_handoffs(entries: &[HandoffEntry], now: OffsetDateTime) -> String {
    if entries.is_empty() {
        return "No handoffs recorded.".to_string();
    }
    entries
        .iter()
        .map(|e| {
            let kind = if e.is_completion() { "done" } else { "released" };
            format!(
                "{:<8} {:<12} {kind:<9} {}  ({})",
                format_age(age_secs(e.timestamp, now)),
                e.from,
                e.files.join(", "),
                e.reason
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_recommendations(recs: &[Recommendation]) -> String {
    let mut lines = Vec::new();
    for (i, r) in recs.iter().enumerate() {
        let status = r
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        lines.push(format!(
            "{}. {} {:.1} (files {:.0}, task {:.0}, workload {:.0}; {status})",
            i + 1,
            r.agent,
            r.score,
            r.breakdown.files,
            r.breakdown.task,
            r.breakdown.workload
        ));
    }
    lines.join("\n")
}
