//! Assignment advisor: ranks agents for taking over a set of files.
//!
//! A plain weighted matcher over the roster's expertise metadata. It only
//! advises; nothing in the claim protocol depends on its output.

use std::path::Path;

use baton_core::{AgentId, AgentProfile, Expertise, UnifiedView, ViewStatus};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Serialize;

const FILE_WEIGHT: f64 = 0.4;
const TASK_WEIGHT: f64 = 0.4;
const WORKLOAD_WEIGHT: f64 = 0.2;

const FILE_MATCH_POINTS: f64 = 10.0;
const PRIMARY_KEYWORD_POINTS: f64 = 20.0;
const KEYWORD_POINTS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub files: f64,
    pub task: f64,
    pub workload: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub agent: AgentId,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    /// Status in the view consulted, if the agent appeared there.
    pub status: Option<ViewStatus>,
}

/// Score every roster agent, best first. Ties keep roster order.
pub fn recommend(
    roster: &[AgentProfile],
    files: &[String],
    task: &str,
    view: Option<&UnifiedView>,
) -> Vec<Recommendation> {
    let task = task.to_lowercase();
    let mut out: Vec<Recommendation> = roster
        .iter()
        .map(|profile| {
            let status = view.and_then(|v| v.status_of(&profile.name));
            let breakdown = ScoreBreakdown {
                files: file_score(&profile.expertise, files),
                task: task_score(&profile.expertise, &task),
                workload: workload_score(status),
            };
            Recommendation {
                agent: profile.name.clone(),
                score: FILE_WEIGHT * breakdown.files
                    + TASK_WEIGHT * breakdown.task
                    + WORKLOAD_WEIGHT * breakdown.workload,
                breakdown,
                status,
            }
        })
        .collect();
    out.sort_by(|a, b| b.score.total_cmp(&a.score));
    out
}

fn build_globset(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => tracing::debug!(pattern = %pattern, error = %e, "skipping bad pattern"),
        }
    }
    builder.build().unwrap_or_else(|_| GlobSet::empty())
}

fn file_score(expertise: &Expertise, files: &[String]) -> f64 {
    let set = build_globset(&expertise.file_patterns);
    let matched = files
        .iter()
        .filter(|f| {
            let path = f.as_str();
            let name = Path::new(path)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(path);
            set.is_match(path) || set.is_match(name)
        })
        .count();
    matched as f64 * FILE_MATCH_POINTS
}

fn task_score(expertise: &Expertise, task_lower: &str) -> f64 {
    expertise
        .task_keywords
        .iter()
        .filter(|k| task_lower.contains(k.to_lowercase().as_str()))
        .map(|k| {
            if expertise.primary.iter().any(|p| k.contains(p.as_str())) {
                PRIMARY_KEYWORD_POINTS
            } else {
                KEYWORD_POINTS
            }
        })
        .sum()
}

fn workload_score(status: Option<ViewStatus>) -> f64 {
    let weight = match status {
        Some(ViewStatus::Active) => 10.0,
        Some(ViewStatus::Stale) => 5.0,
        Some(ViewStatus::Idle) | Some(ViewStatus::Error) | None => 0.0,
    };
    100.0 - weight
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_roster;
    use baton_core::{AgentState, AgentView, CurrentWork};
    use time::macros::datetime;

    fn files(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn markdown_goes_to_the_documentation_agent() {
        let recs = recommend(
            &default_roster(),
            &files(&["docs/architecture.md"]),
            "document the module structure",
            None,
        );
        assert_eq!(recs[0].agent, "claudeCode");
        assert!(recs[0].breakdown.files > 0.0);
        assert!(recs[0].breakdown.task > 0.0);
    }

    #[test]
    fn component_tests_go_to_the_ui_agent() {
        let recs = recommend(
            &default_roster(),
            &files(&["src/components/Button.test.tsx"]),
            "fix the react component test",
            None,
        );
        assert_eq!(recs[0].agent, "cursor");
    }

    #[test]
    fn primary_keywords_score_double() {
        let expertise = Expertise {
            primary: files(&["ml"]),
            task_keywords: files(&["ml", "model"]),
            ..Expertise::default()
        };
        assert_eq!(task_score(&expertise, "train the ml model"), 30.0);
    }

    #[test]
    fn busy_agents_rank_lower_on_ties() {
        let roster = vec![
            AgentProfile::new("alpha", Expertise::default()),
            AgentProfile::new("beta", Expertise::default()),
        ];
        let now = datetime!(2026-03-01 10:00 UTC);
        let mut view = UnifiedView::empty(now);
        let mut busy = AgentState::idle(AgentId::from("alpha"), now);
        busy.activate(CurrentWork::new(&files(&["x.rs"]), "t", now));
        view.agents.insert(
            AgentId::from("alpha"),
            AgentView::from_state(busy, ViewStatus::Active),
        );

        let recs = recommend(&roster, &files(&["a.rs"]), "anything", Some(&view));
        assert_eq!(recs[0].agent, "beta");
        assert_eq!(recs[0].breakdown.workload, 100.0);
        assert_eq!(recs[1].breakdown.workload, 90.0);
    }

    #[test]
    fn equal_scores_keep_roster_order() {
        let roster = vec![
            AgentProfile::new("alpha", Expertise::default()),
            AgentProfile::new("beta", Expertise::default()),
        ];
        let recs = recommend(&roster, &files(&["a.rs"]), "", None);
        assert_eq!(recs[0].agent, "alpha");
        assert_eq!(recs[1].agent, "beta");
        assert_eq!(recs[0].score, 20.0);
    }
}
