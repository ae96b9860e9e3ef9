use baton_coord::render::{render_claim, render_handoff};
use baton_coord::HeartbeatOutcome;
use std::path::Path;

use crate::open_board;

/// `baton start --files a,b --task "..." [--force]`
pub fn start(
    repo_root: &Path,
    agent: &str,
    files: &[String],
    task: &str,
    force: bool,
) -> anyhow::Result<()> {
    let board = open_board(repo_root)?;
    let outcome = board.agent(agent)?.start(files, task, force)?;
    println!("{}", render_claim(&outcome));
    Ok(())
}

/// `baton complete`
pub fn complete(repo_root: &Path, agent: &str) -> anyhow::Result<()> {
    let board = open_board(repo_root)?;
    let outcome = board.agent(agent)?.complete()?;
    println!("{}", render_handoff(&outcome));
    Ok(())
}

/// `baton release [--reason R] [--files a,b]`
pub fn release(repo_root: &Path, agent: &str, reason: &str, files: &[String]) -> anyhow::Result<()> {
    let board = open_board(repo_root)?;
    let claimant = board.agent(agent)?;
    if files.is_empty() {
        let outcome = claimant.release(reason)?;
        println!("{}", render_handoff(&outcome));
        return Ok(());
    }
    match claimant.release_files(files, reason)? {
        Some(outcome) => println!("{}", render_handoff(&outcome)),
        None => println!("{agent} holds none of: {}", files.join(", ")),
    }
    Ok(())
}

/// `baton progress --percentage N [--message M]`
pub fn progress(
    repo_root: &Path,
    agent: &str,
    percentage: i64,
    message: Option<&str>,
) -> anyhow::Result<()> {
    let board = open_board(repo_root)?;
    let p = board.agent(agent)?.progress(percentage, message)?;
    match &p.message {
        Some(msg) => println!("{agent}: {}% ({msg})", p.percentage),
        None => println!("{agent}: {}%", p.percentage),
    }
    Ok(())
}

/// `baton heartbeat`
pub fn heartbeat(repo_root: &Path, agent: &str) -> anyhow::Result<()> {
    let board = open_board(repo_root)?;
    match board.agent(agent)?.heartbeat()? {
        HeartbeatOutcome::Sent { progress: Some(p) } => println!("{agent}: heartbeat sent ({p}%)"),
        HeartbeatOutcome::Sent { progress: None } => println!("{agent}: heartbeat sent"),
        HeartbeatOutcome::SkippedIdle => println!("{agent} is idle; nothing to keep alive"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use baton_coord::CoordError;

    fn files(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn claim_cycle_on_disk() {
        let tmp = tempfile::tempdir().unwrap();
        crate::cmd_init::execute(tmp.path()).unwrap();

        start(tmp.path(), "cursor", &files(&["src/App.tsx"]), "ui", false).unwrap();
        progress(tmp.path(), "cursor", 60, Some("styling")).unwrap();
        heartbeat(tmp.path(), "cursor").unwrap();

        let err = start(tmp.path(), "copilot", &files(&["src/App.tsx"]), "ml", false).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoordError>(),
            Some(CoordError::ClaimConflict { .. })
        ));

        release(tmp.path(), "cursor", "blocked", &files(&["nope.ts"])).unwrap();
        complete(tmp.path(), "cursor").unwrap();
        let err = complete(tmp.path(), "cursor").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoordError>(),
            Some(CoordError::NoActiveWork { .. })
        ));

        let raw = std::fs::read_to_string(
            tmp.path().join(".baton/agent-states/handoffs.json"),
        )
        .unwrap();
        assert!(raw.contains("\"reason\": \"completed\""));
    }

    #[test]
    fn unknown_agent_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(heartbeat(tmp.path(), "nobody").is_err());
    }
}
