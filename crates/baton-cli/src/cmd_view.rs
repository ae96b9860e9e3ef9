use baton_coord::render::{render_check, render_handoffs, render_recommendations, render_summary};
use std::path::Path;

use crate::open_board;

/// `baton check [--json]`
pub fn check(repo_root: &Path, agent: &str, json: bool) -> anyhow::Result<()> {
    let board = open_board(repo_root)?;
    let report = board.agent(agent)?.check()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report.view)?);
    } else {
        println!("{}", render_check(&report));
    }
    Ok(())
}

/// `baton update`
pub fn update(repo_root: &Path) -> anyhow::Result<()> {
    let board = open_board(repo_root)?;
    let view = board.update_view()?;
    println!("{}", render_summary(view.summary()));
    Ok(())
}

/// `baton suggest --files a,b [--task T]`
pub fn suggest(repo_root: &Path, files: &[String], task: &str) -> anyhow::Result<()> {
    let board = open_board(repo_root)?;
    let recs = board.recommend(files, task);
    println!("{}", render_recommendations(&recs));
    Ok(())
}

/// `baton handoffs [--limit N]`
pub fn handoffs(repo_root: &Path, limit: usize) -> anyhow::Result<()> {
    let board = open_board(repo_root)?;
    let entries = board.handoffs().recent(limit)?;
    println!("{}", render_handoffs(&entries, board.now()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_commands_work_on_fresh_workspace() {
        let tmp = tempfile::tempdir().unwrap();
        crate::cmd_init::execute(tmp.path()).unwrap();
        check(tmp.path(), "claudeCode", false).unwrap();
        check(tmp.path(), "claudeCode", true).unwrap();
        update(tmp.path()).unwrap();
        suggest(tmp.path(), &["README.md".to_string()], "document").unwrap();
        handoffs(tmp.path(), 5).unwrap();
    }
}
