use baton_coord::{Board, CoordConfig};
use baton_store::{write_atomic, BatonPaths};
use std::path::Path;

pub fn execute(repo_root: &Path) -> anyhow::Result<()> {
    let paths = BatonPaths::discover(repo_root);
    let existed = paths.is_initialized();
    paths.ensure_layout()?;

    if !paths.config_json.exists() {
        let json = serde_json::to_string_pretty(&CoordConfig::default())?;
        write_atomic(&paths.config_json, json.as_bytes())?;
    }

    let board = Board::open(&paths)?;
    let created = board.init_agents()?;
    let view = board.update_view()?;

    if existed {
        println!("Already initialized at {}", paths.baton_dir.display());
    } else {
        println!("Initialized {}", paths.baton_dir.display());
    }
    for agent in &created {
        println!("  created idle record for {agent}");
    }
    println!("  {} agent(s) in the roster", view.agents.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_creates_layout_and_records() {
        let tmp = tempfile::tempdir().unwrap();
        execute(tmp.path()).unwrap();

        let paths = BatonPaths::discover(tmp.path());
        assert!(paths.config_json.is_file());
        assert!(paths.unified_view_json.is_file());
        for agent in ["claudeCode", "copilot", "cursor"] {
            assert!(paths.agent_state(agent).is_file(), "{agent} record missing");
        }
    }

    #[test]
    fn init_keeps_existing_config() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = BatonPaths::discover(tmp.path());
        paths.ensure_layout().unwrap();
        std::fs::write(&paths.config_json, r#"{"agents":[{"name":"solo"}]}"#).unwrap();

        execute(tmp.path()).unwrap();
        let raw = std::fs::read_to_string(&paths.config_json).unwrap();
        assert!(raw.contains("solo"));
        assert!(paths.agent_state("solo").is_file());
        assert!(!paths.agent_state("cursor").exists());
    }
}
