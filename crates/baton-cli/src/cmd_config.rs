use baton_coord::CoordConfig;
use clap::Subcommand;
use std::path::Path;

use crate::config_path;

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Set a config value
    Set {
        /// Config key (e.g. claim_stale_secs)
        key: String,
        /// Config value (number, string, or JSON for `agents`)
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List the effective configuration
    List,
}

// ── Dispatch ──

pub fn run(cmd: ConfigCmd, repo_root: &Path) -> anyhow::Result<()> {
    match cmd {
        ConfigCmd::Set { key, value } => set(repo_root, &key, &value),
        ConfigCmd::Get { key } => get(repo_root, &key),
        ConfigCmd::List => list(repo_root),
    }
}

// ── Command Implementations ──

/// Read config from `.baton/config.json`. Returns empty map if file doesn't exist.
fn read_config(path: &Path) -> anyhow::Result<serde_json::Map<String, serde_json::Value>> {
    if !path.exists() {
        return Ok(serde_json::Map::new());
    }
    let content = std::fs::read_to_string(path)?;
    let val: serde_json::Value = serde_json::from_str(&content)?;
    match val {
        serde_json::Value::Object(map) => Ok(map),
        _ => Ok(serde_json::Map::new()),
    }
}

/// Write config to `.baton/config.json`.
fn write_config(
    path: &Path,
    config: &serde_json::Map<String, serde_json::Value>,
) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&config)?;
    baton_store::write_atomic(path, json.as_bytes())?;
    Ok(())
}

/// Parse a string value into an appropriate JSON value.
fn parse_value(s: &str) -> serde_json::Value {
    let trimmed = s.trim();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        if let Ok(v) = serde_json::from_str(trimmed) {
            return v;
        }
    }
    match trimmed {
        "true" => serde_json::Value::Bool(true),
        "false" => serde_json::Value::Bool(false),
        _ => {
            if let Ok(n) = trimmed.parse::<u64>() {
                serde_json::Value::Number(n.into())
            } else {
                serde_json::Value::String(s.to_string())
            }
        }
    }
}

/// Fail unless `config` describes a valid, complete configuration.
fn check_config(config: &serde_json::Map<String, serde_json::Value>) -> anyhow::Result<()> {
    let parsed: CoordConfig = serde_json::from_value(serde_json::Value::Object(config.clone()))?;
    parsed.validate()?;
    Ok(())
}

/// `baton config set <key> <value>`
pub fn set(repo_root: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let path = config_path(repo_root);
    if !path.parent().is_some_and(Path::is_dir) {
        anyhow::bail!("No .baton/ workspace found. Run `baton init` first.");
    }
    let known = serde_json::to_value(CoordConfig::default())?;
    if known.get(key).is_none() {
        anyhow::bail!("unknown config key {key:?}");
    }
    let mut config = read_config(&path)?;
    config.insert(key.to_string(), parse_value(value));
    check_config(&config)?;
    write_config(&path, &config)?;
    println!("{key} = {value}");
    Ok(())
}

/// `baton config get <key>`
pub fn get(repo_root: &Path, key: &str) -> anyhow::Result<()> {
    let config = read_config(&config_path(repo_root))?;
    match config.get(key) {
        Some(val) => println!("{val}"),
        None => match serde_json::to_value(CoordConfig::default())?.get(key) {
            Some(default) => println!("{default} (default)"),
            None => println!("(not set)"),
        },
    }
    Ok(())
}

/// `baton config list`
pub fn list(repo_root: &Path) -> anyhow::Result<()> {
    let config = CoordConfig::load(&config_path(repo_root))?;
    let value = serde_json::to_value(&config)?;
    if let serde_json::Value::Object(map) = value {
        for (k, v) in &map {
            if k == "agents" {
                let names: Vec<_> = config.roster().map(|a| a.to_string()).collect();
                println!("{k} = {}", names.join(", "));
            } else {
                println!("{k} = {v}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_value_types() {
        assert_eq!(parse_value("30"), serde_json::json!(30));
        assert_eq!(parse_value("true"), serde_json::json!(true));
        assert_eq!(parse_value("hello"), serde_json::json!("hello"));
        assert_eq!(
            parse_value(r#"[{"name":"alpha"}]"#),
            serde_json::json!([{"name": "alpha"}])
        );
    }

    #[test]
    fn set_requires_workspace() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(set(tmp.path(), "claim_stale_secs", "10").is_err());
    }

    #[test]
    fn set_validates_before_writing() {
        let tmp = tempfile::tempdir().unwrap();
        crate::cmd_init::execute(tmp.path()).unwrap();
        let path = config_path(tmp.path());

        set(tmp.path(), "claim_stale_secs", "10").unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"claim_stale_secs\": 10"));

        assert!(set(tmp.path(), "claim_stale_secs", "999999").is_err());
        assert!(set(tmp.path(), "handoff_retention", "0").is_err());
        assert!(set(tmp.path(), "no_such_key", "1").is_err());
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"claim_stale_secs\": 10"));
    }
}
