//! Config command - manage configuration.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use serde_json::Value;

use invex_core::InvexConfig;

use super::{config_file, load_config, read_config_file};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show the effective configuration (file plus environment)
    Show,

    /// Initialize a new configuration file
    Init(InitArgs),

    /// Get a specific configuration value
    Get {
        /// Configuration key (e.g., "llm.timeout_secs")
        key: String,
    },

    /// Set a value in the configuration file
    Set {
        /// Configuration key
        key: String,
        /// New value
        value: String,
    },

    /// Show configuration file path
    Path,
}

#[derive(Args)]
struct InitArgs {
    /// Output path for configuration file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite existing file
    #[arg(long)]
    force: bool,
}

pub async fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(config_path),
        ConfigCommand::Init(init_args) => init_config(init_args, config_path),
        ConfigCommand::Get { key } => get_config(&key, config_path),
        ConfigCommand::Set { key, value } => set_config(&key, &value, config_path),
        ConfigCommand::Path => show_path(config_path),
    }
}

fn show_config(config_path: Option<&str>) -> anyhow::Result<()> {
    if !config_file(config_path).exists() {
        eprintln!(
            "{} No config file found, showing defaults.",
            style("ℹ").blue()
        );
    }

    let config = load_config(config_path)?;
    println!("{}", serde_json::to_string_pretty(&config)?);

    Ok(())
}

fn init_config(args: InitArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let output_path = args.output.unwrap_or_else(|| config_file(config_path));

    if output_path.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            output_path.display()
        );
    }

    create_parent(&output_path)?;
    InvexConfig::default().save(&output_path)?;

    println!(
        "{} Created configuration file at {}",
        style("✓").green(),
        output_path.display()
    );

    Ok(())
}

fn get_config(key: &str, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let json = serde_json::to_value(&config)?;

    let value = lookup(&json, key)
        .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))?;
    println!("{}", serde_json::to_string_pretty(value)?);

    Ok(())
}

fn set_config(key: &str, value: &str, config_path: Option<&str>) -> anyhow::Result<()> {
    if key == "llm.api_key" {
        anyhow::bail!(
            "llm.api_key is never written to the config file; set LLM_API_KEY \
             (or HUGGINGFACE_API_TOKEN / OPENAI_API_KEY) in the environment or .env instead"
        );
    }

    let path = config_file(config_path);

    // Only the file's own values are written back, never the environment overlay.
    let config = if path.exists() {
        read_config_file(config_path)?
    } else {
        InvexConfig::default()
    };

    let parsed_value: Value =
        serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));

    let mut json = serde_json::to_value(&config)?;
    assign(&mut json, key, parsed_value.clone())?;

    let config: InvexConfig = serde_json::from_value(json)
        .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e))?;

    create_parent(&path)?;
    config.save(&path)?;

    println!(
        "{} Set {} = {}",
        style("✓").green(),
        key,
        serde_json::to_string(&parsed_value)?
    );

    Ok(())
}

fn show_path(config_path: Option<&str>) -> anyhow::Result<()> {
    let path = config_file(config_path);

    println!("Configuration file: {}", path.display());

    if path.exists() {
        println!("Status: {}", style("exists").green());
    } else {
        println!("Status: {}", style("not created").yellow());
        println!();
        println!("Run 'invex config init' to create a configuration file.");
    }

    Ok(())
}

fn create_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Navigate a dotted key path.
fn lookup<'a>(json: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.').try_fold(json, |current, part| current.get(part))
}

/// Set a dotted key path. Only keys already present in the serialized config can be set.
fn assign(json: &mut Value, key: &str, value: Value) -> anyhow::Result<()> {
    let (parents, last) = match key.rsplit_once('.') {
        Some((parents, last)) => (Some(parents), last),
        None => (None, key),
    };

    let mut current = json;
    for part in parents.into_iter().flat_map(|p| p.split('.')) {
        current = current
            .get_mut(part)
            .ok_or_else(|| anyhow::anyhow!("Configuration path not found: {}", key))?;
    }

    let Some(obj) = current.as_object_mut() else {
        anyhow::bail!("Cannot set value at non-object path: {}", key);
    };
    match obj.get_mut(last) {
        Some(slot) => {
            *slot = value;
            Ok(())
        }
        None => anyhow::bail!("Configuration key not found: {}", key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_lookup() {
        let json = serde_json::to_value(InvexConfig::default()).unwrap();
        assert_eq!(lookup(&json, "server.port"), Some(&json!(5000)));
        assert_eq!(lookup(&json, "llm.backend"), Some(&json!("none")));
        assert!(lookup(&json, "server.missing").is_none());
        assert!(lookup(&json, "llm.api_key").is_none());
    }

    #[test]
    fn test_assign_round_trips_through_config() {
        let mut json = serde_json::to_value(InvexConfig::default()).unwrap();
        assign(&mut json, "ocr.max_ocr_pages", json!(3)).unwrap();
        assign(&mut json, "extraction.json_recovery", json!("balanced")).unwrap();

        let config: InvexConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.ocr.max_ocr_pages, 3);
        assert_eq!(
            config.extraction.json_recovery,
            invex_core::JsonRecovery::Balanced
        );
    }

    #[test]
    fn test_assign_unknown_section() {
        let mut json = serde_json::to_value(InvexConfig::default()).unwrap();
        assert!(assign(&mut json, "nope.value", json!(1)).is_err());
        assert!(assign(&mut json, "server.port.inner", json!(1)).is_err());
    }

    #[test]
    fn test_assign_unknown_key() {
        let mut json = serde_json::to_value(InvexConfig::default()).unwrap();
        let before = json.clone();

        let err = assign(&mut json, "server.nope", json!(1)).unwrap_err();
        assert!(err.to_string().contains("Configuration key not found: server.nope"));
        assert!(assign(&mut json, "llm.api_key", json!("secret")).is_err());
        assert!(assign(&mut json, "verbose", json!(true)).is_err());
        assert_eq!(json, before);
    }
}
