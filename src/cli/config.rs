use std::path::Path;

use crate::cli::context::CliContext;
use crate::config::AppConfig;
use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use serde_json::{Map, Value as JsonValue};
use tokio::fs;
use tracing::info;

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set configuration value (dotted key, e.g. explorer.settle_delay_ms)
    Set {
        /// Configuration key
        key: String,

        /// Configuration value
        value: String,
    },

    /// Get configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Reset configuration to defaults
    Reset,

    /// Validate configuration
    Validate,
}

pub async fn cmd_config(args: ConfigArgs, ctx: &CliContext) -> Result<()> {
    let path = ctx.config_path().to_path_buf();
    match args.action {
        ConfigAction::Show => {
            let config = load_config_file(&path).await?;
            println!("Current configuration ({}):", path.display());
            println!("{}", serde_yaml::to_string(&config)?);
        }
        ConfigAction::Set { key, value } => {
            let config = load_config_file(&path).await?;
            let mut json = serde_json::to_value(&config)?;
            let segments = split_key(&key)?;
            let parsed = parse_cli_value(&value);
            set_json_value(&mut json, &segments, parsed)?;
            let config: AppConfig = serde_json::from_value(json)
                .with_context(|| format!("{} does not accept {}", key, value))?;
            config.validate()?;
            save_config_file(&path, &config).await?;
            info!("Updated configuration key {}", key);
            println!("Saved configuration to {}", path.display());
        }
        ConfigAction::Get { key } => {
            let config = load_config_file(&path).await?;
            let json = serde_json::to_value(&config)?;
            let segments = split_key(&key)?;
            if let Some(value) = get_json_value(&json, &segments) {
                println!("{}", serde_yaml::to_string(value)?);
            } else {
                bail!("{} not found in configuration", key);
            }
        }
        ConfigAction::Reset => {
            let defaults = AppConfig::default();
            save_config_file(&path, &defaults).await?;
            println!(
                "Configuration reset to defaults and written to {}",
                path.display()
            );
        }
        ConfigAction::Validate => {
            if fs::try_exists(&path).await? {
                let config = load_config_file(&path).await?;
                config
                    .validate()
                    .with_context(|| format!("validating {}", path.display()))?;
                println!("Configuration file {} is valid", path.display());
            } else {
                AppConfig::default().validate()?;
                println!(
                    "No configuration file at {}; defaults are valid",
                    path.display()
                );
            }
        }
    }

    Ok(())
}

async fn load_config_file(path: &Path) -> Result<AppConfig> {
    if fs::try_exists(path).await? {
        let raw = fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let config =
            serde_yaml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    } else {
        Ok(AppConfig::default())
    }
}

async fn save_config_file(path: &Path, config: &AppConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    let serialized = serde_yaml::to_string(config)?;
    fs::write(path, serialized)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn parse_cli_value(raw: &str) -> JsonValue {
    serde_json::from_str(raw).unwrap_or_else(|_| JsonValue::String(raw.to_string()))
}

fn split_key(key: &str) -> Result<Vec<&str>> {
    let segments: Vec<&str> = key
        .split('.')
        .filter(|segment| !segment.is_empty())
        .collect();
    if segments.is_empty() {
        bail!("configuration key cannot be empty");
    }
    Ok(segments)
}

fn set_json_value(target: &mut JsonValue, path: &[&str], value: JsonValue) -> Result<()> {
    let Some((last, parents)) = path.split_last() else {
        bail!("configuration key cannot be empty");
    };
    let mut current = target;
    for segment in parents {
        current = {
            let map = ensure_object(current, segment)?;
            map.entry((*segment).to_string()).or_insert(JsonValue::Null)
        };
    }
    let map = ensure_object(current, last)?;
    map.insert((*last).to_string(), value);
    Ok(())
}

fn ensure_object<'a>(
    value: &'a mut JsonValue,
    segment: &str,
) -> Result<&'a mut Map<String, JsonValue>> {
    if value.is_null() {
        *value = JsonValue::Object(Map::new());
    }
    match value.as_object_mut() {
        Some(map) => Ok(map),
        None => bail!(
            "{} resolves to a non-object value; cannot assign nested configuration",
            segment
        ),
    }
}

fn get_json_value<'a>(value: &'a JsonValue, path: &[&str]) -> Option<&'a JsonValue> {
    let mut current = value;
    for segment in path {
        match current {
            JsonValue::Object(map) => {
                current = map.get(*segment)?;
            }
            _ => return None,
        }
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_and_get_nested_keys() {
        let mut doc = json!({});
        set_json_value(&mut doc, &["oracle", "timeout_ms"], JsonValue::from(5000)).unwrap();
        set_json_value(
            &mut doc,
            &["explorer", "validate_pages"],
            JsonValue::Bool(true),
        )
        .unwrap();
        assert_eq!(
            get_json_value(&doc, &["oracle", "timeout_ms"]),
            Some(&JsonValue::from(5000))
        );
        assert_eq!(
            get_json_value(&doc, &["explorer", "validate_pages"]),
            Some(&JsonValue::Bool(true))
        );
    }

    #[test]
    fn scalar_parents_are_rejected() {
        let mut doc = json!({ "output_dir": "./out" });
        assert!(set_json_value(&mut doc, &["output_dir", "nested"], JsonValue::Null).is_err());
        assert!(split_key("..").is_err());
    }

    #[test]
    fn cli_values_parse_as_json_when_possible() {
        assert_eq!(parse_cli_value("42"), JsonValue::from(42));
        assert_eq!(parse_cli_value("false"), JsonValue::Bool(false));
        assert_eq!(
            parse_cli_value("http://127.0.0.1:8000"),
            JsonValue::String("http://127.0.0.1:8000".into())
        );
    }
}
