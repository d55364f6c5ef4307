use anyhow::{Context, Result, bail};
use shared::config::ClientConfig;
use std::{fs, path::Path};

/// Generates a configuration file in the specified format.
///
/// # Arguments
/// * `format` - The format of the configuration file ("yaml" or "json").
/// * `output` - Destination; `registry.yaml` or `registry.json` when omitted.
///
/// # Errors
/// Returns an error if the format is unsupported or if writing the file fails.
pub fn generate_config(format: &str, output: Option<&Path>) -> Result<()> {
    let config = ClientConfig::with_defaults();
    let (default_name, serialized) = match format {
        "yaml" | "yml" => ("registry.yaml", serde_yml::to_string(&config)?),
        "json" => ("registry.json", serde_json::to_string_pretty(&config)?),
        _ => bail!("Unsupported format. Use 'yaml' or 'json'."),
    };

    let path = output.unwrap_or_else(|| Path::new(default_name));
    fs::write(path, serialized.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;

    println!("Configuration file '{}' generated successfully.", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generated_yaml_loads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.yaml");
        generate_config("yaml", Some(&path)).unwrap();

        let loaded: ClientConfig =
            serde_yml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, ClientConfig::with_defaults());
    }

    #[test]
    fn test_generated_json_loads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.json");
        generate_config("json", Some(&path)).unwrap();

        let loaded: ClientConfig =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, ClientConfig::with_defaults());
    }

    #[test]
    fn test_unsupported_format() {
        let err = generate_config("toml", None).unwrap_err();
        assert!(err.to_string().contains("Unsupported format"));
    }
}
