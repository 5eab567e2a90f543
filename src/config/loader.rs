// Configuration loader
// Loads settings from a TOML file, then applies environment overrides

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::constants::{BIND_ENV_VAR, CONFIG_ENV_VAR, MODEL_DIR_ENV_VAR};
use super::settings::Settings;

/// Load configuration.
///
/// Lookup order for the file: explicit `path`, then `$MEALCAST_CONFIG`, then
/// `<config_dir>/mealcast/config.toml`. Missing files fall back to defaults;
/// an explicit path that does not exist is an error.
pub fn load_config(path: Option<&Path>) -> Result<Settings> {
    let mut settings = match resolve_config_path(path)? {
        Some(config_path) => {
            tracing::debug!(path = %config_path.display(), "Loading configuration file");
            load_from_file(&config_path)?
        }
        None => Settings::default(),
    };

    apply_env_overrides(&mut settings);

    settings
        .validate()
        .context("Configuration validation failed")?;

    Ok(settings)
}

/// Parse a single TOML config file
pub fn load_from_file(path: &Path) -> Result<Settings> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("Failed to parse configuration file {}", path.display()))
}

fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("Configuration file not found: {}", path.display());
        }
        return Ok(Some(path.to_path_buf()));
    }

    if let Ok(value) = std::env::var(CONFIG_ENV_VAR) {
        if !value.is_empty() {
            let path = PathBuf::from(value);
            if !path.exists() {
                anyhow::bail!(
                    "{} points to a missing file: {}",
                    CONFIG_ENV_VAR,
                    path.display()
                );
            }
            return Ok(Some(path));
        }
    }

    Ok(dirs::config_dir()
        .map(|dir| dir.join("mealcast").join("config.toml"))
        .filter(|path| path.exists()))
}

fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(bind) = std::env::var(BIND_ENV_VAR) {
        if !bind.is_empty() {
            settings.server.bind_address = bind;
        }
    }
    if let Ok(dir) = std::env::var(MODEL_DIR_ENV_VAR) {
        if !dir.is_empty() {
            settings.model.model_dir = PathBuf::from(dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file_reads_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [server]
            bind_address = "0.0.0.0:9000"
            cors_enabled = false

            [model]
            model_dir = "/var/lib/mealcast"
            "#
        )
        .unwrap();

        let settings = load_from_file(file.path()).unwrap();
        assert_eq!(settings.server.bind_address, "0.0.0.0:9000");
        assert!(!settings.server.cors_enabled);
        assert_eq!(settings.model.model_dir, PathBuf::from("/var/lib/mealcast"));
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        let err = load_config(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[training]\nmax_depth = 0").unwrap();
        assert!(load_config(Some(file.path())).is_err());
    }
}
