use std::path::{Path, PathBuf};

use crate::config::schema::SyncConfig;
use crate::error::ConfigError;
use crate::sync::matcher::PathMatcher;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SyncConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config = load_config_from_str(&content)?;
    log::info!(
        "Loaded sync config from {}: {} -> {} every {}s",
        path.display(),
        config.path_in.display(),
        config.path_out.display(),
        config.update_interval
    );
    Ok(config)
}

/// Parses and validates a config document.
///
/// Both roots are resolved to canonical absolute paths so that every later
/// prefix comparison happens against the same spelling notify reports.
pub fn load_config_from_str(content: &str) -> Result<SyncConfig, ConfigError> {
    let mut config: SyncConfig = serde_json::from_str(content)?;

    validate_config(&config)?;

    config.path_in = resolve_root("path_in", &config.path_in)?;
    config.path_out = resolve_root("path_out", &config.path_out)?;

    // A reset of the mirror would otherwise wipe part of the working tree.
    if config.path_in.starts_with(&config.path_out)
        || config.path_out.starts_with(&config.path_in)
    {
        return Err(ConfigError::Validation {
            message: format!(
                "path_in '{}' and path_out '{}' must not overlap",
                config.path_in.display(),
                config.path_out.display()
            ),
        });
    }

    Ok(config)
}

fn validate_config(config: &SyncConfig) -> Result<(), ConfigError> {
    if config.update_interval == 0 {
        return Err(ConfigError::Validation {
            message: "update_interval must be greater than zero".to_string(),
        });
    }

    if config.remote_name.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "remote_name must not be empty".to_string(),
        });
    }

    for preserved in &config.preserved_files {
        if preserved.is_empty() || preserved.contains(['/', '\\']) {
            return Err(ConfigError::Validation {
                message: format!(
                    "preserved_files entry '{}' must be a single top-level name",
                    preserved
                ),
            });
        }
    }

    // Compiles every pattern; the matcher itself is rebuilt by each orchestrator.
    PathMatcher::new(&config.file_patterns)?;

    Ok(())
}

fn resolve_root(field: &'static str, path: &Path) -> Result<PathBuf, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::RootNotFound {
            field,
            path: path.to_path_buf(),
        });
    }
    if !path.is_dir() {
        return Err(ConfigError::NotADirectory {
            field,
            path: path.to_path_buf(),
        });
    }

    dunce::canonicalize(path).map_err(|e| ConfigError::Validation {
        message: format!("Failed to resolve {} '{}': {}", field, path.display(), e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_json(path_in: &Path, path_out: &Path, interval: u64) -> String {
        serde_json::json!({
            "path_in": path_in,
            "path_out": path_out,
            "update_interval": interval,
            "file_patterns": ["*.md", "notes/*"]
        })
        .to_string()
    }

    #[test]
    fn test_load_valid_config() {
        let dir = TempDir::new().unwrap();
        let (src, mirror) = (dir.path().join("src"), dir.path().join("mirror"));
        std::fs::create_dir_all(&src).unwrap();
        std::fs::create_dir_all(&mirror).unwrap();

        let config = load_config_from_str(&config_json(&src, &mirror, 10)).unwrap();
        assert_eq!(config.path_in, dunce::canonicalize(&src).unwrap());
        assert_eq!(config.path_out, dunce::canonicalize(&mirror).unwrap());
        assert_eq!(config.update_interval, 10);
        assert_eq!(config.file_patterns, vec!["*.md", "notes/*"]);
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = TempDir::new().unwrap();
        let (src, mirror) = (dir.path().join("src"), dir.path().join("mirror"));
        std::fs::create_dir_all(&src).unwrap();
        std::fs::create_dir_all(&mirror).unwrap();
        let config_path = dir.path().join("sync.json");
        std::fs::write(&config_path, config_json(&src, &mirror, 3)).unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.update_interval, 3);
    }

    #[test]
    fn test_missing_config_file() {
        let dir = TempDir::new().unwrap();
        let result = load_config(dir.path().join("absent.json"));
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let dir = TempDir::new().unwrap();
        let result = load_config_from_str(&config_json(dir.path(), dir.path(), 0));
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_missing_root_rejected() {
        let dir = TempDir::new().unwrap();
        let result =
            load_config_from_str(&config_json(&dir.path().join("nope"), dir.path(), 5));
        assert!(matches!(
            result,
            Err(ConfigError::RootNotFound { field: "path_in", .. })
        ));
    }

    #[test]
    fn test_file_root_rejected() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, "x").unwrap();

        let result = load_config_from_str(&config_json(dir.path(), &file, 5));
        assert!(matches!(
            result,
            Err(ConfigError::NotADirectory { field: "path_out", .. })
        ));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let dir = TempDir::new().unwrap();
        let json = serde_json::json!({
            "path_in": dir.path(),
            "path_out": dir.path(),
            "update_interval": 5,
            "file_patterns": ["[unclosed"]
        })
        .to_string();

        let result = load_config_from_str(&json);
        assert!(matches!(result, Err(ConfigError::InvalidPattern { .. })));
    }

    #[test]
    fn test_nested_preserved_file_rejected() {
        let dir = TempDir::new().unwrap();
        let json = serde_json::json!({
            "path_in": dir.path(),
            "path_out": dir.path(),
            "update_interval": 5,
            "file_patterns": ["*"],
            "preserved_files": ["docs/README.md"]
        })
        .to_string();

        let result = load_config_from_str(&json);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_overlapping_roots_rejected() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("mirror");
        std::fs::create_dir_all(&nested).unwrap();

        let same = load_config_from_str(&config_json(dir.path(), dir.path(), 5));
        assert!(matches!(same, Err(ConfigError::Validation { .. })));

        let inner = load_config_from_str(&config_json(dir.path(), &nested, 5));
        assert!(matches!(inner, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_malformed_json() {
        let result = load_config_from_str("{ not json");
        assert!(matches!(result, Err(ConfigError::ParseJson(_))));
    }
}
