//! Loading and fingerprinting of TOML configuration files

use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Reads, parses, and validates the configuration at `path`.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use linkrot::config::load_config;
///
/// let config = load_config(Path::new("linkrot.toml")).unwrap();
/// println!("seed: {}", config.site.seed_url);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_and_validate(&content)
}

/// Hex-encoded SHA-256 of the configuration file's raw bytes.
///
/// Logged at startup so configuration drift between runs is traceable.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(hash_content(&content))
}

/// Loads the configuration and its content hash in a single read.
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_and_validate(&content)?;
    Ok((config, hash_content(&content)))
}

fn parse_and_validate(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

fn hash_content(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{content}").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[site]
seed-url = "https://example.com/"
user-agent = "linkrot-test/1.0"

[limits]
max-cron-time = 60
max-urls = 1000
max-url-size = 1048576
fetch-timeout = 30

[schedule]
recrawl-interval = 86400
retry-cooldown = 3600
retention-period = 604800

[output]
database-path = "./test.db"
"#;

        let file = temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.site.seed_url, "https://example.com/");
        assert_eq!(config.limits.max_urls, 1000);
        assert_eq!(config.schedule.retention_period, 604_800);
        assert_eq!(config.output.database_path, "./test.db");
    }

    #[test]
    fn test_load_minimal_config_uses_defaults() {
        let config_content = r#"
[site]
seed-url = "https://example.com/"

[output]
database-path = "./test.db"
"#;

        let file = temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.limits.max_cron_time, 60);
        assert_eq!(config.limits.max_url_size, 1024 * 1024);
        assert_eq!(config.schedule.recrawl_interval, 86_400);
        assert!(config.site.user_agent.starts_with("linkrot/"));
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[site]
seed-url = "https://example.com/"

[limits]
max-urls = 0

[output]
database-path = "./test.db"
"#;

        let file = temp_config(config_content);
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().starts_with("Invalid config:"));
    }

    #[test]
    fn test_config_hash_is_stable() {
        let file = temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64); // 32 bytes, hex encoded
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = temp_config("content 1");
        let file2 = temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_load_with_hash_matches_separate_calls() {
        let config_content = r#"
[site]
seed-url = "https://example.com/"

[output]
database-path = "./test.db"
"#;

        let file = temp_config(config_content);
        let (config, hash) = load_config_with_hash(file.path()).unwrap();

        assert_eq!(config.site.seed_url, "https://example.com/");
        assert_eq!(hash, compute_config_hash(file.path()).unwrap());
    }
}
