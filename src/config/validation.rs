use crate::config::types::{Config, LimitsConfig, OutputConfig, ScheduleConfig, SiteConfig};
use crate::url::normalize_url;
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_limits_config(&config.limits)?;
    validate_schedule_config(&config.schedule)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the site section
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    // The seed must normalize cleanly; it is the identity every internal
    // URL is classified against.
    normalize_url(&config.seed_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed-url: {}", e)))?;

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates resource ceilings
fn validate_limits_config(config: &LimitsConfig) -> Result<(), ConfigError> {
    if config.max_cron_time < 1 {
        return Err(ConfigError::Validation(format!(
            "max-cron-time must be >= 1 second, got {}",
            config.max_cron_time
        )));
    }

    if config.max_urls < 1 {
        return Err(ConfigError::Validation(format!(
            "max-urls must be >= 1, got {}",
            config.max_urls
        )));
    }

    if config.max_url_size < 1 {
        return Err(ConfigError::Validation(format!(
            "max-url-size must be >= 1 byte, got {}",
            config.max_url_size
        )));
    }

    if config.fetch_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "fetch-timeout must be >= 1 second, got {}",
            config.fetch_timeout
        )));
    }

    Ok(())
}

/// Validates recrawl and retention timing
fn validate_schedule_config(config: &ScheduleConfig) -> Result<(), ConfigError> {
    if config.recrawl_interval < 1 {
        return Err(ConfigError::Validation(format!(
            "recrawl-interval must be >= 1 second, got {}",
            config.recrawl_interval
        )));
    }

    // The cooldown doubles as the in-flight lease; zero would let two
    // overlapping invocations pull the same URL.
    if config.retry_cooldown < 1 {
        return Err(ConfigError::Validation(format!(
            "retry-cooldown must be >= 1 second, got {}",
            config.retry_cooldown
        )));
    }

    if config.retention_period < 1 {
        return Err(ConfigError::Validation(format!(
            "retention-period must be >= 1 second, got {}",
            config.retention_period
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{LimitsConfig, ScheduleConfig};

    fn create_test_config() -> Config {
        Config {
            site: SiteConfig {
                seed_url: "https://example.com/".to_string(),
                user_agent: "linkrot-test/1.0".to_string(),
            },
            limits: LimitsConfig::default(),
            schedule: ScheduleConfig::default(),
            output: OutputConfig {
                database_path: "./test.db".to_string(),
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        let config = create_test_config();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_malformed_seed_url_rejected() {
        let mut config = create_test_config();
        config.site.seed_url = "not a url".to_string();

        let result = validate(&config);
        assert!(matches!(result.unwrap_err(), ConfigError::InvalidUrl(_)));
    }

    #[test]
    fn test_non_http_seed_url_rejected() {
        let mut config = create_test_config();
        config.site.seed_url = "ftp://example.com/".to_string();

        let result = validate(&config);
        assert!(matches!(result.unwrap_err(), ConfigError::InvalidUrl(_)));
    }

    #[test]
    fn test_empty_user_agent_rejected() {
        let mut config = create_test_config();
        config.site.user_agent = String::new();

        let result = validate(&config);
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_zero_max_cron_time_rejected() {
        let mut config = create_test_config();
        config.limits.max_cron_time = 0;

        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_max_urls_rejected() {
        let mut config = create_test_config();
        config.limits.max_urls = 0;

        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_max_url_size_rejected() {
        let mut config = create_test_config();
        config.limits.max_url_size = 0;

        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_retry_cooldown_rejected() {
        let mut config = create_test_config();
        config.schedule.retry_cooldown = 0;

        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_retention_period_rejected() {
        let mut config = create_test_config();
        config.schedule.retention_period = 0;

        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_database_path_rejected() {
        let mut config = create_test_config();
        config.output.database_path = String::new();

        let result = validate(&config);
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }
}
