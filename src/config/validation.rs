use crate::config::Config;
use crate::url::normalize_url;
use crate::ConfigError;

/// Validates a parsed configuration
///
/// Checks that the seed list is non-empty, every seed is an absolute
/// http(s) URL, and an explicit in-flight cap is non-zero.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.seeds.urls.is_empty() {
        return Err(ConfigError::Validation(
            "at least one seed URL is required".to_string(),
        ));
    }

    for seed in &config.seeds.urls {
        normalize_url(seed, None)
            .map_err(|e| ConfigError::InvalidSeed(format!("{}: {}", seed, e)))?;
    }

    if config.crawler.max_concurrent == Some(0) {
        return Err(ConfigError::Validation(
            "max-concurrent must be at least 1".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CrawlerConfig, SeedConfig};

    fn valid_config() -> Config {
        Config {
            crawler: CrawlerConfig::default(),
            seeds: SeedConfig {
                urls: vec!["https://example.com/".to_string()],
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_empty_seeds_rejected() {
        let mut config = valid_config();
        config.seeds.urls.clear();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_bad_seed_url_rejected() {
        let mut config = valid_config();
        config.seeds.urls.push("ftp://example.com/".to_string());
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidSeed(_))
        ));
    }

    #[test]
    fn test_relative_seed_rejected() {
        let mut config = valid_config();
        config.seeds.urls.push("/just/a/path".to_string());
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidSeed(_))
        ));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = valid_config();
        config.crawler.max_concurrent = Some(0);
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }
}
