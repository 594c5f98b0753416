//! Configuration loading and validation
//!
//! Petrel is configured from a TOML file with two sections: `[crawler]`
//! (depth bound, in-flight cap, cache directory, all optional) and
//! `[seeds]` (the URL list the crawl starts from).

mod parser;
mod types;
mod validation;

pub use parser::load_config;
pub use types::{Config, CrawlerConfig, ResolvedLimits, SeedConfig};
pub use validation::validate;

use crate::url::normalize_url;
use crate::ConfigError;
use url::Url;

impl Config {
    /// Parses and normalizes the configured seed URLs
    pub fn seed_urls(&self) -> Result<Vec<Url>, ConfigError> {
        self.seeds
            .urls
            .iter()
            .map(|raw| {
                normalize_url(raw, None)
                    .map_err(|e| ConfigError::InvalidSeed(format!("{}: {}", raw, e)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_urls_normalized() {
        let config = Config {
            crawler: CrawlerConfig::default(),
            seeds: SeedConfig {
                urls: vec!["HTTPS://Example.COM/page#frag".to_string()],
            },
        };

        let seeds = config.seed_urls().unwrap();
        assert_eq!(seeds[0].as_str(), "https://example.com/page");
    }

    #[test]
    fn test_seed_urls_propagate_errors() {
        let config = Config {
            crawler: CrawlerConfig::default(),
            seeds: SeedConfig {
                urls: vec!["file:///etc/passwd".to_string()],
            },
        };

        assert!(config.seed_urls().is_err());
    }
}
