use std::path::PathBuf;

use crate::app_config::CrawlConfig;
use crate::ConfigError;

/// Load crawler configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a `HOMECRAWL_*` value cannot be parsed.
pub fn load_crawl_config() -> Result<CrawlConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_crawl_config_from_env()
}

/// Load crawler configuration from environment variables already in the process.
///
/// Unlike [`load_crawl_config`], this does NOT load `.env` files — useful for
/// testing or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a `HOMECRAWL_*` value cannot be parsed.
pub fn load_crawl_config_from_env() -> Result<CrawlConfig, ConfigError> {
    build_crawl_config(|key| std::env::var(key))
}

/// Build crawler configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual
/// environment so it can be tested with a pure `HashMap` lookup — no
/// `set_var`/`remove_var` needed.
fn build_crawl_config<F>(lookup: F) -> Result<CrawlConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        let value = raw.parse::<f64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })?;
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("must be a positive finite number, got {raw}"),
            })
        }
    };

    let provider_base_url = or_default("HOMECRAWL_PROVIDER_BASE_URL", "https://api.divar.ir");
    let request_timeout_secs = parse_u64("HOMECRAWL_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("HOMECRAWL_USER_AGENT", "homecrawl/0.1 (map-crawler)");
    let max_retries = parse_u32("HOMECRAWL_MAX_RETRIES", "3")?;
    let retry_backoff_base_secs = parse_u64("HOMECRAWL_RETRY_BACKOFF_BASE_SECS", "5")?;
    let tile_side_km = parse_f64("HOMECRAWL_TILE_SIDE_KM", "1.0")?;
    let cache_ttl_hours = parse_u32("HOMECRAWL_CACHE_TTL_HOURS", "24")?;
    let cache_dir = PathBuf::from(or_default("HOMECRAWL_CACHE_DIR", "./data"));
    let log_level = or_default("HOMECRAWL_LOG_LEVEL", "info");

    Ok(CrawlConfig {
        provider_base_url,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_secs,
        tile_side_km,
        cache_ttl_hours,
        cache_dir,
        log_level,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn build_crawl_config_defaults_with_empty_env() {
        let map: HashMap<&str, &str> = HashMap::new();
        let config = build_crawl_config(lookup_from_map(&map)).unwrap();
        assert_eq!(config.provider_base_url, "https://api.divar.ir");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.max_retries, 3);
        assert!((config.tile_side_km - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.cache_ttl_hours, 24);
        assert_eq!(config.cache_dir, PathBuf::from("./data"));
    }

    #[test]
    fn build_crawl_config_overrides_from_env() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("HOMECRAWL_PROVIDER_BASE_URL", "http://localhost:9999");
        map.insert("HOMECRAWL_TILE_SIDE_KM", "0.5");
        map.insert("HOMECRAWL_CACHE_TTL_HOURS", "1");
        let config = build_crawl_config(lookup_from_map(&map)).unwrap();
        assert_eq!(config.provider_base_url, "http://localhost:9999");
        assert!((config.tile_side_km - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.cache_ttl_hours, 1);
    }

    #[test]
    fn build_crawl_config_rejects_bad_timeout() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("HOMECRAWL_REQUEST_TIMEOUT_SECS", "soon");
        let result = build_crawl_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "HOMECRAWL_REQUEST_TIMEOUT_SECS"),
            "expected InvalidEnvVar, got: {result:?}"
        );
    }

    #[test]
    fn build_crawl_config_rejects_nonpositive_tile_side() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("HOMECRAWL_TILE_SIDE_KM", "0");
        let result = build_crawl_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "HOMECRAWL_TILE_SIDE_KM"),
            "expected InvalidEnvVar, got: {result:?}"
        );
    }

    #[test]
    fn build_crawl_config_rejects_bad_cache_ttl() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("HOMECRAWL_CACHE_TTL_HOURS", "never");
        let result = build_crawl_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "HOMECRAWL_CACHE_TTL_HOURS"),
            "expected InvalidEnvVar, got: {result:?}"
        );
    }

    #[test]
    fn build_crawl_config_rejects_bad_retries() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("HOMECRAWL_MAX_RETRIES", "-1");
        let result = build_crawl_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "HOMECRAWL_MAX_RETRIES"),
            "expected InvalidEnvVar, got: {result:?}"
        );
    }
}
