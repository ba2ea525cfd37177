use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "pretty" | "text" => Self::Pretty,
            _ => Self::Json,
        }
    }
}

/// Process configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Settings {
    pub port: u16,
    pub config_dir: PathBuf,
    pub plugin_dir: PathBuf,
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
    pub cors_origins: Vec<String>,
    pub rate_limit: bool,
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: 3000,
            config_dir: PathBuf::from("configs"),
            plugin_dir: PathBuf::from("plugins"),
            cache_capacity: 512,
            cache_ttl: Duration::from_secs(300),
            cors_origins: vec!["http://localhost:3000".to_string()],
            rate_limit: true,
            log_format: LogFormat::Json,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            port: parsed(&lookup, "PORT", defaults.port),
            config_dir: lookup("DIVBRIDGE_CONFIG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.config_dir),
            plugin_dir: lookup("DIVBRIDGE_PLUGIN_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.plugin_dir),
            cache_capacity: parsed(&lookup, "DIVBRIDGE_CACHE_CAPACITY", defaults.cache_capacity),
            cache_ttl: Duration::from_secs(parsed(
                &lookup,
                "DIVBRIDGE_CACHE_TTL_SECS",
                defaults.cache_ttl.as_secs(),
            )),
            cors_origins: lookup("DIVBRIDGE_CORS_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
            rate_limit: lookup("DIVBRIDGE_RATE_LIMIT")
                .map(|v| !matches!(v.trim().to_lowercase().as_str(), "false" | "0" | "off"))
                .unwrap_or(defaults.rate_limit),
            log_format: lookup("DIVBRIDGE_LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or(defaults.log_format),
        }
    }
}

fn parsed<T: FromStr + Copy + std::fmt::Display>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default = %default, "unparseable setting, using default");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Settings {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let settings = from_pairs(&[]);
        assert_eq!(settings.port, 3000);
        assert_eq!(settings.cache_capacity, 512);
        assert_eq!(settings.cache_ttl, Duration::from_secs(300));
        assert!(settings.rate_limit);
        assert_eq!(settings.log_format, LogFormat::Json);
    }

    #[test]
    fn values_are_read_and_bad_numbers_fall_back() {
        let settings = from_pairs(&[
            ("PORT", "8080"),
            ("DIVBRIDGE_CACHE_CAPACITY", "lots"),
            ("DIVBRIDGE_CACHE_TTL_SECS", "30"),
            ("DIVBRIDGE_CORS_ORIGINS", "https://a.example, ,https://b.example"),
            ("DIVBRIDGE_RATE_LIMIT", "off"),
            ("DIVBRIDGE_LOG_FORMAT", "pretty"),
            ("DIVBRIDGE_CONFIG_DIR", "/var/lib/divbridge"),
        ]);
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.cache_capacity, 512);
        assert_eq!(settings.cache_ttl, Duration::from_secs(30));
        assert_eq!(
            settings.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(!settings.rate_limit);
        assert_eq!(settings.log_format, LogFormat::Pretty);
        assert_eq!(settings.config_dir, PathBuf::from("/var/lib/divbridge"));
    }
}
