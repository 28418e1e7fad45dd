// ============================================================================
// Configuration
// ============================================================================
// Lit la configuration depuis les variables d'environnement (et un .env
// éventuel chargé par main), avec des valeurs par défaut raisonnables.
//
// Variables :
// - TOKENFOLIO_API_URL        : adresse de base de l'API (CoinGecko v3)
// - TOKENFOLIO_DATA_DIR       : répertoire du stockage local
// - TOKENFOLIO_LOG_DIR        : répertoire des logs
// - TOKENFOLIO_DEFAULT_COUNT  : taille du snapshot initial
// ============================================================================

use std::env;
use std::path::PathBuf;

use tracing::warn;

use crate::api::DEFAULT_BASE_URL;
use crate::store::DEFAULT_MARKET_COUNT;

const APP_DIR: &str = "tokenfolio";

/// Configuration de l'application
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_base_url: String,
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub default_market_count: usize,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            log_dir: data_dir.join("logs"),
            data_dir,
            default_market_count: DEFAULT_MARKET_COUNT,
        }
    }
}

impl Config {
    /// Crée la configuration depuis les variables d'environnement
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Variante testable : `lookup` remplace env::var
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let data_dir = lookup("TOKENFOLIO_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let log_dir = lookup("TOKENFOLIO_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("logs"));

        let default_market_count = match lookup("TOKENFOLIO_DEFAULT_COUNT") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    warn!(value = %raw, "Invalid TOKENFOLIO_DEFAULT_COUNT, using default");
                    defaults.default_market_count
                }
            },
            None => defaults.default_market_count,
        };

        Self {
            api_base_url: lookup("TOKENFOLIO_API_URL").unwrap_or(defaults.api_base_url),
            data_dir,
            log_dir,
            default_market_count,
        }
    }
}

/// ~/.local/share/tokenfolio sur Linux, "./tokenfolio" en dernier recours
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.api_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.default_market_count, DEFAULT_MARKET_COUNT);
        assert!(config.data_dir.ends_with(APP_DIR));
        assert_eq!(config.log_dir, config.data_dir.join("logs"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("TOKENFOLIO_API_URL", "http://localhost:9000"),
            ("TOKENFOLIO_DATA_DIR", "/tmp/tf"),
            ("TOKENFOLIO_DEFAULT_COUNT", "25"),
        ]));

        assert_eq!(config.api_base_url, "http://localhost:9000");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/tf"));
        assert_eq!(config.log_dir, PathBuf::from("/tmp/tf/logs"));
        assert_eq!(config.default_market_count, 25);
    }

    #[test]
    fn test_invalid_count_falls_back() {
        let config = Config::from_lookup(lookup_from(&[("TOKENFOLIO_DEFAULT_COUNT", "zero")]));
        assert_eq!(config.default_market_count, DEFAULT_MARKET_COUNT);

        let config = Config::from_lookup(lookup_from(&[("TOKENFOLIO_DEFAULT_COUNT", "0")]));
        assert_eq!(config.default_market_count, DEFAULT_MARKET_COUNT);
    }
}
