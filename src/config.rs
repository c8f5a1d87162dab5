// ⚙️ Configuration - Explicit, constructed from the environment once
// Replaces hidden singletons: the config value is built and passed around

use crate::gazetteer::REGION_CODE_BAHIA;
use crate::matching::DEFAULT_FUZZY_THRESHOLD;
use crate::normalize::RegionFilter;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AtlasConfig {
    /// Municipality gazetteer JSON
    pub gazetteer_path: PathBuf,

    /// Local spreadsheet export for the brokers sheet
    pub brokers_path: PathBuf,

    /// Local spreadsheet export for the agencies sheet
    pub agencies_path: PathBuf,

    /// SQLite users database
    pub users_db_path: PathBuf,

    /// Target region code in the gazetteer (IBGE UF code)
    pub region_code: u32,

    /// Accepted spellings for the region column in the sources
    pub region: RegionFilter,

    /// Minimum fuzzy-match score (0-100)
    pub fuzzy_threshold: f64,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        AtlasConfig {
            gazetteer_path: PathBuf::from("dados/municipios.json"),
            brokers_path: PathBuf::from("dados/corretores.csv"),
            agencies_path: PathBuf::from("dados/imobiliarias.csv"),
            users_db_path: PathBuf::from("data/users.db"),
            region_code: REGION_CODE_BAHIA,
            region: RegionFilter::bahia(),
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
        }
    }
}

impl AtlasConfig {
    /// Read configuration from ATLAS_* environment variables, falling
    /// back to the defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = AtlasConfig::default();

        AtlasConfig {
            gazetteer_path: env_path("ATLAS_GAZETTEER", defaults.gazetteer_path),
            brokers_path: env_path("ATLAS_BROKERS", defaults.brokers_path),
            agencies_path: env_path("ATLAS_AGENCIES", defaults.agencies_path),
            users_db_path: env_path("ATLAS_USERS_DB", defaults.users_db_path),
            region_code: env_parsed("ATLAS_REGION_CODE", defaults.region_code),
            region: defaults.region,
            fuzzy_threshold: env_parsed("ATLAS_FUZZY_THRESHOLD", defaults.fuzzy_threshold),
        }
    }
}

fn env_path(key: &str, default: PathBuf) -> PathBuf {
    env::var(key).map(PathBuf::from).unwrap_or(default)
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AtlasConfig::default();

        assert_eq!(config.region_code, REGION_CODE_BAHIA);
        assert_eq!(config.fuzzy_threshold, DEFAULT_FUZZY_THRESHOLD);
        assert_eq!(config.gazetteer_path, PathBuf::from("dados/municipios.json"));
        assert!(config.region.accepts("BA"));
    }

    #[test]
    fn test_env_parsed_falls_back_on_garbage() {
        // Unset and unparseable both fall back
        assert_eq!(env_parsed("ATLAS_TEST_UNSET_VARIABLE", 29u32), 29);
    }
}
