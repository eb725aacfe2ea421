//! Runtime configuration.
//!
//! Read from `<data_dir>/config.json`. Every field is optional in the file;
//! missing fields take their defaults. The API key never touches disk and
//! comes from `GEMINI_API_KEY` or `API_KEY`.

use crate::constants::{DEFAULT_API_BASE_URL, DEFAULT_DAILY_FREE_LIMIT, DEFAULT_EDIT_COST_MULTIPLIER};
use crate::error::{AtomError, Result};
use crate::pricing::{CostModel, CostTable};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

pub const CONFIG_FILE: &str = "config.json";
pub const API_KEY_ENVS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Free renders per 24h window
    pub daily_free_limit: u32,
    pub cost_table: CostTable,
    pub edit_cost_multiplier: f64,
    pub api_base_url: String,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            daily_free_limit: DEFAULT_DAILY_FREE_LIMIT,
            cost_table: CostTable::default(),
            edit_cost_multiplier: DEFAULT_EDIT_COST_MULTIPLIER,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: None,
        }
    }
}

impl Config {
    /// Load `<data_dir>/config.json`, falling back to defaults when the file
    /// is missing or unreadable
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read config, using defaults");
                return Self::default();
            }
        };

        match serde_json::from_str::<Config>(&content) {
            Ok(config) => config.sanitized(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "config malformed, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, data_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(data_dir).map_err(|source| AtomError::DirectoryAccess {
            path: data_dir.to_path_buf(),
            source,
        })?;
        let path = data_dir.join(CONFIG_FILE);
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content).map_err(|source| AtomError::FileWrite { path, source })
    }

    /// Pick up the API key from the environment
    pub fn with_env_api_key(mut self) -> Self {
        self.api_key = API_KEY_ENVS
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|key| !key.trim().is_empty());
        self
    }

    pub fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or(AtomError::MissingApiKey)
    }

    pub fn cost_model(&self) -> CostModel {
        CostModel::new(self.cost_table.clone(), self.edit_cost_multiplier)
    }

    // Negative or non-finite multipliers would break the non-negative cost invariant
    fn sanitized(mut self) -> Self {
        if !self.edit_cost_multiplier.is_finite() || self.edit_cost_multiplier < 0.0 {
            warn!(value = self.edit_cost_multiplier, "invalid edit cost multiplier, using default");
            self.edit_cost_multiplier = DEFAULT_EDIT_COST_MULTIPLIER;
        }
        let defaults = CostTable::default();
        let table = &mut self.cost_table;
        for (price, fallback) in [
            (&mut table.mini_hd, defaults.mini_hd),
            (&mut table.full_hd, defaults.full_hd),
            (&mut table.one_k, defaults.one_k),
            (&mut table.two_k, defaults.two_k),
            (&mut table.four_k, defaults.four_k),
        ] {
            if !price.is_finite() || *price < 0.0 {
                *price = fallback;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ModelTier, OperationKind, SizeTier};
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path());
        assert_eq!(config, Config::default());
        assert_eq!(config.daily_free_limit, 5);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_partial_config_overrides_fields() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"dailyFreeLimit": 10, "costTable": {"fourK": 9.0}}"#,
        )
        .unwrap();

        let config = Config::load(dir.path());
        assert_eq!(config.daily_free_limit, 10);
        assert_eq!(config.cost_table.four_k, 9.0);
        assert_eq!(config.cost_table.full_hd, 1.45);
        assert_eq!(config.edit_cost_multiplier, 0.5);
    }

    #[test]
    fn test_malformed_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "dailyFreeLimit = 10").unwrap();
        assert_eq!(Config::load(dir.path()), Config::default());
    }

    #[test]
    fn test_negative_prices_are_replaced() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"editCostMultiplier": -1, "costTable": {"twoK": -4.25}}"#,
        )
        .unwrap();

        let config = Config::load(dir.path());
        assert_eq!(config.edit_cost_multiplier, 0.5);
        assert_eq!(config.cost_table.two_k, 4.25);
    }

    #[test]
    fn test_save_round_trip_skips_api_key() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            daily_free_limit: 3,
            api_key: Some("secret".into()),
            ..Config::default()
        };
        config.save(&dir.path().join("nested")).unwrap();

        let written = std::fs::read_to_string(dir.path().join("nested").join(CONFIG_FILE)).unwrap();
        assert!(!written.contains("secret"));

        let loaded = Config::load(&dir.path().join("nested"));
        assert_eq!(loaded.daily_free_limit, 3);
        assert_eq!(loaded.api_key, None);
    }

    #[test]
    fn test_cost_model_and_missing_key() {
        let config = Config {
            edit_cost_multiplier: 0.25,
            ..Config::default()
        };
        let model = config.cost_model();
        let cost = model.cost(SizeTier::FourK, ModelTier::Pro, OperationKind::Edit);
        assert!((cost.value() - 2.125).abs() < 1e-9);
        assert!(matches!(config.api_key(), Err(AtomError::MissingApiKey)));
    }
}
