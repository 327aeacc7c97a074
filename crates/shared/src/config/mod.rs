// Configuration module
// Reads INI-style configuration files with environment variable overrides
//
// Keys inside a `[Section]` are addressed as `Section.Key`; keys before the
// first header are addressed by their bare name. An environment variable
// named `<prefix><Section>_<Key>` wins over the file.

use configparser::ini::Ini;
use std::collections::HashMap;
use std::path::Path;

/// Name configparser gives to keys that appear before any section header
const DEFAULT_SECTION: &str = "default";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration file {0} not found")]
    NotFound(String),
    #[error("could not parse configuration file {file}: {reason}")]
    Parse { file: String, reason: String },
}

/// Configuration file parser
/// Supports INI-style files with environment variable override
#[derive(Debug, Clone)]
pub struct Config {
    values: HashMap<String, String>,
    filename: String,
    env_prefix: String,
}

impl Config {
    pub fn new() -> Self {
        Config {
            values: HashMap::new(),
            filename: String::new(),
            env_prefix: String::new(),
        }
    }

    /// Configuration without a backing file; only environment overrides apply
    pub fn from_env(env_prefix: &str) -> Self {
        Config {
            values: HashMap::new(),
            filename: String::new(),
            env_prefix: env_prefix.to_string(),
        }
    }

    /// Load configuration from a file
    /// env_prefix is used to check environment variables (e.g., "Navgraph_")
    pub fn set_source(&mut self, filename: &str, env_prefix: &str) -> Result<(), ConfigError> {
        self.filename = filename.to_string();
        self.env_prefix = env_prefix.to_string();
        self.reload()
    }

    /// Parse configuration text directly (used for embedded defaults and tests)
    pub fn set_source_str(&mut self, content: &str, env_prefix: &str) -> Result<(), ConfigError> {
        self.filename = String::from("<memory>");
        self.env_prefix = env_prefix.to_string();
        let mut ini = Ini::new_cs();
        let sections = ini.read(content.to_string()).map_err(|reason| ConfigError::Parse {
            file: self.filename.clone(),
            reason,
        })?;
        self.values = flatten(sections);
        Ok(())
    }

    /// Reload the configuration file
    pub fn reload(&mut self) -> Result<(), ConfigError> {
        self.values.clear();

        let path = Path::new(&self.filename);
        if !path.exists() {
            return Err(ConfigError::NotFound(self.filename.clone()));
        }

        let mut ini = Ini::new_cs();
        let sections = ini.load(path).map_err(|reason| ConfigError::Parse {
            file: self.filename.clone(),
            reason,
        })?;
        self.values = flatten(sections);

        tracing::debug!(
            "Loaded {} configuration values from {}",
            self.values.len(),
            self.filename
        );
        Ok(())
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Check if a key is set
    pub fn is_set(&self, key: &str) -> bool {
        self.get_env_or_config(key).is_some()
    }

    /// Get a string value with a default
    pub fn get_string_default(&self, key: &str, default: &str) -> String {
        self.get_env_or_config(key)
            .unwrap_or_else(|| default.to_string())
    }

    /// Get a string value (empty string default)
    pub fn get_string(&self, key: &str) -> String {
        self.get_string_default(key, "")
    }

    /// Get a boolean value with a default
    pub fn get_bool_default(&self, key: &str, default: bool) -> bool {
        match self.get_env_or_config(key) {
            Some(val) => {
                let lower = val.to_lowercase();
                matches!(lower.as_str(), "1" | "true" | "yes")
            }
            None => default,
        }
    }

    /// Get an integer value with a default
    pub fn get_int_default(&self, key: &str, default: i32) -> i32 {
        match self.get_env_or_config(key) {
            Some(val) => val.parse().unwrap_or(default),
            None => default,
        }
    }

    /// Get a float value with a default
    pub fn get_float_default(&self, key: &str, default: f32) -> f32 {
        match self.get_env_or_config(key) {
            Some(val) => val.parse().unwrap_or(default),
            None => default,
        }
    }

    /// Try environment variable first, then config file
    fn get_env_or_config(&self, key: &str) -> Option<String> {
        // Convert key to env var name: replace '.' with '_', add prefix
        if !self.env_prefix.is_empty() {
            let env_key = format!("{}{}", self.env_prefix, key.replace('.', "_"));
            if let Ok(val) = std::env::var(&env_key) {
                return Some(val);
            }
        }

        self.values.get(key).cloned()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapse configparser's section map into `Section.Key` entries
fn flatten(sections: HashMap<String, HashMap<String, Option<String>>>) -> HashMap<String, String> {
    let mut values = HashMap::new();
    for (section, entries) in sections {
        for (key, value) in entries {
            let Some(mut value) = value else { continue };

            // Strip quotes
            if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
                value = value[1..value.len() - 1].to_string();
            }

            let full_key = if section == DEFAULT_SECTION {
                key
            } else {
                format!("{}.{}", section, key)
            };
            values.insert(full_key, value);
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.get_int_default("nonexistent", 42), 42);
        assert_eq!(config.get_string_default("nonexistent", "hello"), "hello");
        assert!(config.get_bool_default("nonexistent", true));
    }

    #[test]
    fn test_sections_are_flattened() {
        let mut config = Config::new();
        config
            .set_source_str(
                "LogsDir = \"logs\"\n[Navigation]\nStepHeight = 20.5\nSimplifyPaths = no\n",
                "",
            )
            .unwrap();
        assert_eq!(config.get_string("LogsDir"), "logs");
        assert_eq!(config.get_float_default("Navigation.StepHeight", 0.0), 20.5);
        assert!(!config.get_bool_default("Navigation.SimplifyPaths", true));
    }

    #[test]
    fn test_env_override() {
        let mut config = Config::new();
        config
            .set_source_str("[Navigation]\nJumpHeight = 72\n", "NavgraphConfigTest_")
            .unwrap();
        // SAFETY: the variable name is unique to this test
        unsafe { std::env::set_var("NavgraphConfigTest_Navigation_JumpHeight", "60") };
        assert_eq!(config.get_int_default("Navigation.JumpHeight", 0), 60);
        unsafe { std::env::remove_var("NavgraphConfigTest_Navigation_JumpHeight") };
        assert_eq!(config.get_int_default("Navigation.JumpHeight", 0), 72);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("navgraph.conf");
        std::fs::write(&path, "[Navigation]\nMaxFallDistance = 300\n").unwrap();

        let mut config = Config::new();
        config.set_source(path.to_str().unwrap(), "").unwrap();
        assert_eq!(config.get_float_default("Navigation.MaxFallDistance", 0.0), 300.0);
    }

    #[test]
    fn test_missing_file() {
        let mut config = Config::new();
        let err = config.set_source("/definitely/not/here.conf", "").unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
