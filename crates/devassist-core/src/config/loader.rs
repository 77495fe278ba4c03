//! Configuration loader with environment variable expansion
//!
//! Loads configuration from `.devassist.toml` in the working directory or the
//! user config directory, then applies environment overrides.

use super::types::DevAssistConfig;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Configuration loading error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

/// Load configuration from various sources
///
/// Priority order:
/// 1. Project-level `.devassist.toml`
/// 2. User-level `~/.config/devassist/config.toml`
/// 3. Default configuration
///
/// Environment overrides are applied on top of whichever source wins.
pub fn load_config(project_dir: &Path) -> Result<DevAssistConfig, ConfigError> {
    let project_config = project_dir.join(".devassist.toml");
    if project_config.exists() {
        return load_from_file(&project_config);
    }

    if let Some(user_config) = get_user_config_path() {
        if user_config.exists() {
            return load_from_file(&user_config);
        }
    }

    apply_env_overrides(DevAssistConfig::default(), env_lookup)
}

/// Get user config directory path
fn get_user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("devassist").join("config.toml"))
}

/// Load configuration from a specific file
pub fn load_from_file(path: &Path) -> Result<DevAssistConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config: DevAssistConfig = toml::from_str(&content)?;

    expand_env_vars(&mut config, env_lookup);

    apply_env_overrides(config, env_lookup)
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn env_regex() -> Option<&'static Regex> {
    static ENV_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    ENV_REGEX
        .get_or_init(|| Regex::new(r"\$\{([^}]+)\}").ok())
        .as_ref()
}

/// Expand ${VAR} patterns in string values
///
/// Secrets that still reference an unset variable are treated as not set.
fn expand_env_vars<F>(config: &mut DevAssistConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    config.llm.api_key = expand_secret(config.llm.api_key.as_deref(), &lookup);
    config.llm.base_url = expand_string(&config.llm.base_url, &lookup);

    config.server.auth_token = expand_secret(config.server.auth_token.as_deref(), &lookup);

    if let Some(ref repo) = config.repo_path {
        let expanded = expand_string(&repo.to_string_lossy(), &lookup);
        config.repo_path = Some(PathBuf::from(expanded));
    }
}

/// Expand an optional secret, dropping it if a variable was missing
fn expand_secret<F>(value: Option<&str>, lookup: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let expanded = expand_string(value?, lookup);
    let unresolved = env_regex().is_some_and(|re| re.is_match(&expanded));
    (!unresolved && !expanded.is_empty()).then_some(expanded)
}

/// Expand environment variables in a single string
fn expand_string<F>(s: &str, lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let Some(re) = env_regex() else {
        return s.to_string();
    };
    re.replace_all(s, |caps: &regex::Captures| {
        let var_name = &caps[1];
        lookup(var_name).unwrap_or_else(|| format!("${{{}}}", var_name))
    })
    .to_string()
}

/// Apply environment variable overrides for common settings
///
/// Supports direct environment variables:
/// - ANTHROPIC_API_KEY -> llm.api_key
/// - REPO_PATH -> repo_path
/// - DEV_AUTH_TOKEN -> server.auth_token
/// - PORT -> server.port
/// - DEVASSIST_MODEL -> llm.model
fn apply_env_overrides<F>(
    mut config: DevAssistConfig,
    lookup: F,
) -> Result<DevAssistConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if let Some(key) = non_empty("ANTHROPIC_API_KEY") {
        config.llm.api_key = Some(key);
    }

    if let Some(path) = non_empty("REPO_PATH") {
        config.repo_path = Some(PathBuf::from(path));
    }

    if let Some(token) = non_empty("DEV_AUTH_TOKEN") {
        config.server.auth_token = Some(token);
    }

    if let Some(port) = non_empty("PORT") {
        config.server.port = port.parse().map_err(|_| ConfigError::InvalidValue {
            name: "PORT".to_string(),
            value: port.clone(),
        })?;
    }

    if let Some(model) = non_empty("DEVASSIST_MODEL") {
        config.llm.model = model;
    }

    Ok(config)
}

/// Create a sample configuration file content
pub fn sample_config() -> &'static str {
    r#"# devassist configuration
# Place this file in the directory you start devassist from as .devassist.toml
# or in ~/.config/devassist/config.toml for global settings

# Repository the assistant works on (defaults to the working directory)
# repo_path = "/srv/checkout"

[server]
port = 8080
# Requests must send "Authorization: Bearer <token>" when this is set
auth_token = "${DEV_AUTH_TOKEN}"

[llm]
api_key = "${ANTHROPIC_API_KEY}"
base_url = "https://api.anthropic.com"
model = "claude-sonnet-4-20250514"
max_tokens = 4096
# Request timeout in seconds
timeout = 120

[orchestrator]
# Model calls allowed per conversation turn
max_iterations = 25
# Wall-clock budget per conversation turn
turn_budget_secs = 600

[build]
timeout_ms = 120000
tail_lines = 40

[build.projects.ethos]
path = "."
command = ["npm", "run", "build"]

[build.projects.guildry]
path = "guildry/apps/web"
command = ["npm", "run", "build"]
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_expand_env_var() {
        let lookup = lookup_from(&[("TEST_VAR", "test_value")]);
        let result = expand_string("prefix_${TEST_VAR}_suffix", &lookup);
        assert_eq!(result, "prefix_test_value_suffix");
    }

    #[test]
    fn test_missing_env_var() {
        let lookup = lookup_from(&[]);
        let result = expand_string("${NONEXISTENT_VAR}", &lookup);
        assert_eq!(result, "${NONEXISTENT_VAR}");
    }

    #[test]
    fn test_env_overrides() {
        let lookup = lookup_from(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("REPO_PATH", "/srv/repo"),
            ("DEV_AUTH_TOKEN", "letmein"),
            ("PORT", "9000"),
        ]);
        let config = apply_env_overrides(DevAssistConfig::default(), lookup).unwrap();

        assert_eq!(config.api_key(), Some("sk-test"));
        assert_eq!(config.repo_path, Some(PathBuf::from("/srv/repo")));
        assert_eq!(config.server.auth_token.as_deref(), Some("letmein"));
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let lookup = lookup_from(&[("DEV_AUTH_TOKEN", "")]);
        let config = apply_env_overrides(DevAssistConfig::default(), lookup).unwrap();
        assert!(config.server.auth_token.is_none());
    }

    #[test]
    fn test_invalid_port() {
        let lookup = lookup_from(&[("PORT", "eighty")]);
        let err = apply_env_overrides(DevAssistConfig::default(), lookup).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_sample_config_parses() {
        let config: DevAssistConfig = toml::from_str(sample_config()).unwrap();
        assert_eq!(config.build.projects.len(), 2);
        assert_eq!(config.orchestrator.turn_budget_secs, 600);
    }

    #[test]
    fn test_expand_in_file_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".devassist.toml");
        std::fs::write(&path, "[llm]\napi_key = \"${DEVASSIST_TEST_ONLY_KEY}\"\n").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut config: DevAssistConfig = toml::from_str(&content).unwrap();
        expand_env_vars(&mut config, lookup_from(&[("DEVASSIST_TEST_ONLY_KEY", "abc")]));

        assert_eq!(config.llm.api_key.as_deref(), Some("abc"));
    }

    #[test]
    fn test_sample_config_without_env_has_no_secrets() {
        let mut config: DevAssistConfig = toml::from_str(sample_config()).unwrap();
        expand_env_vars(&mut config, lookup_from(&[]));
        let config = apply_env_overrides(config, lookup_from(&[])).unwrap();

        assert_eq!(config.server.auth_token, None);
        assert_eq!(config.llm.api_key, None);
        assert_eq!(config.llm.base_url, "https://api.anthropic.com");
    }

    #[test]
    fn test_partially_expanded_secret_is_unset() {
        let lookup = lookup_from(&[("USER_PART", "abc")]);
        assert_eq!(expand_secret(Some("${USER_PART}-${MISSING}"), &lookup), None);
        assert_eq!(
            expand_secret(Some("${USER_PART}-fixed"), &lookup).as_deref(),
            Some("abc-fixed")
        );
        assert_eq!(expand_secret(None, &lookup), None);
    }
}
