//! Configuration loading and backend factory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use quizgrade_core::grading::GradingPolicy;
use quizgrade_core::traits::QuizBackend;

use crate::http::{HttpBackend, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::mock::MockBackend;
use crate::retry::RetryPolicy;

/// Local config file name, searched in the working directory.
pub const CONFIG_FILE_NAME: &str = "quizgrade.toml";

/// Which backend to talk to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    Http {
        #[serde(default = "default_base_url")]
        base_url: String,
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
    },
    Mock,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Http {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Top-level quizgrade configuration.
///
/// Note: Custom Debug impl masks the access token.
#[derive(Clone, Serialize, Deserialize)]
pub struct QuizgradeConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    /// Access token from `quizgrade login`.
    #[serde(default)]
    pub token: Option<String>,
    /// Username the token belongs to.
    #[serde(default)]
    pub username: Option<String>,
    /// Retries for idempotent reads after a transient failure.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Initial delay between retries in milliseconds; doubles each retry.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Output directory for grade reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Where the daily-quiz gate is persisted between runs.
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
    #[serde(default)]
    pub grading: GradingPolicy,
}

impl std::fmt::Debug for QuizgradeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizgradeConfig")
            .field("backend", &self.backend)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("username", &self.username)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("output_dir", &self.output_dir)
            .field("state_file", &self.state_file)
            .field("grading", &self.grading)
            .finish()
    }
}

fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    500
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./quizgrade-results")
}
fn default_state_file() -> PathBuf {
    PathBuf::from(".quizgrade-state.json")
}

impl Default for QuizgradeConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            token: None,
            username: None,
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            output_dir: default_output_dir(),
            state_file: default_state_file(),
            grading: GradingPolicy::default(),
        }
    }
}

impl QuizgradeConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_delay_ms),
            ..RetryPolicy::default()
        }
    }

    /// The configured token, or an error telling the user to log in.
    pub fn require_token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .filter(|t| !t.is_empty())
            .context("not logged in; run `quizgrade login` or set QUIZGRADE_TOKEN")
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
/// Substituted values are not scanned again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            result.push_str(&rest[start..]);
            return result;
        };
        result.push_str(&std::env::var(&after[..end]).unwrap_or_default());
        rest = &after[end + 1..];
    }
    result.push_str(rest);
    result
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizgrade.toml` in the current directory
/// 2. `~/.config/quizgrade/config.toml`
///
/// Environment variable overrides: `QUIZGRADE_API_URL`, `QUIZGRADE_TOKEN`,
/// `QUIZGRADE_USE_MOCK`.
pub fn load_config() -> Result<QuizgradeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizgradeConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => default_config_path(),
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            tracing::debug!("loading config from {}", path.display());
            toml::from_str::<QuizgradeConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => QuizgradeConfig::default(),
    };

    apply_env_overrides(&mut config);
    resolve_config(&mut config);
    Ok(config)
}

/// The config file that [`load_config`] would read, if any exists.
pub fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }
    let global = dirs_path()?.join("config.toml");
    global.exists().then_some(global)
}

fn apply_env_overrides(config: &mut QuizgradeConfig) {
    if let Ok(url) = std::env::var("QUIZGRADE_API_URL") {
        let timeout_secs = match &config.backend {
            BackendConfig::Http { timeout_secs, .. } => *timeout_secs,
            BackendConfig::Mock => default_timeout(),
        };
        config.backend = BackendConfig::Http {
            base_url: url,
            timeout_secs,
        };
    }

    if std::env::var("QUIZGRADE_USE_MOCK").is_ok_and(|v| is_truthy(&v)) {
        config.backend = BackendConfig::Mock;
    }

    if let Ok(token) = std::env::var("QUIZGRADE_TOKEN") {
        config.token = Some(token);
    }
}

fn resolve_config(config: &mut QuizgradeConfig) {
    if let BackendConfig::Http { base_url, .. } = &mut config.backend {
        *base_url = resolve_env_vars(base_url);
    }
    config.token = config
        .token
        .as_deref()
        .map(resolve_env_vars)
        .filter(|t| !t.is_empty());
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizgrade"))
}

/// Store a login token in a config file, keeping the rest of the file intact.
pub fn save_token(path: &Path, username: &str, token: &str) -> Result<()> {
    let content = if path.exists() {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?
    } else {
        String::new()
    };

    let mut doc = content
        .parse::<toml_edit::DocumentMut>()
        .with_context(|| format!("failed to parse config: {}", path.display()))?;
    doc["username"] = toml_edit::value(username);
    doc["token"] = toml_edit::value(token);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, doc.to_string())
        .with_context(|| format!("failed to write config: {}", path.display()))?;
    Ok(())
}

/// Create a backend instance from the configuration.
pub fn create_backend(config: &QuizgradeConfig) -> Result<Box<dyn QuizBackend>> {
    match &config.backend {
        BackendConfig::Http {
            base_url,
            timeout_secs,
        } => Ok(Box::new(HttpBackend::new(
            base_url,
            *timeout_secs,
            config.retry_policy(),
        )?)),
        BackendConfig::Mock => Ok(Box::new(MockBackend::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_QUIZGRADE_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_QUIZGRADE_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_QUIZGRADE_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        std::env::remove_var("_QUIZGRADE_TEST_VAR");
    }

    #[test]
    fn resolve_env_vars_unterminated() {
        assert_eq!(resolve_env_vars("${OPEN"), "${OPEN");
    }

    #[test]
    fn resolve_env_vars_does_not_expand_values() {
        std::env::set_var("_QUIZGRADE_SELF_REF", "a${_QUIZGRADE_SELF_REF}b");
        assert_eq!(
            resolve_env_vars("x${_QUIZGRADE_SELF_REF}y"),
            "xa${_QUIZGRADE_SELF_REF}by"
        );
        std::env::remove_var("_QUIZGRADE_SELF_REF");
        assert_eq!(resolve_env_vars("${_QUIZGRADE_UNSET_VAR}!"), "!");
        assert_eq!(resolve_env_vars("ok ${OPEN"), "ok ${OPEN");
    }

    #[test]
    fn default_config() {
        let config = QuizgradeConfig::default();
        assert_eq!(
            config.backend,
            BackendConfig::Http {
                base_url: "http://localhost:8000".into(),
                timeout_secs: 30
            }
        );
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.grading.similarity_threshold, 85.0);
        assert!(config.require_token().is_err());
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
token = "abc"
max_retries = 1
output_dir = "out"

[backend]
type = "http"
base_url = "https://quiz.example.com"

[grading]
similarity_threshold = 90.0
excellent_threshold = 85
good_threshold = 50
"#;
        let config: QuizgradeConfig = toml::from_str(toml_str).unwrap();
        assert!(matches!(
            &config.backend,
            BackendConfig::Http { base_url, timeout_secs: 30 } if base_url == "https://quiz.example.com"
        ));
        assert_eq!(config.grading.similarity_threshold, 90.0);
        assert_eq!(config.grading.good_threshold, 50);
        assert_eq!(config.require_token().unwrap(), "abc");
        assert_eq!(config.retry_policy().max_retries, 1);
    }

    #[test]
    fn parse_mock_backend() {
        let config: QuizgradeConfig = toml::from_str("[backend]\ntype = \"mock\"\n").unwrap();
        assert_eq!(config.backend, BackendConfig::Mock);
        let backend = create_backend(&config).unwrap();
        assert_eq!(backend.name(), "mock");
    }

    #[test]
    fn debug_masks_token() {
        let config = QuizgradeConfig {
            token: Some("super-secret-jwt".into()),
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret-jwt"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn load_explicit_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config_from(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn save_token_preserves_existing_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quizgrade.toml");
        std::fs::write(
            &path,
            "# my settings\nmax_retries = 5\n\n[backend]\ntype = \"mock\"\n",
        )
        .unwrap();

        save_token(&path, "ayse", "tok-123").unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("# my settings"));
        let config: QuizgradeConfig = toml::from_str(&written).unwrap();
        assert_eq!(config.token.as_deref(), Some("tok-123"));
        assert_eq!(config.username.as_deref(), Some("ayse"));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.backend, BackendConfig::Mock);
    }

    #[test]
    fn save_token_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        save_token(&path, "ayse", "tok").unwrap();
        let config: QuizgradeConfig =
            toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(config.token.as_deref(), Some("tok"));
    }
}
