// Configuration loading and parsing (overunder.toml, credentials.toml).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub autosave: AutosaveSection,
    pub countdown: CountdownSection,
    pub search: SearchSection,
    pub data_paths: DataPaths,
    pub credentials: CredentialsConfig,
    /// Resolved path of the local draft database.
    pub db_path: String,
}

// ---------------------------------------------------------------------------
// overunder.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the whole overunder.toml file.
#[derive(Debug, Clone, Deserialize)]
struct SettingsFile {
    server: ServerConfig,
    autosave: AutosaveSection,
    #[serde(default)]
    countdown: CountdownSection,
    #[serde(default)]
    search: SearchSection,
    #[serde(default)]
    storage: StorageSection,
    data_paths: DataPaths,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub base_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct AutosaveSection {
    pub save_interval_ms: u64,
    pub debounce_delay_ms: u64,
    pub endpoint_template: String,
    #[serde(default = "default_freshness_window_ms")]
    pub freshness_window_ms: u64,
}

fn default_freshness_window_ms() -> u64 {
    24 * 60 * 60 * 1000
}

#[derive(Debug, Clone, Deserialize)]
pub struct CountdownSection {
    pub format: String,
    pub show_seconds: bool,
    pub update_interval_ms: u64,
}

impl Default for CountdownSection {
    fn default() -> Self {
        CountdownSection {
            format: "compact".into(),
            show_seconds: true,
            update_interval_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchSection {
    pub debounce_delay_ms: u64,
}

impl Default for SearchSection {
    fn default() -> Self {
        SearchSection {
            debounce_delay_ms: 300,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct StorageSection {
    db_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub entry_form: String,
    pub contests: String,
}

// ---------------------------------------------------------------------------
// credentials.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CredentialsConfig {
    /// Anti-forgery token sent as `X-CSRFToken` on every write.
    pub csrf_token: Option<String>,
    /// Session cookie forwarded verbatim, if the server needs one.
    pub session_cookie: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/overunder.toml` and
/// (optionally) `config/credentials.toml`, relative to `base_dir`.
///
/// Does not copy defaults; `load_config()` does that first.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    let settings_path = config_dir.join("overunder.toml");
    let settings_text = read_file(&settings_path)?;
    let settings: SettingsFile =
        toml::from_str(&settings_text).map_err(|e| ConfigError::ParseError {
            path: settings_path.clone(),
            source: e,
        })?;

    let credentials_path = config_dir.join("credentials.toml");
    let credentials = if credentials_path.exists() {
        let cred_text = read_file(&credentials_path)?;
        toml::from_str(&cred_text).map_err(|e| ConfigError::ParseError {
            path: credentials_path.clone(),
            source: e,
        })?
    } else {
        CredentialsConfig::default()
    };

    let db_path = match settings.storage.db_path {
        Some(path) => path,
        None => default_db_path()?,
    };

    let config = Config {
        server: settings.server,
        autosave: settings.autosave,
        countdown: settings.countdown,
        search: settings.search,
        data_paths: settings.data_paths,
        credentials,
        db_path,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }

        let target = config_dir.join(file_name);
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Load config relative to the current working directory, copying any
/// missing default files first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Derived settings
// ---------------------------------------------------------------------------

impl AutosaveSection {
    pub fn save_interval(&self) -> Duration {
        Duration::from_millis(self.save_interval_ms)
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_delay_ms)
    }

    pub fn freshness_window(&self) -> Duration {
        Duration::from_millis(self.freshness_window_ms)
    }
}

impl SearchSection {
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_delay_ms)
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

/// Draft database under the platform data directory.
fn default_db_path() -> Result<String, ConfigError> {
    let dirs = directories::ProjectDirs::from("", "", "overunder").ok_or_else(|| {
        ConfigError::ValidationError {
            field: "storage.db_path".into(),
            message: "no home directory found; set storage.db_path explicitly".into(),
        }
    })?;
    let data_dir = dirs.data_dir();
    std::fs::create_dir_all(data_dir).map_err(|e| ConfigError::ValidationError {
        field: "storage.db_path".into(),
        message: format!("failed to create {}: {e}", data_dir.display()),
    })?;
    Ok(data_dir.join("drafts.db").to_string_lossy().into_owned())
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.server.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "server.base_url".into(),
            message: "must not be empty".into(),
        });
    }

    let durations: &[(&str, u64)] = &[
        ("server.request_timeout_ms", config.server.request_timeout_ms),
        ("autosave.save_interval_ms", config.autosave.save_interval_ms),
        ("autosave.debounce_delay_ms", config.autosave.debounce_delay_ms),
        ("autosave.freshness_window_ms", config.autosave.freshness_window_ms),
        ("countdown.update_interval_ms", config.countdown.update_interval_ms),
    ];
    for (name, val) in durations {
        if *val == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be > 0".into(),
            });
        }
    }

    if !config.autosave.endpoint_template.contains("{contest_id}") {
        return Err(ConfigError::ValidationError {
            field: "autosave.endpoint_template".into(),
            message: format!(
                "must contain `{{contest_id}}`, got {:?}",
                config.autosave.endpoint_template
            ),
        });
    }

    if !matches!(config.countdown.format.as_str(), "compact" | "verbose") {
        return Err(ConfigError::ValidationError {
            field: "countdown.format".into(),
            message: format!("must be \"compact\" or \"verbose\", got {:?}", config.countdown.format),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
