//! Application configuration for channelkeys.
//!
//! Optional user config lives at `~/.channelkeys/channelkeys.toml`.
//! CLI flags (and their environment variables) override config file values,
//! which override defaults. The merged result is a [`RunConfig`], handed
//! explicitly to the pipeline.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ChannelKeysError, Result};
use crate::types::Identifier;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "channelkeys.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".channelkeys";

/// Environment variable naming the listing page URL.
pub const LISTING_URL_ENV: &str = "BASE_LISTING_URL";

/// Environment variable naming the detail page URL prefix.
pub const DETAIL_PREFIX_ENV: &str = "BASE_STREAM_URL";

/// Browser User-Agent sent with every request unless overridden.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

// ---------------------------------------------------------------------------
// Config structs (matching channelkeys.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Result file settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Listing page parsing.
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

/// `[http]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header value.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Timeout for the listing page request.
    #[serde(default = "default_listing_timeout")]
    pub listing_timeout_secs: u64,

    /// Timeout for each detail page request.
    #[serde(default = "default_detail_timeout")]
    pub detail_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            listing_timeout_secs: default_listing_timeout(),
            detail_timeout_secs: default_detail_timeout(),
        }
    }
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.into()
}
fn default_listing_timeout() -> u64 {
    15
}
fn default_detail_timeout() -> u64 {
    10
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Path of the JSON result store.
    #[serde(default = "default_output_path")]
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

fn default_output_path() -> String {
    "api_data.json".into()
}

/// `[discovery]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// CSS selector for the anchors that carry identifiers.
    #[serde(default = "default_selector")]
    pub selector: String,

    /// Regex applied to each anchor's `href`; capture group 1 is the identifier.
    #[serde(default = "default_id_pattern")]
    pub id_pattern: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            selector: default_selector(),
            id_pattern: default_id_pattern(),
        }
    }
}

fn default_selector() -> String {
    r#"div.channel a[href*="play.php?id="]"#.into()
}
fn default_id_pattern() -> String {
    "id=([a-fA-F0-9]+)".into()
}

// ---------------------------------------------------------------------------
// Run config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Values the CLI collected from flags or the environment. `None` means
/// "not given"; the config file or defaults fill the gap where allowed.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub listing_url: Option<String>,
    pub detail_prefix: Option<String>,
    pub output_path: Option<PathBuf>,
}

/// Runtime configuration for one scrape run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Listing page holding the identifier anchors.
    pub listing_url: Url,
    /// Prefix the identifier is appended to, forming the detail URL.
    pub detail_prefix: String,
    /// JSON result store location.
    pub output_path: PathBuf,
    /// User-Agent header value.
    pub user_agent: String,
    /// Listing request timeout in seconds.
    pub listing_timeout_secs: u64,
    /// Detail request timeout in seconds.
    pub detail_timeout_secs: u64,
    /// Anchor selector for discovery.
    pub selector: String,
    /// Identifier capture pattern for discovery.
    pub id_pattern: String,
}

impl RunConfig {
    /// Merge CLI/environment overrides onto the file config.
    ///
    /// Both URLs are required; a missing or empty value is a
    /// [`ChannelKeysError::Config`].
    pub fn resolve(app: &AppConfig, overrides: RunOverrides) -> Result<Self> {
        let listing = required(overrides.listing_url, LISTING_URL_ENV)?;
        let detail_prefix = required(overrides.detail_prefix, DETAIL_PREFIX_ENV)?;

        let listing_url = Url::parse(&listing).map_err(|e| {
            ChannelKeysError::config(format!("{LISTING_URL_ENV} is not a valid URL '{listing}': {e}"))
        })?;
        Url::parse(&detail_prefix).map_err(|e| {
            ChannelKeysError::config(format!(
                "{DETAIL_PREFIX_ENV} is not a valid URL prefix '{detail_prefix}': {e}"
            ))
        })?;

        Ok(Self {
            listing_url,
            detail_prefix,
            output_path: overrides
                .output_path
                .unwrap_or_else(|| PathBuf::from(&app.output.path)),
            user_agent: app.http.user_agent.clone(),
            listing_timeout_secs: app.http.listing_timeout_secs,
            detail_timeout_secs: app.http.detail_timeout_secs,
            selector: app.discovery.selector.clone(),
            id_pattern: app.discovery.id_pattern.clone(),
        })
    }

    /// Detail page URL for `id`: the prefix with the identifier appended verbatim.
    pub fn detail_url(&self, id: &Identifier) -> String {
        format!("{}{}", self.detail_prefix, id)
    }
}

fn required(value: Option<String>, env_name: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ChannelKeysError::config(format!(
            "{env_name} is not set. Pass it as a flag or set the {env_name} environment variable."
        ))),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.channelkeys/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ChannelKeysError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.channelkeys/channelkeys.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ChannelKeysError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ChannelKeysError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ChannelKeysError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ChannelKeysError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ChannelKeysError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides() -> RunOverrides {
        RunOverrides {
            listing_url: Some("https://tv.example.com/channels".into()),
            detail_prefix: Some("https://tv.example.com/play.php?id=".into()),
            output_path: None,
        }
    }

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("user_agent"));
        assert!(toml_str.contains("api_data.json"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.http.listing_timeout_secs, 15);
        assert_eq!(parsed.http.detail_timeout_secs, 10);
        assert_eq!(parsed.output.path, "api_data.json");
    }

    #[test]
    fn default_selector_is_scoped_to_channel_tiles() {
        let run = RunConfig::resolve(&AppConfig::default(), overrides()).unwrap();
        assert_eq!(run.selector, r#"div.channel a[href*="play.php?id="]"#);
        assert_eq!(run.id_pattern, "id=([a-fA-F0-9]+)");
    }

    #[test]
    fn partial_config_file_keeps_defaults() {
        let toml_str = r#"
[output]
path = "/tmp/streams.json"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.output.path, "/tmp/streams.json");
        assert_eq!(config.http.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.discovery.id_pattern, "id=([a-fA-F0-9]+)");
    }

    #[test]
    fn run_config_from_overrides() {
        let run = RunConfig::resolve(&AppConfig::default(), overrides()).unwrap();
        assert_eq!(run.listing_url.as_str(), "https://tv.example.com/channels");
        assert_eq!(run.output_path, PathBuf::from("api_data.json"));
        assert_eq!(run.detail_timeout_secs, 10);

        let id = Identifier::new("AB12").unwrap();
        assert_eq!(run.detail_url(&id), "https://tv.example.com/play.php?id=AB12");
    }

    #[test]
    fn output_override_beats_config_file() {
        let mut o = overrides();
        o.output_path = Some(PathBuf::from("out/custom.json"));
        let run = RunConfig::resolve(&AppConfig::default(), o).unwrap();
        assert_eq!(run.output_path, PathBuf::from("out/custom.json"));
    }

    #[test]
    fn missing_listing_url_is_config_error() {
        let mut o = overrides();
        o.listing_url = None;
        let err = RunConfig::resolve(&AppConfig::default(), o).unwrap_err();
        assert!(matches!(err, ChannelKeysError::Config { .. }));
        assert!(err.to_string().contains(LISTING_URL_ENV));
    }

    #[test]
    fn empty_detail_prefix_is_config_error() {
        let mut o = overrides();
        o.detail_prefix = Some("  ".into());
        let err = RunConfig::resolve(&AppConfig::default(), o).unwrap_err();
        assert!(err.to_string().contains(DETAIL_PREFIX_ENV));
    }

    #[test]
    fn unparseable_listing_url_is_config_error() {
        let mut o = overrides();
        o.listing_url = Some("not a url".into());
        let err = RunConfig::resolve(&AppConfig::default(), o).unwrap_err();
        assert!(matches!(err, ChannelKeysError::Config { .. }));
    }
}
