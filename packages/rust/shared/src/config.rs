//! Application configuration for KantanPress.
//!
//! User config lives at `~/.kantanpress/kantanpress.toml`.
//! CLI flags override config file values, which override defaults.
//! Secrets never live in the file — the config names the env vars
//! that hold them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{KantanError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "kantanpress.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".kantanpress";

// ---------------------------------------------------------------------------
// Config structs (matching kantanpress.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// CMS endpoint and credential settings.
    #[serde(default)]
    pub cms: CmsConfig,

    /// Fetch stage defaults.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Static site generator invocation.
    #[serde(default)]
    pub build: BuildConfig,

    /// Packaging and upload settings.
    #[serde(default)]
    pub deploy: DeployConfig,

    /// Content converters, one per collection.
    #[serde(default = "default_converters")]
    pub converters: Vec<ConverterConfig>,

    /// Latest-items exporters.
    #[serde(default)]
    pub exports: Vec<ExportConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cms: CmsConfig::default(),
            fetch: FetchConfig::default(),
            build: BuildConfig::default(),
            deploy: DeployConfig::default(),
            converters: default_converters(),
            exports: Vec::new(),
        }
    }
}

/// `[cms]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmsConfig {
    /// Base URL of the Kantan CMS instance (API root is `<base_url>/v1/api`).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the env var holding the project id.
    #[serde(default = "default_project_id_env")]
    pub project_id_env: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Page size for paginated listing endpoints.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            project_id_env: default_project_id_env(),
            api_key_env: default_api_key_env(),
            page_size: default_page_size(),
        }
    }
}

fn default_base_url() -> String {
    "https://app.kantancms.com".into()
}
fn default_project_id_env() -> String {
    "KANTAN_PROJECT_ID".into()
}
fn default_api_key_env() -> String {
    "KANTAN_CMS_API_KEY".into()
}
fn default_page_size() -> u32 {
    100
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Directory where collection snapshots are written.
    #[serde(default = "default_storage_path")]
    pub storage_path: String,

    /// Collections to fetch. Empty means "all".
    #[serde(default = "default_collections")]
    pub collections: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            collections: default_collections(),
        }
    }
}

fn default_storage_path() -> String {
    "tmp".into()
}
fn default_collections() -> Vec<String> {
    vec!["Blog".into()]
}

/// `[build]` section — the static site generator subprocess.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Generator command.
    #[serde(default = "default_build_command")]
    pub command: String,

    /// Arguments passed to the command.
    #[serde(default = "default_build_args")]
    pub args: Vec<String>,

    /// Working directory for the subprocess.
    #[serde(default = "default_working_dir")]
    pub working_dir: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            command: default_build_command(),
            args: default_build_args(),
            working_dir: default_working_dir(),
        }
    }
}

fn default_build_command() -> String {
    "mkdocs".into()
}
fn default_build_args() -> Vec<String> {
    vec!["build".into()]
}
fn default_working_dir() -> String {
    ".".into()
}

/// `[deploy]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Directory containing the generator's static output.
    #[serde(default = "default_static_output_dir")]
    pub static_output_dir: String,

    /// File name for the temporary ZIP archive.
    #[serde(default = "default_zip_filename")]
    pub zip_filename: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            static_output_dir: default_static_output_dir(),
            zip_filename: default_zip_filename(),
        }
    }
}

fn default_static_output_dir() -> String {
    "out".into()
}
fn default_zip_filename() -> String {
    "site-export.zip".into()
}

// ---------------------------------------------------------------------------
// Converter config
// ---------------------------------------------------------------------------

/// Output format for converted records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Frontmatter + raw content body, written as `<slug>.md`.
    #[default]
    Markdown,
    /// Mapped fields + content, written as `<slug>.json`.
    Json,
}

impl OutputFormat {
    /// File extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Json => "json",
        }
    }
}

/// Value formatter applied to a mapped field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldFormat {
    /// Parse an RFC 3339 timestamp (or bare date) and emit `YYYY-MM-DD`.
    IsoDate,
}

/// One frontmatter field mapping: `[[converters.frontmatter]]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontmatterField {
    /// Field name on the CMS record.
    pub source: String,
    /// Field name in the generated frontmatter.
    pub target: String,
    /// Optional value formatter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<FieldFormat>,
    /// Required fields are emitted as `target: ""` when the source is missing.
    #[serde(default)]
    pub required: bool,
}

/// `[[converters]]` entry — converts one collection snapshot into content files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Collection name (e.g. `Blog`).
    pub collection: String,

    /// Source snapshot file. Defaults to `<storage_path>/<collection>.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,

    /// Directory where converted files are written.
    pub target_dir: String,

    /// Record field used to generate the slug/filename.
    pub slug_field: String,

    /// Record field containing the main content body.
    pub content_field: String,

    /// Output format.
    #[serde(default)]
    pub output: OutputFormat,

    /// Frontmatter field mappings.
    #[serde(default)]
    pub frontmatter: Vec<FrontmatterField>,
}

impl ConverterConfig {
    /// Resolve the source snapshot path against the storage directory.
    pub fn source_path(&self, storage_path: &str) -> PathBuf {
        match &self.source_file {
            Some(f) => PathBuf::from(f),
            None => Path::new(storage_path).join(format!("{}.json", self.collection)),
        }
    }
}

/// The shipped default: one Blog converter matching the classic setup.
fn default_converters() -> Vec<ConverterConfig> {
    vec![ConverterConfig {
        collection: "Blog".into(),
        source_file: None,
        target_dir: "docs/docs".into(),
        slug_field: "fname".into(),
        content_field: "content".into(),
        output: OutputFormat::Markdown,
        frontmatter: vec![
            FrontmatterField {
                source: "name".into(),
                target: "title".into(),
                format: None,
                required: true,
            },
            FrontmatterField {
                source: "date".into(),
                target: "date".into(),
                format: Some(FieldFormat::IsoDate),
                required: true,
            },
            FrontmatterField {
                source: "order".into(),
                target: "order".into(),
                format: None,
                required: false,
            },
        ],
    }]
}

// ---------------------------------------------------------------------------
// Export config
// ---------------------------------------------------------------------------

/// Sort direction for latest-items exports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// One exported field mapping: `[[exports.fields]]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportField {
    /// Field name on the CMS record.
    pub source: String,
    /// Field name in the exported item.
    pub target: String,
    /// Optional value formatter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<FieldFormat>,
}

/// `[[exports]]` entry — exports the latest N records as a JSON data file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Source snapshot file.
    pub source_file: String,

    /// Output file for the exported JSON array.
    pub target_file: String,

    /// Number of items to export.
    pub count: usize,

    /// Record field to sort by (compared as strings).
    pub sort_field: String,

    /// Sort direction.
    #[serde(default)]
    pub sort_direction: SortDirection,

    /// Field mappings applied to each exported item.
    #[serde(default)]
    pub fields: Vec<ExportField>,

    /// Constant values merged into every exported item.
    #[serde(default)]
    pub defaults: serde_json::Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// CMS credentials, resolved from the environment at runtime.
#[derive(Debug, Clone)]
pub struct CmsCredentials {
    /// Project identifier (`X-Project-Id` header).
    pub project_id: String,
    /// API key (`X-API-Key` header).
    pub api_key: String,
}

/// Read project id and API key from the env vars named in the config.
pub fn resolve_credentials(config: &AppConfig) -> Result<CmsCredentials> {
    let project_id = require_env(&config.cms.project_id_env)?;
    let api_key = require_env(&config.cms.api_key_env)?;
    Ok(CmsCredentials {
        project_id,
        api_key,
    })
}

fn require_env(var_name: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(KantanError::config(format!(
            "CMS credential not found. Set the {var_name} environment variable."
        ))),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.kantanpress/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| KantanError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.kantanpress/kantanpress.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| KantanError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| KantanError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| KantanError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| KantanError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| KantanError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
