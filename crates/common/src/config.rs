//! Application configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides (`OWR__SERVER__PORT=8080`).
const ENV_PREFIX: &str = "OWR";

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// File storage configuration.
    pub storage: StorageSettings,
    /// Outgoing email configuration.
    #[serde(default)]
    pub email: EmailSettings,
    /// Translation gateway configuration.
    #[serde(default)]
    pub translation: TranslationSettings,
    /// Administrator bootstrap.
    #[serde(default)]
    pub admin: AdminSettings,
    /// Log output.
    #[serde(default)]
    pub log: LogSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this service.
    pub url: String,
    /// Maximum accepted request body for uploads.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Per-request timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// File storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Directory that holds one sub-directory per bucket.
    #[serde(default = "default_storage_path")]
    pub base_path: PathBuf,
    /// Public URL prefix the file route is mounted under.
    #[serde(default = "default_files_url")]
    pub public_base_url: String,
    /// Secret used to sign time-limited URLs.
    pub signing_secret: String,
    /// Lifetime of signed URLs.
    #[serde(default = "default_signed_url_ttl")]
    pub signed_url_ttl_secs: i64,
}

impl StorageSettings {
    /// Absolute files URL for links that leave the site, such as emails.
    ///
    /// A relative `public_base_url` is resolved against `server_url`.
    #[must_use]
    pub fn absolute_files_url(&self, server_url: &str) -> String {
        let base = self.public_base_url.trim_end_matches('/');
        if base.starts_with("http://") || base.starts_with("https://") {
            base.to_string()
        } else {
            format!(
                "{}/{}",
                server_url.trim_end_matches('/'),
                base.trim_start_matches('/')
            )
        }
    }
}

/// Email delivery provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailProviderKind {
    /// Write messages to the log instead of sending them.
    #[default]
    Log,
    /// Resend HTTP API.
    Resend,
    /// Plain SMTP relay.
    Smtp,
}

/// Outgoing email configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailSettings {
    /// Which provider delivers mail.
    #[serde(default)]
    pub provider: EmailProviderKind,
    /// Sender address.
    #[serde(default = "default_from_address")]
    pub from_address: String,
    /// Sender display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// API key for HTTP providers.
    #[serde(default)]
    pub api_key: Option<String>,
    /// SMTP relay host.
    #[serde(default)]
    pub smtp_host: Option<String>,
    /// SMTP relay port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    #[serde(default)]
    pub smtp_username: Option<String>,
    /// SMTP password.
    #[serde(default)]
    pub smtp_password: Option<String>,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            provider: EmailProviderKind::default(),
            from_address: default_from_address(),
            from_name: default_from_name(),
            api_key: None,
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
        }
    }
}

/// Translation gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TranslationSettings {
    /// Whether `/translate` is served at all.
    #[serde(default)]
    pub enabled: bool,
    /// OpenAI-compatible chat completions endpoint.
    #[serde(default = "default_translation_endpoint")]
    pub endpoint: String,
    /// Bearer key for the gateway.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model name passed to the gateway.
    #[serde(default)]
    pub model: Option<String>,
    /// How long translated strings stay cached.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_translation_endpoint(),
            api_key: None,
            model: None,
            cache_ttl_seconds: default_cache_ttl(),
        }
    }
}

/// Administrator bootstrap settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminSettings {
    /// Accounts signing up with one of these emails receive the admin role.
    #[serde(default)]
    pub emails: Vec<String>,
}

impl AdminSettings {
    /// Whether an email is on the bootstrap list (case-insensitive).
    #[must_use]
    pub fn is_bootstrap_admin(&self, email: &str) -> bool {
        self.emails.iter().any(|e| e.eq_ignore_ascii_case(email))
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Log settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogSettings {
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./files")
}

fn default_files_url() -> String {
    "/api/files".to_string()
}

const fn default_signed_url_ttl() -> i64 {
    3600
}

fn default_from_address() -> String {
    "no-reply@localhost".to_string()
}

fn default_from_name() -> String {
    "OWR".to_string()
}

const fn default_smtp_port() -> u16 {
    587
}

fn default_translation_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

const fn default_cache_ttl() -> u64 {
    3600
}

/// `OWR__SECTION__KEY` overrides. List-valued keys take comma-separated values.
fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("admin.emails")
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present, exported into the process environment)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `OWR_ENV`)
    /// 4. Environment variables with `OWR__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let _ = dotenvy::dotenv();
        let env = std::env::var("OWR_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(environment())
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [server]
        url = "https://owr.example"

        [database]
        url = "postgres://localhost/owr"

        [storage]
        signing_secret = "s3cret"
    "#;

    fn parse(toml: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_fill_optional_sections() {
        let config = parse(MINIMAL);
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.storage.signed_url_ttl_secs, 3600);
        assert_eq!(config.email.provider, EmailProviderKind::Log);
        assert!(!config.translation.enabled);
        assert!(config.admin.emails.is_empty());
        assert_eq!(config.log.format, LogFormat::Pretty);
    }

    #[test]
    fn test_email_provider_parsing() {
        let toml = format!(
            "{MINIMAL}\n[email]\nprovider = \"smtp\"\nsmtp_host = \"mail.example\"\n"
        );
        let config = parse(&toml);
        assert_eq!(config.email.provider, EmailProviderKind::Smtp);
        assert_eq!(config.email.smtp_host.as_deref(), Some("mail.example"));
        assert_eq!(config.email.smtp_port, 587);
    }

    #[test]
    fn test_absolute_files_url() {
        let mut config = parse(MINIMAL);
        assert_eq!(
            config.storage.absolute_files_url(&config.server.url),
            "https://owr.example/api/files"
        );

        config.storage.public_base_url = "https://cdn.example/files/".to_string();
        assert_eq!(
            config.storage.absolute_files_url("https://owr.example/"),
            "https://cdn.example/files"
        );
    }

    #[test]
    fn test_admin_emails_from_environment() {
        let vars: config::Map<String, String> = [
            ("OWR__ADMIN__EMAILS", "a@example.com,b@example.com"),
            ("OWR__SERVER__PORT", "8080"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(MINIMAL, config::FileFormat::Toml))
            .add_source(environment().source(Some(vars)))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.admin.emails, vec!["a@example.com", "b@example.com"]);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_bootstrap_admin_is_case_insensitive() {
        let admin = AdminSettings {
            emails: vec!["Root@Example.com".to_string()],
        };
        assert!(admin.is_bootstrap_admin("root@example.com"));
        assert!(!admin.is_bootstrap_admin("other@example.com"));
    }
}
