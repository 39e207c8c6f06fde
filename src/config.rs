//! Configuration loading and validation for dyn-ip-mailer.

use crate::error::{MailerError, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Base name of the config file searched for in the home and current directories.
pub const CONFIG_FILE_NAME: &str = ".dyn-ip-mailer.toml";

/// IP-echo service used when `ip_service` is not set.
pub const DEFAULT_IP_SERVICE: &str = "https://api.ipify.org";

/// Validated settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// File holding the last observed address.
    pub cache_file: PathBuf,
    /// Notification address, used as both sender and recipient.
    pub email: String,
    /// Outgoing mail server.
    pub smtp: SmtpSettings,
    /// IP-echo endpoint.
    pub ip_service: String,
}

/// SMTP connection settings.
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub tls: TlsMode,
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("tls", &self.tls)
            .finish()
    }
}

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    /// Plain connection upgraded with STARTTLS.
    #[default]
    Starttls,
    /// TLS from the first byte (usually port 465).
    Wrapper,
    /// No encryption. Only for local relays.
    None,
}

/// On-disk shape. Everything is optional so that missing keys can be
/// reported one by one instead of as a generic serde error.
#[derive(Debug, Deserialize)]
struct RawConfig {
    cachefile: Option<String>,
    email: Option<String>,
    smtp: Option<RawSmtp>,
    ip_service: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSmtp {
    server: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    tls: Option<TlsMode>,
}

impl Settings {
    /// Candidate config locations, in search order.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(CONFIG_FILE_NAME));
        }
        paths.push(PathBuf::from(CONFIG_FILE_NAME));
        paths
    }

    /// Load settings from `explicit` if given, otherwise from the first
    /// existing search path.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        Self::load_first(&Self::search_paths())
    }

    /// Load the first existing file among `candidates`.
    fn load_first(candidates: &[PathBuf]) -> Result<Self> {
        match candidates.iter().find(|p| p.exists()) {
            Some(path) => Self::load_from(path),
            None => {
                let searched: Vec<String> =
                    candidates.iter().map(|p| p.display().to_string()).collect();
                Err(MailerError::Config(format!(
                    "no {} found (searched: {})",
                    CONFIG_FILE_NAME,
                    searched.join(", ")
                )))
            }
        }
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        tracing::debug!("Reading config from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| {
            MailerError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)?;
        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> Result<Self> {
        let cache_file = required(raw.cachefile, "cachefile")?;
        let email = required(raw.email, "email")?;
        let smtp = raw.smtp.ok_or(MailerError::MissingSection("smtp"))?;

        let server = required(smtp.server, "smtp.server")?;
        let port = match smtp.port {
            None => return Err(MailerError::MissingKey("smtp.port")),
            Some(0) => return Err(MailerError::EmptyKey("smtp.port")),
            Some(port) => port,
        };
        let username = resolve_env(&required(smtp.username, "smtp.username")?);
        let password = resolve_env(&required(smtp.password, "smtp.password")?);

        Ok(Self {
            cache_file: PathBuf::from(cache_file),
            email,
            smtp: SmtpSettings {
                server,
                port,
                username,
                password,
                tls: smtp.tls.unwrap_or_default(),
            },
            ip_service: raw
                .ip_service
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_IP_SERVICE.to_string()),
        })
    }
}

fn required(value: Option<String>, key: &'static str) -> Result<String> {
    match value {
        None => Err(MailerError::MissingKey(key)),
        Some(v) if v.trim().is_empty() => Err(MailerError::EmptyKey(key)),
        Some(v) => Ok(v),
    }
}

/// Resolve environment variable references (values starting with $).
fn resolve_env(value: &str) -> String {
    if let Some(var_name) = value.strip_prefix('$') {
        std::env::var(var_name).unwrap_or_else(|_| {
            tracing::warn!("Environment variable {} not set", var_name);
            value.to_string()
        })
    } else {
        value.to_string()
    }
}
