use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "blog_site.toml";

/// Minimum secret length accepted for cookie signing.
pub const MIN_SECRET_KEY_LEN: usize = 32;

/// Longest session lifetime accepted: one year.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 366;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub paths: PathConfig,
    pub mail: MailConfig,
    pub site: SiteConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Signs the session and flash cookies.
    #[serde(skip_serializing, default = "generate_secret_key")]
    pub secret_key: String,
    pub session_ttl_hours: i64,
    /// Mark session and flash cookies `Secure` (HTTPS only).
    #[serde(default)]
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    /// Plain path or `sqlite://<path>`.
    pub database_url: String,
    pub templates_dir: PathBuf,
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Sender account, also used as the SMTP login.
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    /// Where contact form messages are delivered.
    pub to_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub title: String,
    pub description: String,
    pub author: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
                secret_key: generate_secret_key(),
                session_ttl_hours: 24 * 7,
                secure_cookies: false,
            },
            paths: PathConfig {
                database_url: "sqlite://blog.db".to_string(),
                templates_dir: PathBuf::from("templates"),
                static_dir: PathBuf::from("static"),
            },
            mail: MailConfig {
                smtp_host: "smtp.gmail.com".to_string(),
                smtp_port: 587,
                username: String::new(),
                password: String::new(),
                to_address: String::new(),
            },
            site: SiteConfig {
                title: "My Blog".to_string(),
                description: "A collection of random musings.".to_string(),
                author: "Admin".to_string(),
            },
        }
    }
}

impl Config {
    /// Load the config file (or defaults when it is absent), then apply
    /// environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Write the config to `path`. Secrets are not written out.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup("SECRET_KEY") {
            self.server.secret_key = secret;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.paths.database_url = url;
        }
        if let Some(email) = lookup("EMAIL") {
            self.mail.username = email;
        }
        if let Some(password) = lookup("EMAIL_PASS") {
            self.mail.password = password;
        }
        if let Some(to) = lookup("EMAIL_TO") {
            self.mail.to_address = to;
        }
        if let Some(host) = lookup("SMTP_HOST") {
            self.mail.smtp_host = host;
        }
        if let Some(port) = lookup("SMTP_PORT").and_then(|p| p.parse().ok()) {
            self.mail.smtp_port = port;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.secret_key.len() < MIN_SECRET_KEY_LEN {
            return Err(ConfigError::Invalid(format!(
                "secret key must be at least {} bytes",
                MIN_SECRET_KEY_LEN
            )));
        }
        if self.server.session_ttl_hours <= 0 {
            return Err(ConfigError::Invalid(
                "session_ttl_hours must be positive".to_string(),
            ));
        }
        if self.server.session_ttl_hours > MAX_SESSION_TTL_HOURS {
            return Err(ConfigError::Invalid(format!(
                "session_ttl_hours must be at most {}",
                MAX_SESSION_TTL_HOURS
            )));
        }
        if self.database_path().as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database_url is empty".to_string()));
        }
        Ok(())
    }

    /// Filesystem path of the SQLite database.
    pub fn database_path(&self) -> PathBuf {
        let url = self.paths.database_url.trim();
        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);
        PathBuf::from(path)
    }
}

// Two v4 UUIDs give 64 hex characters, enough for key derivation.
fn generate_secret_key() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.secret_key.len(), 64);
        assert_eq!(config.database_path(), PathBuf::from("blog.db"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("DATABASE_URL", "sqlite:///var/lib/blog/blog.db"),
            ("EMAIL", "me@example.com"),
            ("EMAIL_PASS", "hunter2"),
            ("EMAIL_TO", "inbox@example.com"),
            ("SMTP_PORT", "2525"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database_path(), PathBuf::from("/var/lib/blog/blog.db"));
        assert_eq!(config.mail.username, "me@example.com");
        assert_eq!(config.mail.password, "hunter2");
        assert_eq!(config.mail.to_address, "inbox@example.com");
        assert_eq!(config.mail.smtp_port, 2525);
        assert_eq!(config.mail.smtp_host, "smtp.gmail.com");
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut config = Config::default();
        config.server.secret_key = "too-short".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_session_ttl_bounds() {
        let mut config = Config::default();
        config.server.session_ttl_hours = MAX_SESSION_TTL_HOURS;
        assert!(config.validate().is_ok());

        config.server.session_ttl_hours = i64::MAX;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.server.session_ttl_hours = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_secure_cookies_defaults_off() {
        let written = toml::to_string(&Config::default()).unwrap();
        assert!(written.contains("secure_cookies = false"));

        let without_flag = written.replace("secure_cookies = false\n", "");
        let config: Config = toml::from_str(&without_flag).unwrap();
        assert!(!config.server.secure_cookies);

        let enabled = written.replace("secure_cookies = false", "secure_cookies = true");
        let config: Config = toml::from_str(&enabled).unwrap();
        assert!(config.server.secure_cookies);
    }

    #[test]
    fn test_plain_database_path() {
        let mut config = Config::default();
        config.paths.database_url = "data/site.db".to_string();
        assert_eq!(config.database_path(), PathBuf::from("data/site.db"));
    }

    #[test]
    fn test_save_omits_secrets() {
        let path = std::env::temp_dir().join(format!("blog_site_{}.toml", uuid::Uuid::new_v4()));
        let mut config = Config::default();
        config.mail.password = "secret-mail-pass".to_string();
        config.save(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("secret-mail-pass"));
        assert!(!written.contains(&config.server.secret_key));

        let reloaded: Config = toml::from_str(&written).unwrap();
        assert!(reloaded.mail.password.is_empty());
        assert!(reloaded.validate().is_ok());

        std::fs::remove_file(&path).ok();
    }
}
