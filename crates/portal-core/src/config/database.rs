use serde::{Deserialize, Serialize};

/// Database configuration.
///
/// Either `url` is set, or the discrete connection fields are used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection URL. Takes precedence over the discrete fields.
    #[serde(default)]
    pub url: String,

    /// Server host name.
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database name.
    #[serde(default = "default_name")]
    pub name: String,

    /// Login role.
    #[serde(default = "default_user")]
    pub user: String,

    /// Login password.
    #[serde(default)]
    pub password: Option<String>,

    /// Connection pool size.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Seconds to wait for a connection before giving up.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Statement timeout in seconds (0 keeps the server default).
    #[serde(default)]
    pub statement_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            host: default_host(),
            port: default_port(),
            name: default_name(),
            user: default_user(),
            password: None,
            pool_size: default_pool_size(),
            connect_timeout_secs: default_connect_timeout(),
            statement_timeout_secs: 0,
        }
    }
}

impl DatabaseConfig {
    /// Whether a connection URL was supplied.
    pub fn has_url(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_name() -> String {
    "smart_college_portal".to_string()
}

fn default_user() -> String {
    "postgres".to_string()
}

fn default_pool_size() -> u32 {
    5
}

fn default_connect_timeout() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_database_config() {
        let config = DatabaseConfig::default();
        assert_eq!(config.pool_size, 5);
        assert_eq!(config.port, 5432);
        assert_eq!(config.name, "smart_college_portal");
        assert!(!config.has_url());
    }

    #[test]
    fn test_parse_discrete_fields() {
        let toml = r#"
            host = "db.internal"
            port = 6543
            name = "portal"
            user = "portal_admin"
            password = "s3cret"
        "#;

        let config: DatabaseConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 6543);
        assert_eq!(config.password.as_deref(), Some("s3cret"));
        assert_eq!(config.connect_timeout_secs, 10);
    }

    #[test]
    fn test_blank_url_is_not_configured() {
        let config = DatabaseConfig {
            url: "   ".to_string(),
            ..Default::default()
        };
        assert!(!config.has_url());
    }
}
