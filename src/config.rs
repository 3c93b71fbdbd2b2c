use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::SqlConnectorError;
use crate::types::DatabaseType;

/// A string that must never appear in logs, `Debug` output, or error text.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Hand the raw value to a driver. Call sites are the only places the
    /// secret leaves this wrapper.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

fn default_schema() -> String {
    "public".to_string()
}

fn default_enabled() -> bool {
    true
}

/// One configured external database.
///
/// Records are created and updated by an external data-source store; this
/// crate only validates and consumes them, never mutates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceConfig {
    #[serde(rename = "type")]
    pub db_type: DatabaseType,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: Secret,
    #[serde(default = "default_schema")]
    pub schema_name: String,
    #[serde(default, rename = "useTLS")]
    pub use_tls: bool,
    /// Opaque driver options; recognized keys are applied per dialect at
    /// connect time, everything else is ignored.
    #[serde(default)]
    pub extra_options: HashMap<String, JsonValue>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl DataSourceConfig {
    /// Parse a config from its wire/storage JSON representation.
    ///
    /// # Errors
    ///
    /// Returns `SqlConnectorError::ConfigError` when the document is
    /// malformed, the `type` is not a supported dialect, or the port is out
    /// of range for a `u16`.
    pub fn from_json(value: JsonValue) -> Result<Self, SqlConnectorError> {
        serde_json::from_value(value)
            .map_err(|e| SqlConnectorError::ConfigError(format!("invalid data source config: {e}")))
    }

    /// Check the config is structurally complete before any connection
    /// attempt. No side effects; callers may invoke this standalone (e.g. a
    /// "test configuration" action) without connecting.
    ///
    /// # Errors
    ///
    /// Returns `SqlConnectorError::ConfigError` naming the first missing or
    /// out-of-range field.
    pub fn validate(&self) -> Result<(), SqlConnectorError> {
        let missing = |field: &str| {
            Err(SqlConnectorError::ConfigError(format!(
                "missing required field: {field}"
            )))
        };

        if self.host.trim().is_empty() {
            return missing("host");
        }
        if self.database.trim().is_empty() {
            return missing("database");
        }
        if self.username.trim().is_empty() {
            return missing("username");
        }
        if self.password.is_empty() {
            return missing("password");
        }
        if self.port == 0 {
            return Err(SqlConnectorError::ConfigError(format!(
                "invalid port number: {}",
                self.port
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_json() -> JsonValue {
        json!({
            "type": "postgres",
            "host": "db.internal",
            "port": 5432,
            "database": "reports",
            "username": "reader",
            "password": "hunter2",
        })
    }

    #[test]
    fn parses_with_defaults() {
        let config = DataSourceConfig::from_json(valid_json()).unwrap();
        assert_eq!(config.db_type, DatabaseType::Postgres);
        assert_eq!(config.schema_name, "public");
        assert!(!config.use_tls);
        assert!(config.enabled);
        assert!(config.extra_options.is_empty());
        config.validate().unwrap();
    }

    #[test]
    fn rejects_unsupported_type() {
        let mut doc = valid_json();
        doc["type"] = json!("sqlite");
        let err = DataSourceConfig::from_json(doc).unwrap_err();
        assert!(matches!(err, SqlConnectorError::ConfigError(_)));
    }

    #[test]
    fn rejects_out_of_range_port() {
        let mut doc = valid_json();
        doc["port"] = json!(70000);
        let err = DataSourceConfig::from_json(doc).unwrap_err();
        assert!(matches!(err, SqlConnectorError::ConfigError(_)));

        let mut config = DataSourceConfig::from_json(valid_json()).unwrap();
        config.port = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, SqlConnectorError::ConfigError(msg) if msg.contains("port")));
    }

    #[test]
    fn rejects_each_missing_field() {
        for field in ["host", "database", "username", "password"] {
            let mut config = DataSourceConfig::from_json(valid_json()).unwrap();
            match field {
                "host" => config.host.clear(),
                "database" => config.database.clear(),
                "username" => config.username.clear(),
                "password" => config.password = Secret::new(""),
                _ => unreachable!(),
            }
            let err = config.validate().unwrap_err();
            assert!(
                matches!(err, SqlConnectorError::ConfigError(msg) if msg.contains(field)),
                "expected ConfigError naming {field}"
            );
        }
    }

    #[test]
    fn debug_output_never_contains_password() {
        let config = DataSourceConfig::from_json(valid_json()).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("Secret(***)"));
    }
}
