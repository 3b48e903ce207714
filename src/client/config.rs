use crate::client::error::{ClientError, Result};
use crate::client::identity::PlainCredentials;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Environment configuration, forwarded verbatim to the server as the
/// initial start request.
///
/// The two fields this client interprets are typed; everything else the
/// configuration file carries is preserved in `extra` and round-trips
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvConfig {
    pub respond_action_after_measurement: bool,
    pub downlink: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Externally supplied client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub session_name: String,
    pub session_key: String,
    pub algorithm_client_port: u16,
    pub env_config: EnvConfig,
    /// Partially prefilled outbound action message; the current policy is
    /// injected under the `action_list` key before transmission.
    pub action_template: Value,
}

impl Config {
    /// Load a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading configuration");
        let text = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text).map_err(|e| {
            ClientError::Config(format!("{}: {}", path.display(), e))
        })?;
        debug!(session = %config.session_name, "Configuration loaded");
        Ok(config)
    }

    /// Validates the configuration values
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");
        if self.session_name.is_empty() {
            return Err(ClientError::Config("session_name must not be empty".into()));
        }
        if self.algorithm_client_port == 0 {
            return Err(ClientError::Config(
                "algorithm_client_port must be > 0".into(),
            ));
        }
        if !self.action_template.is_object() {
            return Err(ClientError::Config(
                "action_template must be a JSON object".into(),
            ));
        }
        debug!("Configuration validated successfully");
        Ok(())
    }

    /// Plain credentials presented in the greeting frame.
    pub fn credentials(&self) -> PlainCredentials {
        PlainCredentials {
            username: self.session_name.clone(),
            password: self.session_key.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_config() -> Config {
        Config {
            session_name: "test".to_owned(),
            session_key: "test".to_owned(),
            algorithm_client_port: 8086,
            env_config: EnvConfig {
                respond_action_after_measurement: true,
                downlink: true,
                extra: Map::new(),
            },
            action_template: json!({"type": "action", "version": "1.3"}),
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut config = sample_config();
        config.algorithm_client_port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_session_name() {
        let mut config = sample_config();
        config.session_name.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_object_template() {
        let mut config = sample_config();
        config.action_template = json!([1, 2, 3]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_config_preserves_unknown_fields() {
        let text = r#"{
            "respond_action_after_measurement": false,
            "downlink": true,
            "env": "nqos_split",
            "num_users": 4
        }"#;
        let env: EnvConfig = serde_json::from_str(text).unwrap();
        assert!(!env.respond_action_after_measurement);
        assert_eq!(env.extra.get("env"), Some(&json!("nqos_split")));

        let reserialized = serde_json::to_value(&env).unwrap();
        assert_eq!(reserialized["num_users"], json!(4));
        assert_eq!(reserialized["downlink"], json!(true));
    }

    #[test]
    fn test_from_file_roundtrip() -> Result<()> {
        let config = sample_config();
        let path = std::env::temp_dir().join("axon-config-test.json");
        fs::write(&path, serde_json::to_string_pretty(&config).unwrap())?;

        let loaded = Config::from_file(&path)?;
        assert_eq!(loaded, config);

        fs::remove_file(&path)?;
        Ok(())
    }

    #[test]
    fn test_from_file_missing() {
        let result = Config::from_file("/nonexistent/axon.json");
        assert!(result.is_err());
    }

    #[test]
    fn test_credentials_derivation() {
        let credentials = sample_config().credentials();
        assert_eq!(credentials.username, "test");
        assert_eq!(credentials.password, "test");
    }
}
