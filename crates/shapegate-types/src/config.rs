//! Service configuration types for shapegate.
//!
//! `ServiceConfig` is the top-level `shapegate.toml`. Every field has a
//! default except the credentials, which must come from the file or the
//! environment (see `shapegate_infra::config`).

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub fortigate: FortigateConfig,
    #[serde(default)]
    pub shaping: ShapingConfig,
    #[serde(default)]
    pub timing: TimingConfig,
}

impl ServiceConfig {
    /// Check the invariants that serde defaults cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.token.is_none() {
            return Err(ConfigError::MissingToken);
        }
        if self.fortigate.password.is_none() && self.fortigate.private_key_path.is_none() {
            return Err(ConfigError::MissingCredential);
        }
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be non-zero".to_string()));
        }
        if let Some(uuid) = self.server.webhook_uuid.as_deref().map(str::trim) {
            if !uuid.chars().all(is_path_segment_char) {
                return Err(ConfigError::Invalid(format!(
                    "server.webhook_uuid '{uuid}' may only contain A-Z, a-z, 0-9, '.', '_', '~' and '-'"
                )));
            }
        }
        if self.fortigate.port == 0 {
            return Err(ConfigError::Invalid("fortigate.port must be non-zero".to_string()));
        }
        if self.fortigate.host.trim().is_empty() {
            return Err(ConfigError::Invalid("fortigate.host must not be empty".to_string()));
        }
        if self.shaping.policy_ids.is_empty() {
            return Err(ConfigError::Invalid(
                "shaping.policy_ids must list at least one policy".to_string(),
            ));
        }
        if self.timing.inactivity_check_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "timing.inactivity_check_interval_secs must be non-zero".to_string(),
            ));
        }
        if self.timing.action_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "timing.action_timeout_secs must be non-zero when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Unreserved URL characters; anything else could be read as route syntax.
fn is_path_segment_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '~' | '-')
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Secret path segment; the endpoint is `/webhook/{uuid}`.
    #[serde(default)]
    pub webhook_uuid: Option<String>,
}

impl ServerConfig {
    /// Path the webhook endpoint is mounted on.
    pub fn webhook_path(&self) -> String {
        match self.webhook_uuid.as_deref().map(str::trim) {
            Some(uuid) if !uuid.is_empty() => format!("/webhook/{uuid}"),
            _ => "/webhook/default".to_string(),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            webhook_uuid: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    25001
}

/// Webhook authentication settings.
#[derive(Debug, Default, Deserialize)]
pub struct AuthConfig {
    /// Shared token expected in the `X-Webhook-Token` header.
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub token: Option<SecretString>,
}

/// SSH target for the shaping action.
#[derive(Debug, Deserialize)]
pub struct FortigateConfig {
    #[serde(default = "default_fortigate_host")]
    pub host: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub password: Option<SecretString>,
    /// Private key file; takes precedence over the password when set.
    #[serde(default)]
    pub private_key_path: Option<PathBuf>,
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub private_key_passphrase: Option<SecretString>,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Expected host key, e.g. `SHA256:...`. Any key is accepted when unset.
    #[serde(default)]
    pub host_key_fingerprint: Option<String>,
}

impl FortigateConfig {
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for FortigateConfig {
    fn default() -> Self {
        Self {
            host: default_fortigate_host(),
            port: default_ssh_port(),
            username: default_username(),
            password: None,
            private_key_path: None,
            private_key_passphrase: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            host_key_fingerprint: None,
        }
    }
}

fn default_fortigate_host() -> String {
    "fortigate.example.com".to_string()
}

fn default_ssh_port() -> u16 {
    22
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

/// Which firewall shaping policies are toggled.
#[derive(Debug, Clone, Deserialize)]
pub struct ShapingConfig {
    #[serde(default = "default_policy_ids")]
    pub policy_ids: Vec<u32>,
}

impl Default for ShapingConfig {
    fn default() -> Self {
        Self {
            policy_ids: default_policy_ids(),
        }
    }
}

fn default_policy_ids() -> Vec<u32> {
    vec![17, 21, 22]
}

/// Timer settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TimingConfig {
    /// Delay before a pause/stop disables shaping.
    #[serde(default = "default_disable_delay_secs")]
    pub disable_delay_secs: u64,
    /// Idle period after which shaping is disabled regardless of events.
    #[serde(default = "default_inactivity_timeout_secs")]
    pub inactivity_timeout_secs: u64,
    #[serde(default = "default_inactivity_check_interval_secs")]
    pub inactivity_check_interval_secs: u64,
    /// Upper bound on one external action. `None` waits indefinitely.
    #[serde(default)]
    pub action_timeout_secs: Option<u64>,
}

impl TimingConfig {
    pub fn disable_delay(&self) -> Duration {
        Duration::from_secs(self.disable_delay_secs)
    }

    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_secs(self.inactivity_timeout_secs)
    }

    pub fn inactivity_check_interval(&self) -> Duration {
        Duration::from_secs(self.inactivity_check_interval_secs)
    }

    pub fn action_timeout(&self) -> Option<Duration> {
        self.action_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            disable_delay_secs: default_disable_delay_secs(),
            inactivity_timeout_secs: default_inactivity_timeout_secs(),
            inactivity_check_interval_secs: default_inactivity_check_interval_secs(),
            action_timeout_secs: None,
        }
    }
}

fn default_disable_delay_secs() -> u64 {
    120
}

fn default_inactivity_timeout_secs() -> u64 {
    7200
}

fn default_inactivity_check_interval_secs() -> u64 {
    300
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.map(SecretString::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn valid_config() -> ServiceConfig {
        let mut config = ServiceConfig::default();
        config.auth.token = Some(SecretString::from("token"));
        config.fortigate.password = Some(SecretString::from("pw"));
        config
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.server.port, 25001);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.fortigate.port, 22);
        assert_eq!(config.fortigate.username, "admin");
        assert_eq!(config.fortigate.connect_timeout_secs, 10);
        assert_eq!(config.shaping.policy_ids, vec![17, 21, 22]);
        assert_eq!(config.timing.disable_delay_secs, 120);
        assert_eq!(config.timing.inactivity_timeout_secs, 7200);
        assert_eq!(config.timing.inactivity_check_interval_secs, 300);
        assert!(config.timing.action_timeout().is_none());
    }

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: ServiceConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 25001);
        assert!(config.auth.token.is_none());
        assert_eq!(config.shaping.policy_ids, vec![17, 21, 22]);
    }

    #[test]
    fn test_deserialize_with_values() {
        let toml_str = r#"
[server]
port = 8080
webhook_uuid = "abc-123"

[auth]
token = "s3cret"

[fortigate]
host = "10.0.0.1"
username = "shaper"
private_key_path = "/keys/id_ed25519"

[shaping]
policy_ids = [4]

[timing]
disable_delay_secs = 30
action_timeout_secs = 90
"#;
        let config: ServiceConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.webhook_path(), "/webhook/abc-123");
        assert_eq!(
            config.auth.token.as_ref().map(|t| t.expose_secret().to_string()),
            Some("s3cret".to_string())
        );
        assert_eq!(config.fortigate.target(), "10.0.0.1:22");
        assert_eq!(config.fortigate.username, "shaper");
        assert!(config.fortigate.password.is_none());
        assert_eq!(config.shaping.policy_ids, vec![4]);
        assert_eq!(config.timing.disable_delay(), Duration::from_secs(30));
        assert_eq!(config.timing.action_timeout(), Some(Duration::from_secs(90)));
        assert_eq!(config.timing.inactivity_timeout_secs, 7200);
        config.validate().unwrap();
    }

    #[test]
    fn test_webhook_path_default() {
        let mut server = ServerConfig::default();
        assert_eq!(server.webhook_path(), "/webhook/default");
        server.webhook_uuid = Some("  ".to_string());
        assert_eq!(server.webhook_path(), "/webhook/default");
    }

    #[test]
    fn test_validate_requires_token() {
        let mut config = valid_config();
        config.auth.token = None;
        assert!(matches!(config.validate(), Err(ConfigError::MissingToken)));
    }

    #[test]
    fn test_validate_requires_credential() {
        let mut config = valid_config();
        config.fortigate.password = None;
        assert!(matches!(config.validate(), Err(ConfigError::MissingCredential)));

        config.fortigate.private_key_path = Some(PathBuf::from("/keys/id"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_policies_and_zero_values() {
        let mut config = valid_config();
        config.shaping.policy_ids.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = valid_config();
        config.server.port = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = valid_config();
        config.timing.action_timeout_secs = Some(0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_route_syntax_in_webhook_uuid() {
        for uuid in ["abc{def", "{x}", "*rest", "a/b", "a b", "%2F"] {
            let mut config = valid_config();
            config.server.webhook_uuid = Some(uuid.to_string());
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid(_))),
                "uuid {uuid:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_accepts_uuid_like_webhook_ids() {
        for uuid in ["3b1f6c1e-0d4a-4c2e-9a51-7f0e2b8d9c11", "plex.hook_1~a", "  "] {
            let mut config = valid_config();
            config.server.webhook_uuid = Some(uuid.to_string());
            assert!(config.validate().is_ok(), "uuid {uuid:?} should be accepted");
        }
    }
}
