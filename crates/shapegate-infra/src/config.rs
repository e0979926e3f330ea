//! Service configuration loader for shapegate.
//!
//! Reads `shapegate.toml` (path configurable), then applies environment
//! overrides, then validates. A missing file means "all defaults"; the
//! credentials then have to come from the environment.

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use shapegate_types::config::ServiceConfig;
use shapegate_types::error::ConfigError;

/// Config file name used when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "shapegate.toml";

/// Load, override from the process environment, and validate.
pub async fn load_service_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let mut config = load_config_file(path).await?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// Read and parse the TOML file at `path`.
///
/// - Missing file: returns [`ServiceConfig::default()`].
/// - Unreadable or malformed file: returns an error.
pub async fn load_config_file(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(ServiceConfig::default());
        }
        Err(err) => {
            return Err(ConfigError::Read {
                path: path.display().to_string(),
                reason: err.to_string(),
            });
        }
    };

    toml::from_str::<ServiceConfig>(&content).map_err(|err| ConfigError::Parse {
        path: path.display().to_string(),
        reason: err.to_string(),
    })
}

/// Apply environment overrides using `lookup` to read variables.
///
/// | Variable                        | Field                           |
/// |---------------------------------|---------------------------------|
/// | `WEBHOOK_TOKEN`                 | `auth.token`                    |
/// | `WEBHOOK_UUID`                  | `server.webhook_uuid`           |
/// | `FORTIGATE_HOST`                | `fortigate.host`                |
/// | `FORTIGATE_PORT`                | `fortigate.port`                |
/// | `FORTIGATE_USER`                | `fortigate.username`            |
/// | `FORTIGATE_PASS`                | `fortigate.password`            |
/// | `FORTIGATE_KEY_PATH`            | `fortigate.private_key_path`    |
/// | `SHAPEGATE_ACTION_TIMEOUT_SECS` | `timing.action_timeout_secs`    |
///
/// Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(token) = get("WEBHOOK_TOKEN") {
        config.auth.token = Some(SecretString::from(token));
    }
    if let Some(uuid) = get("WEBHOOK_UUID") {
        config.server.webhook_uuid = Some(uuid);
    }
    if let Some(host) = get("FORTIGATE_HOST") {
        config.fortigate.host = host;
    }
    if let Some(port) = get("FORTIGATE_PORT") {
        config.fortigate.port = parse_override("FORTIGATE_PORT", &port)?;
    }
    if let Some(user) = get("FORTIGATE_USER") {
        config.fortigate.username = user;
    }
    if let Some(password) = get("FORTIGATE_PASS") {
        config.fortigate.password = Some(SecretString::from(password));
    }
    if let Some(path) = get("FORTIGATE_KEY_PATH") {
        config.fortigate.private_key_path = Some(PathBuf::from(path));
    }
    if let Some(secs) = get("SHAPEGATE_ACTION_TIMEOUT_SECS") {
        config.timing.action_timeout_secs =
            Some(parse_override("SHAPEGATE_ACTION_TIMEOUT_SECS", &secs)?);
    }

    Ok(())
}

fn parse_override<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}
