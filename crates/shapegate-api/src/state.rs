//! Application state shared by the HTTP handlers.
//!
//! The shaping service is generic over its executor; the binary pins it to
//! `SshExecutor`, tests plug in a fake.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

use shapegate_core::executor::RemoteExecutor;
use shapegate_core::service::ShapingService;
use shapegate_infra::ssh::SshExecutor;
use shapegate_types::config::ServiceConfig;
use shapegate_types::error::ConfigError;

/// Shared state handed to every request.
pub struct AppState<E: RemoteExecutor + 'static = SshExecutor> {
    pub service: Arc<ShapingService<E>>,
    pub token: Arc<SecretString>,
    pub webhook_path: String,
}

// Manual impl: deriving would require `E: Clone`.
impl<E: RemoteExecutor + 'static> Clone for AppState<E> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            token: Arc::clone(&self.token),
            webhook_path: self.webhook_path.clone(),
        }
    }
}

impl AppState<SshExecutor> {
    /// Wire the SSH executor and shaping service from a validated config.
    pub fn init(config: &ServiceConfig) -> Result<Self, ConfigError> {
        let executor = SshExecutor::from_config(&config.fortigate)?;
        let service = ShapingService::new(executor, &config.shaping, &config.timing);
        Self::with_service(service, config)
    }
}

impl<E: RemoteExecutor + 'static> AppState<E> {
    pub fn with_service(service: ShapingService<E>, config: &ServiceConfig) -> Result<Self, ConfigError> {
        let token = config
            .auth
            .token
            .as_ref()
            .map(|t| SecretString::from(t.expose_secret().to_string()))
            .ok_or(ConfigError::MissingToken)?;

        Ok(Self {
            service: Arc::new(service),
            token: Arc::new(token),
            webhook_path: config.server.webhook_path(),
        })
    }
}
