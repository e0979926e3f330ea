//! SSH executor for the FortiGate CLI.
//!
//! Each action opens a fresh session, authenticates, runs the script on one
//! exec channel and collects its output. Sessions are not pooled.

use std::sync::Arc;
use std::time::{Duration, Instant};

use russh::keys::{HashAlg, PrivateKey, PrivateKeyWithHashAlg, load_secret_key, ssh_key};
use russh::{ChannelMsg, Disconnect};
use secrecy::{ExposeSecret, SecretString};

use shapegate_core::executor::RemoteExecutor;
use shapegate_types::action::ActionResult;
use shapegate_types::config::FortigateConfig;
use shapegate_types::error::{ActionError, ConfigError};

/// How the executor proves its identity to the firewall.
enum Credential {
    Password(SecretString),
    PrivateKey(Arc<PrivateKey>),
}

/// Client-side handler; only host key verification is customised.
struct FortigateHandler {
    target: String,
    expected_fingerprint: Option<String>,
}

impl russh::client::Handler for FortigateHandler {
    type Error = russh::Error;

    fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send {
        let presented = server_public_key.fingerprint(HashAlg::Sha256).to_string();
        let accepted = match &self.expected_fingerprint {
            Some(expected) => fingerprint_matches(expected, &presented),
            None => {
                tracing::debug!(target_host = %self.target, fingerprint = %presented, "accepting host key");
                true
            }
        };
        if !accepted {
            tracing::error!(
                target_host = %self.target,
                presented = %presented,
                "host key fingerprint mismatch"
            );
        }
        async move { Ok(accepted) }
    }
}

/// Compare fingerprints, tolerating a missing `SHA256:` prefix in config.
fn fingerprint_matches(expected: &str, presented: &str) -> bool {
    let strip = |s: &str| s.trim().trim_start_matches("SHA256:").to_string();
    strip(expected) == strip(presented)
}

/// Runs shaping scripts on the firewall over SSH.
pub struct SshExecutor {
    host: String,
    port: u16,
    username: String,
    credential: Credential,
    connect_timeout: Duration,
    host_key_fingerprint: Option<String>,
}

impl std::fmt::Debug for SshExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshExecutor")
            .field("target", &self.target())
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl SshExecutor {
    /// Build from config. A configured private key is loaded here so a bad
    /// key path fails at startup rather than on the first webhook.
    pub fn from_config(config: &FortigateConfig) -> Result<Self, ConfigError> {
        let credential = match (&config.private_key_path, &config.password) {
            (Some(path), _) => {
                let passphrase = config
                    .private_key_passphrase
                    .as_ref()
                    .map(|p| p.expose_secret().to_string());
                let key = load_secret_key(path, passphrase.as_deref()).map_err(|e| {
                    ConfigError::Invalid(format!(
                        "cannot load private key {}: {e}",
                        path.display()
                    ))
                })?;
                Credential::PrivateKey(Arc::new(key))
            }
            (None, Some(password)) => {
                Credential::Password(SecretString::from(password.expose_secret().to_string()))
            }
            (None, None) => return Err(ConfigError::MissingCredential),
        };

        Ok(Self {
            host: config.host.clone(),
            port: config.port,
            username: config.username.clone(),
            credential,
            connect_timeout: config.connect_timeout(),
            host_key_fingerprint: config.host_key_fingerprint.clone(),
        })
    }

    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    async fn connect(&self) -> Result<russh::client::Handle<FortigateHandler>, ActionError> {
        let handler = FortigateHandler {
            target: self.target(),
            expected_fingerprint: self.host_key_fingerprint.clone(),
        };
        let config = Arc::new(russh::client::Config::default());

        let connecting = russh::client::connect(config, (self.host.as_str(), self.port), handler);
        let mut handle = match tokio::time::timeout(self.connect_timeout, connecting).await {
            Ok(Ok(handle)) => handle,
            Ok(Err(e)) => {
                return Err(ActionError::Connect {
                    target: self.target(),
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                return Err(ActionError::Connect {
                    target: self.target(),
                    reason: format!("timed out after {:?}", self.connect_timeout),
                });
            }
        };

        let auth = match &self.credential {
            Credential::Password(password) => {
                handle
                    .authenticate_password(self.username.as_str(), password.expose_secret())
                    .await
            }
            Credential::PrivateKey(key) => {
                let key = PrivateKeyWithHashAlg::new(Arc::clone(key), Some(HashAlg::Sha256));
                handle
                    .authenticate_publickey(self.username.as_str(), key)
                    .await
            }
        }
        .map_err(|e| ActionError::Connect {
            target: self.target(),
            reason: e.to_string(),
        })?;

        if !auth.success() {
            return Err(ActionError::Authentication {
                user: self.username.clone(),
                target: self.target(),
            });
        }

        Ok(handle)
    }

    async fn run_script(
        handle: &russh::client::Handle<FortigateHandler>,
        command: &str,
    ) -> Result<(Option<u32>, Vec<u8>, Vec<u8>), ActionError> {
        let mut channel = handle
            .channel_open_session()
            .await
            .map_err(|e| ActionError::Channel(e.to_string()))?;
        channel
            .exec(true, command)
            .await
            .map_err(|e| ActionError::Channel(e.to_string()))?;

        let mut exit_status = None;
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        // Keep reading after ExitStatus: output may still follow it.
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
                ChannelMsg::ExtendedData { ref data, ext: _ } => stderr.extend_from_slice(data),
                ChannelMsg::ExitStatus { exit_status: code } => exit_status = Some(code),
                _ => {}
            }
        }

        Ok((exit_status, stdout, stderr))
    }
}

impl RemoteExecutor for SshExecutor {
    async fn execute(&self, command: &str) -> Result<ActionResult, ActionError> {
        let started = Instant::now();
        tracing::info!(target_host = %self.target(), user = %self.username, "connecting to firewall");

        let handle = self.connect().await?;
        tracing::info!(command = %command.trim(), "executing remote command");
        let outcome = Self::run_script(&handle, command).await;

        if let Err(e) = handle
            .disconnect(Disconnect::ByApplication, "", "English")
            .await
        {
            tracing::debug!(error = %e, "disconnect after action failed");
        }

        let (exit_status, stdout, stderr) = outcome?;
        let result = ActionResult {
            exit_status,
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        if !result.stdout.is_empty() {
            tracing::info!(output = %result.stdout, "firewall output");
        }
        if !result.stderr.is_empty() {
            tracing::error!(stderr = %result.stderr, "firewall error output");
        }
        tracing::info!(
            exit_status = %result.exit_status_label(),
            elapsed_ms = result.elapsed_ms,
            "remote command finished"
        );

        Ok(result)
    }
}
