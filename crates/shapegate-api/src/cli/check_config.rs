//! `shapegate check-config`: show the effective configuration.

use serde_json::{Value, json};

use shapegate_types::config::ServiceConfig;

const REDACTED: &str = "********";

/// Effective configuration as JSON, with every secret replaced.
pub fn redacted_summary(config: &ServiceConfig) -> Value {
    let secret = |present: bool| if present { json!(REDACTED) } else { Value::Null };

    json!({
        "server": {
            "host": config.server.host,
            "port": config.server.port,
            "webhook_path": config.server.webhook_path(),
        },
        "auth": {
            "token": secret(config.auth.token.is_some()),
        },
        "fortigate": {
            "host": config.fortigate.host,
            "port": config.fortigate.port,
            "username": config.fortigate.username,
            "password": secret(config.fortigate.password.is_some()),
            "private_key_path": config.fortigate.private_key_path,
            "private_key_passphrase": secret(config.fortigate.private_key_passphrase.is_some()),
            "connect_timeout_secs": config.fortigate.connect_timeout_secs,
            "host_key_fingerprint": config.fortigate.host_key_fingerprint,
        },
        "shaping": {
            "policy_ids": config.shaping.policy_ids,
        },
        "timing": {
            "disable_delay_secs": config.timing.disable_delay_secs,
            "inactivity_timeout_secs": config.timing.inactivity_timeout_secs,
            "inactivity_check_interval_secs": config.timing.inactivity_check_interval_secs,
            "action_timeout_secs": config.timing.action_timeout_secs,
        },
    })
}

pub fn print_config(config: &ServiceConfig, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&redacted_summary(config))?);
        return Ok(());
    }

    let auth_method = if config.fortigate.private_key_path.is_some() {
        "private key"
    } else {
        "password"
    };
    let action_timeout = match config.timing.action_timeout_secs {
        Some(secs) => format!("{secs}s"),
        None => "none".to_string(),
    };
    let policies = config
        .shaping
        .policy_ids
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    println!();
    println!(
        "  {} Configuration is valid",
        console::style("✓").green().bold()
    );
    println!();
    println!(
        "  Listen        {}",
        console::style(config.server.bind_addr()).cyan()
    );
    println!(
        "  Webhook       {}",
        console::style(config.server.webhook_path()).cyan()
    );
    if config.server.webhook_uuid.is_none() {
        println!(
            "                {}",
            console::style("no webhook_uuid set, using the default path").yellow()
        );
    }
    println!("  Token         {}", console::style(REDACTED).dim());
    println!(
        "  FortiGate     {}@{} ({auth_method})",
        config.fortigate.username,
        config.fortigate.target()
    );
    println!("  Policies      {policies}");
    println!(
        "  Timing        disable after {}s, idle timeout {}s (checked every {}s), action timeout {action_timeout}",
        config.timing.disable_delay_secs,
        config.timing.inactivity_timeout_secs,
        config.timing.inactivity_check_interval_secs,
    );
    println!();

    Ok(())
}
