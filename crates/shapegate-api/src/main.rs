//! shapegate CLI and webhook receiver entry point.
//!
//! Parses CLI arguments, loads the configuration, then either serves the
//! webhook endpoint or runs a one-off command.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use shapegate_infra::config::load_service_config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions need neither logging nor config.
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "shapegate", &mut std::io::stdout());
        return Ok(());
    }

    shapegate_observe::tracing_setup::init_tracing(cli.log_filter(), cli.json, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialise tracing: {e}"))?;

    let result = run(cli).await;
    shapegate_observe::tracing_setup::shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_service_config(&cli.config).await?;

    match cli.command {
        Commands::CheckConfig => {
            cli::check_config::print_config(&config, cli.json)?;
        }

        Commands::Apply { state } => {
            let app = AppState::init(&config)?;
            cli::apply::apply_state(&app.service, state.into(), cli.json).await?;
        }

        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if config.server.webhook_uuid.is_none() {
                tracing::warn!("WEBHOOK_UUID not set, serving on /webhook/default");
            }

            let app = AppState::init(&config)?;
            let service = std::sync::Arc::clone(&app.service);
            let watchdog = service.start_watchdog();

            let addr = config.server.bind_addr();
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!(
                %addr,
                webhook_path = %app.webhook_path,
                firewall = %config.fortigate.target(),
                policies = ?config.shaping.policy_ids,
                "webhook receiver started"
            );

            if !cli.quiet {
                println!(
                    "  {} shapegate listening on {}",
                    console::style("⚡").bold(),
                    console::style(format!("http://{addr}{}", app.webhook_path)).cyan()
                );
                println!("  {}", console::style("Press Ctrl+C to stop").dim());
            }

            let router = http::router::build_router(app);
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            service.shutdown();
            if let Err(e) = watchdog.await {
                tracing::warn!(error = %e, "inactivity watchdog ended abnormally");
            }
            tracing::info!("webhook receiver stopped");
        }

        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
