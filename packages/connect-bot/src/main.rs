//! Connect Bot
//!
//! Connects to the configured Mumble server and runs the presence machine
//! until the session ends.

use std::sync::Arc;

use anyhow::{Context, Result};
use connect_bot::domains::presence::{edges, PresenceEffect, PresenceMachine};
use connect_bot::kernel::{BotDeps, MumbleGateway};
use connect_bot::runtime::Runtime;
use connect_bot::Config;
use futures::StreamExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,connect_bot=debug,mumble=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!(
        server = %config.server,
        username = %config.username,
        channel = ?config.channel_path,
        "Starting connect bot"
    );

    let client_config = mumble::ClientConfig {
        address: config.server.clone(),
        username: config.username.clone(),
        tls: config.tls_options(),
        password: config.password,
    };

    let (client, events) = mumble::connect(client_config)
        .await
        .with_context(|| format!("Failed to connect to {}", config.server))?;

    tracing::info!(session = ?client.own_session(), "Connected to {}", config.server);

    let deps = Arc::new(BotDeps::new(Arc::new(MumbleGateway::new(client.clone()))));
    let machine = PresenceMachine::new(
        config.default_connect_string,
        config.channel_path,
        config.self_name,
    );
    let mut runtime = Runtime::new(machine, PresenceEffect, deps);

    tokio::select! {
        outcome = runtime.run(events.map(edges::inbound)) => {
            tracing::info!(reason = outcome.reason(), "Connect bot stopped");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, disconnecting");
            client.disconnect();
        }
    }

    Ok(())
}
