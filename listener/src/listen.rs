use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use energenie_common::{
    logging, CommandGateway, GatewayOutcome, RuntimeConfig, SystemLines, ThreadDelay, Transmitter,
};
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use tracing::{debug, info, warn};

const DEFAULT_CONFIG_PATH: &str = "energenie.json";

pub async fn run() -> anyhow::Result<()> {
    let config_path = std::env::var_os("ENERGENIE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = RuntimeConfig::load(&config_path)
        .with_context(|| format!("failed to load runtime config {}", config_path.display()))?;
    logging::init(config.logging.file.as_deref()).context("failed to initialise logging")?;

    logging::log_failure(serve(&config).await)
}

async fn serve(config: &RuntimeConfig) -> anyhow::Result<()> {
    let lines = SystemLines::open(&config.gpio).context("failed to open gpio lines")?;
    let mut transmitter =
        Transmitter::new(lines, ThreadDelay).context("failed to initialise transmitter")?;
    let gateway = CommandGateway::new(config.listener.socket);

    let mut mqtt_options = MqttOptions::new(
        config.mqtt.client_id.clone(),
        config.mqtt.host.clone(),
        config.mqtt.port,
    );
    mqtt_options.set_keep_alive(Duration::from_secs(config.mqtt.keep_alive_secs.max(5)));
    if !config.mqtt.user.is_empty() {
        mqtt_options.set_credentials(config.mqtt.user.clone(), config.mqtt.pass.clone());
    }

    let (mqtt, mut eventloop) = AsyncClient::new(mqtt_options, 16);
    let topic = config.mqtt.topic.clone();

    info!(
        "listening on {} for receiver {} via {}:{}",
        topic,
        gateway.socket(),
        config.mqtt.host,
        config.mqtt.port
    );

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            event = eventloop.poll() => match event {
                Ok(Event::Incoming(Incoming::ConnAck(ack))) => {
                    info!("connected to mqtt broker: {:?}", ack.code);
                    // Sessions are clean, so every reconnect needs the subscription again.
                    mqtt.subscribe(topic.as_str(), QoS::AtMostOnce)
                        .await
                        .context("failed to queue subscription")?;
                }
                Ok(Event::Incoming(Incoming::Publish(message))) => {
                    info!("{} -> {}", message.topic, String::from_utf8_lossy(&message.payload));
                    // Handled to completion before the next poll so sends never overlap.
                    let outcome = tokio::task::block_in_place(|| {
                        gateway.handle_bytes(&message.payload, &mut transmitter)
                    })
                    .context("transmitter failure")?;
                    if let GatewayOutcome::Sent(state) = outcome {
                        debug!("receiver {} now {state}", gateway.socket());
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    warn!("mqtt poll error: {err}");
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            },
            _ = &mut shutdown => {
                info!("shutdown requested");
                break;
            }
        }
    }

    if let Err(err) = mqtt.disconnect().await {
        debug!("mqtt disconnect failed: {err}");
    }
    drop(transmitter);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!("failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
