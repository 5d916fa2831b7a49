//! `gamecode simulate`: run the reserve-then-join flow in process.

use anyhow::{Context, Result};
use gamecode_core::{ClientInfo, GameCode};
use gamecode_plugin::{
    BeforeCreateEvent, BeforeJoinEvent, ClientConnection, CustomGameCodePlugin, JoinOutcome,
    MemoryConnection, MemoryWorker, PluginConfig, Worker,
};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

pub async fn run(config_path: &Path, code: &str, settings: &str, taken: &[String]) -> Result<()> {
    let config = PluginConfig::load(Some(config_path))
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    let settings: Value = serde_json::from_str(settings).context("settings must be valid JSON")?;
    let code = GameCode::parse(code).context("invalid join code")?;

    let worker = Arc::new(MemoryWorker::<Value>::new());
    for existing in taken {
        let existing = GameCode::parse(existing)
            .with_context(|| format!("invalid taken code '{existing}'"))?;
        worker.create_room(existing, Value::Null).await?;
    }

    let plugin = CustomGameCodePlugin::new(worker, config);
    plugin.on_load().await;

    let client = Arc::new(MemoryConnection::new(sim_client()));
    println!("client: {}", client.info().username);

    let mut create = BeforeCreateEvent::new(client.clone(), settings);
    plugin.bridge().on_before_create(&mut create).await;
    println!("create: canceled={}", create.is_canceled());
    print_last_disconnect(&client);

    let mut join = BeforeJoinEvent::new(client.clone(), code);
    let outcome = plugin.bridge().on_before_join(&mut join).await;
    println!("join {code}: {}", describe(outcome));
    match join.room() {
        Some(room) => println!("  room: {} {}", room.code, room.settings),
        None => print_last_disconnect(&client),
    }
    println!("reservations pending: {}", plugin.store().len().await);

    plugin.on_unload().await;
    Ok(())
}

fn sim_client() -> ClientInfo {
    ClientInfo {
        remote_addr: std::net::Ipv4Addr::LOCALHOST.into(),
        username: "simulator".into(),
        client_version: "2021.6.30".into(),
        platform: "StandaloneSteamPC".into(),
        language: 0,
        mods: Vec::new(),
    }
}

fn print_last_disconnect(client: &MemoryConnection) {
    if let Some(reason) = client.last_disconnect() {
        println!("  disconnect: {reason}");
    }
}

fn describe(outcome: JoinOutcome) -> &'static str {
    match outcome {
        JoinOutcome::Passthrough => "passthrough",
        JoinOutcome::Canceled => "canceled",
        JoinOutcome::CodeInUse => "code in use",
        JoinOutcome::Created => "created",
        JoinOutcome::CreationFailed => "creation failed",
    }
}
