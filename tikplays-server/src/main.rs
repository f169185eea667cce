use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use dotenv::dotenv;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use tikplays_common::models::LiveEvent;
use tikplays_common::traits::ProfileStore;
use tikplays_core::engine::OperatorCommand;
use tikplays_core::http::DefaultHttpClient;
use tikplays_core::normalizer::{DEFAULT_STREAK_CAPACITY, DEFAULT_STREAK_IDLE};
use tikplays_core::profiles::{FsProfileStore, default_data_dir};
use tikplays_core::services::ActionServices;
use tikplays_core::services::dispatch::default_key_presser;
use tikplays_core::{Engine, EngineConfig, EngineHandle, EventBus};

#[derive(Parser, Debug, Clone)]
#[command(name = "tikplays")]
#[command(author, version, about = "TikPlays - turns live-stream gifts, likes and follows into game actions")]
struct Args {
    /// Root of the profile data. Defaults to TIKPLAYS_DATA_DIR, then the platform data dir.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Base URL of the game-server command sink when the profile sets no host.
    #[arg(long, env = "SERVER_TAP_URL")]
    server_tap_url: Option<String>,

    /// Seconds after which an unreported gift streak is forgotten.
    #[arg(long, default_value_t = DEFAULT_STREAK_IDLE.as_secs())]
    streak_idle_secs: u64,

    #[arg(long, default_value_t = DEFAULT_STREAK_CAPACITY)]
    streak_capacity: usize,

    /// Per-observer queue length on the broadcast bus.
    #[arg(long, default_value_t = 256)]
    bus_buffer: usize,
}

const DEFAULT_LOG_FILTER: &str = "tikplays=info";

/// RUST_LOG when it is set and parses, otherwise `tikplays=info`.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn init_tracing() {
    let filter = log_filter(std::env::var("RUST_LOG").ok().as_deref());
    let sub = fmt().with_env_filter(filter).with_writer(std::io::stderr).finish();
    if let Err(e) = tracing::subscriber::set_global_default(sub) {
        eprintln!("tracing already initialised: {e}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();
    let args = Args::parse();

    let data_dir = args.data_dir.clone().unwrap_or_else(default_data_dir);
    let store = FsProfileStore::open(&data_dir)
        .with_context(|| format!("opening profile store at {}", data_dir.display()))?;
    info!("TikPlays starting. data_dir={}, active profile='{}'", store.root().display(), store.active_id());

    let bus = Arc::new(EventBus::with_buffer(args.bus_buffer));
    let observer = spawn_stdout_observer(&bus);

    let services = ActionServices {
        http: Arc::new(DefaultHttpClient::new()),
        keys: default_key_presser(),
        broadcaster: bus.clone(),
    };
    let config = EngineConfig {
        streak_capacity: args.streak_capacity,
        streak_idle_timeout: Duration::from_secs(args.streak_idle_secs),
        server_tap_url: args.server_tap_url.clone(),
    };

    let engine = Engine::new(Arc::new(store), services, config);
    let (handle, engine_task) = engine.spawn(args.bus_buffer);

    tokio::select! {
        res = read_stdin(handle) => {
            if let Err(e) = res {
                error!("stdin adapter failed: {:?}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    // The handle is gone once read_stdin returns or is cancelled.
    if let Err(e) = engine_task.await {
        warn!("engine task ended abnormally: {}", e);
    }
    bus.shutdown();
    let _ = observer.await;
    info!("TikPlays stopped");
    Ok(())
}

/// One JSON object per line: objects with `type` are live events, objects
/// with `command` are operator commands whose reply is printed to stdout.
async fn read_stdin(handle: EngineHandle) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let raw: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                warn!("ignoring malformed input line: {}", e);
                continue;
            }
        };

        if raw.get("command").is_some() {
            let reply = match OperatorCommand::from_value(&raw) {
                Ok(cmd) => handle.command(cmd).await,
                Err(e) => Err(e),
            };
            let out = match reply {
                Ok(reply) => json!({ "ok": true, "reply": reply }),
                Err(e) => json!({ "ok": false, "error": e.code(), "message": e.to_string() }),
            };
            println!("{}", out);
        } else if raw.get("type").is_some() {
            match serde_json::from_value::<LiveEvent>(raw) {
                Ok(event) => handle.live(event).await?,
                Err(e) => warn!("dropping unreadable live event: {}", e),
            }
        } else {
            warn!("input line has neither 'type' nor 'command'");
        }
    }

    info!("stdin closed");
    Ok(())
}

fn spawn_stdout_observer(bus: &Arc<EventBus>) -> tokio::task::JoinHandle<()> {
    let mut rx = bus.subscribe(None);
    let mut shutdown_rx = bus.shutdown_rx.clone();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                event = rx.recv() => match event {
                    Some(event) => match serde_json::to_string(&event) {
                        Ok(line) => println!("{}", line),
                        Err(e) => warn!("could not encode broadcast: {}", e),
                    },
                    None => break,
                },
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }
        // Flush whatever the engine published before shutdown.
        while let Ok(event) = rx.try_recv() {
            if let Ok(line) = serde_json::to_string(&event) {
                println!("{}", line);
            }
        }
    })
}
