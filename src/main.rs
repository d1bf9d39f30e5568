use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use arriba::auth::{AuthGate, StaticAuth};
use arriba::engine::{CompletionPolicy, Engine, EngineConfig};
use arriba::form::RevalidatePolicy;
use arriba::model::FeeSchedule;
use arriba::notify::NotificationLog;
use arriba::store::JsonStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let metrics_port: Option<u16> = std::env::var("ARRIBA_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    arriba::observability::init(metrics_port);

    let data_dir = std::env::var("ARRIBA_DATA_DIR").unwrap_or_else(|_| "./data".into());
    let admin_email =
        std::env::var("ARRIBA_ADMIN_EMAIL").unwrap_or_else(|_| "admin@arriba.example".into());
    let admin_password = std::env::var("ARRIBA_ADMIN_PASSWORD").unwrap_or_else(|_| "arriba".into());
    let room_fee: i64 = std::env::var("ARRIBA_ROOM_FEE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(FeeSchedule::default().room_fee_per_night);
    let extra_bed_fee: i64 = std::env::var("ARRIBA_EXTRA_BED_FEE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(FeeSchedule::default().extra_bed_fee_per_bed);
    let session_timeout_secs: u64 = std::env::var("ARRIBA_SESSION_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1800);
    let completion: CompletionPolicy = std::env::var("ARRIBA_COMPLETION_POLICY")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_default();
    let fresh_recheck = std::env::var("ARRIBA_FRESH_RECHECK")
        .map(|s| s == "1" || s.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let revalidate = if fresh_recheck {
        RevalidatePolicy::FreshSnapshot
    } else {
        RevalidatePolicy::CachedSnapshot
    };

    std::fs::create_dir_all(&data_dir)?;

    let store = Arc::new(JsonStore::open(PathBuf::from(&data_dir))?);
    let notify = Arc::new(arriba::notify::NotifyHub::new());
    let engine = Arc::new(Engine::new(
        store,
        notify.clone(),
        EngineConfig {
            fees: FeeSchedule {
                room_fee_per_night: room_fee,
                extra_bed_fee_per_bed: extra_bed_fee,
            },
            completion,
        },
    ));
    let auth = Arc::new(AuthGate::new(
        Arc::new(StaticAuth::new(admin_email.clone(), admin_password)),
        Duration::from_secs(session_timeout_secs),
    ));

    info!("arriba booking engine started");
    info!("  data_dir: {data_dir}");
    info!("  admin: {admin_email}");
    info!("  fees: {room_fee}/night, {extra_bed_fee}/extra bed");
    info!("  completion policy: {completion:?}");
    info!("  submit revalidation: {revalidate:?}");
    info!(
        "  metrics: {}",
        metrics_port.map_or("disabled".to_string(), |p| format!(
            "http://0.0.0.0:{p}/metrics"
        ))
    );

    // Mirror every lifecycle event into the persistent notification log
    let log_path = PathBuf::from(&data_dir).join("notifications.json");
    let log = Arc::new(tokio::sync::Mutex::new(NotificationLog::load(
        log_path.clone(),
    )));
    let mut events = notify.subscribe();
    let log_writer = log.clone();
    let log_task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let mut log = log_writer.lock().await;
                    log.record(&event);
                    log.persist();
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("notification log lagged, {n} events dropped");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut auth_states = auth.subscribe();
    tokio::spawn(async move {
        while auth_states.changed().await.is_ok() {
            let state = auth_states.borrow().clone();
            info!("auth state changed: {state:?}");
        }
    });

    let shutdown = async {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            let mut sigterm =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("failed to register SIGTERM handler");
            tokio::select! {
                _ = ctrl_c => {}
                _ = sigterm.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            ctrl_c.await.ok();
        }
    };
    shutdown.await;
    info!("shutdown signal received");

    // Drop our subscription path so the log task sees Closed, then flush
    drop(engine);
    drop(notify);
    let _ = tokio::time::timeout(Duration::from_secs(5), log_task).await;
    log.lock().await.persist();
    auth.sign_out().await;

    info!("arriba stopped");
    Ok(())
}
