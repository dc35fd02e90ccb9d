//! pg-sentinel entry point.
//!
//! Starts the enabled watchers and the status HTTP server, then runs
//! until Ctrl+C.

use anyhow::Context;
use axum::Router;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use pg_sentinel::alerts::{HttpAlertSender, RiskSource, RiskWatcher};
use pg_sentinel::api;
use pg_sentinel::app_state::AppState;
use pg_sentinel::config::SentinelConfig;
use pg_sentinel::domain::{EventBus, StatusBoard};
use pg_sentinel::persistence::{PgChangeSource, PgRiskSource};
use pg_sentinel::replication::{
    ChangeSource, ProcessRunner, ReplicationWatcher, Replicator, dump_command, restore_command,
};
use pg_sentinel::scheduler::run_periodic;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    // Load configuration
    let config = SentinelConfig::from_env()?;
    if config.replication.is_none() && config.alerts.is_none() {
        anyhow::bail!("REPLICATION_ENABLED and ALERTS_ENABLED are both off, nothing to run");
    }
    tracing::info!(
        replication = config.replication.is_some(),
        alerts = config.alerts.is_some(),
        "starting pg-sentinel"
    );

    // Event plumbing
    let event_bus = EventBus::new(config.event_bus_capacity);
    let status_board = StatusBoard::new();
    let board_listener = status_board.spawn_listener(event_bus.subscribe());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut tasks = JoinSet::new();

    // Replication watcher
    if let Some(rep) = &config.replication {
        let source = PgChangeSource::new(rep.source.clone(), config.connect_timeout);
        let total = source
            .total_changes()
            .await
            .with_context(|| format!("cannot read change counter from {}", rep.source))?;
        tracing::info!(
            source = %rep.source,
            target = %rep.target,
            total_changes = total,
            "replication source reachable"
        );

        let replicator = Replicator::new(
            ProcessRunner,
            dump_command(&rep.pg_dump_bin, &rep.source, &rep.dump_file),
            restore_command(&rep.pg_restore_bin, &rep.target, &rep.dump_file),
        );
        let watcher = ReplicationWatcher::new(source, replicator, event_bus.clone());
        tasks.spawn(run_periodic(watcher, rep.interval, shutdown_rx.clone()));
    }

    // Risk alert watcher
    if let Some(alerts) = &config.alerts {
        let source = PgRiskSource::new(
            alerts.patient_db.clone(),
            alerts.user_db.clone(),
            config.connect_timeout,
        );
        source
            .doctor_email()
            .await
            .with_context(|| format!("cannot query users in {}", alerts.user_db))?;
        source
            .patient_risks()
            .await
            .with_context(|| format!("cannot query patients in {}", alerts.patient_db))?;
        tracing::info!(
            patients = %alerts.patient_db,
            users = %alerts.user_db,
            url = %alerts.notification_url,
            threshold = alerts.risk_threshold,
            "risk alert databases reachable"
        );

        let sender =
            HttpAlertSender::new(alerts.notification_url.clone(), alerts.notification_timeout)?;
        let watcher = RiskWatcher::new(source, sender, alerts.risk_threshold, event_bus.clone());
        tasks.spawn(run_periodic(watcher, alerts.interval, shutdown_rx.clone()));
    }

    // Status server
    if config.status_enabled {
        let app = Router::new()
            .merge(api::build_router())
            .layer(TraceLayer::new_for_http())
            .with_state(AppState::new(status_board.clone()));

        let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
        tracing::info!(addr = %config.listen_addr, "status server listening");

        let mut stop = shutdown_rx.clone();
        tasks.spawn(async move {
            let shutdown = async move {
                let _ = stop.wait_for(|stopped| *stopped).await;
            };
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                tracing::error!(error = %e, "status server failed");
            }
        });
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("received Ctrl+C, stopping after the current tick");
    let _ = shutdown_tx.send(true);

    while let Some(result) = tasks.join_next().await {
        if let Err(e) = result {
            tracing::warn!(error = %e, "task ended abnormally");
        }
    }

    // Watchers held the remaining senders; the listener drains and exits.
    drop(event_bus);
    let _ = board_listener.await;

    tracing::info!("pg-sentinel stopped");
    Ok(())
}

/// `RUST_LOG` filters (default `info`); `LOG_FORMAT=json` switches to
/// JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
