//! Scoreboard runtime
//!
//! Wires the store, dispatcher, broadcaster and transports together and runs
//! them until shutdown.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use bytes::Bytes;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::broadcast::{Broadcaster, SinkKind};
use crate::error::Result;
use crate::server::config::ScoreboardConfig;
use crate::server::dispatch::Dispatcher;
use crate::state::StateStore;
use crate::stats::SyncStats;
use crate::transport::{
    create_router, ConnectInfo, DisplaySink, HttpState, LogRenderer, PushHub, Renderer,
    WirelessLink,
};

/// How long open HTTP connections get to finish after shutdown
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// A fully wired scoreboard
pub struct Scoreboard {
    config: ScoreboardConfig,
    store: Arc<StateStore>,
    stats: Arc<SyncStats>,
    broadcaster: Arc<Broadcaster>,
    dispatcher: Dispatcher,
    display: Arc<DisplaySink>,
    wireless: Arc<WirelessLink>,
    notify_rx: Option<mpsc::Receiver<Bytes>>,
    http: HttpState,
}

impl Scoreboard {
    /// Build a scoreboard drawing through `renderer`
    pub fn new(config: ScoreboardConfig, renderer: impl Renderer + 'static) -> Self {
        let store = Arc::new(StateStore::new());
        let stats = Arc::new(SyncStats::new());
        let (inbound_tx, inbound_rx) = mpsc::channel(config.inbound_capacity.max(1));

        let display = Arc::new(DisplaySink::new(renderer, config.tap_debounce));
        let (wireless, notify_rx) = WirelessLink::new(
            inbound_tx.clone(),
            Arc::clone(&stats),
            config.notify_capacity,
            config.max_fragment_buffer,
        );
        let push = PushHub::new(config.push_capacity, Arc::clone(&stats));

        let mut broadcaster = Broadcaster::new(Arc::clone(&store), Arc::clone(&stats))
            .fallback_interval(config.tick_fallback_interval);
        broadcaster.attach(SinkKind::Render, display.clone());
        broadcaster.attach(SinkKind::Wireless, Arc::new(wireless.sink()));
        broadcaster.attach(SinkKind::PushStream, Arc::new(push.clone()));

        let dispatcher = Dispatcher::new(
            Arc::clone(&store),
            broadcaster.signal(),
            Arc::clone(&stats),
            inbound_rx,
        );
        let http = HttpState::new(
            Arc::clone(&store),
            inbound_tx,
            push,
            Arc::clone(&stats),
            &config.cors_origin,
        );

        Self {
            config,
            store,
            stats,
            broadcaster: Arc::new(broadcaster),
            dispatcher,
            display,
            wireless: Arc::new(wireless),
            notify_rx: Some(notify_rx),
            http,
        }
    }

    /// Build a scoreboard that renders to the log
    pub fn with_config(config: ScoreboardConfig) -> Self {
        let renderer = LogRenderer::new(ConnectInfo::from_config(&config));
        Self::new(config, renderer)
    }

    /// HTTP application
    pub fn router(&self) -> Router {
        create_router(self.http.clone())
    }

    /// Wireless link input side
    pub fn wireless(&self) -> Arc<WirelessLink> {
        Arc::clone(&self.wireless)
    }

    /// Take the wireless notify queue
    ///
    /// If nobody takes it before the scoreboard runs, notifications are
    /// drained and discarded.
    pub fn take_wireless_notify(&mut self) -> Option<mpsc::Receiver<Bytes>> {
        self.notify_rx.take()
    }

    /// Display sink, for tap input
    pub fn display(&self) -> Arc<DisplaySink> {
        Arc::clone(&self.display)
    }

    /// Live state store
    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// Live counters
    pub fn stats(&self) -> &Arc<SyncStats> {
        &self.stats
    }

    /// Configured HTTP bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.http_bind_addr
    }

    /// Bind the HTTP listener and run until `shutdown` resolves
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.http_bind_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Run on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(mut self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let addr = listener.local_addr()?;
        tracing::info!(addr = %addr, "Scoreboard HTTP API listening");

        let (stop_tx, stop_rx) = watch::channel(false);
        let app = self.router();
        let mut http_handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(stopped(stop_rx))
                .await
        });

        let broadcaster_handle = self.broadcaster.spawn();
        let stats_handle = spawn_stats_task(Arc::clone(&self.stats), self.config.stats_interval);
        let drain_handle = self.notify_rx.take().map(|mut rx| {
            tracing::debug!("No wireless radio attached, discarding notifications");
            tokio::spawn(async move { while rx.recv().await.is_some() {} })
        });

        // Initial frame so every sink starts from the current state
        self.broadcaster.request();

        self.dispatcher.run_until(shutdown).await;
        tracing::info!("Shutdown signal received");

        let _ = stop_tx.send(true);
        // Open event streams would hold graceful shutdown forever
        let result = match tokio::time::timeout(SHUTDOWN_GRACE, &mut http_handle).await {
            Ok(Ok(served)) => served.map_err(Into::into),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "HTTP server task failed");
                Ok(())
            }
            Err(_) => {
                tracing::warn!("HTTP connections still open after grace period, aborting");
                http_handle.abort();
                Ok(())
            }
        };

        broadcaster_handle.abort();
        if let Some(handle) = stats_handle {
            handle.abort();
        }
        if let Some(handle) = drain_handle {
            handle.abort();
        }

        result
    }
}

async fn stopped(mut rx: watch::Receiver<bool>) {
    // A dropped sender also means stop
    let _ = rx.wait_for(|stop| *stop).await;
}

fn spawn_stats_task(stats: Arc<SyncStats>, interval: Duration) -> Option<JoinHandle<()>> {
    if interval.is_zero() {
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let snapshot = stats.snapshot();
            tracing::info!(
                uptime_secs = snapshot.uptime.as_secs(),
                applied = snapshot.updates_applied,
                rejected = snapshot.updates_rejected,
                decode_errors = snapshot.decode_errors,
                passes = snapshot.fanout_passes,
                coalesced = snapshot.coalesced(),
                sink_failures = snapshot.sink_failures,
                push_subscribers = snapshot.push_subscribers,
                "Sync stats"
            );
        }
    }))
}
