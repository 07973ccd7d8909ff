// MIT License - Copyright (c) 2026 Peter Wright
// Polling coordinator

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, warn};

use crate::client::{self, ClientError, SharedClient};
use crate::error::UpdateError;

/// Broadcast to entity publishers after every refresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateEvent {
    /// Cached client state is now current.
    Updated,
    /// Transient failure; the next scheduled poll retries.
    UpdateFailed,
    /// Credentials rejected. Emitted once per occurrence; polling stops
    /// until the operator re-authenticates and the bridge reloads.
    ReauthRequired,
}

/// Drives the fixed-cadence metadata refresh against the client.
///
/// One instance per bridge. All blocking client I/O is delegated to the
/// runtime's blocking pool; the run loop serializes scheduled ticks and
/// forced post-command refreshes so only one refresh is in flight at a time.
pub struct Coordinator {
    client: SharedClient,
    event_tx: broadcast::Sender<UpdateEvent>,
    refresh_tx: mpsc::UnboundedSender<()>,
    refresh_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<()>>,
    reauth_latched: AtomicBool,
}

impl Coordinator {
    pub fn new(client: SharedClient) -> Self {
        let (event_tx, _) = broadcast::channel(32);
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();
        Self {
            client,
            event_tx,
            refresh_tx,
            refresh_rx: tokio::sync::Mutex::new(refresh_rx),
            reauth_latched: AtomicBool::new(false),
        }
    }

    pub fn client(&self) -> &SharedClient {
        &self.client
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UpdateEvent> {
        self.event_tx.subscribe()
    }

    /// Queue a forced out-of-cycle refresh (used after successful commands).
    pub fn request_refresh(&self) {
        // The run loop holds the receiver for its whole life, so this can
        // only fail once the coordinator itself is being torn down.
        let _ = self.refresh_tx.send(());
    }

    /// Route a command-time usercode rejection into the re-authentication
    /// flow, once per occurrence.
    pub fn trigger_reauth(&self) {
        if !self.reauth_latched.swap(true, Ordering::SeqCst) {
            let _ = self.event_tx.send(UpdateEvent::ReauthRequired);
        }
    }

    /// One refresh pass: fetch panel/zone metadata for every known location.
    ///
    /// Also called once during bridge setup, before any entity publishes
    /// state.
    pub async fn refresh(&self) -> Result<(), UpdateError> {
        let client = Arc::clone(&self.client);
        let result = task::spawn_blocking(move || {
            let mut client = client::lock(&client);
            let ids: Vec<u32> = client.locations().keys().copied().collect();
            for id in ids {
                client.refresh_metadata(id)?;
            }
            Ok(())
        })
        .await
        .unwrap_or_else(|join| Err(ClientError::Other(format!("refresh task failed: {join}"))));

        match result {
            Ok(()) => {
                self.reauth_latched.store(false, Ordering::SeqCst);
                let _ = self.event_tx.send(UpdateEvent::Updated);
                Ok(())
            }
            Err(err) if err.requires_reauth() => {
                self.trigger_reauth();
                Err(UpdateError::AuthFailed)
            }
            Err(err) => {
                let _ = self.event_tx.send(UpdateEvent::UpdateFailed);
                Err(UpdateError::Failed(err.to_string()))
            }
        }
    }

    /// The poll loop: a refresh on every tick, plus any forced refreshes
    /// queued by [`request_refresh`](Self::request_refresh).
    ///
    /// Returns when an authentication failure is hit — a rejected credential
    /// set is never silently retried.
    pub async fn run(&self, poll_interval: Duration) {
        let mut forced = self.refresh_rx.lock().await;
        let mut ticker = time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The interval fires immediately; setup already did the first
        // refresh, so swallow that tick.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => debug!("Scheduled refresh"),
                _ = forced.recv() => debug!("Forced refresh"),
            }
            match self.refresh().await {
                Ok(()) => {}
                Err(UpdateError::AuthFailed) => {
                    error!("Authentication failed during refresh; polling stopped until reauth");
                    break;
                }
                Err(UpdateError::Failed(reason)) => {
                    warn!("Refresh failed, retrying on next poll: {reason}");
                }
            }
        }
    }
}
