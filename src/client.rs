//! Async facade over one controller system.
//!
//! [`RioClient`] owns the TCP connection and a driver task that is the single
//! caller into the core: it feeds inbound lines, fires connect/disconnect
//! transitions and services the deferred-task queue. Facade methods serialize
//! through the same mutex, so every call sees and leaves a consistent core.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::connection::{Connection, ConnectionEvent};
use crate::error::Result;
use crate::persist::{InMemoryPersistence, Persistence};
use crate::selection::Subpage;
use crate::sink::{DisplaySink, NullSink};
use crate::system::RioSystem;
use crate::types::{
    Source, SourceId, SourceListEntry, SystemConfig, Zone, ZoneId, ZoneListEntry,
};

/// How long shutdown waits for the driver task to wind down
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Client for talking to a Russound controller system over TCP
///
/// One client per controller stack. Dropping the client stops its driver
/// task; [`shutdown`](RioClient::shutdown) does the same but waits for it.
pub struct RioClient {
    system: Arc<Mutex<RioSystem>>,
    stop_tx: Option<broadcast::Sender<()>>,
    driver: Option<JoinHandle<()>>,
}

impl RioClient {
    /// Connect with a quiet sink and in-memory last-selection storage.
    ///
    /// The standard RIO port is [`DEFAULT_PORT`](crate::DEFAULT_PORT).
    /// Discovery of all configured sources and zones starts as soon as the
    /// connection is up.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use russound_rio::{RioClient, SystemConfig, DEFAULT_PORT};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let mut client =
    ///         RioClient::connect("192.168.1.250", DEFAULT_PORT, SystemConfig::default()).await?;
    ///
    ///     tokio::time::sleep(std::time::Duration::from_secs(2)).await;
    ///     for entry in client.zones() {
    ///         println!("{}  {}", entry.zone, entry.name);
    ///     }
    ///
    ///     client.shutdown().await;
    ///     Ok(())
    /// }
    /// ```
    pub async fn connect(
        host: impl Into<String>,
        port: u16,
        config: SystemConfig,
    ) -> Result<Self> {
        Self::connect_with(
            host,
            port,
            config,
            Box::new(NullSink),
            Box::new(InMemoryPersistence::default()),
        )
        .await
    }

    /// Connect with caller-supplied display sink and persistence collaborators
    pub async fn connect_with(
        host: impl Into<String>,
        port: u16,
        config: SystemConfig,
        sink: Box<dyn DisplaySink>,
        persistence: Box<dyn Persistence>,
    ) -> Result<Self> {
        let connection = Connection::connect(host, port).await?;
        let transport = Box::new(connection.sender());
        let system = Arc::new(Mutex::new(RioSystem::new(
            config,
            transport,
            sink,
            persistence,
        )));

        let (stop_tx, _) = broadcast::channel(1);
        let driver = tokio::spawn(drive(system.clone(), connection, stop_tx.subscribe()));

        Ok(Self {
            system,
            stop_tx: Some(stop_tx),
            driver: Some(driver),
        })
    }

    /// Stop the driver task and close the connection
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.driver.take() {
            let _ = tokio::time::timeout(SHUTDOWN_GRACE, handle).await;
        }
    }

    pub fn config(&self) -> SystemConfig {
        self.system.lock().unwrap().config()
    }

    // ---- selection -------------------------------------------------------

    /// Make `zone` the current zone; see [`RioSystem::select_zone`]
    pub fn select_zone(&self, zone: ZoneId) -> Result<()> {
        self.system.lock().unwrap().select_zone(zone)
    }

    /// Switch the current zone to `source`; see [`RioSystem::select_source`]
    pub fn select_source(&self, source: SourceId) -> Result<()> {
        self.system.lock().unwrap().select_source(source)
    }

    pub fn current_zone(&self) -> Option<ZoneId> {
        self.system.lock().unwrap().current_zone()
    }

    pub fn watched_source(&self) -> Option<SourceId> {
        self.system.lock().unwrap().watched_source()
    }

    pub fn subpage(&self) -> Option<Subpage> {
        self.system.lock().unwrap().subpage()
    }

    /// Report the host's secondary list overlay as open or closed
    pub fn set_overlay_open(&self, open: bool) {
        self.system.lock().unwrap().set_overlay_open(open);
    }

    // ---- state snapshots -------------------------------------------------

    /// Snapshot of one zone's state
    pub fn zone(&self, id: ZoneId) -> Result<Zone> {
        self.system.lock().unwrap().store().zone(id).cloned()
    }

    /// Snapshot of one source's state
    pub fn source(&self, id: SourceId) -> Result<Source> {
        self.system.lock().unwrap().store().source(id).cloned()
    }

    /// Discovered zones with names, in discovery order
    pub fn zones(&self) -> Vec<ZoneListEntry> {
        self.system.lock().unwrap().store().zone_entries()
    }

    /// Discovered sources with names and types, in completion order
    pub fn sources(&self) -> Vec<SourceListEntry> {
        self.system.lock().unwrap().store().source_entries()
    }

    // ---- key actions -----------------------------------------------------

    pub fn all_zones_on(&self) -> Result<()> {
        self.system.lock().unwrap().all_zones_on()
    }

    pub fn all_zones_off(&self) -> Result<()> {
        self.system.lock().unwrap().all_zones_off()
    }

    /// Toggle power on the current zone
    pub fn zone_power_toggle(&self) -> Result<()> {
        self.system.lock().unwrap().zone_power_toggle()
    }

    pub fn volume_up(&self) -> Result<()> {
        self.system.lock().unwrap().volume_up()
    }

    pub fn volume_down(&self) -> Result<()> {
        self.system.lock().unwrap().volume_down()
    }

    pub fn mute_toggle(&self) -> Result<()> {
        self.system.lock().unwrap().mute_toggle()
    }

    pub fn dnd_toggle(&self) -> Result<()> {
        self.system.lock().unwrap().dnd_toggle()
    }

    pub fn party_mode_toggle(&self) -> Result<()> {
        self.system.lock().unwrap().party_mode_toggle()
    }
}

/// Drive the core: connection events, deferred deadlines, shutdown.
///
/// The mutex is held only for the synchronous core calls, never across an
/// await point. When the stop channel closes (client dropped) the loop ends.
async fn drive(
    system: Arc<Mutex<RioSystem>>,
    mut connection: Connection,
    mut stop_rx: broadcast::Receiver<()>,
) {
    loop {
        let deadline = system.lock().unwrap().next_deadline();
        let timer = async {
            match deadline {
                Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = stop_rx.recv() => {
                tracing::info!("client driver stopping");
                break;
            }
            event = connection.next_event() => match event {
                Some(ConnectionEvent::Connected) => {
                    system.lock().unwrap().handle_connect(Instant::now());
                }
                Some(ConnectionEvent::Line(line)) => {
                    system.lock().unwrap().handle_line(&line, Instant::now());
                }
                Some(ConnectionEvent::Disconnected) | None => {
                    system.lock().unwrap().handle_disconnect();
                    break;
                }
            },
            _ = timer => {
                system.lock().unwrap().fire_due(Instant::now());
            }
        }
    }
}
