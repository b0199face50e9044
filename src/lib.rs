//! Rust client library for Russound RIO multi-zone audio controllers
//!
//! This library speaks the RIO text control protocol used by Russound MCA
//! and MBX series matrix controllers. It supports:
//!
//! - Decoding inbound status lines into a structured model of controllers, zones and sources
//! - Idempotent state tracking with change-gated display notifications
//! - Zone and source watch subscriptions (exactly one zone, at most one source)
//! - Outbound GET/WATCH/EVENT command construction and key events
//! - Staggered whole-system discovery on connect
//! - Source-category subpage resolution with power-gated visibility
//! - A tokio TCP line transport and async client facade
//!
//! # Quick Start
//!
//! ```no_run
//! use russound_rio::{RioClient, SystemConfig, ZoneId, DEFAULT_PORT};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client =
//!         RioClient::connect("192.168.1.250", DEFAULT_PORT, SystemConfig::default()).await?;
//!
//!     // Discovery sweeps every configured source and zone shortly after
//!     // connect; give it a moment before reading the lists.
//!     tokio::time::sleep(std::time::Duration::from_secs(2)).await;
//!
//!     for entry in client.zones() {
//!         println!("{}  {}", entry.zone, entry.name);
//!     }
//!
//!     client.select_zone(ZoneId::new(1, 1))?;
//!     client.volume_up()?;
//!
//!     client.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Driving the core directly
//!
//! The protocol core is runtime-free. Hosts with their own event loop can
//! construct a [`RioSystem`] with injected collaborators and feed it lines
//! themselves:
//!
//! ```
//! use std::time::Instant;
//! use russound_rio::{
//!     NullPersistence, NullSink, Result, RioSystem, SystemConfig, Transport, ZoneId,
//! };
//!
//! struct StdoutTransport;
//!
//! impl Transport for StdoutTransport {
//!     fn send(&mut self, line: &str) -> Result<()> {
//!         print!("-> {line}");
//!         Ok(())
//!     }
//! }
//!
//! let mut system = RioSystem::new(
//!     SystemConfig::default(),
//!     Box::new(StdoutTransport),
//!     Box::new(NullSink),
//!     Box::new(NullPersistence),
//! );
//!
//! // The first named zone becomes the current zone automatically.
//! system.handle_line("N C[1].Z[1].name=\"Kitchen\"", Instant::now());
//! assert_eq!(system.current_zone(), Some(ZoneId::new(1, 1)));
//! ```
//!
//! # Architecture
//!
//! The library is organized into several layers:
//!
//! - **Client**: async facade owning the connection and the driver task
//! - **Connection**: CR-framed TCP line transport
//! - **System**: event-driven core coordinating the pieces below
//! - **Protocol**: inbound message grammar and ordered classification
//! - **Command**: outbound message construction
//! - **State**: controller/zone/source store with dedup semantics
//! - **Selection**: current zone/source machine and the subpage table
//!
//! Rendering, last-selection storage and reconnect policy stay with the
//! host, reached through the [`DisplaySink`], [`Persistence`] and
//! [`Transport`] traits.

mod client;
pub mod command;
mod connection;
mod discovery;
mod error;
mod persist;
pub mod protocol;
mod scheduler;
mod selection;
mod sink;
mod state;
mod system;
mod types;

// Public exports
pub use client::RioClient;
pub use connection::{Connection, ConnectionEvent, LineSender, Transport, DEFAULT_PORT};
pub use discovery::{QUERY_STEP, ZONE_QUERY_OFFSET};
pub use error::{AddressKind, Result, RioError};
pub use persist::{InMemoryPersistence, NullPersistence, Persistence};
pub use selection::Subpage;
pub use sink::{DisplaySink, NullSink};
pub use state::{SourceApplied, StateStore, ZoneApplied};
pub use system::{RioSystem, COLLAPSE_DELAY};
pub use types::{
    Controller, ControllerId, ControllerParam, DndState, PartyMode, ShuffleMode, Source,
    SourceId, SourceListEntry, SourceParam, Switch, SystemConfig, Zone, ZoneId, ZoneListEntry,
    ZoneParam, ZoneStatus,
};
