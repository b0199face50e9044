//! The event-driven core of the client.
//!
//! [`RioSystem`] owns the state store, the selection machine and the timer
//! queue, and talks to the outside world through three injected
//! collaborators: a [`Transport`] for outbound lines, a [`DisplaySink`] for
//! render notifications and a [`Persistence`] store for the last-selected
//! zone. It has no thread or runtime of its own; whoever drives it feeds
//! inbound lines to [`handle_line`], fires connect/disconnect transitions and
//! services the timer queue via [`next_deadline`] / [`fire_due`]. All calls
//! happen on one logical thread of control.
//!
//! Inbound failures never escape: unrecognized messages are dropped by the
//! decoder, unknown parameters and unparseable values are ignored by the
//! store, and out-of-range addresses are logged and discarded. Errors only
//! surface from the user-action methods, where the caller can act on them.
//!
//! [`handle_line`]: RioSystem::handle_line
//! [`next_deadline`]: RioSystem::next_deadline
//! [`fire_due`]: RioSystem::fire_due

use std::time::{Duration, Instant};

use crate::command;
use crate::connection::Transport;
use crate::discovery;
use crate::error::Result;
use crate::persist::Persistence;
use crate::protocol::{self, RioMessage, SourceUpdate, ZoneUpdate};
use crate::scheduler::{DeferredTask, TimerQueue};
use crate::selection::{SelectionState, Subpage};
use crate::sink::DisplaySink;
use crate::state::StateStore;
use crate::types::{
    DndState, PartyMode, SourceId, SourceParam, SystemConfig, ZoneId, ZoneParam, ZoneStatus,
};

/// Delay between hiding an open overlay and collapsing the zone-control
/// surface beneath it. Collapsing both at once makes the panel flicker.
pub const COLLAPSE_DELAY: Duration = Duration::from_millis(500);

/// Core state machine for one Russound system.
///
/// One instance per controller stack; independent systems are independent
/// instances with their own collaborators.
pub struct RioSystem {
    store: StateStore,
    selection: SelectionState,
    queue: TimerQueue,
    transport: Box<dyn Transport>,
    sink: Box<dyn DisplaySink>,
    persistence: Box<dyn Persistence>,
}

impl RioSystem {
    pub fn new(
        config: SystemConfig,
        transport: Box<dyn Transport>,
        sink: Box<dyn DisplaySink>,
        persistence: Box<dyn Persistence>,
    ) -> Self {
        Self {
            store: StateStore::new(config),
            selection: SelectionState::default(),
            queue: TimerQueue::new(),
            transport,
            sink,
            persistence,
        }
    }

    pub fn config(&self) -> SystemConfig {
        self.store.config()
    }

    /// Read access to the live device state
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn current_zone(&self) -> Option<ZoneId> {
        self.selection.current_zone()
    }

    pub fn watched_source(&self) -> Option<SourceId> {
        self.selection.watched_source()
    }

    /// Subpage last applied to the sink
    pub fn subpage(&self) -> Option<Subpage> {
        self.selection.subpage
    }

    /// The host's secondary overlay state, as last reported or forced
    pub fn overlay_open(&self) -> bool {
        self.selection.overlay_open
    }

    // ---- connection lifecycle -------------------------------------------

    /// The transport came up. Restores the persisted selection (falling back
    /// to the zone that was current before a reconnect) and schedules the
    /// discovery sweep.
    pub fn handle_connect(&mut self, now: Instant) {
        tracing::info!("connected, starting discovery");
        self.queue.clear();
        self.selection.clear_watches();

        let restore = self
            .persistence
            .last_selection()
            .or(self.selection.current_zone());
        if let Some(zone) = restore {
            if let Err(err) = self.select_zone(zone) {
                tracing::warn!(%zone, %err, "could not restore last selection");
            }
        }

        discovery::schedule_discovery(self.store.config(), &mut self.queue, now);
    }

    /// The transport went away. Pending timers are useless now; the device
    /// forgets watches on disconnect, so the selection machine does too.
    pub fn handle_disconnect(&mut self) {
        tracing::info!("disconnected");
        self.queue.clear();
        self.selection.clear_watches();
    }

    // ---- inbound path ----------------------------------------------------

    /// Process one raw line from the transport.
    ///
    /// Every failure in here is local: logged and dropped, never propagated.
    pub fn handle_line(&mut self, raw_line: &str, now: Instant) {
        for message in protocol::decode(raw_line) {
            match message {
                RioMessage::Zone(update) => self.on_zone_update(update, now),
                RioMessage::Source(update) => self.on_source_update(update),
                RioMessage::Controller(update) => {
                    match self.store.apply_controller_update(
                        update.controller,
                        &update.param,
                        &update.value,
                    ) {
                        // Controller metadata has no render surface to notify.
                        Ok(_) => {}
                        Err(err) => {
                            tracing::warn!(%err, "dropping controller update")
                        }
                    }
                }
                RioMessage::Event(event) => {
                    // The device echoes key events for zones we watch; nothing
                    // to do with them, state arrives as zone updates anyway.
                    tracing::trace!(
                        controller = event.controller,
                        zone = event.zone,
                        body = %event.body,
                        "ignoring inbound event"
                    );
                }
            }
        }
    }

    fn on_zone_update(&mut self, update: ZoneUpdate, now: Instant) {
        let id = update.zone_id();
        let applied = match self.store.apply_zone_update(id, &update.param, &update.value) {
            Ok(Some(applied)) => applied,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(%err, "dropping zone update");
                return;
            }
        };

        let is_current = self.selection.current_zone() == Some(id);
        if is_current {
            self.sink.zone_changed(id, applied.param, &update.value);
        }

        match applied.param {
            ZoneParam::Name => {
                // Only real name changes reach this point, so repeated
                // discovery replies cannot produce duplicate list entries.
                if applied.listed || self.listed_zone(id) {
                    self.sink.zone_list_changed();
                }
                if self.selection.current_zone().is_none() {
                    tracing::info!(zone = %id, name = %update.value, "auto-selecting first named zone");
                    if let Err(err) = self.select_zone(id) {
                        tracing::warn!(%err, "auto-select failed");
                    }
                }
            }
            ZoneParam::Status if is_current => self.apply_status_visibility(now),
            ZoneParam::CurrentSource if is_current => {
                if let Err(err) = self.follow_zone_source() {
                    tracing::warn!(%err, "source watch change failed");
                }
            }
            _ => {}
        }
    }

    fn on_source_update(&mut self, update: SourceUpdate) {
        let id = update.source;
        let applied = match self.store.apply_source_update(id, &update.param, &update.value) {
            Ok(Some(applied)) => applied,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(%err, "dropping source update");
                return;
            }
        };

        let is_watched = self.selection.watched_source() == Some(id);
        if is_watched {
            self.sink.source_changed(id, applied.param, &update.value);
        }

        match applied.param {
            SourceParam::Name => {
                if applied.listed || self.listed_source(id) {
                    self.sink.source_list_changed();
                }
            }
            SourceParam::Type => {
                if applied.listed {
                    self.sink.source_list_changed();
                }
                // The subpage is a function of the watched source's type.
                if is_watched {
                    self.apply_subpage();
                }
            }
            _ => {}
        }
    }

    // ---- selection -------------------------------------------------------

    /// Make `zone` the current zone.
    ///
    /// Unwatches the previous zone if it differs, watches the new one (always,
    /// so re-selection refreshes the stream), persists the choice and
    /// re-derives the watched source and surface visibility from stored state.
    pub fn select_zone(&mut self, zone: ZoneId) -> Result<()> {
        if let Err(err) = self.store.config().validate_zone(zone) {
            tracing::warn!(%err, "rejecting zone selection");
            return Err(err);
        }

        let watch = self.selection.select_zone(zone);
        if let Some(previous) = watch.off {
            self.send_line(&command::watch_zone(previous, false))?;
        }
        self.send_line(&command::watch_zone(watch.on, true))?;
        self.persistence.set_last_selection(zone);
        tracing::info!(zone = %zone, name = self.store.zone(zone)?.name, "zone selected");

        // A collapse queued for the previous zone must not hide the new one.
        self.queue.cancel_collapse();
        self.follow_zone_source()?;

        if self.store.zone(zone)?.status == ZoneStatus::On {
            self.show_surface();
        } else {
            if self.selection.overlay_open {
                self.selection.overlay_open = false;
                self.sink.overlay_visible(false);
            }
            if self.selection.controls_visible {
                self.hide_surface();
            }
        }
        Ok(())
    }

    /// User picked a source. Moves the source watch if needed, always
    /// re-applies the subpage (re-picking the same source must refresh the
    /// page), and tells the current zone to switch over.
    pub fn select_source(&mut self, source: SourceId) -> Result<()> {
        if let Err(err) = self.store.config().validate_source(source) {
            tracing::warn!(%err, "rejecting source selection");
            return Err(err);
        }

        let watch = self.selection.follow_source(Some(source));
        if let Some(previous) = watch.off {
            self.send_line(&command::watch_source(previous, false))?;
        }
        if let Some(next) = watch.on {
            self.send_line(&command::watch_source(next, true))?;
        }

        self.apply_subpage();

        match self.selection.current_zone() {
            Some(zone) => {
                self.send_line(&command::event_message(
                    zone,
                    "SelectSource",
                    &[&source.to_string()],
                ))?;
            }
            None => {
                tracing::warn!(source, "no zone selected, not sending SelectSource");
            }
        }
        Ok(())
    }

    /// The host opened or closed its secondary list overlay. The core only
    /// needs this to sequence the two-step hide when the zone powers off.
    pub fn set_overlay_open(&mut self, open: bool) {
        self.selection.overlay_open = open;
    }

    // ---- user key actions --------------------------------------------------

    /// `AllOn` is system-wide; the device ignores the addressed zone.
    pub fn all_zones_on(&mut self) -> Result<()> {
        self.send_line(&command::event_message(ZoneId::new(1, 1), "AllOn", &[]))
    }

    pub fn all_zones_off(&mut self) -> Result<()> {
        self.send_line(&command::event_message(ZoneId::new(1, 1), "AllOff", &[]))
    }

    /// Toggle power on the current zone from its stored status
    pub fn zone_power_toggle(&mut self) -> Result<()> {
        let Some(zone) = self.require_zone("power toggle") else {
            return Ok(());
        };
        let event = if self.store.zone(zone)?.status == ZoneStatus::On {
            "ZoneOff"
        } else {
            "ZoneOn"
        };
        self.send_line(&command::event_message(zone, event, &[]))
    }

    pub fn volume_up(&mut self) -> Result<()> {
        let Some(zone) = self.require_zone("volume up") else {
            return Ok(());
        };
        self.send_line(&command::event_message(zone, "KeyPress", &["VolumeUp"]))
    }

    pub fn volume_down(&mut self) -> Result<()> {
        let Some(zone) = self.require_zone("volume down") else {
            return Ok(());
        };
        self.send_line(&command::event_message(zone, "KeyPress", &["VolumeDown"]))
    }

    pub fn mute_toggle(&mut self) -> Result<()> {
        let Some(zone) = self.require_zone("mute toggle") else {
            return Ok(());
        };
        self.send_line(&command::event_message(zone, "KeyRelease", &["Mute"]))
    }

    /// Toggle do-not-disturb. A zone slaved to another zone's DND shows as
    /// active on the panel, so toggling from Slave releases it.
    pub fn dnd_toggle(&mut self) -> Result<()> {
        let Some(zone) = self.require_zone("dnd toggle") else {
            return Ok(());
        };
        let value = match self.store.zone(zone)?.do_not_disturb {
            DndState::Off => "ON",
            DndState::On | DndState::Slave => "OFF",
        };
        self.send_line(&command::event_message(zone, "DoNotDisturb", &[value]))
    }

    pub fn party_mode_toggle(&mut self) -> Result<()> {
        let Some(zone) = self.require_zone("party toggle") else {
            return Ok(());
        };
        let value = match self.store.zone(zone)?.party_mode {
            PartyMode::Off => "ON",
            PartyMode::On | PartyMode::Master => "OFF",
        };
        self.send_line(&command::event_message(zone, "PartyMode", &[value]))
    }

    fn require_zone(&self, action: &str) -> Option<ZoneId> {
        let zone = self.selection.current_zone();
        if zone.is_none() {
            tracing::warn!(action, "no zone selected, ignoring");
        }
        zone
    }

    // ---- timers ------------------------------------------------------------

    /// Earliest pending deferred deadline, for the driver to sleep until
    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.next_deadline()
    }

    /// Run every deferred task due at `now`
    pub fn fire_due(&mut self, now: Instant) {
        for task in self.queue.pop_due(now) {
            match task {
                DeferredTask::SendLine(line) => {
                    if let Err(err) = self.send_line(&line) {
                        tracing::warn!(%err, line, "deferred send failed");
                    }
                }
                DeferredTask::CollapseZoneSurface => {
                    if self.selection.controls_visible {
                        self.hide_surface();
                    }
                }
            }
        }
    }

    // ---- surface visibility -------------------------------------------------

    /// React to a status change on the current zone. Showing is immediate;
    /// hiding is two-step when the overlay is open so the panel does not
    /// flicker, with the collapse deferred through the timer queue.
    fn apply_status_visibility(&mut self, now: Instant) {
        let Some(zone) = self.selection.current_zone() else {
            return;
        };
        let status = match self.store.zone(zone) {
            Ok(state) => state.status,
            Err(_) => return,
        };

        if status == ZoneStatus::On {
            // Back on before a pending collapse fired: keep the surface.
            self.queue.cancel_collapse();
            self.show_surface();
        } else if self.selection.controls_visible {
            if self.selection.overlay_open {
                self.selection.overlay_open = false;
                self.sink.overlay_visible(false);
                self.queue
                    .schedule_at(now + COLLAPSE_DELAY, DeferredTask::CollapseZoneSurface);
            } else {
                self.hide_surface();
            }
        }
    }

    fn show_surface(&mut self) {
        if !self.selection.controls_visible {
            self.selection.controls_visible = true;
            self.sink.zone_controls_visible(true);
        }
        self.apply_subpage();
    }

    fn hide_surface(&mut self) {
        self.queue.cancel_collapse();
        self.selection.subpage = None;
        self.sink.subpage_changed(None);
        self.selection.controls_visible = false;
        self.sink.zone_controls_visible(false);
    }

    /// Resolve the subpage for the watched source and push it to the sink.
    ///
    /// Shown only while the current zone is on; types without a table entry
    /// resolve to no subpage at all rather than leaving a stale page up.
    fn apply_subpage(&mut self) {
        let Some(zone) = self.selection.current_zone() else {
            return;
        };
        let on = self
            .store
            .zone(zone)
            .map(|state| state.status == ZoneStatus::On)
            .unwrap_or(false);
        if !on {
            return;
        }

        let subpage = self.selection.watched_source().and_then(|source| {
            let source_type = &self.store.source(source).ok()?.source_type;
            let resolved = Subpage::for_source_type(source_type);
            if resolved.is_none() && !source_type.is_empty() {
                tracing::info!(source, source_type, "source type has no subpage");
            }
            resolved
        });
        self.selection.subpage = subpage;
        self.sink.subpage_changed(subpage);
    }

    /// Move the source watch to whatever the current zone is playing.
    /// Device-reported changes come through here, so no SelectSource echo.
    fn follow_zone_source(&mut self) -> Result<()> {
        let Some(zone) = self.selection.current_zone() else {
            return Ok(());
        };
        let current = self.store.zone(zone)?.current_source;
        let target = (current > 0).then_some(current);

        let watch = self.selection.follow_source(target);
        if let Some(previous) = watch.off {
            self.send_line(&command::watch_source(previous, false))?;
        }
        if let Some(next) = watch.on {
            self.send_line(&command::watch_source(next, true))?;
        }
        if !watch.is_noop() {
            self.apply_subpage();
        }
        Ok(())
    }

    // ---- outbound -----------------------------------------------------------

    /// Terminate and hand one command to the transport
    fn send_line(&mut self, line: &str) -> Result<()> {
        tracing::debug!(command = line, "send");
        self.transport.send(&format!("{line}\r"))
    }

    fn listed_zone(&self, id: ZoneId) -> bool {
        self.store
            .zone(id)
            .map(|zone| zone.list_index.is_some())
            .unwrap_or(false)
    }

    fn listed_source(&self, id: SourceId) -> bool {
        self.store
            .source(id)
            .map(|source| source.list_index.is_some())
            .unwrap_or(false)
    }
}
