//! In-memory mirror of controller, zone and source state.
//!
//! The store is the single owner of device state. Updates arrive as raw
//! parameter name/value strings from the decoder; the store coerces values,
//! ignores vocabulary it does not know, and reports back exactly what
//! changed. Re-applying a value the store already holds changes nothing and
//! reports nothing, which is what keeps downstream notifications quiet while
//! the controller re-sends unchanged state.

use crate::error::Result;
use crate::types::{
    Controller, ControllerId, ControllerParam, DndState, PartyMode, ShuffleMode, Source, SourceId,
    SourceListEntry, SourceParam, Switch, SystemConfig, Zone, ZoneId, ZoneListEntry, ZoneParam,
    ZoneStatus,
};

/// Volume and turn-on volume ceiling
const VOLUME_MAX: u8 = 50;
/// Bass, treble and balance swing in either direction
const TONE_SWING: i8 = 10;

/// A zone update that actually changed stored state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneApplied {
    pub param: ZoneParam,
    /// True when this update put the zone on the rendered zone list
    pub listed: bool,
}

/// A source update that actually changed stored state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceApplied {
    pub param: SourceParam,
    /// True when this update completed the name and type pair and the
    /// source joined the rendered source list
    pub listed: bool,
}

/// State for every addressable controller, zone and source.
///
/// All slots exist from construction; discovery only fills in names. The
/// zone and source lists hold addresses in the order their names arrived,
/// which is the order a panel presents them in.
pub struct StateStore {
    config: SystemConfig,
    controllers: Vec<Controller>,
    zones: Vec<Vec<Zone>>,
    sources: Vec<Source>,
    zone_list: Vec<ZoneId>,
    source_list: Vec<SourceId>,
}

impl StateStore {
    pub fn new(config: SystemConfig) -> Self {
        Self {
            config,
            controllers: vec![Controller::default(); config.controllers as usize],
            zones: vec![
                vec![Zone::default(); config.zones_per_controller as usize];
                config.controllers as usize
            ],
            sources: vec![Source::default(); config.sources as usize],
            zone_list: Vec::new(),
            source_list: Vec::new(),
        }
    }

    pub fn config(&self) -> SystemConfig {
        self.config
    }

    pub fn zone(&self, id: ZoneId) -> Result<&Zone> {
        self.config.validate_zone(id)?;
        Ok(&self.zones[(id.controller - 1) as usize][(id.index - 1) as usize])
    }

    pub fn source(&self, id: SourceId) -> Result<&Source> {
        self.config.validate_source(id)?;
        Ok(&self.sources[(id - 1) as usize])
    }

    pub fn controller(&self, id: ControllerId) -> Result<&Controller> {
        self.config.validate_controller(id)?;
        Ok(&self.controllers[(id - 1) as usize])
    }

    /// Zones with known names, in discovery order
    pub fn zone_entries(&self) -> Vec<ZoneListEntry> {
        self.zone_list
            .iter()
            .map(|&id| ZoneListEntry {
                zone: id,
                name: self.zones[(id.controller - 1) as usize][(id.index - 1) as usize]
                    .name
                    .clone(),
            })
            .collect()
    }

    /// Sources with known names and types, in completion order
    pub fn source_entries(&self) -> Vec<SourceListEntry> {
        self.source_list
            .iter()
            .map(|&id| SourceListEntry {
                source: id,
                name: self.sources[(id - 1) as usize].name.clone(),
            })
            .collect()
    }

    /// Apply one zone parameter update.
    ///
    /// Returns `Ok(None)` when nothing changed: the parameter is outside the
    /// store's vocabulary, the value does not coerce, or the stored value is
    /// already equal. The address is validated before anything else; an
    /// out-of-range address is an error and leaves the store untouched.
    pub fn apply_zone_update(
        &mut self,
        id: ZoneId,
        param: &str,
        value: &str,
    ) -> Result<Option<ZoneApplied>> {
        self.config.validate_zone(id)?;
        let Some(param) = ZoneParam::from_wire(param) else {
            tracing::trace!(zone = %id, param, "ignoring unrecognized zone parameter");
            return Ok(None);
        };

        let max_source = self.config.sources;
        let zone = &mut self.zones[(id.controller - 1) as usize][(id.index - 1) as usize];
        let changed = match param {
            ZoneParam::Name => Some(set_field(&mut zone.name, value.to_string())),
            ZoneParam::Status => {
                ZoneStatus::from_wire(value).map(|v| set_field(&mut zone.status, v))
            }
            ZoneParam::Volume => volume_level(value).map(|v| set_field(&mut zone.volume, v)),
            ZoneParam::Bass => tone_adjust(value).map(|v| set_field(&mut zone.bass, v)),
            ZoneParam::Treble => tone_adjust(value).map(|v| set_field(&mut zone.treble, v)),
            ZoneParam::Balance => tone_adjust(value).map(|v| set_field(&mut zone.balance, v)),
            ZoneParam::TurnOnVolume => {
                volume_level(value).map(|v| set_field(&mut zone.turn_on_volume, v))
            }
            ZoneParam::Loudness => Switch::from_wire(value).map(|v| set_field(&mut zone.loudness, v)),
            ZoneParam::DoNotDisturb => {
                DndState::from_wire(value).map(|v| set_field(&mut zone.do_not_disturb, v))
            }
            ZoneParam::PartyMode => {
                PartyMode::from_wire(value).map(|v| set_field(&mut zone.party_mode, v))
            }
            ZoneParam::Mute => Switch::from_wire(value).map(|v| set_field(&mut zone.mute, v)),
            ZoneParam::SharedSource => {
                Switch::from_wire(value).map(|v| set_field(&mut zone.shared_source, v))
            }
            ZoneParam::CurrentSource => {
                source_number(value, max_source).map(|v| set_field(&mut zone.current_source, v))
            }
        };

        let Some(changed) = changed else {
            tracing::debug!(zone = %id, param = param.wire_name(), value, "ignoring unparseable zone value");
            return Ok(None);
        };
        if !changed {
            return Ok(None);
        }

        let mut listed = false;
        if param == ZoneParam::Name {
            listed = self.list_zone(id);
        }
        Ok(Some(ZoneApplied { param, listed }))
    }

    /// Apply one source parameter update; same contract as zone updates.
    pub fn apply_source_update(
        &mut self,
        id: SourceId,
        param: &str,
        value: &str,
    ) -> Result<Option<SourceApplied>> {
        self.config.validate_source(id)?;
        let Some(param) = SourceParam::from_wire(param) else {
            tracing::trace!(source = id, param, "ignoring unrecognized source parameter");
            return Ok(None);
        };

        let source = &mut self.sources[(id - 1) as usize];
        let changed = match param {
            SourceParam::Name => Some(set_field(&mut source.name, value.to_string())),
            SourceParam::Type => Some(set_field(&mut source.source_type, value.to_string())),
            SourceParam::Channel => Some(set_field(&mut source.channel, value.to_string())),
            SourceParam::ChannelName => Some(set_field(&mut source.channel_name, value.to_string())),
            SourceParam::Genre => Some(set_field(&mut source.genre, value.to_string())),
            SourceParam::ArtistName => Some(set_field(&mut source.artist_name, value.to_string())),
            SourceParam::AlbumName => Some(set_field(&mut source.album_name, value.to_string())),
            SourceParam::PlaylistName => {
                Some(set_field(&mut source.playlist_name, value.to_string()))
            }
            SourceParam::SongName => Some(set_field(&mut source.song_name, value.to_string())),
            SourceParam::ComposerName => {
                Some(set_field(&mut source.composer_name, value.to_string()))
            }
            SourceParam::ProgramServiceName => {
                Some(set_field(&mut source.program_service_name, value.to_string()))
            }
            SourceParam::RadioText => Some(set_field(&mut source.radio_text, value.to_string())),
            SourceParam::RadioText2 => Some(set_field(&mut source.radio_text2, value.to_string())),
            SourceParam::RadioText3 => Some(set_field(&mut source.radio_text3, value.to_string())),
            SourceParam::RadioText4 => Some(set_field(&mut source.radio_text4, value.to_string())),
            SourceParam::CoverArtUrl => {
                Some(set_field(&mut source.cover_art_url, value.to_string()))
            }
            SourceParam::Mode => Some(set_field(&mut source.mode, value.to_string())),
            SourceParam::ShuffleMode => {
                ShuffleMode::from_wire(value).map(|v| set_field(&mut source.shuffle_mode, v))
            }
        };

        let Some(changed) = changed else {
            tracing::debug!(source = id, param = param.wire_name(), value, "ignoring unparseable source value");
            return Ok(None);
        };
        if !changed {
            return Ok(None);
        }

        let mut listed = false;
        if matches!(param, SourceParam::Name | SourceParam::Type) {
            listed = self.list_source(id);
        }
        Ok(Some(SourceApplied { param, listed }))
    }

    /// Apply one controller parameter update; same contract as zone updates.
    pub fn apply_controller_update(
        &mut self,
        id: ControllerId,
        param: &str,
        value: &str,
    ) -> Result<Option<ControllerParam>> {
        self.config.validate_controller(id)?;
        let Some(param) = ControllerParam::from_wire(param) else {
            tracing::trace!(controller = id, param, "ignoring unrecognized controller parameter");
            return Ok(None);
        };

        let controller = &mut self.controllers[(id - 1) as usize];
        let changed = match param {
            ControllerParam::IpAddress => set_field(&mut controller.ip_address, value.to_string()),
            ControllerParam::MacAddress => {
                set_field(&mut controller.mac_address, value.to_string())
            }
            ControllerParam::Version => set_field(&mut controller.version, value.to_string()),
            ControllerParam::Status => set_field(&mut controller.status, value.to_string()),
        };
        Ok(changed.then_some(param))
    }

    /// Put a newly named zone on the zone list; returns whether it was added
    fn list_zone(&mut self, id: ZoneId) -> bool {
        let slot = &self.zones[(id.controller - 1) as usize][(id.index - 1) as usize];
        if slot.list_index.is_some() || slot.name.is_empty() {
            return false;
        }
        let index = self.zone_list.len();
        self.zones[(id.controller - 1) as usize][(id.index - 1) as usize].list_index = Some(index);
        self.zone_list.push(id);
        true
    }

    /// Put a source on the source list once both name and type are known
    fn list_source(&mut self, id: SourceId) -> bool {
        let slot = &self.sources[(id - 1) as usize];
        if slot.list_index.is_some() || slot.name.is_empty() || slot.source_type.is_empty() {
            return false;
        }
        let index = self.source_list.len();
        self.sources[(id - 1) as usize].list_index = Some(index);
        self.source_list.push(id);
        true
    }
}

/// Store `value` into `slot`, reporting whether anything changed
fn set_field<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

/// Parse a volume value, 0..=50
fn volume_level(value: &str) -> Option<u8> {
    let level: u8 = value.trim().parse().ok()?;
    (level <= VOLUME_MAX).then_some(level)
}

/// Parse a bass, treble or balance value, -10..=10
fn tone_adjust(value: &str) -> Option<i8> {
    let level: i8 = value.trim().parse().ok()?;
    (-TONE_SWING..=TONE_SWING).contains(&level).then_some(level)
}

/// Parse a source number; 0 means the zone has no source
fn source_number(value: &str, max: SourceId) -> Option<SourceId> {
    let source: SourceId = value.trim().parse().ok()?;
    (source <= max).then_some(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RioError;

    fn store() -> StateStore {
        StateStore::new(SystemConfig::default())
    }

    #[test]
    fn reapplying_a_value_changes_nothing() {
        let mut store = store();
        let zone = ZoneId::new(1, 2);

        let applied = store.apply_zone_update(zone, "volume", "28").unwrap();
        assert_eq!(
            applied,
            Some(ZoneApplied {
                param: ZoneParam::Volume,
                listed: false,
            })
        );
        assert_eq!(store.zone(zone).unwrap().volume, 28);

        assert_eq!(store.apply_zone_update(zone, "volume", "28").unwrap(), None);
        assert_eq!(store.zone(zone).unwrap().volume, 28);
    }

    #[test]
    fn unknown_parameters_are_ignored() {
        let mut store = store();
        let zone = ZoneId::new(1, 1);
        assert_eq!(
            store.apply_zone_update(zone, "sleepTimeRemaining", "60").unwrap(),
            None
        );
        assert_eq!(store.apply_source_update(1, "bitrate", "320").unwrap(), None);
        assert_eq!(
            store.apply_controller_update(1, "serialNumber", "x").unwrap(),
            None
        );
    }

    #[test]
    fn out_of_range_addresses_are_errors() {
        let mut store = store();

        let err = store
            .apply_zone_update(ZoneId::new(1, 99), "volume", "10")
            .unwrap_err();
        assert!(matches!(
            err,
            RioError::OutOfRangeAddress { number: 99, max: 8, .. }
        ));

        assert!(store.apply_zone_update(ZoneId::new(7, 1), "volume", "10").is_err());
        assert!(store.apply_source_update(9, "name", "x").is_err());
        assert!(store.apply_source_update(0, "name", "x").is_err());
        assert!(store.apply_controller_update(7, "version", "x").is_err());
        assert!(store.zone(ZoneId::new(0, 1)).is_err());
    }

    #[test]
    fn unparseable_values_are_ignored() {
        let mut store = store();
        let zone = ZoneId::new(1, 1);
        store.apply_zone_update(zone, "volume", "28").unwrap();

        assert_eq!(store.apply_zone_update(zone, "volume", "fifty").unwrap(), None);
        assert_eq!(store.apply_zone_update(zone, "volume", "51").unwrap(), None);
        assert_eq!(store.apply_zone_update(zone, "bass", "-11").unwrap(), None);
        assert_eq!(store.apply_zone_update(zone, "status", "HIBERNATE").unwrap(), None);
        assert_eq!(store.zone(zone).unwrap().volume, 28);
        assert_eq!(store.zone(zone).unwrap().bass, 0);
    }

    #[test]
    fn boundary_values_are_accepted() {
        let mut store = store();
        let zone = ZoneId::new(1, 1);

        assert!(store.apply_zone_update(zone, "volume", "50").unwrap().is_some());
        assert!(store.apply_zone_update(zone, "bass", "-10").unwrap().is_some());
        assert!(store.apply_zone_update(zone, "treble", "10").unwrap().is_some());
        assert!(store.apply_zone_update(zone, "turnOnVolume", "0").unwrap().is_some());
        assert_eq!(store.zone(zone).unwrap().turn_on_volume, 0);
    }

    #[test]
    fn enum_values_coerce_case_insensitively() {
        let mut store = store();
        let zone = ZoneId::new(2, 3);

        store.apply_zone_update(zone, "status", "on").unwrap();
        store.apply_zone_update(zone, "doNotDisturb", "slave").unwrap();
        store.apply_zone_update(zone, "partyMode", "MASTER").unwrap();
        store.apply_zone_update(zone, "mute", "On").unwrap();

        let state = store.zone(zone).unwrap();
        assert_eq!(state.status, ZoneStatus::On);
        assert_eq!(state.do_not_disturb, DndState::Slave);
        assert_eq!(state.party_mode, PartyMode::Master);
        assert_eq!(state.mute, Switch::On);
    }

    #[test]
    fn named_zones_join_the_list_once() {
        let mut store = store();
        let kitchen = ZoneId::new(1, 2);
        let den = ZoneId::new(1, 1);

        let applied = store.apply_zone_update(kitchen, "name", "Kitchen").unwrap();
        assert!(applied.unwrap().listed);
        let applied = store.apply_zone_update(den, "name", "Den").unwrap();
        assert!(applied.unwrap().listed);

        // Arrival order, not address order.
        let entries = store.zone_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].zone, kitchen);
        assert_eq!(entries[0].name, "Kitchen");
        assert_eq!(entries[1].zone, den);

        // A rename updates the entry without duplicating it.
        let applied = store.apply_zone_update(kitchen, "name", "Cucina").unwrap();
        assert!(!applied.unwrap().listed);
        let entries = store.zone_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "Cucina");
        assert_eq!(store.zone(kitchen).unwrap().list_index, Some(0));
    }

    #[test]
    fn sources_list_only_when_name_and_type_are_both_known() {
        let mut store = store();

        let applied = store.apply_source_update(3, "name", "Blu-ray").unwrap();
        assert!(!applied.unwrap().listed);
        assert!(store.source_entries().is_empty());

        let applied = store.apply_source_update(3, "type", "DVD").unwrap();
        assert!(applied.unwrap().listed);
        let entries = store.source_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].source, 3);
        assert_eq!(entries[0].name, "Blu-ray");

        // Type first works just as well.
        let applied = store.apply_source_update(1, "type", "Tuner").unwrap();
        assert!(!applied.unwrap().listed);
        let applied = store.apply_source_update(1, "name", "AM/FM").unwrap();
        assert!(applied.unwrap().listed);
        assert_eq!(store.source_entries().len(), 2);
    }

    #[test]
    fn current_source_zero_means_none() {
        let mut store = store();
        let zone = ZoneId::new(1, 1);

        store.apply_zone_update(zone, "currentSource", "5").unwrap();
        assert_eq!(store.zone(zone).unwrap().current_source, 5);

        store.apply_zone_update(zone, "currentSource", "0").unwrap();
        assert_eq!(store.zone(zone).unwrap().current_source, 0);

        // Beyond the configured source count: ignored, state intact.
        assert_eq!(store.apply_zone_update(zone, "currentSource", "9").unwrap(), None);
        assert_eq!(store.zone(zone).unwrap().current_source, 0);
    }

    #[test]
    fn controller_updates_dedup_like_zone_updates() {
        let mut store = store();

        let applied = store.apply_controller_update(1, "version", "07.04.00").unwrap();
        assert_eq!(applied, Some(ControllerParam::Version));
        assert_eq!(
            store.apply_controller_update(1, "version", "07.04.00").unwrap(),
            None
        );
        assert_eq!(store.controller(1).unwrap().version, "07.04.00");
    }

    #[test]
    fn store_respects_the_configured_layout() {
        let config = SystemConfig::new(2, 4, 3).unwrap();
        let mut store = StateStore::new(config);

        assert!(store.apply_zone_update(ZoneId::new(2, 4), "name", "Attic").unwrap().is_some());
        assert!(store.apply_zone_update(ZoneId::new(2, 5), "name", "Nope").is_err());
        assert!(store.apply_source_update(3, "name", "Aux").unwrap().is_some());
        assert!(store.apply_source_update(4, "name", "Nope").is_err());
    }
}
