use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AddressKind, Result, RioError};

/// Controller identifier (1-based)
pub type ControllerId = u16;

/// Source identifier (1-based; 0 means "no source" where noted)
pub type SourceId = u16;

/// Address of a zone: the canonical (controller, index) pair
///
/// RIO addresses every zone by the controller hosting it and its 1-based
/// position on that controller. A flattened 1..=N numbering exists only as a
/// convenience and is derived through [`SystemConfig::flat_zone`] /
/// [`SystemConfig::zone_from_flat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZoneId {
    /// Controller hosting the zone (1-based)
    pub controller: ControllerId,
    /// Position within the controller (1-based)
    pub index: u16,
}

impl ZoneId {
    pub fn new(controller: ControllerId, index: u16) -> Self {
        Self { controller, index }
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C[{}].Z[{}]", self.controller, self.index)
    }
}

/// Size of the attached Russound system
///
/// All address validation and flat-number conversion is parameterized on this
/// config; nothing in the crate assumes the classic 6x8 layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Number of controllers in the system
    pub controllers: u16,
    /// Zones hosted by each controller
    pub zones_per_controller: u16,
    /// Number of configured sources
    pub sources: u16,
}

impl Default for SystemConfig {
    /// The classic full build-out: six controllers of eight zones, eight sources
    fn default() -> Self {
        Self {
            controllers: 6,
            zones_per_controller: 8,
            sources: 8,
        }
    }
}

impl SystemConfig {
    /// Create a config, rejecting zero counts and zone totals beyond `u16::MAX`
    pub fn new(controllers: u16, zones_per_controller: u16, sources: u16) -> Result<Self> {
        if controllers == 0 || zones_per_controller == 0 || sources == 0 {
            return Err(RioError::InvalidConfig(
                "controller, zone and source counts must all be at least 1".to_string(),
            ));
        }
        if controllers.checked_mul(zones_per_controller).is_none() {
            return Err(RioError::InvalidConfig(format!(
                "{controllers} controllers of {zones_per_controller} zones overflow the flat zone numbering"
            )));
        }
        Ok(Self {
            controllers,
            zones_per_controller,
            sources,
        })
    }

    /// Total number of zones across all controllers
    ///
    /// Configs from [`SystemConfig::new`] never reach the cap; the product
    /// saturates at `u16::MAX` for hand-assembled or deserialized ones.
    pub fn zone_count(&self) -> u16 {
        self.controllers.saturating_mul(self.zones_per_controller)
    }

    pub fn validate_controller(&self, controller: ControllerId) -> Result<()> {
        if controller == 0 || controller > self.controllers {
            return Err(RioError::out_of_range(
                AddressKind::Controller,
                controller,
                self.controllers,
            ));
        }
        Ok(())
    }

    pub fn validate_zone(&self, zone: ZoneId) -> Result<()> {
        self.validate_controller(zone.controller)?;
        if zone.index == 0 || zone.index > self.zones_per_controller {
            return Err(RioError::out_of_range(
                AddressKind::Zone,
                zone.index,
                self.zones_per_controller,
            ));
        }
        Ok(())
    }

    pub fn validate_source(&self, source: SourceId) -> Result<()> {
        if source == 0 || source > self.sources {
            return Err(RioError::out_of_range(
                AddressKind::Source,
                source,
                self.sources,
            ));
        }
        Ok(())
    }

    /// Flatten a zone address into the 1..=zone_count() numbering
    ///
    /// A pair whose flat number would not fit in u16 (possible only when the
    /// config skipped [`SystemConfig::new`]) comes back as
    /// [`RioError::InvalidConfig`] rather than a wrapped number.
    pub fn flat_zone(&self, zone: ZoneId) -> Result<u16> {
        self.validate_zone(zone)?;
        (zone.controller - 1)
            .checked_mul(self.zones_per_controller)
            .and_then(|base| base.checked_add(zone.index))
            .ok_or_else(|| {
                RioError::InvalidConfig(format!(
                    "flat number for {zone} overflows u16 in a {}x{} layout",
                    self.controllers, self.zones_per_controller
                ))
            })
    }

    /// Recover the (controller, index) pair from a flat zone number
    pub fn zone_from_flat(&self, number: u16) -> Result<ZoneId> {
        if number == 0 || number > self.zone_count() {
            return Err(RioError::out_of_range(
                AddressKind::Zone,
                number,
                self.zone_count(),
            ));
        }
        Ok(ZoneId::new(
            (number - 1) / self.zones_per_controller + 1,
            (number - 1) % self.zones_per_controller + 1,
        ))
    }
}

/// Zone power status as reported by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ZoneStatus {
    #[default]
    Off,
    On,
    Standby,
}

impl ZoneStatus {
    pub(crate) fn from_wire(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "OFF" => Some(ZoneStatus::Off),
            "ON" => Some(ZoneStatus::On),
            "STANDBY" => Some(ZoneStatus::Standby),
            _ => None,
        }
    }
}

/// Plain two-state toggle used for mute, loudness and shared-source flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Switch {
    #[default]
    Off,
    On,
}

impl Switch {
    pub fn is_on(&self) -> bool {
        matches!(self, Switch::On)
    }

    pub(crate) fn from_wire(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "OFF" => Some(Switch::Off),
            "ON" => Some(Switch::On),
            _ => None,
        }
    }
}

/// Do-not-disturb state; Slave means another zone's DND is holding this one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DndState {
    #[default]
    Off,
    On,
    Slave,
}

impl DndState {
    pub(crate) fn from_wire(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "OFF" => Some(DndState::Off),
            "ON" => Some(DndState::On),
            "SLAVE" => Some(DndState::Slave),
            _ => None,
        }
    }
}

/// Party mode state; Master is the zone whose source the party follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PartyMode {
    #[default]
    Off,
    On,
    Master,
}

impl PartyMode {
    pub(crate) fn from_wire(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "OFF" => Some(PartyMode::Off),
            "ON" => Some(PartyMode::On),
            "MASTER" => Some(PartyMode::Master),
            _ => None,
        }
    }
}

/// Shuffle mode reported by media sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ShuffleMode {
    #[default]
    Off,
    Song,
    Album,
}

impl ShuffleMode {
    pub(crate) fn from_wire(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "OFF" => Some(ShuffleMode::Off),
            "SONG" => Some(ShuffleMode::Song),
            "ALBUM" => Some(ShuffleMode::Album),
            _ => None,
        }
    }
}

/// Live state of a single zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Zone name, empty until discovery fills it in
    pub name: String,
    pub status: ZoneStatus,
    /// Volume level, 0..=50
    pub volume: u8,
    /// Bass adjustment, -10..=10
    pub bass: i8,
    /// Treble adjustment, -10..=10
    pub treble: i8,
    /// Balance, -10 (left) ..= 10 (right)
    pub balance: i8,
    /// Volume applied when the zone powers on, 0..=50
    pub turn_on_volume: u8,
    pub loudness: Switch,
    pub do_not_disturb: DndState,
    pub party_mode: PartyMode,
    pub mute: Switch,
    pub shared_source: Switch,
    /// Source currently feeding the zone, 0 = none
    pub current_source: SourceId,
    /// Position in the rendered zone list, None until the zone is listed
    pub list_index: Option<usize>,
}

impl Default for Zone {
    fn default() -> Self {
        Self {
            name: String::new(),
            status: ZoneStatus::Off,
            volume: 0,
            bass: 0,
            treble: 0,
            balance: 0,
            turn_on_volume: 20,
            loudness: Switch::Off,
            do_not_disturb: DndState::Off,
            party_mode: PartyMode::Off,
            mute: Switch::Off,
            shared_source: Switch::Off,
            current_source: 0,
            list_index: None,
        }
    }
}

/// A source input and its now-playing metadata
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    /// Free-text category reported by the controller (e.g. "DVD", "Tuner")
    #[serde(rename = "type")]
    pub source_type: String,
    pub channel: String,
    pub channel_name: String,
    pub genre: String,
    pub artist_name: String,
    pub album_name: String,
    pub playlist_name: String,
    pub song_name: String,
    pub composer_name: String,
    pub program_service_name: String,
    pub radio_text: String,
    pub radio_text2: String,
    pub radio_text3: String,
    pub radio_text4: String,
    pub cover_art_url: String,
    pub mode: String,
    pub shuffle_mode: ShuffleMode,
    /// Position in the rendered source list, None until listed
    pub list_index: Option<usize>,
}

/// Controller-level metadata
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Controller {
    pub ip_address: String,
    pub mac_address: String,
    pub version: String,
    pub status: String,
}

/// Zone parameters understood by the state store
///
/// Wire names are the camelCase tokens the controller sends; anything not in
/// this set is ignored per the protocol contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneParam {
    Name,
    Status,
    Volume,
    Bass,
    Treble,
    Balance,
    Loudness,
    TurnOnVolume,
    DoNotDisturb,
    PartyMode,
    Mute,
    SharedSource,
    CurrentSource,
}

impl ZoneParam {
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "name" => Some(ZoneParam::Name),
            "status" => Some(ZoneParam::Status),
            "volume" => Some(ZoneParam::Volume),
            "bass" => Some(ZoneParam::Bass),
            "treble" => Some(ZoneParam::Treble),
            "balance" => Some(ZoneParam::Balance),
            "loudness" => Some(ZoneParam::Loudness),
            "turnOnVolume" => Some(ZoneParam::TurnOnVolume),
            "doNotDisturb" => Some(ZoneParam::DoNotDisturb),
            "partyMode" => Some(ZoneParam::PartyMode),
            "mute" => Some(ZoneParam::Mute),
            "sharedSource" => Some(ZoneParam::SharedSource),
            "currentSource" => Some(ZoneParam::CurrentSource),
            _ => None,
        }
    }

    pub fn wire_name(&self) -> &'static str {
        match self {
            ZoneParam::Name => "name",
            ZoneParam::Status => "status",
            ZoneParam::Volume => "volume",
            ZoneParam::Bass => "bass",
            ZoneParam::Treble => "treble",
            ZoneParam::Balance => "balance",
            ZoneParam::Loudness => "loudness",
            ZoneParam::TurnOnVolume => "turnOnVolume",
            ZoneParam::DoNotDisturb => "doNotDisturb",
            ZoneParam::PartyMode => "partyMode",
            ZoneParam::Mute => "mute",
            ZoneParam::SharedSource => "sharedSource",
            ZoneParam::CurrentSource => "currentSource",
        }
    }
}

/// Source parameters understood by the state store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceParam {
    Name,
    Type,
    Channel,
    ChannelName,
    Genre,
    ArtistName,
    AlbumName,
    PlaylistName,
    SongName,
    ComposerName,
    ProgramServiceName,
    RadioText,
    RadioText2,
    RadioText3,
    RadioText4,
    CoverArtUrl,
    Mode,
    ShuffleMode,
}

impl SourceParam {
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "name" => Some(SourceParam::Name),
            "type" => Some(SourceParam::Type),
            "channel" => Some(SourceParam::Channel),
            "channelName" => Some(SourceParam::ChannelName),
            "genre" => Some(SourceParam::Genre),
            "artistName" => Some(SourceParam::ArtistName),
            "albumName" => Some(SourceParam::AlbumName),
            "playlistName" => Some(SourceParam::PlaylistName),
            "songName" => Some(SourceParam::SongName),
            "composerName" => Some(SourceParam::ComposerName),
            "programServiceName" => Some(SourceParam::ProgramServiceName),
            "radioText" => Some(SourceParam::RadioText),
            "radioText2" => Some(SourceParam::RadioText2),
            "radioText3" => Some(SourceParam::RadioText3),
            "radioText4" => Some(SourceParam::RadioText4),
            "coverArtURL" => Some(SourceParam::CoverArtUrl),
            "mode" => Some(SourceParam::Mode),
            "shuffleMode" => Some(SourceParam::ShuffleMode),
            _ => None,
        }
    }

    pub fn wire_name(&self) -> &'static str {
        match self {
            SourceParam::Name => "name",
            SourceParam::Type => "type",
            SourceParam::Channel => "channel",
            SourceParam::ChannelName => "channelName",
            SourceParam::Genre => "genre",
            SourceParam::ArtistName => "artistName",
            SourceParam::AlbumName => "albumName",
            SourceParam::PlaylistName => "playlistName",
            SourceParam::SongName => "songName",
            SourceParam::ComposerName => "composerName",
            SourceParam::ProgramServiceName => "programServiceName",
            SourceParam::RadioText => "radioText",
            SourceParam::RadioText2 => "radioText2",
            SourceParam::RadioText3 => "radioText3",
            SourceParam::RadioText4 => "radioText4",
            SourceParam::CoverArtUrl => "coverArtURL",
            SourceParam::Mode => "mode",
            SourceParam::ShuffleMode => "shuffleMode",
        }
    }
}

/// Controller parameters understood by the state store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerParam {
    IpAddress,
    MacAddress,
    Version,
    Status,
}

impl ControllerParam {
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "ipAddress" => Some(ControllerParam::IpAddress),
            "macAddress" => Some(ControllerParam::MacAddress),
            "version" => Some(ControllerParam::Version),
            "status" => Some(ControllerParam::Status),
            _ => None,
        }
    }
}

/// Entry in the ordered, discovery-populated zone list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneListEntry {
    pub zone: ZoneId,
    pub name: String,
}

/// Entry in the ordered, discovery-populated source list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceListEntry {
    pub source: SourceId,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_zone_round_trips_for_odd_layouts() {
        // A 3-controller system with 6 zones each; nothing may assume 8.
        let config = SystemConfig::new(3, 6, 4).unwrap();

        assert_eq!(config.zone_count(), 18);
        assert_eq!(config.flat_zone(ZoneId::new(1, 1)).unwrap(), 1);
        assert_eq!(config.flat_zone(ZoneId::new(2, 1)).unwrap(), 7);
        assert_eq!(config.flat_zone(ZoneId::new(3, 6)).unwrap(), 18);

        for flat in 1..=config.zone_count() {
            let zone = config.zone_from_flat(flat).unwrap();
            assert_eq!(config.flat_zone(zone).unwrap(), flat);
        }
    }

    #[test]
    fn flat_zone_rejects_out_of_range() {
        let config = SystemConfig::default();
        assert!(config.zone_from_flat(0).is_err());
        assert!(config.zone_from_flat(49).is_err());
        assert!(config.flat_zone(ZoneId::new(7, 1)).is_err());
        assert!(config.flat_zone(ZoneId::new(1, 9)).is_err());
    }

    #[test]
    fn config_rejects_zero_counts() {
        assert!(SystemConfig::new(0, 8, 8).is_err());
        assert!(SystemConfig::new(6, 0, 8).is_err());
        assert!(SystemConfig::new(6, 8, 0).is_err());
    }

    #[test]
    fn zone_totals_beyond_u16_are_rejected_not_wrapped() {
        let err = SystemConfig::new(1000, 100, 8).unwrap_err();
        assert!(matches!(err, RioError::InvalidConfig(_)));

        // Deserialized configs skip `new`; the arithmetic must still hold.
        let rogue: SystemConfig = serde_json::from_str(
            r#"{"controllers":1000,"zones_per_controller":100,"sources":8}"#,
        )
        .unwrap();
        assert_eq!(rogue.zone_count(), u16::MAX);
        assert!(matches!(
            rogue.flat_zone(ZoneId::new(1000, 50)),
            Err(RioError::InvalidConfig(_))
        ));

        // Pairs whose flat number does fit keep flattening exactly.
        assert_eq!(rogue.flat_zone(ZoneId::new(2, 5)).unwrap(), 105);
        let zone = rogue.zone_from_flat(u16::MAX).unwrap();
        assert_eq!(rogue.flat_zone(zone).unwrap(), u16::MAX);
    }

    #[test]
    fn zone_params_map_wire_names_both_ways() {
        let names = [
            "name",
            "status",
            "volume",
            "bass",
            "treble",
            "balance",
            "loudness",
            "turnOnVolume",
            "doNotDisturb",
            "partyMode",
            "mute",
            "sharedSource",
            "currentSource",
        ];
        for name in names {
            let param = ZoneParam::from_wire(name).expect(name);
            assert_eq!(param.wire_name(), name);
        }
        assert_eq!(ZoneParam::from_wire("sleepTimeRemaining"), None);
        // Parameter names are exact-match; the grammar is case-insensitive
        // but the vocabulary is not.
        assert_eq!(ZoneParam::from_wire("Volume"), None);
    }

    #[test]
    fn source_params_map_wire_names_both_ways() {
        let names = [
            "name",
            "type",
            "channel",
            "channelName",
            "genre",
            "artistName",
            "albumName",
            "playlistName",
            "songName",
            "composerName",
            "programServiceName",
            "radioText",
            "radioText2",
            "radioText3",
            "radioText4",
            "coverArtURL",
            "mode",
            "shuffleMode",
        ];
        for name in names {
            let param = SourceParam::from_wire(name).expect(name);
            assert_eq!(param.wire_name(), name);
        }
        assert_eq!(SourceParam::from_wire("bitrate"), None);
    }

    #[test]
    fn wire_enums_parse_case_insensitively() {
        assert_eq!(ZoneStatus::from_wire("on"), Some(ZoneStatus::On));
        assert_eq!(ZoneStatus::from_wire("STANDBY"), Some(ZoneStatus::Standby));
        assert_eq!(ZoneStatus::from_wire("hibernate"), None);
        assert_eq!(DndState::from_wire("slave"), Some(DndState::Slave));
        assert_eq!(PartyMode::from_wire("Master"), Some(PartyMode::Master));
        assert_eq!(ShuffleMode::from_wire("ALBUM"), Some(ShuffleMode::Album));
        assert_eq!(Switch::from_wire("On"), Some(Switch::On));
    }

    #[test]
    fn zone_id_displays_in_wire_form() {
        assert_eq!(ZoneId::new(2, 5).to_string(), "C[2].Z[5]");
    }
}
