//! Selection state: which zone and source the panel is looking at.
//!
//! The state machine itself is pure: transitions return the watch commands
//! they imply and the caller sends them. Exactly one zone and at most one
//! source are watched at a time; the watched source always follows the
//! current zone's source.

use serde::{Deserialize, Serialize};

use crate::types::{SourceId, ZoneId};

/// Control surface associated with a source category.
///
/// Resolved from the source's free-text `type` through a fixed table; types
/// without an entry get no subpage at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subpage {
    Tuner,
    Dvd,
    Cd,
    Cable,
    Satellite,
    IpodUsb,
    InternetRadio,
    MediaStreamer,
}

impl Subpage {
    /// Look up the subpage for a source type, case-insensitively.
    pub fn for_source_type(source_type: &str) -> Option<Self> {
        match source_type.to_ascii_lowercase().as_str() {
            "tuner" | "am/fm tuner" => Some(Subpage::Tuner),
            "dvd" => Some(Subpage::Dvd),
            "cd" => Some(Subpage::Cd),
            "cable" => Some(Subpage::Cable),
            "satellite" => Some(Subpage::Satellite),
            "ipod" | "usb" | "ipod/usb" => Some(Subpage::IpodUsb),
            "internet radio" => Some(Subpage::InternetRadio),
            "media streamer" => Some(Subpage::MediaStreamer),
            _ => None,
        }
    }
}

/// Watch commands implied by a zone selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneWatch {
    /// Previous zone to unwatch, present only when it differs from the new one
    pub off: Option<ZoneId>,
    /// Zone to watch; emitted even on re-selection to refresh the stream
    pub on: ZoneId,
}

/// Watch commands implied by a change of followed source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceWatch {
    pub off: Option<SourceId>,
    pub on: Option<SourceId>,
}

impl SourceWatch {
    pub fn is_noop(&self) -> bool {
        self.off.is_none() && self.on.is_none()
    }
}

/// Current selection plus the visibility the panel has been told about
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    current_zone: Option<ZoneId>,
    watched_source: Option<SourceId>,
    /// Subpage last applied to the sink
    pub subpage: Option<Subpage>,
    /// Whether the zone-control surface is currently shown
    pub controls_visible: bool,
    /// Whether the host reports its secondary overlay as open
    pub overlay_open: bool,
}

impl SelectionState {
    pub fn current_zone(&self) -> Option<ZoneId> {
        self.current_zone
    }

    pub fn watched_source(&self) -> Option<SourceId> {
        self.watched_source
    }

    /// Make `zone` current. The previous zone is unwatched only when it
    /// differs; the new zone is watched unconditionally.
    pub fn select_zone(&mut self, zone: ZoneId) -> ZoneWatch {
        let off = self.current_zone.filter(|&previous| previous != zone);
        self.current_zone = Some(zone);
        ZoneWatch { off, on: zone }
    }

    /// Follow `source` (None when the zone has no source). Watching is
    /// deduplicated: following the already-watched source changes nothing.
    pub fn follow_source(&mut self, source: Option<SourceId>) -> SourceWatch {
        if source == self.watched_source {
            return SourceWatch::default();
        }
        let off = self.watched_source.take();
        self.watched_source = source;
        SourceWatch { off, on: source }
    }

    /// Drop all watches, keeping the zone selection for reconnect
    pub fn clear_watches(&mut self) {
        self.watched_source = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_types_resolve_case_insensitively() {
        assert_eq!(Subpage::for_source_type("DVD"), Some(Subpage::Dvd));
        assert_eq!(Subpage::for_source_type("dvd"), Some(Subpage::Dvd));
        assert_eq!(Subpage::for_source_type("Tuner"), Some(Subpage::Tuner));
        assert_eq!(
            Subpage::for_source_type("Internet Radio"),
            Some(Subpage::InternetRadio)
        );
    }

    #[test]
    fn unmapped_types_have_no_subpage() {
        assert_eq!(Subpage::for_source_type("Misc Audio"), None);
        assert_eq!(Subpage::for_source_type(""), None);
    }

    #[test]
    fn selecting_a_different_zone_unwatches_the_old_one() {
        let mut selection = SelectionState::default();
        let first = ZoneId::new(1, 1);
        let second = ZoneId::new(1, 2);

        let watch = selection.select_zone(first);
        assert_eq!(watch, ZoneWatch { off: None, on: first });

        let watch = selection.select_zone(second);
        assert_eq!(watch, ZoneWatch { off: Some(first), on: second });
        assert_eq!(selection.current_zone(), Some(second));
    }

    #[test]
    fn reselecting_the_zone_rewatches_without_unwatching() {
        let mut selection = SelectionState::default();
        let zone = ZoneId::new(2, 3);

        selection.select_zone(zone);
        let watch = selection.select_zone(zone);
        assert_eq!(watch, ZoneWatch { off: None, on: zone });
    }

    #[test]
    fn source_follow_is_deduplicated() {
        let mut selection = SelectionState::default();

        let watch = selection.follow_source(Some(3));
        assert_eq!(watch, SourceWatch { off: None, on: Some(3) });

        assert!(selection.follow_source(Some(3)).is_noop());

        let watch = selection.follow_source(Some(5));
        assert_eq!(watch, SourceWatch { off: Some(3), on: Some(5) });

        let watch = selection.follow_source(None);
        assert_eq!(watch, SourceWatch { off: Some(5), on: None });
        assert_eq!(selection.watched_source(), None);
    }
}
