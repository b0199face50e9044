//! Host-supplied rendering callbacks.
//!
//! The core pushes display-relevant changes through this trait and owns no
//! rendering itself. Every method defaults to a no-op so a sink implements
//! only what it draws. Field-level callbacks fire for the current zone and
//! watched source only; list callbacks fire for any zone or source.

use crate::selection::Subpage;
use crate::types::{SourceId, SourceParam, ZoneId, ZoneParam};

pub trait DisplaySink: Send {
    /// A parameter of the current zone changed; `value` is the raw wire value
    fn zone_changed(&mut self, zone: ZoneId, param: ZoneParam, value: &str) {
        let _ = (zone, param, value);
    }

    /// A parameter of the watched source changed
    fn source_changed(&mut self, source: SourceId, param: SourceParam, value: &str) {
        let _ = (source, param, value);
    }

    /// The ordered zone list gained an entry or an entry was renamed
    fn zone_list_changed(&mut self) {}

    /// The ordered source list gained an entry or an entry was renamed
    fn source_list_changed(&mut self) {}

    /// The control surface for the current source category changed
    fn subpage_changed(&mut self, subpage: Option<Subpage>) {
        let _ = subpage;
    }

    /// Show or hide the zone-control surface
    fn zone_controls_visible(&mut self, visible: bool) {
        let _ = visible;
    }

    /// Show or hide the host's secondary list overlay
    fn overlay_visible(&mut self, visible: bool) {
        let _ = visible;
    }
}

/// Sink that renders nothing
#[derive(Debug, Default)]
pub struct NullSink;

impl DisplaySink for NullSink {}
