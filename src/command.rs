//! Outbound RIO message construction.
//!
//! Every outbound message is `<CMD> <address><suffix>` where the address is
//! any combination of `C[c]`, `.Z[z]` and `S[s]` fragments. Builders return
//! the bare message; the carriage return terminator is appended at send time
//! by the connection layer, never here.

use crate::types::{ControllerId, SourceId, ZoneId};

/// Assemble an outbound message from its parts.
///
/// The command token is uppercased. A `None` command produces a message with
/// no leading token (used for raw keypad passthrough). The dot between the
/// controller and zone fragments appears only when both are present.
pub fn build_message(
    command: Option<&str>,
    controller: Option<ControllerId>,
    zone: Option<u16>,
    source: Option<SourceId>,
    suffix: &str,
) -> String {
    let mut message = String::new();

    if let Some(command) = command {
        message.push_str(&command.to_ascii_uppercase());
        message.push(' ');
    }
    if let Some(controller) = controller {
        message.push_str(&format!("C[{controller}]"));
    }
    if let Some(zone) = zone {
        if controller.is_some() {
            message.push('.');
        }
        message.push_str(&format!("Z[{zone}]"));
    }
    if let Some(source) = source {
        message.push_str(&format!("S[{source}]"));
    }
    message.push_str(suffix);
    message
}

/// `EVENT C[c].Z[z]!Name [args]`, a zone-addressed event with space-joined args
pub fn event_message(zone: ZoneId, event: &str, args: &[&str]) -> String {
    let mut suffix = format!("!{event}");
    for arg in args {
        suffix.push(' ');
        suffix.push_str(arg);
    }
    build_message(Some("EVENT"), Some(zone.controller), Some(zone.index), None, &suffix)
}

/// `WATCH C[c].Z[z] ON|OFF`
pub fn watch_zone(zone: ZoneId, on: bool) -> String {
    let suffix = if on { " ON" } else { " OFF" };
    build_message(Some("WATCH"), Some(zone.controller), Some(zone.index), None, suffix)
}

/// `WATCH S[s] ON|OFF`
pub fn watch_source(source: SourceId, on: bool) -> String {
    let suffix = if on { " ON" } else { " OFF" };
    build_message(Some("WATCH"), None, None, Some(source), suffix)
}

/// `GET C[c].Z[z].name`
pub fn zone_name_query(zone: ZoneId) -> String {
    build_message(Some("GET"), Some(zone.controller), Some(zone.index), None, ".name")
}

/// `GET S[s].type,S[s].name`, one combined query per source
pub fn source_info_query(source: SourceId) -> String {
    format!(
        "{},{}",
        build_message(Some("GET"), None, None, Some(source), ".type"),
        build_message(None, None, None, Some(source), ".name"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_the_full_address_shape() {
        assert_eq!(
            build_message(Some("get"), Some(1), Some(2), None, ".name"),
            "GET C[1].Z[2].name"
        );
    }

    #[test]
    fn command_is_uppercased() {
        assert_eq!(
            build_message(Some("watch"), Some(1), Some(2), None, " ON"),
            "WATCH C[1].Z[2] ON"
        );
    }

    #[test]
    fn none_command_omits_the_token() {
        assert_eq!(build_message(None, None, None, Some(4), ".name"), "S[4].name");
    }

    #[test]
    fn zone_without_controller_has_no_leading_dot() {
        assert_eq!(build_message(Some("GET"), None, Some(2), None, ".name"), "GET Z[2].name");
    }

    #[test]
    fn source_only_addressing() {
        assert_eq!(
            build_message(Some("GET"), None, None, Some(3), ".type"),
            "GET S[3].type"
        );
    }

    #[test]
    fn event_args_are_space_joined() {
        let zone = ZoneId::new(1, 2);
        assert_eq!(
            event_message(zone, "KeyRelease", &["Mute"]),
            "EVENT C[1].Z[2]!KeyRelease Mute"
        );
        assert_eq!(
            event_message(zone, "SelectSource", &["5"]),
            "EVENT C[1].Z[2]!SelectSource 5"
        );
        assert_eq!(event_message(zone, "ZoneOn", &[]), "EVENT C[1].Z[2]!ZoneOn");
    }

    #[test]
    fn watch_messages() {
        let zone = ZoneId::new(1, 6);
        assert_eq!(watch_zone(zone, true), "WATCH C[1].Z[6] ON");
        assert_eq!(watch_zone(zone, false), "WATCH C[1].Z[6] OFF");
        assert_eq!(watch_source(3, true), "WATCH S[3] ON");
        assert_eq!(watch_source(3, false), "WATCH S[3] OFF");
    }

    #[test]
    fn discovery_queries() {
        assert_eq!(zone_name_query(ZoneId::new(2, 8)), "GET C[2].Z[8].name");
        assert_eq!(source_info_query(5), "GET S[5].type,S[5].name");
    }

    #[test]
    fn no_terminator_in_built_messages() {
        assert!(!watch_zone(ZoneId::new(1, 1), true).contains('\r'));
        assert!(!event_message(ZoneId::new(1, 1), "ZoneOff", &[]).contains('\r'));
    }
}
