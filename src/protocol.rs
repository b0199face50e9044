//! Inbound RIO message decoding.
//!
//! The controller replies with carriage-return terminated ASCII lines. A line
//! may combine several replies separated by commas, with only the first part
//! carrying the reply command token. [`decode`] splits such lines, re-attaches
//! the token to every part and classifies each one against an ordered grammar:
//! Event, then ZoneUpdate, then ControllerUpdate, then SourceUpdate. The order
//! is load-bearing: a zone path `C[c].Z[z].param` also parses as a controller
//! path whose param happens to start with `Z[z].`, so the more specific
//! grammar must win. Anything matching no grammar is dropped.

use crate::types::{ControllerId, SourceId, ZoneId};

/// A classified inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RioMessage {
    /// `EVENT C[c].Z[z]!EventName [args]`
    Event(EventMessage),
    /// `CMD C[c].Z[z].param="value"`
    Zone(ZoneUpdate),
    /// `CMD C[c].param="value"`
    Controller(ControllerUpdate),
    /// `CMD S[s].param="value"`
    Source(SourceUpdate),
}

/// Event notification addressed to a zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMessage {
    pub controller: ControllerId,
    pub zone: u16,
    /// Event name plus any arguments, left unparsed: only some events carry
    /// data and the argument layout is per-event convention, not grammar.
    pub body: String,
}

/// Parameter update for a single zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneUpdate {
    /// Reply command token, shared by every part of a combined line
    pub command: String,
    pub controller: ControllerId,
    pub zone: u16,
    pub param: String,
    /// Raw value as quoted on the wire; coercion happens in the state store
    pub value: String,
}

impl ZoneUpdate {
    pub fn zone_id(&self) -> ZoneId {
        ZoneId::new(self.controller, self.zone)
    }
}

/// Parameter update for a controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerUpdate {
    pub command: String,
    pub controller: ControllerId,
    pub param: String,
    pub value: String,
}

/// Parameter update for a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUpdate {
    pub command: String,
    pub source: SourceId,
    pub param: String,
    pub value: String,
}

/// Decode one raw inbound line into zero or more classified messages.
///
/// Unrecognized parts are logged at debug level and dropped; they never
/// produce an error or touch state.
pub fn decode(raw_line: &str) -> Vec<RioMessage> {
    let line = raw_line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Vec::new();
    }

    let mut messages = Vec::new();
    for part in split_combined(line) {
        match classify(&part) {
            Some(message) => messages.push(message),
            None => tracing::debug!(message = %part, "dropping unrecognized message"),
        }
    }
    messages
}

/// Split a combined reply on commas, prepending the reply command token from
/// the first part to every subsequent part so each is self-contained.
fn split_combined(line: &str) -> Vec<String> {
    let parts: Vec<&str> = line.split(',').collect();
    let command = parts[0].split_once(' ').map_or(parts[0], |(token, _)| token);

    parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            if i == 0 {
                part.to_string()
            } else {
                format!("{command} {}", part.trim_start())
            }
        })
        .collect()
}

/// Classify one self-contained message. Grammar priority is fixed:
/// Event, ZoneUpdate, ControllerUpdate, SourceUpdate; first match wins.
fn classify(message: &str) -> Option<RioMessage> {
    let message = message.trim();
    if let Some(event) = match_event(message) {
        return Some(RioMessage::Event(event));
    }
    if let Some(update) = match_zone(message) {
        return Some(RioMessage::Zone(update));
    }
    if let Some(update) = match_controller(message) {
        return Some(RioMessage::Controller(update));
    }
    if let Some(update) = match_source(message) {
        return Some(RioMessage::Source(update));
    }
    None
}

/// `EVENT C[c].Z[z]!body`
fn match_event(message: &str) -> Option<EventMessage> {
    let mut s = Scanner::new(message);
    if !s.tag("EVENT ") {
        return None;
    }
    if !s.tag("C[") {
        return None;
    }
    let controller = s.number()?;
    if !s.tag("].Z[") {
        return None;
    }
    let zone = s.number()?;
    if !s.tag("]!") {
        return None;
    }
    Some(EventMessage {
        controller,
        zone,
        body: s.rest().to_string(),
    })
}

/// `CMD C[c].Z[z].param="value"`
fn match_zone(message: &str) -> Option<ZoneUpdate> {
    let (command, rest) = command_token(message)?;
    let mut s = Scanner::new(rest);
    if !s.tag("C[") {
        return None;
    }
    let controller = s.number()?;
    if !s.tag("].Z[") {
        return None;
    }
    let zone = s.number()?;
    if !s.tag("].") {
        return None;
    }
    let (param, value) = param_value(s.rest())?;
    Some(ZoneUpdate {
        command: command.to_string(),
        controller,
        zone,
        param,
        value,
    })
}

/// `CMD C[c].param="value"`; zone lines also fit this shape, hence the priority
fn match_controller(message: &str) -> Option<ControllerUpdate> {
    let (command, rest) = command_token(message)?;
    let mut s = Scanner::new(rest);
    if !s.tag("C[") {
        return None;
    }
    let controller = s.number()?;
    if !s.tag("].") {
        return None;
    }
    let (param, value) = param_value(s.rest())?;
    Some(ControllerUpdate {
        command: command.to_string(),
        controller,
        param,
        value,
    })
}

/// `CMD S[s].param="value"`
fn match_source(message: &str) -> Option<SourceUpdate> {
    let (command, rest) = command_token(message)?;
    let mut s = Scanner::new(rest);
    if !s.tag("S[") {
        return None;
    }
    let source = s.number()?;
    if !s.tag("].") {
        return None;
    }
    let (param, value) = param_value(s.rest())?;
    Some(SourceUpdate {
        command: command.to_string(),
        source,
        param,
        value,
    })
}

/// Split the leading reply command token from the address part
fn command_token(message: &str) -> Option<(&str, &str)> {
    let (token, rest) = message.split_once(' ')?;
    if token.is_empty() {
        return None;
    }
    Some((token, rest.trim_start()))
}

/// Split `param="value"`. The parameter is everything before the first `="`,
/// the value everything up to the trailing quote (interior quotes survive).
fn param_value(rest: &str) -> Option<(String, String)> {
    let (param, after) = rest.split_once("=\"")?;
    let value = after.strip_suffix('"')?;
    if param.is_empty() {
        return None;
    }
    Some((param.to_string(), value.to_string()))
}

/// Byte cursor over one message. Structural matching is ASCII
/// case-insensitive: the original grammars tolerated `c[1].z[2]`.
struct Scanner<'a> {
    rest: &'a str,
}

impl<'a> Scanner<'a> {
    fn new(message: &'a str) -> Self {
        Self { rest: message }
    }

    /// Consume `tag` case-insensitively; `tag` must be pure ASCII
    fn tag(&mut self, tag: &str) -> bool {
        let n = tag.len();
        let bytes = self.rest.as_bytes();
        if bytes.len() >= n && bytes[..n].eq_ignore_ascii_case(tag.as_bytes()) {
            self.rest = &self.rest[n..];
            true
        } else {
            false
        }
    }

    /// Consume a non-empty run of ASCII digits
    fn number(&mut self) -> Option<u16> {
        let digits = self
            .rest
            .as_bytes()
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if digits == 0 {
            return None;
        }
        let value = self.rest[..digits].parse().ok()?;
        self.rest = &self.rest[digits..];
        Some(value)
    }

    fn rest(&self) -> &'a str {
        self.rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_line_shares_the_reply_token() {
        let messages = decode("N C[1].Z[1].name=\"Kitchen\",C[1].Z[2].name=\"Den\"");
        assert_eq!(messages.len(), 2);

        match (&messages[0], &messages[1]) {
            (RioMessage::Zone(a), RioMessage::Zone(b)) => {
                assert_eq!(a.command, "N");
                assert_eq!(b.command, "N");
                assert_eq!((a.controller, a.zone), (1, 1));
                assert_eq!((b.controller, b.zone), (1, 2));
                assert_eq!(a.value, "Kitchen");
                assert_eq!(b.value, "Den");
            }
            other => panic!("expected two zone updates, got {other:?}"),
        }
    }

    #[test]
    fn zone_wins_over_controller() {
        let line = "S C[2].Z[6].volume=\"28\"";

        // The controller grammar genuinely accepts this line...
        let as_controller = match_controller(line).unwrap();
        assert_eq!(as_controller.param, "Z[6].volume");

        // ...but classification must pick the more specific zone grammar.
        match classify(line) {
            Some(RioMessage::Zone(update)) => {
                assert_eq!(update.zone_id(), ZoneId::new(2, 6));
                assert_eq!(update.param, "volume");
                assert_eq!(update.value, "28");
            }
            other => panic!("expected zone update, got {other:?}"),
        }
    }

    #[test]
    fn event_wins_over_everything() {
        match classify("EVENT C[1].Z[4]!KeyPress VolumeUp") {
            Some(RioMessage::Event(event)) => {
                assert_eq!((event.controller, event.zone), (1, 4));
                assert_eq!(event.body, "KeyPress VolumeUp");
            }
            other => panic!("expected event, got {other:?}"),
        }

        // An event with a quoted argument would otherwise parse as a
        // controller update with a bizarre parameter name.
        match classify("EVENT C[1].Z[2]!SomeEvent data=\"x\"") {
            Some(RioMessage::Event(event)) => assert_eq!(event.body, "SomeEvent data=\"x\""),
            other => panic!("expected event, got {other:?}"),
        }
    }

    #[test]
    fn controller_and_source_updates_classify() {
        match classify("N C[1].version=\"07.04.00\"") {
            Some(RioMessage::Controller(update)) => {
                assert_eq!(update.controller, 1);
                assert_eq!(update.param, "version");
                assert_eq!(update.value, "07.04.00");
            }
            other => panic!("expected controller update, got {other:?}"),
        }

        match classify("N S[3].type=\"DVD\"") {
            Some(RioMessage::Source(update)) => {
                assert_eq!(update.source, 3);
                assert_eq!(update.param, "type");
                assert_eq!(update.value, "DVD");
            }
            other => panic!("expected source update, got {other:?}"),
        }
    }

    #[test]
    fn structure_matches_case_insensitively() {
        assert!(matches!(
            classify("event c[1].z[2]!ZoneOn"),
            Some(RioMessage::Event(_))
        ));
        assert!(matches!(
            classify("N c[1].z[2].name=\"Den\""),
            Some(RioMessage::Zone(_))
        ));
    }

    #[test]
    fn unrecognized_lines_are_dropped() {
        assert!(decode("E System Error").is_empty());
        assert!(decode("").is_empty());
        assert!(decode("\r\n").is_empty());
        assert!(decode("garbage").is_empty());
        // No quoted value: not a well-formed update.
        assert!(decode("N C[1].Z[1].volume=20").is_empty());
    }

    #[test]
    fn non_numeric_addresses_fall_through() {
        // An empty zone number cannot be a zone update; it degrades to a
        // controller update whose parameter is simply never recognized.
        match classify("N C[1].Z[].name=\"x\"") {
            Some(RioMessage::Controller(update)) => assert_eq!(update.param, "Z[].name"),
            other => panic!("expected controller update, got {other:?}"),
        }
        assert!(classify("N C[one].name=\"x\"").is_none());
    }

    #[test]
    fn interior_quotes_survive_in_values() {
        match classify("N C[1].Z[1].name=\"The \"Den\"\"") {
            Some(RioMessage::Zone(update)) => assert_eq!(update.value, "The \"Den\""),
            other => panic!("expected zone update, got {other:?}"),
        }
    }

    #[test]
    fn comma_is_reserved_as_the_reply_separator() {
        // The wire format has no escaping: a comma inside a quoted value
        // splits the reply and neither fragment parses.
        assert!(decode("N C[1].Z[1].name=\"Living, Room\"").is_empty());
    }

    #[test]
    fn combined_line_tolerates_space_after_comma() {
        let messages = decode("S S[1].type=\"Tuner\", S[1].name=\"AM/FM\"");
        assert_eq!(messages.len(), 2);
        match &messages[1] {
            RioMessage::Source(update) => {
                assert_eq!(update.command, "S");
                assert_eq!(update.param, "name");
                assert_eq!(update.value, "AM/FM");
            }
            other => panic!("expected source update, got {other:?}"),
        }
    }

    #[test]
    fn trailing_carriage_return_is_stripped() {
        let messages = decode("N C[1].Z[1].status=\"ON\"\r\n");
        assert_eq!(messages.len(), 1);
    }
}
