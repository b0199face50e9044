//! Last-selection persistence.
//!
//! A panel remembers which zone it was showing and restores it on reconnect.
//! Writes are fire-and-forget: an implementation that fails to store should
//! log and move on, never propagate.

use crate::types::ZoneId;

pub trait Persistence: Send {
    fn last_selection(&self) -> Option<ZoneId>;
    fn set_last_selection(&mut self, zone: ZoneId);
}

/// Persistence that remembers nothing
#[derive(Debug, Default)]
pub struct NullPersistence;

impl Persistence for NullPersistence {
    fn last_selection(&self) -> Option<ZoneId> {
        None
    }

    fn set_last_selection(&mut self, _zone: ZoneId) {}
}

/// Process-lifetime persistence, enough to survive a reconnect
#[derive(Debug, Default)]
pub struct InMemoryPersistence {
    last: Option<ZoneId>,
}

impl Persistence for InMemoryPersistence {
    fn last_selection(&self) -> Option<ZoneId> {
        self.last
    }

    fn set_last_selection(&mut self, zone: ZoneId) {
        self.last = Some(zone);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_round_trip() {
        let mut persistence = InMemoryPersistence::default();
        assert_eq!(persistence.last_selection(), None);

        persistence.set_last_selection(ZoneId::new(2, 3));
        assert_eq!(persistence.last_selection(), Some(ZoneId::new(2, 3)));

        persistence.set_last_selection(ZoneId::new(1, 1));
        assert_eq!(persistence.last_selection(), Some(ZoneId::new(1, 1)));
    }
}
