//! Staggered startup queries.
//!
//! On connect the whole system is enumerated: one combined type/name query
//! per source, then one name query per zone. Queries are spaced out so the
//! controller is never flooded, and they are fire-and-forget: replies come
//! back as ordinary updates and re-runs are idempotent, so nothing ever
//! cancels a scheduled query.

use std::time::{Duration, Instant};

use crate::command;
use crate::scheduler::{DeferredTask, TimerQueue};
use crate::types::{SystemConfig, ZoneId};

/// Gap between consecutive queries
pub const QUERY_STEP: Duration = Duration::from_millis(10);
/// Zone queries start this long after the first source query was scheduled
pub const ZONE_QUERY_OFFSET: Duration = Duration::from_millis(100);

/// Queue discovery queries for every configured source and zone.
///
/// Sources go first, one per step. Zones follow after the fixed offset,
/// enumerated in canonical address order: controller 1 zones 1.., then
/// controller 2, and so on.
pub fn schedule_discovery(config: SystemConfig, queue: &mut TimerQueue, now: Instant) {
    tracing::info!(
        sources = config.sources,
        zones = config.zone_count(),
        "scheduling discovery queries"
    );

    for source in 1..=config.sources {
        queue.schedule_at(
            now + QUERY_STEP * u32::from(source),
            DeferredTask::SendLine(command::source_info_query(source)),
        );
    }

    let mut step = 0u32;
    for controller in 1..=config.controllers {
        for index in 1..=config.zones_per_controller {
            step += 1;
            queue.schedule_at(
                now + ZONE_QUERY_OFFSET + QUERY_STEP * step,
                DeferredTask::SendLine(command::zone_name_query(ZoneId::new(controller, index))),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(tasks: Vec<DeferredTask>) -> Vec<String> {
        tasks
            .into_iter()
            .map(|task| match task {
                DeferredTask::SendLine(line) => line,
                other => panic!("unexpected task {other:?}"),
            })
            .collect()
    }

    #[test]
    fn sources_then_zones_in_address_order() {
        let config = SystemConfig::new(2, 2, 3).unwrap();
        let mut queue = TimerQueue::new();
        let t0 = Instant::now();

        schedule_discovery(config, &mut queue, t0);

        let all = lines(queue.pop_due(t0 + Duration::from_secs(10)));
        assert_eq!(
            all,
            vec![
                "GET S[1].type,S[1].name",
                "GET S[2].type,S[2].name",
                "GET S[3].type,S[3].name",
                "GET C[1].Z[1].name",
                "GET C[1].Z[2].name",
                "GET C[2].Z[1].name",
                "GET C[2].Z[2].name",
            ]
        );
    }

    #[test]
    fn queries_are_spaced_one_step_apart() {
        let config = SystemConfig::new(1, 2, 2).unwrap();
        let mut queue = TimerQueue::new();
        let t0 = Instant::now();

        schedule_discovery(config, &mut queue, t0);

        // Nothing is due at the instant of scheduling.
        assert!(queue.pop_due(t0).is_empty());
        assert_eq!(queue.next_deadline(), Some(t0 + QUERY_STEP));

        let due = lines(queue.pop_due(t0 + QUERY_STEP));
        assert_eq!(due, vec!["GET S[1].type,S[1].name"]);

        let due = lines(queue.pop_due(t0 + QUERY_STEP * 2));
        assert_eq!(due, vec!["GET S[2].type,S[2].name"]);

        // Zone queries wait for the offset even when sources finish early.
        assert_eq!(queue.next_deadline(), Some(t0 + ZONE_QUERY_OFFSET + QUERY_STEP));
        let due = lines(queue.pop_due(t0 + ZONE_QUERY_OFFSET + QUERY_STEP));
        assert_eq!(due, vec!["GET C[1].Z[1].name"]);
    }

    #[test]
    fn full_default_layout_is_enumerated() {
        let config = SystemConfig::default();
        let mut queue = TimerQueue::new();
        let t0 = Instant::now();

        schedule_discovery(config, &mut queue, t0);

        let all = lines(queue.pop_due(t0 + Duration::from_secs(60)));
        assert_eq!(all.len(), (config.sources + config.zone_count()) as usize);
        assert_eq!(all[0], "GET S[1].type,S[1].name");
        assert_eq!(all[8], "GET C[1].Z[1].name");
        assert_eq!(all.last().unwrap(), "GET C[6].Z[8].name");
    }
}
