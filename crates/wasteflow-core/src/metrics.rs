//! Reporters and render views.
//!
//! Every function here is a pure function of agent state; none of them feed
//! back into dispatch.

use rust_decimal::Decimal;
use wasteflow_agents::Collector;
use wasteflow_types::{AgentKind, AgentView, PhaseCounts, WorldReport};
use wasteflow_world::{DisposalSink, TrashSource};

/// Trash generated by all buildings since the start of the run.
pub fn total_generated(sources: &[TrashSource]) -> Decimal {
    sources
        .iter()
        .map(TrashSource::total_generated)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Trash harvested by all trucks since the start of the run.
pub fn total_collected(collectors: &[Collector]) -> Decimal {
    collectors
        .iter()
        .map(Collector::total_collected)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Number of buildings awaiting pickup.
pub fn buildings_needing_pickup(sources: &[TrashSource]) -> u32 {
    let count = sources.iter().filter(|s| s.pickup_requested()).count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Mean `wait_ticks` over buildings awaiting pickup, or zero if none are.
pub fn mean_wait_ticks(sources: &[TrashSource]) -> Decimal {
    let (sum, count) = sources
        .iter()
        .filter(|s| s.pickup_requested())
        .fold((0_u64, 0_u64), |(sum, count), s| {
            (sum.saturating_add(s.wait_ticks()), count.saturating_add(1))
        });
    Decimal::from(sum)
        .checked_div(Decimal::from(count))
        .unwrap_or(Decimal::ZERO)
}

/// Collectors per dispatch phase.
pub fn phase_counts(collectors: &[Collector]) -> PhaseCounts {
    let mut counts = PhaseCounts::default();
    for c in collectors {
        counts.record(c.phase());
    }
    counts
}

/// The full aggregate report for `tick`.
pub fn world_report(
    tick: u64,
    sources: &[TrashSource],
    collectors: &[Collector],
    sink: &DisposalSink,
) -> WorldReport {
    WorldReport {
        tick,
        total_generated: total_generated(sources),
        total_collected: total_collected(collectors),
        total_received: sink.total_received(),
        mean_wait_ticks: mean_wait_ticks(sources),
        buildings_needing_pickup: buildings_needing_pickup(sources),
        trips_made: collectors
            .iter()
            .map(Collector::trips_made)
            .fold(0, u64::saturating_add),
        distance_traveled: collectors
            .iter()
            .map(Collector::distance_traveled)
            .fold(0, u64::saturating_add),
        phases: phase_counts(collectors),
    }
}

/// One render view per agent: buildings, then trucks, then the sink.
pub fn agent_views(
    sources: &[TrashSource],
    collectors: &[Collector],
    sink: &DisposalSink,
) -> Vec<AgentView> {
    let mut views = Vec::with_capacity(sources.len().saturating_add(collectors.len()).saturating_add(1));
    views.extend(sources.iter().map(|s| AgentView {
        occupant: s.occupant(),
        kind: AgentKind::Building,
        position: s.position(),
        amount: s.fill_level(),
        fill_ratio: s.fill_ratio(),
        phase: None,
        pickup_requested: s.pickup_requested(),
    }));
    views.extend(collectors.iter().map(|c| AgentView {
        occupant: c.occupant(),
        kind: AgentKind::Truck,
        position: c.position(),
        amount: c.load(),
        fill_ratio: c.load_ratio(),
        phase: Some(c.phase()),
        pickup_requested: false,
    }));
    views.push(AgentView {
        occupant: sink.occupant(),
        kind: AgentKind::Disposal,
        position: sink.position(),
        amount: sink.total_received(),
        fill_ratio: Decimal::ZERO,
        phase: None,
        pickup_requested: false,
    });
    views
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wasteflow_types::{Position, SourceId};
    use wasteflow_world::SourceParams;

    use super::*;

    fn source(id: u32, capacity: i64, rate: i64) -> TrashSource {
        let params = SourceParams::new(Decimal::new(capacity, 0), Decimal::new(rate, 0));
        TrashSource::new(SourceId::new(id), Position::new(id, 0), &params).unwrap()
    }

    #[test]
    fn mean_wait_is_zero_without_requests() {
        let sources = vec![source(0, 10, 1), source(1, 10, 1)];
        assert_eq!(mean_wait_ticks(&sources), Decimal::ZERO);
        assert_eq!(buildings_needing_pickup(&sources), 0);
    }

    #[test]
    fn mean_wait_averages_only_waiting_buildings() {
        let mut fast = source(0, 10, 10);
        let mut slow = source(1, 10, 5);
        let quiet = source(2, 100, 1);
        // fast waits 3 ticks, slow requests on tick 2 and waits 2.
        for _ in 0..3 {
            fast.step();
            slow.step();
        }
        let sources = vec![fast, slow, quiet];
        assert_eq!(buildings_needing_pickup(&sources), 2);
        assert_eq!(mean_wait_ticks(&sources), Decimal::new(25, 1));
        assert_eq!(total_generated(&sources), Decimal::new(20, 0));
    }

    #[test]
    fn views_cover_every_agent() {
        let sources = vec![source(0, 10, 10)];
        let sink = DisposalSink::new(Position::ORIGIN);
        let views = agent_views(&sources, &[], &sink);
        assert_eq!(views.len(), 2);
        assert_eq!(views.first().unwrap().kind, AgentKind::Building);
        assert_eq!(views.last().unwrap().kind, AgentKind::Disposal);
    }
}
