//! Greedy request selection.
//!
//! A patrolling truck scans the buildings in id order and picks the
//! nearest one (Manhattan distance) that is requesting pickup, is not
//! claimed by another truck, and fits in the truck's remaining headroom.
//! Equal distances keep the lowest source id.

use rust_decimal::Decimal;
use wasteflow_types::{CollectorId, Position, SourceId};
use wasteflow_world::TrashSource;

use crate::claims::ClaimRegistry;

/// What a patrolling collector should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Claim this source and drive to it.
    Claim {
        /// The chosen source.
        source: SourceId,
        /// Manhattan distance at the time of choice.
        distance: u64,
    },
    /// Open requests exist, but none fits in the remaining headroom.
    NoFit,
    /// No open, unclaimed request exists.
    Idle,
}

/// Choose a pickup for `collector` at `position` with `headroom` spare load.
///
/// A source fits when its full capacity is at most `headroom`, so the whole
/// fill can always be taken in one harvest.
pub fn select_target(
    collector: CollectorId,
    position: Position,
    headroom: Decimal,
    sources: &[TrashSource],
    claims: &ClaimRegistry,
) -> Dispatch {
    let mut best: Option<(u64, SourceId)> = None;
    let mut saw_unfit = false;

    for source in sources {
        if !source.pickup_requested() || claims.is_claimed_by_other(source.id(), collector) {
            continue;
        }
        if source.capacity() > headroom {
            saw_unfit = true;
            continue;
        }
        let distance = position.manhattan_distance(source.position());
        let better = best.is_none_or(|(d, id)| distance < d || (distance == d && source.id() < id));
        if better {
            best = Some((distance, source.id()));
        }
    }

    match best {
        Some((distance, source)) => Dispatch::Claim { source, distance },
        None if saw_unfit => Dispatch::NoFit,
        None => Dispatch::Idle,
    }
}
