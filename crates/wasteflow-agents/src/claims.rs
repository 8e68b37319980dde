//! The claim registry.
//!
//! A claim marks a pickup request as taken so that no second truck drives
//! to the same building. Each source has at most one holder at a time.
//! Collectors act sequentially in id order within a tick, so a claim made
//! by an earlier collector is visible to every later one in the same tick;
//! ties between equally-near trucks therefore go to the lowest id.
//!
//! Claims are released when the holder harvests the source or abandons it
//! because the request vanished.

use std::collections::BTreeMap;

use wasteflow_types::{CollectorId, SourceId};

use crate::error::AgentError;

/// Mapping from claimed source to the collector that holds it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimRegistry {
    by_source: BTreeMap<SourceId, CollectorId>,
}

impl ClaimRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            by_source: BTreeMap::new(),
        }
    }

    /// Claim `source` for `collector`.
    ///
    /// Re-claiming a source the collector already holds is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AlreadyClaimed`] if another collector holds it.
    pub fn claim(&mut self, source: SourceId, collector: CollectorId) -> Result<(), AgentError> {
        match self.by_source.get(&source) {
            Some(&holder) if holder != collector => Err(AgentError::AlreadyClaimed {
                source_id: source,
                holder,
            }),
            Some(_) => Ok(()),
            None => {
                self.by_source.insert(source, collector);
                Ok(())
            }
        }
    }

    /// Release `source` if `collector` holds it. Returns whether a claim was
    /// removed.
    pub fn release(&mut self, source: SourceId, collector: CollectorId) -> bool {
        if self.by_source.get(&source) == Some(&collector) {
            self.by_source.remove(&source);
            true
        } else {
            false
        }
    }

    /// The collector holding `source`, if any.
    pub fn holder(&self, source: SourceId) -> Option<CollectorId> {
        self.by_source.get(&source).copied()
    }

    /// Whether `source` is held by someone other than `collector`.
    pub fn is_claimed_by_other(&self, source: SourceId, collector: CollectorId) -> bool {
        self.holder(source).is_some_and(|holder| holder != collector)
    }

    /// All active claims in source order.
    pub fn iter(&self) -> impl Iterator<Item = (SourceId, CollectorId)> + '_ {
        self.by_source.iter().map(|(s, c)| (*s, *c))
    }

    /// Number of active claims.
    pub fn len(&self) -> usize {
        self.by_source.len()
    }

    /// Whether no source is claimed.
    pub fn is_empty(&self) -> bool {
        self.by_source.is_empty()
    }
}
