//! Type-safe identifier wrappers for simulation agents.
//!
//! Every building and truck has a strongly-typed ID so the two rosters can
//! never be mixed at compile time. Identifiers are dense registration
//! indices rather than random UUIDs: the tick loop evaluates agents in
//! ascending ID order and dispatch ties are broken by the lowest source
//! ID, so IDs must be stable and reproducible across runs.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Generates a newtype wrapper around a registration index with standard
/// derives and a prefixed display form.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident, $prefix:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub u32);

        impl $name {
            /// Create an identifier from a registration index.
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            /// Return the inner registration index.
            pub const fn into_inner(self) -> u32 {
                self.0
            }

            /// Return the registration index as a roster slot.
            pub fn slot(self) -> usize {
                usize::try_from(self.0).unwrap_or(usize::MAX)
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl From<u32> for $name {
            fn from(index: u32) -> Self {
                Self(index)
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a trash source (building).
    SourceId, "building"
}

define_id! {
    /// Unique identifier for a collector (truck).
    CollectorId, "truck"
}
