//! Error types for the wasteflow-agents crate.
//!
//! Only construction and registry misuse can fail. Inside the tick loop,
//! a vanished target, a blocked cell or an empty request list are ordinary
//! state-machine branches and never surface as errors.

use wasteflow_types::{CollectorId, SourceId};

/// Errors that can occur during collector operations.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// A collector was configured with invalid parameters.
    #[error("invalid collector: {reason}")]
    InvalidCollector {
        /// Description of what is wrong.
        reason: String,
    },

    /// The source is already claimed by another collector.
    #[error("{source_id} is already claimed by {holder}")]
    AlreadyClaimed {
        /// The contested source.
        source_id: SourceId,
        /// The collector currently holding the claim.
        holder: CollectorId,
    },
}
