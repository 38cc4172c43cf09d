//! Error classification.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Broad error category used to decide how far a failure propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    /// Bad configuration or failed initialization. Fatal before traffic.
    Configuration,
    /// A tool server, peer agent or model endpoint could not be reached.
    Transport,
    /// A tool reported a failure of its own.
    Application,
    /// Model or peer output did not have the expected shape.
    Decoding,
    /// The model provider rejected a request.
    Model,
    /// Invariant violations and everything else.
    Internal,
}
