//! AcousticBrainz API Data Transfer Objects
//!
//! Only the submission count endpoint is used: it tells us whether audio
//! features exist for a recording without downloading them.

use serde::{Deserialize, Serialize};

/// `/api/v1/{mbid}/count` response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CountResponse {
    pub mbid: Option<String>,
    /// Number of low-level submissions for the recording
    pub count: u64,
}
