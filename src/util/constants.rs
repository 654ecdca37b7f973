//! Centralized constants for runtime configuration
//!
//! All timeout and limit values in one place for easy tuning.

use std::time::Duration;

/// Timeout for a single provider create/update call
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(60);

/// Maximum resource id length (DNS label limit)
pub const MAX_RESOURCE_ID_LEN: usize = 63;
