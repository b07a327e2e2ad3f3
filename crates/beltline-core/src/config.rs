//! Engine configuration.

use crate::rate::{BELT_RATES, PIPE_RATES};
use serde::{Deserialize, Serialize};

/// Tunables for a calculation pass.
///
/// Every field has a default, so partial configuration files are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct FlowConfig {
    /// Relative band around demand within which supply counts as optimal.
    pub tolerance: f64,
    /// Belt tier assumed for nodes that do not select one (1-based).
    pub default_belt_tier: u8,
    /// Pipe tier assumed for nodes that do not select one (1-based).
    pub default_pipe_tier: u8,
    /// Items per minute forwarded by a lift.
    pub lift_rate: f64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.01,
            default_belt_tier: BELT_RATES.len() as u8,
            default_pipe_tier: PIPE_RATES.len() as u8,
            lift_rate: BELT_RATES[0],
        }
    }
}
