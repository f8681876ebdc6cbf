//! Per-query lifecycle stages.
//!
//! Transitions only move forward. The host expresses each stage as a value it
//! consumes to reach the next, so an out-of-order call does not type-check;
//! `Stage` names the states for logs and manifests.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    Unbound,
    Bound,
    Generated,
    Loaded,
    Executed,
    Consumed,
}

impl Stage {
    pub const fn next(self) -> Option<Stage> {
        match self {
            Stage::Unbound => Some(Stage::Bound),
            Stage::Bound => Some(Stage::Generated),
            Stage::Generated => Some(Stage::Loaded),
            Stage::Loaded => Some(Stage::Executed),
            Stage::Executed => Some(Stage::Consumed),
            Stage::Consumed => None,
        }
    }

    /// Whether `to` directly follows `self`.
    pub fn can_advance_to(self, to: Stage) -> bool {
        self.next() == Some(to)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Unbound => "unbound",
            Stage::Bound => "bound",
            Stage::Generated => "generated",
            Stage::Loaded => "loaded",
            Stage::Executed => "executed",
            Stage::Consumed => "consumed",
        };
        f.write_str(s)
    }
}
