//! Pipeline lifecycle states.
//!
//! ```text
//!  Uninitialized ──startup──▶ Ready ──before_day──▶ Collecting ──after_day──▶ Computing
//!                               ▲                                               │
//!                               │                                        iteration_end
//!                               └──────── before_day ◀── Reported ◀─────────────┘
//!
//!  any fatal error ──▶ Aborted (terminal)
//! ```

use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PipelineState {
    /// Built, no grid yet.
    Uninitialized,
    /// Grid built; waiting for the first day.
    Ready,
    /// Accepting events for the current day.
    Collecting,
    /// Stages have run; summary not yet reported.
    Computing,
    /// Iteration finished; the next `before_day` may start.
    Reported,
    /// A fatal error occurred.  Every hook is rejected.
    Aborted,
}

impl PipelineState {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineState::Uninitialized => "uninitialized",
            PipelineState::Ready         => "ready",
            PipelineState::Collecting    => "collecting",
            PipelineState::Computing     => "computing",
            PipelineState::Reported      => "reported",
            PipelineState::Aborted       => "aborted",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
