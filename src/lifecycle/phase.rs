//! Orchestrator lifecycle phases.
//!
//! # State Transitions
//! ```text
//! Created → Initializing:       initialize_services() called
//! Initializing → Running:       every critical facade present, loops started
//! Initializing → Created:       a critical facade missing or the graph rejected
//! Created/Initializing/Running → ShuttingDown: shutdown() called
//! ShuttingDown → Stopped:       loops joined, facades shut down
//! ```

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    Created,
    Initializing,
    Running,
    ShuttingDown,
    Stopped,
}

impl LifecyclePhase {
    pub fn can_transition_to(self, next: LifecyclePhase) -> bool {
        use LifecyclePhase::*;
        matches!(
            (self, next),
            (Created, Initializing)
                | (Initializing, Running)
                | (Initializing, Created)
                | (Created | Initializing | Running, ShuttingDown)
                | (ShuttingDown, Stopped)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, LifecyclePhase::ShuttingDown | LifecyclePhase::Stopped)
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecyclePhase::Created => "created",
            LifecyclePhase::Initializing => "initializing",
            LifecyclePhase::Running => "running",
            LifecyclePhase::ShuttingDown => "shutting_down",
            LifecyclePhase::Stopped => "stopped",
        };
        f.write_str(name)
    }
}
