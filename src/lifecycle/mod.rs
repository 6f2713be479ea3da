//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Phases (phase.rs):
//!     Created → Initializing → Running → ShuttingDown → Stopped
//!
//! Shutdown (shutdown.rs):
//!     orchestrator.shutdown() → broadcast → monitor + metrics loops exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → main calls orchestrator.shutdown()
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then facades, then background loops
//! - Ordered shutdown: stop loops, then facades (dependents first)
//! - Every shutdown step has a timeout

pub mod phase;
pub mod shutdown;
pub mod signals;

pub use phase::LifecyclePhase;
pub use shutdown::Shutdown;
