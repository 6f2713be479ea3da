//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Facade operation:
//!     → cache.rs (serve fresh cached value, else continue)
//!     → circuit_breaker.rs (fail fast while open)
//!     → call the wrapped service
//!     → On failure: retries.rs + backoff.rs (sleep base * 2^attempt, retry)
//!     → circuit_breaker.rs (count failure, open at threshold)
//! ```
//!
//! # Design Decisions
//! - Every external call has a deadline or a bounded retry budget
//! - Circuit breaker prevents cascading failures
//! - Primitives are plain state records; the facade owns locking

pub mod backoff;
pub mod cache;
pub mod circuit_breaker;
pub mod retries;

pub use cache::{cache_key, TtlCache};
pub use circuit_breaker::{Admission, CircuitBreakerState, CircuitState};
pub use retries::RetryPolicy;
