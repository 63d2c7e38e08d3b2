//! Typed configuration (SPEC_FULL.md §7B).
//!
//! Small structs with `Default` impls carrying the tunables named in §5,
//! rather than a dynamic key/value config map, matching the convention used
//! throughout the corpus for this kind of thing.

use std::time::Duration;

/// Server-side router tunables.
#[derive(Debug, Clone)]
pub struct RouterConfig {
	/// Maximum number of client-protocol entries kept in the compatibility
	/// cache before FIFO eviction kicks in.
	pub max_cache_entries: usize,
	/// Soft deadline applied around endpoint invocation, if the host
	/// framework doesn't already impose one. `None` leaves it entirely to
	/// the host.
	pub call_timeout: Option<Duration>,
}

impl Default for RouterConfig {
	fn default() -> Self {
		Self {
			max_cache_entries: 100,
			call_timeout: None,
		}
	}
}

/// Client-side gateway tunables.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
	/// Number of attempts (including the first) before a transport error is
	/// raised to the caller.
	pub attempts: u32,
	/// Per-call deadline, realized via `reqwest::ClientBuilder::timeout`.
	pub timeout: Duration,
	/// `backoff(attempt)` is the sleep duration before retry number
	/// `attempt` (1-based). Defaults to `attempt² seconds`.
	pub backoff: fn(u32) -> Duration,
}

fn default_backoff(attempt: u32) -> Duration {
	Duration::from_secs(u64::from(attempt.saturating_mul(attempt)))
}

impl Default for GatewayConfig {
	fn default() -> Self {
		Self {
			attempts: 3,
			timeout: Duration::from_secs(30),
			backoff: default_backoff,
		}
	}
}
