//! Timestamps carried by ping/pong packets.
//!
//! Latency is measured by stamping a packet when it leaves and comparing
//! that stamp with one taken later. Two properties matter:
//!
//! - the unit has to be fine-grained (we use nanoseconds), and
//! - readings from one clock must never go backwards, otherwise a latency
//!   sample can come out negative.
//!
//! [`SystemClock`] reads the wall clock ONCE when created and advances it
//! with the monotonic [`Instant`], so it satisfies both.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Nanoseconds since the UNIX epoch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
    Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Returns the raw nanosecond count.
    pub fn as_nanos(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}

/// A source of [`Timestamp`]s.
///
/// `Send + Sync` because the session manager holding the clock lives
/// inside a Tokio task.
pub trait Clock: Send + Sync + 'static {
    /// Returns the current time.
    fn now(&self) -> Timestamp;
}

// ---------------------------------------------------------------------------
// SystemClock
// ---------------------------------------------------------------------------

/// Wall-clock anchored, monotonically advancing clock.
#[derive(Debug, Clone)]
pub struct SystemClock {
    epoch_nanos: i64,
    origin: Instant,
}

impl SystemClock {
    /// Anchors a new clock at the current wall time.
    pub fn new() -> Self {
        // A system clock set before 1970 is treated as the epoch itself.
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Self {
            epoch_nanos: duration_to_nanos(since_epoch),
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let elapsed = duration_to_nanos(self.origin.elapsed());
        Timestamp(self.epoch_nanos.saturating_add(elapsed))
    }
}

fn duration_to_nanos(d: Duration) -> i64 {
    i64::try_from(d.as_nanos()).unwrap_or(i64::MAX)
}

// ---------------------------------------------------------------------------
// FixedClock
// ---------------------------------------------------------------------------

/// A manually driven clock for tests and simulations.
///
/// Interior mutability through an atomic lets a test keep a clone of the
/// `Arc` and move time forward while the session manager owns the other.
#[derive(Debug, Default)]
pub struct FixedClock {
    nanos: AtomicI64,
}

impl FixedClock {
    /// Creates a clock frozen at `nanos`.
    pub fn new(nanos: i64) -> Self {
        Self {
            nanos: AtomicI64::new(nanos),
        }
    }

    /// Moves the clock to an absolute value.
    pub fn set(&self, nanos: i64) {
        self.nanos.store(nanos, Ordering::Relaxed);
    }

    /// Moves the clock forward by `nanos`.
    pub fn advance(&self, nanos: i64) {
        self.nanos.fetch_add(nanos, Ordering::Relaxed);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.nanos.load(Ordering::Relaxed))
    }
}

impl<C: Clock> Clock for std::sync::Arc<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}
