//! Request ids for outgoing pings.

/// Hands out ping request ids: `1, 2, 3, …`.
///
/// The counter wraps back to `0` once it reaches `i32::MAX - 1`, so it can
/// never overflow. After a wrap ids repeat; nothing here tracks which ids
/// are still outstanding.
#[derive(Debug, Clone, Default)]
pub struct RequestIdSequence {
    counter: i32,
}

impl RequestIdSequence {
    /// Value at which the counter resets to zero.
    pub const WRAP_AT: i32 = i32::MAX - 1;

    /// Creates a sequence whose first id is `1`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sequence whose next id is `counter + 1` (or `0` if that
    /// reaches [`Self::WRAP_AT`]).
    pub fn starting_after(counter: i32) -> Self {
        Self { counter }
    }

    /// Allocates the next id.
    pub fn next_id(&mut self) -> i32 {
        self.counter = self.counter.saturating_add(1);
        if self.counter >= Self::WRAP_AT {
            self.counter = 0;
        }
        self.counter
    }

    /// The most recently allocated id (`0` before the first call).
    pub fn current(&self) -> i32 {
        self.counter
    }
}
