/// Process-wide crawl cycle state
///
/// A crawl cycle runs from seeding the queue until the queue drains. The three
/// timestamps here are the only cycle-level mutable state the engine keeps,
/// and they live in storage, not in a global: the orchestrator loads them at
/// the start of every tick and persists them back after each transition.

/// Timestamps (epoch seconds, 0 = unset) describing the current crawl cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CrawlState {
    /// When the current (or most recent) cycle started
    pub crawl_start: i64,

    /// When the last cycle finished draining the queue
    pub crawl_end: i64,

    /// When the engine last made progress (updated once per tick iteration)
    pub crawl_tick: i64,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while a cycle is in progress
    ///
    /// A cycle is active from `begin_cycle` until `finish_cycle`; a fresh
    /// store (all zeros) is idle.
    pub fn is_active(&self) -> bool {
        self.crawl_start > self.crawl_end
    }

    /// Starts a new cycle at `now`
    pub fn begin_cycle(&mut self, now: i64) {
        self.crawl_start = now;
        self.crawl_tick = now;
    }

    /// Ends the active cycle at `now`
    pub fn finish_cycle(&mut self, now: i64) {
        self.crawl_end = now;
    }

    /// Records a heartbeat for the current tick iteration
    pub fn record_tick(&mut self, now: i64) {
        self.crawl_tick = now;
    }
}
