//! Per-subscription fetch lifecycle.
//!
//! Pure and synchronous: the engine drives it, the tests exercise it
//! directly. Two rules govern the cycle. First, at most one request is in
//! flight per subscription; a timer tick that lands while a fetch is
//! outstanding is dropped. Second, a completion only applies if it carries
//! the highest sequence number issued so far. A request the client already
//! reported as failed (say, a transport timeout) may still complete later
//! once a replacement has been issued; that zombie completion must not
//! clobber the newer snapshot.

/// Where the subscription is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the next timer tick.
    Idle,
    /// A request is outstanding.
    Fetching,
}

/// Verdict for a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The result is current; publish it.
    Applied,
    /// A newer request superseded this one; discard silently.
    Stale,
}

#[derive(Debug)]
pub struct PollState {
    phase: Phase,
    /// Highest sequence number handed out by `on_tick`. Zero means no
    /// request has been issued yet.
    highest_issued: u64,
    /// Consecutive failures since the last applied result.
    errors: u64,
}

impl PollState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            highest_issued: 0,
            errors: 0,
        }
    }

    /// Timer tick. Issues the next sequence number and enters `Fetching`,
    /// or returns `None` if a request is already outstanding.
    pub fn on_tick(&mut self) -> Option<u64> {
        match self.phase {
            Phase::Fetching => None,
            Phase::Idle => {
                self.highest_issued += 1;
                self.phase = Phase::Fetching;
                Some(self.highest_issued)
            }
        }
    }

    /// A fetch tagged `seq` completed successfully. Returns whether the
    /// result should replace the cached snapshot.
    pub fn on_success(&mut self, seq: u64) -> Completion {
        if seq != self.highest_issued {
            return Completion::Stale;
        }
        self.phase = Phase::Idle;
        self.errors = 0;
        Completion::Applied
    }

    /// A fetch tagged `seq` failed. The cached snapshot stays untouched;
    /// stale failures are ignored entirely.
    pub fn on_error(&mut self, seq: u64) {
        if seq != self.highest_issued {
            return;
        }
        self.phase = Phase::Idle;
        self.errors += 1;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn errors(&self) -> u64 {
        self.errors
    }
}

impl Default for PollState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_issues_immediately() {
        let mut state = PollState::new();
        assert_eq!(state.on_tick(), Some(1));
        assert_eq!(state.phase(), Phase::Fetching);
    }

    #[test]
    fn ticks_never_overlap_requests() {
        let mut state = PollState::new();
        assert_eq!(state.on_tick(), Some(1));
        // Ticks landing mid-fetch are dropped.
        assert_eq!(state.on_tick(), None);
        assert_eq!(state.on_tick(), None);

        assert_eq!(state.on_success(1), Completion::Applied);
        assert_eq!(state.on_tick(), Some(2));
    }

    #[test]
    fn late_completion_of_a_failed_request_is_discarded() {
        let mut state = PollState::new();

        // Request 1 goes out and the client gives up on it (timeout).
        assert_eq!(state.on_tick(), Some(1));
        state.on_error(1);
        assert_eq!(state.errors(), 1);

        // Request 2 is issued and completes first.
        assert_eq!(state.on_tick(), Some(2));
        assert_eq!(state.on_success(2), Completion::Applied);

        // Request 1's response finally crawls in; it must not apply.
        assert_eq!(state.on_success(1), Completion::Stale);
        assert_eq!(state.phase(), Phase::Idle);
    }

    #[test]
    fn stale_errors_do_not_count() {
        let mut state = PollState::new();
        assert_eq!(state.on_tick(), Some(1));
        state.on_error(1);
        assert_eq!(state.on_tick(), Some(2));
        assert_eq!(state.on_success(2), Completion::Applied);

        // A zombie failure for request 1 after request 2 applied.
        state.on_error(1);
        assert_eq!(state.errors(), 0);
        assert_eq!(state.phase(), Phase::Idle);
    }

    #[test]
    fn errors_accumulate_until_a_success() {
        let mut state = PollState::new();
        for expected in 1..=3u64 {
            let seq = state.on_tick().unwrap();
            state.on_error(seq);
            assert_eq!(state.errors(), expected);
        }
        let seq = state.on_tick().unwrap();
        assert_eq!(state.on_success(seq), Completion::Applied);
        assert_eq!(state.errors(), 0);
    }
}
