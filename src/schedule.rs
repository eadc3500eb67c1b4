use std::time::{Duration, Instant};

/// Redraw delay while a watermark drag is in progress (about one frame at 60fps)
pub const DRAG_REDRAW_DELAY: Duration = Duration::from_millis(16);
/// Redraw delay for ordinary edits such as typing or slider changes
pub const EDIT_REDRAW_DELAY: Duration = Duration::from_millis(150);

pub fn redraw_delay(dragging: bool) -> Duration {
    if dragging {
        DRAG_REDRAW_DELAY
    } else {
        EDIT_REDRAW_DELAY
    }
}

/// Coalesces bursts of redraw requests into a single redraw.
///
/// Every request pushes the deadline out to `now + delay`; the caller polls
/// [`RedrawScheduler::take_due`] from its event loop.
#[derive(Debug, Default)]
pub struct RedrawScheduler {
    deadline: Option<Instant>,
    coalesced: u64,
}

impl RedrawScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, now: Instant, dragging: bool) {
        if self.deadline.is_some() {
            self.coalesced += 1;
        }
        self.deadline = Some(now + redraw_delay(dragging));
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time left until the pending redraw, if any
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// True once the deadline has passed; clears the pending request
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Number of requests folded into an already pending redraw
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}
