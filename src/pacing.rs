//! Politeness delays between remote requests.
//!
//! YouTube starts asking for logins when a client hammers it, so every entry
//! that touched the remote side is followed by a pause, and a longer one
//! separates playlists. Consecutive failures stretch the pause exponentially.
//! All waiting goes through [`Clock`] so tests never sleep for real.

use std::cell::RefCell;
use std::time::Duration;

pub const DEFAULT_ENTRY_DELAY: Duration = Duration::from_secs(10);
pub const DEFAULT_PLAYLIST_DELAY: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(300);
const MAX_BACKOFF_EXPONENT: u32 = 5;

pub trait Clock {
    fn sleep(&self, duration: Duration);
}

/// Blocks the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Records requested sleeps instead of waiting.
#[derive(Debug, Default)]
pub struct VirtualClock {
    sleeps: RefCell<Vec<Duration>>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }

    pub fn elapsed(&self) -> Duration {
        self.sleeps.borrow().iter().sum()
    }
}

impl Clock for VirtualClock {
    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    pub entry_delay: Duration,
    pub playlist_delay: Duration,
    pub max_backoff: Duration,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            entry_delay: DEFAULT_ENTRY_DELAY,
            playlist_delay: DEFAULT_PLAYLIST_DELAY,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

impl PacingPolicy {
    /// Delay after an entry given the current run of consecutive failures.
    pub fn entry_delay_after(&self, consecutive_failures: u32) -> Duration {
        if consecutive_failures == 0 {
            return self.entry_delay;
        }
        let factor = 1u32 << consecutive_failures.min(MAX_BACKOFF_EXPONENT);
        self.entry_delay
            .saturating_mul(factor)
            .min(self.max_backoff.max(self.entry_delay))
    }
}

/// Applies a [`PacingPolicy`] through a [`Clock`].
pub struct Pacer<'a> {
    policy: PacingPolicy,
    clock: &'a dyn Clock,
    consecutive_failures: u32,
}

impl<'a> Pacer<'a> {
    pub fn new(policy: PacingPolicy, clock: &'a dyn Clock) -> Self {
        Self {
            policy,
            clock,
            consecutive_failures: 0,
        }
    }

    /// Waits after an entry that reached the remote side.
    pub fn after_entry(&mut self, succeeded: bool) -> Duration {
        if succeeded {
            self.consecutive_failures = 0;
        } else {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        }
        let delay = self.policy.entry_delay_after(self.consecutive_failures);
        self.clock.sleep(delay);
        delay
    }

    /// Waits between two playlists.
    pub fn after_playlist(&mut self) -> Duration {
        let delay = self.policy.playlist_delay;
        self.clock.sleep(delay);
        delay
    }
}
