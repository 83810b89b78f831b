//! Fixed-interval polling with a deadline.

use std::thread;
use std::time::{Duration, Instant};

/// How often and for how long to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(50),
            timeout: Duration::from_secs(30),
        }
    }
}

impl PollPolicy {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

/// The condition never held before the deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTimeout {
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Call `check` until it returns true or the policy's timeout passes.
///
/// The first attempt happens immediately. Sleeps never overshoot the
/// deadline, so a failing check returns within `timeout` plus the duration
/// of one `check` call. A timeout too large to represent never expires.
/// Returns the number of attempts made.
pub fn poll_until<F>(policy: &PollPolicy, mut check: F) -> Result<u32, PollTimeout>
where
    F: FnMut() -> bool,
{
    let start = Instant::now();
    let deadline = start.checked_add(policy.timeout);
    let mut attempts = 0u32;

    loop {
        attempts = attempts.saturating_add(1);
        if check() {
            return Ok(attempts);
        }

        let now = Instant::now();
        let pause = match deadline {
            Some(deadline) if now >= deadline => {
                return Err(PollTimeout {
                    attempts,
                    elapsed: now - start,
                });
            }
            Some(deadline) => policy.interval.min(deadline - now),
            None => policy.interval,
        };
        thread::sleep(pause);
    }
}
