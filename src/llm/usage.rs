use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use tokio::sync::Mutex;

use super::clock::{Clock, SystemClock};
use crate::error::{LlmError, QuotaKind, Result};

const MINUTE_WINDOW: Duration = Duration::from_secs(60);
const DAY_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Provider-imposed quotas
#[derive(Debug, Clone, PartialEq)]
pub struct UsageLimits {
    pub requests_per_minute: u32,
    pub tokens_per_minute: u64,
    pub requests_per_day: u32,
    /// Spacing between the end of one send and the start of the next
    pub min_delay: Duration,
}

impl Default for UsageLimits {
    fn default() -> Self {
        UsageLimits {
            requests_per_minute: 15,
            tokens_per_minute: 250_000,
            requests_per_day: 1000,
            min_delay: Duration::from_secs(4),
        }
    }
}

/// Counters for the current windows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageState {
    pub requests_this_minute: u32,
    pub tokens_this_minute: u64,
    pub requests_today: u32,
    pub last_request_time: Option<DateTime<Utc>>,
    pub minute_start_time: DateTime<Utc>,
}

/// Read-only snapshot of usage against the limits
#[derive(Debug, Clone, Serialize)]
pub struct UsageStatus {
    pub requests_this_minute: u32,
    pub requests_per_minute_limit: u32,
    pub tokens_this_minute: u64,
    pub tokens_per_minute_limit: u64,
    pub requests_today: u32,
    pub requests_per_day_limit: u32,
    pub time_until_minute_reset_secs: f64,
    pub can_make_request: bool,
}

impl fmt::Display for UsageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "   - Requests this minute: {}/{}", self.requests_this_minute, self.requests_per_minute_limit)?;
        writeln!(f, "   - Tokens this minute: {}/{}", self.tokens_this_minute, self.tokens_per_minute_limit)?;
        writeln!(f, "   - Requests today: {}/{}", self.requests_today, self.requests_per_day_limit)?;
        write!(f, "   - Time until minute reset: {:.1} seconds", self.time_until_minute_reset_secs)
    }
}

/// Usage tracker shared by every client talking to the same provider
pub type SharedUsage = Arc<Mutex<UsageTracker>>;

/// Rough token count: one token per four characters
pub fn estimate_tokens(prompt: &str) -> u64 {
    (prompt.chars().count() / 4) as u64
}

/// Sliding per-minute and per-day quota accounting
///
/// The minute window is fixed-length and restarts once 60s have elapsed
/// since it opened. The day window slides: it holds the admission
/// instants of the last 24 hours, so no 24h span ever exceeds
/// `requests_per_day`.
pub struct UsageTracker {
    limits: UsageLimits,
    state: UsageState,
    day_log: VecDeque<DateTime<Utc>>,
    clock: Arc<dyn Clock>,
}

impl UsageTracker {
    pub fn new(limits: UsageLimits) -> Self {
        Self::with_clock(limits, Arc::new(SystemClock))
    }

    pub fn with_clock(limits: UsageLimits, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        UsageTracker {
            limits,
            state: UsageState {
                requests_this_minute: 0,
                tokens_this_minute: 0,
                requests_today: 0,
                last_request_time: None,
                minute_start_time: now,
            },
            day_log: VecDeque::new(),
            clock,
        }
    }

    pub fn shared(self) -> SharedUsage {
        Arc::new(Mutex::new(self))
    }

    pub fn limits(&self) -> &UsageLimits {
        &self.limits
    }

    pub fn state(&self) -> &UsageState {
        &self.state
    }

    /// Wait until a send is allowed, or fail once the daily cap is reached
    ///
    /// Called right before a send. Counters are only bumped by
    /// [`record`](Self::record) once the send went through.
    pub async fn admit(&mut self, estimated_tokens: u64) -> Result<()> {
        let now = self.clock.now();

        // 1. Restart the minute window if it is over
        self.roll_minute_window(now);
        self.prune_day_window(now);

        // 2. Daily cap is a hard stop
        if self.state.requests_today >= self.limits.requests_per_day {
            let retry_after = self
                .day_log
                .front()
                .map(|oldest| elapsed(now, *oldest + to_delta(DAY_WINDOW)))
                .unwrap_or(DAY_WINDOW);
            warn!(
                "🚫 Daily request limit ({}) reached, next slot in {:.0}s",
                self.limits.requests_per_day,
                retry_after.as_secs_f64()
            );
            return Err(LlmError::QuotaExceeded {
                kind: QuotaKind::Daily,
                limit: self.limits.requests_per_day,
                retry_after,
            });
        }

        if estimated_tokens > self.limits.tokens_per_minute {
            warn!(
                "Prompt estimated at {} tokens exceeds the {} tokens/min quota",
                estimated_tokens, self.limits.tokens_per_minute
            );
        }

        // 3. Minute quotas block until the window is over
        let requests_full = self.state.requests_this_minute >= self.limits.requests_per_minute;
        let tokens_full = self.state.tokens_this_minute >= self.limits.tokens_per_minute;
        if requests_full || tokens_full {
            let wait = MINUTE_WINDOW.saturating_sub(elapsed(self.state.minute_start_time, now));
            let cause = if requests_full { "Rate" } else { "Token" };
            info!("⏳ {} limit reached. Waiting {:.1} seconds...", cause, wait.as_secs_f64());
            self.clock.sleep(wait).await;
            let now = self.clock.now();
            self.reset_minute_window(now);
        }

        // 4. Minimum spacing always applies
        if let Some(last) = self.state.last_request_time {
            let since_last = elapsed(last, self.clock.now());
            if since_last < self.limits.min_delay {
                let wait = self.limits.min_delay - since_last;
                info!("⏳ Waiting {:.1} seconds between requests...", wait.as_secs_f64());
                self.clock.sleep(wait).await;
            }
        }

        Ok(())
    }

    /// Account for a send that reached the provider
    pub fn record(&mut self, estimated_tokens: u64) {
        let now = self.clock.now();
        self.roll_minute_window(now);
        self.prune_day_window(now);

        self.state.requests_this_minute += 1;
        self.state.tokens_this_minute += estimated_tokens;
        self.day_log.push_back(now);
        self.state.requests_today = self.day_log.len() as u32;
        self.state.last_request_time = Some(now);

        info!(
            "📊 API Usage: {}/{} requests/min, {}/{} tokens/min, {}/{} requests/day",
            self.state.requests_this_minute,
            self.limits.requests_per_minute,
            self.state.tokens_this_minute,
            self.limits.tokens_per_minute,
            self.state.requests_today,
            self.limits.requests_per_day
        );
    }

    pub fn status(&self) -> UsageStatus {
        let now = self.clock.now();
        let since_window = elapsed(self.state.minute_start_time, now);

        let (requests_this_minute, tokens_this_minute, time_until_reset) = if since_window >= MINUTE_WINDOW {
            (0, 0, Duration::ZERO)
        } else {
            (
                self.state.requests_this_minute,
                self.state.tokens_this_minute,
                MINUTE_WINDOW - since_window,
            )
        };

        let day_cutoff = now - to_delta(DAY_WINDOW);
        let requests_today = self.day_log.iter().filter(|t| **t > day_cutoff).count() as u32;

        UsageStatus {
            requests_this_minute,
            requests_per_minute_limit: self.limits.requests_per_minute,
            tokens_this_minute,
            tokens_per_minute_limit: self.limits.tokens_per_minute,
            requests_today,
            requests_per_day_limit: self.limits.requests_per_day,
            time_until_minute_reset_secs: time_until_reset.as_secs_f64(),
            can_make_request: requests_this_minute < self.limits.requests_per_minute
                && tokens_this_minute < self.limits.tokens_per_minute
                && requests_today < self.limits.requests_per_day,
        }
    }

    fn roll_minute_window(&mut self, now: DateTime<Utc>) {
        if elapsed(self.state.minute_start_time, now) >= MINUTE_WINDOW {
            self.reset_minute_window(now);
        }
    }

    /// Both minute counters are zeroed together; the window start never moves back
    fn reset_minute_window(&mut self, now: DateTime<Utc>) {
        debug!("Minute window reset");
        self.state.requests_this_minute = 0;
        self.state.tokens_this_minute = 0;
        self.state.minute_start_time = self.state.minute_start_time.max(now);
    }

    fn prune_day_window(&mut self, now: DateTime<Utc>) {
        let cutoff = now - to_delta(DAY_WINDOW);
        while self.day_log.front().is_some_and(|t| *t <= cutoff) {
            self.day_log.pop_front();
        }
        self.state.requests_today = self.day_log.len() as u32;
    }
}

/// Time from `from` to `to`, zero when `to` is earlier
fn elapsed(from: DateTime<Utc>, to: DateTime<Utc>) -> Duration {
    (to - from).to_std().unwrap_or(Duration::ZERO)
}

fn to_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::zero())
}
