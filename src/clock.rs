use std::time::Duration;

pub const SESSION_SECS: u32 = 60;
pub const COUNTDOWN_INTERVAL: Duration = Duration::from_millis(1000);
pub const REPOPULATE_INTERVAL: Duration = Duration::from_millis(5000);

/// A fixed-period cadence driven by a logical clock
#[derive(Debug, Clone, Copy)]
pub struct Cadence {
    period: Duration,
    elapsed: Duration,
}

impl Cadence {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            elapsed: Duration::ZERO,
        }
    }

    /// Advance by `dt`; returns the offset into `dt` of every completed period
    pub fn advance(&mut self, dt: Duration) -> Vec<Duration> {
        let mut due = vec![];
        let mut next = self.period - self.elapsed;
        while next <= dt {
            due.push(next);
            next += self.period;
        }
        self.elapsed = self.period - (next - dt);
        due
    }

    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTick {
    Repopulate,
    Countdown,
}

/// The session's two cadences behind a single tick source. Nothing fires
/// while stopped.
#[derive(Debug, Clone)]
pub struct SessionClock {
    repopulate: Cadence,
    countdown: Cadence,
    running: bool,
}

impl Default for SessionClock {
    fn default() -> Self {
        Self {
            repopulate: Cadence::new(REPOPULATE_INTERVAL),
            countdown: Cadence::new(COUNTDOWN_INTERVAL),
            running: false,
        }
    }
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.repopulate.reset();
        self.countdown.reset();
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advance both cadences and return the ticks that came due, in time
    /// order. When both fall on the same instant the repopulate tick comes
    /// first.
    pub fn advance(&mut self, dt: Duration) -> Vec<ClockTick> {
        if !self.running {
            return vec![];
        }

        let mut due: Vec<(Duration, ClockTick)> = self
            .repopulate
            .advance(dt)
            .into_iter()
            .map(|at| (at, ClockTick::Repopulate))
            .chain(
                self.countdown
                    .advance(dt)
                    .into_iter()
                    .map(|at| (at, ClockTick::Countdown)),
            )
            .collect();
        due.sort_by_key(|(at, tick)| (*at, *tick == ClockTick::Countdown));
        due.into_iter().map(|(_, tick)| tick).collect()
    }
}
