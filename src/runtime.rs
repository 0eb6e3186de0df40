use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// What the game loop reacts to
#[derive(Clone, Debug, PartialEq)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    /// A frame is due: poll poses and step the game by the carried duration
    Frame(Duration),
}

/// Source of terminal input (keys, resizes)
pub trait AppEventSource: Send + 'static {
    /// Wait up to `timeout` for input. Err(Timeout) when nothing arrived.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Reads crossterm events on a background thread
pub struct CrosstermEventSource {
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || loop {
            let forwarded = match event::read() {
                // Held keys repeat on some terminals; releases are noise
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                    tx.send(AppEvent::Key(key))
                }
                Ok(CtEvent::Resize(_, _)) => tx.send(AppEvent::Resize),
                Ok(_) => Ok(()),
                Err(_) => break,
            };
            if forwarded.is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AppEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Test event source fed from a channel
pub struct TestEventSource {
    rx: Receiver<AppEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl AppEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Frame cadence and how much game time each frame is worth
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;

    /// Game time charged for a frame that took `elapsed` of wall time
    fn frame_time(&self, elapsed: Duration) -> Duration {
        elapsed
    }
}

/// Wall-clock frames: the game advances by the time that really passed
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Frames at `interval` that each advance the game by a fixed `step`, so a
/// headless run can cover a whole session in milliseconds
#[derive(Clone, Copy, Debug)]
pub struct SteppedTicker {
    interval: Duration,
    step: Duration,
}

impl SteppedTicker {
    pub fn new(interval: Duration, step: Duration) -> Self {
        Self { interval, step }
    }
}

impl Ticker for SteppedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }

    fn frame_time(&self, _elapsed: Duration) -> Duration {
        self.step
    }
}

/// Interleaves input with frames. Input never delays a frame past its
/// deadline; frames come from the ticker's cadence alone.
pub struct Runner<E: AppEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    last_frame: Instant,
}

impl<E: AppEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
            last_frame: Instant::now(),
        }
    }

    /// Next input event, or a Frame once the interval since the last frame
    /// has run out
    pub fn step(&mut self) -> AppEvent {
        let since = self.last_frame.elapsed();
        let Some(remaining) = self.ticker.interval().checked_sub(since) else {
            return self.frame();
        };
        match self.event_source.recv_timeout(remaining) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => self.frame(),
            Err(RecvTimeoutError::Disconnected) => {
                // No more input; keep the cadence without spinning
                thread::sleep(remaining);
                self.frame()
            }
        }
    }

    fn frame(&mut self) -> AppEvent {
        let now = Instant::now();
        let elapsed = now - self.last_frame;
        self.last_frame = now;
        AppEvent::Frame(self.ticker.frame_time(elapsed))
    }
}
