use std::time::Duration;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::calibration::CalibrationWindow;
use crate::clock::{ClockTick, SessionClock};
use crate::hit_test::{check_touches, Touch};
use crate::pose::{Part, Pose};
use crate::session::{Phase, SessionState};
use crate::targets::{Target, TargetManager};

/// Everything a step changed, for the UI and the logs
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Calibrated,
    Hit {
        wrist: Part,
        target: Target,
        score: u32,
    },
    Repopulated,
    TimeTick {
        remaining: u32,
    },
    GameOver {
        score: u32,
    },
    Restarted,
}

/// The whole game: session state, targets and clock, advanced by explicit
/// step calls. [`Game::frame`] runs once per rendered frame and
/// [`Game::advance`] feeds elapsed time to the session clock.
#[derive(Debug)]
pub struct Game {
    state: SessionState,
    targets: TargetManager,
    clock: SessionClock,
    window: CalibrationWindow,
    rng: StdRng,
}

impl Game {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            state: SessionState::default(),
            targets: TargetManager::new(),
            clock: SessionClock::new(),
            window: CalibrationWindow::default(),
            rng,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn targets(&self) -> &[Target] {
        self.targets.targets()
    }

    pub fn calibration_window(&self) -> &CalibrationWindow {
        &self.window
    }

    /// Per-frame step. Before calibration this looks for the player inside the
    /// outline; afterwards it hit-tests the wrists. Does nothing once the
    /// session is over.
    pub fn frame(&mut self, poses: &[Pose]) -> Vec<GameEvent> {
        if self.state.game_over {
            return vec![];
        }

        if !self.state.calibrated {
            if !self.window.is_calibrated(poses) {
                return vec![];
            }
            info!("player calibrated, starting session");
            self.state.calibrated = true;
            self.start_session();
            return vec![GameEvent::Calibrated];
        }

        check_touches(poses, &mut self.targets, &mut self.rng)
            .into_iter()
            .map(|touch| match touch {
                Touch::Hit { wrist, target } => {
                    self.state.score += 1;
                    debug!(
                        "{} hit target at ({:.0}, {:.0}), score {}",
                        wrist, target.x, target.y, self.state.score
                    );
                    GameEvent::Hit {
                        wrist,
                        target,
                        score: self.state.score,
                    }
                }
                Touch::Repopulated => {
                    debug!("all targets cleared, repopulated");
                    GameEvent::Repopulated
                }
            })
            .collect()
    }

    /// Feed elapsed time to the session clock and apply whatever came due
    pub fn advance(&mut self, dt: Duration) -> Vec<GameEvent> {
        let mut events = vec![];
        for tick in self.clock.advance(dt) {
            if self.state.game_over {
                break;
            }
            match tick {
                ClockTick::Repopulate => {
                    if self.targets.repopulate_if_empty(&mut self.rng) {
                        debug!("safety net repopulated an empty target set");
                        events.push(GameEvent::Repopulated);
                    }
                }
                ClockTick::Countdown => {
                    self.state.time_remaining = self.state.time_remaining.saturating_sub(1);
                    events.push(GameEvent::TimeTick {
                        remaining: self.state.time_remaining,
                    });
                    if self.state.time_remaining == 0 {
                        events.push(self.end_session());
                    }
                }
            }
        }
        events
    }

    /// Back to the calibration screen. Only valid after game over.
    pub fn restart(&mut self) -> Option<GameEvent> {
        if !self.state.game_over {
            return None;
        }
        info!("restart requested");
        self.state = SessionState::default();
        self.targets.clear();
        self.clock.stop();
        Some(GameEvent::Restarted)
    }

    fn start_session(&mut self) {
        self.targets.populate(&mut self.rng);
        self.state.start_round();
        self.clock.start();
    }

    fn end_session(&mut self) -> GameEvent {
        self.state.game_over = true;
        self.clock.stop();
        info!("game over, final score {}", self.state.score);
        GameEvent::GameOver {
            score: self.state.score,
        }
    }
}
