use crate::clock::SESSION_SECS;

/// Where the game is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    WaitingForCalibration,
    Active,
    GameOver,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub score: u32,
    pub time_remaining: u32,
    pub calibrated: bool,
    pub game_over: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            score: 0,
            time_remaining: SESSION_SECS,
            calibrated: false,
            game_over: false,
        }
    }
}

impl SessionState {
    pub fn phase(&self) -> Phase {
        if self.game_over {
            Phase::GameOver
        } else if self.calibrated {
            Phase::Active
        } else {
            Phase::WaitingForCalibration
        }
    }

    /// Fresh scoring state for a new round; leaves calibration alone
    pub fn start_round(&mut self) {
        self.score = 0;
        self.time_remaining = SESSION_SECS;
        self.game_over = false;
    }
}
