use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::game::{Game, GameEvent};
use crate::pose::Pose;
use crate::pose_source::PoseSource;
use crate::session::Phase;

/// Game plus its pose source and the bits of UI state the renderer reads
pub struct App {
    pub game: Game,
    source: Box<dyn PoseSource>,
    poses: Vec<Pose>,
    report: Option<String>,
    quit: bool,
}

impl App {
    pub fn new(game: Game, source: Box<dyn PoseSource>) -> Self {
        Self {
            game,
            source,
            poses: vec![],
            report: None,
            quit: false,
        }
    }

    /// Latest poses seen by the game; frozen after game over
    pub fn poses(&self) -> &[Pose] {
        &self.poses
    }

    /// Final score message shown after a session ends
    pub fn report(&self) -> Option<&str> {
        self.report.as_deref()
    }

    /// Extra keys understood by the pose source, if any
    pub fn source_legend(&self) -> Option<&'static str> {
        self.source.legend()
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// One frame: advance the session clock by `dt`, then run the per-frame
    /// game step against the newest poses.
    pub fn on_frame(&mut self, dt: Duration) -> Vec<GameEvent> {
        if self.game.phase() == Phase::GameOver {
            return vec![];
        }
        self.poses = self.source.latest();

        let mut events = self.game.advance(dt);
        events.extend(self.game.frame(&self.poses));

        for event in &events {
            if let GameEvent::GameOver { score } = event {
                self.report = Some(format!("Game Over! Your score: {score}"));
            }
        }
        events
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Option<GameEvent> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.quit = true;
                return None;
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.quit = true;
                return None;
            }
            _ => {}
        }

        if self.game.phase() == Phase::GameOver {
            if matches!(key.code, KeyCode::Enter | KeyCode::Char('r')) {
                self.report = None;
                return self.game.restart();
            }
            return None;
        }

        self.source.on_key(key);
        None
    }
}
