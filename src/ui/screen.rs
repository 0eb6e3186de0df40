use ratatui::Frame;

use crate::{app::App, session::Phase};

use super::{
    regions, render_footer, render_report, render_scoreboard, scene::render_scene,
    CALIBRATION_MESSAGE,
};

/// Quit key, preceded by whatever keys the pose source listens to
fn play_legend(app: &App) -> String {
    match app.source_legend() {
        Some(keys) => format!("{keys} / (esc)ape"),
        None => "(esc)ape".to_string(),
    }
}

/// A UI Screen boundary: one per game phase
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Outline drawn, waiting for the player to line up
pub struct CalibrationScreen;

impl Screen for CalibrationScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        let [header, body, footer] = regions(f.area());
        render_scoreboard(app, f, header);
        render_scene(app, f, body);
        render_footer(f, footer, Some(CALIBRATION_MESSAGE), &play_legend(app));
    }
}

/// Targets on screen, clock running
pub struct PlayScreen;

impl Screen for PlayScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        let [header, body, footer] = regions(f.area());
        render_scoreboard(app, f, header);
        render_scene(app, f, body);
        render_footer(f, footer, None, &play_legend(app));
    }
}

/// Frozen final frame with the score report and the restart control
pub struct GameOverScreen;

impl Screen for GameOverScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        let [header, body, footer] = regions(f.area());
        render_scoreboard(app, f, header);
        render_scene(app, f, body);
        render_footer(f, footer, None, super::PLAY_AGAIN);
        if let Some(report) = app.report() {
            render_report(f, body, report);
        }
    }
}

/// Helper to construct the appropriate screen for the current phase
pub fn current_screen(phase: Phase) -> Box<dyn Screen> {
    match phase {
        Phase::WaitingForCalibration => Box::new(CalibrationScreen),
        Phase::Active => Box::new(PlayScreen),
        Phase::GameOver => Box::new(GameOverScreen),
    }
}
