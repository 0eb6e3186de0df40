use ratatui::{
    layout::Rect,
    style::Color,
    symbols::Marker,
    widgets::{
        canvas::{Canvas, Circle, Context, Line, Points},
        Block, Borders,
    },
    Frame,
};

use crate::app::App;
use crate::hit_test::{wrist_point, WRISTS};
use crate::pose::{Part, Pose, EDGES};
use crate::targets::Target;
use crate::util::{mirror_x, CANVAS_HEIGHT, CANVAS_WIDTH};

pub type Segment = ((f64, f64), (f64, f64));

/// Head centre and radius of the calibration outline
pub const OUTLINE_HEAD: (f64, f64, f64) = (320.0, 90.0, 20.0);

/// Static body outline, screen coordinates (y grows downwards)
pub const OUTLINE_SEGMENTS: [Segment; 8] = [
    ((320.0, 110.0), (320.0, 140.0)), // neck
    ((320.0, 140.0), (280.0, 160.0)),
    ((320.0, 140.0), (360.0, 160.0)),
    ((280.0, 160.0), (240.0, 200.0)),
    ((360.0, 160.0), (400.0, 200.0)),
    ((320.0, 140.0), (320.0, 300.0)), // torso
    ((320.0, 300.0), (280.0, 340.0)),
    ((320.0, 300.0), (360.0, 340.0)),
];

/// Canvas y grows upwards, screen y grows downwards
fn flip(y: f64) -> f64 {
    CANVAS_HEIGHT - y
}

/// Mirrored screen position of a confident keypoint
fn screen_point(pose: &Pose, part: Part) -> Option<(f64, f64)> {
    pose.confident(part)
        .map(|k| (mirror_x(k.position.x), k.position.y))
}

/// Edges of the first pose that have both ends confidently detected, in
/// mirrored screen space. This is the camera view.
pub fn skeleton_segments(poses: &[Pose]) -> Vec<Segment> {
    let Some(pose) = poses.first() else {
        return vec![];
    };
    EDGES
        .iter()
        .filter_map(|(a, b)| Some((screen_point(pose, *a)?, screen_point(pose, *b)?)))
        .collect()
}

fn draw_segment(ctx: &mut Context, (a, b): Segment, color: Color) {
    ctx.draw(&Line {
        x1: a.0,
        y1: flip(a.1),
        x2: b.0,
        y2: flip(b.1),
        color,
    });
}

fn draw_camera_view(ctx: &mut Context, poses: &[Pose]) {
    for segment in skeleton_segments(poses) {
        draw_segment(ctx, segment, Color::DarkGray);
    }
    let Some(pose) = poses.first() else {
        return;
    };
    if let Some((x, y)) = screen_point(pose, Part::Nose) {
        ctx.draw(&Circle {
            x,
            y: flip(y),
            radius: 14.0,
            color: Color::DarkGray,
        });
    }
    for wrist in WRISTS {
        if let Some((x, y)) = wrist_point(pose, wrist) {
            ctx.draw(&Circle {
                x,
                y: flip(y),
                radius: 8.0,
                color: Color::Yellow,
            });
        }
    }
}

fn draw_outline(ctx: &mut Context) {
    let (x, y, radius) = OUTLINE_HEAD;
    ctx.draw(&Circle {
        x,
        y: flip(y),
        radius,
        color: Color::Green,
    });
    for segment in OUTLINE_SEGMENTS {
        draw_segment(ctx, segment, Color::Green);
    }
}

fn draw_targets(ctx: &mut Context, targets: &[Target]) {
    for target in targets {
        // Concentric rings approximate a filled disc
        let mut radius = target.radius;
        while radius > 0.0 {
            ctx.draw(&Circle {
                x: target.x,
                y: flip(target.y),
                radius,
                color: Color::Blue,
            });
            radius -= 3.0;
        }
        ctx.draw(&Points {
            coords: &[(target.x, flip(target.y))],
            color: Color::Blue,
        });
    }
}

/// Camera view plus either the calibration outline or the targets, decided by
/// the calibration flag alone
pub fn render_scene(app: &App, f: &mut Frame, area: Rect) {
    let calibrated = app.game.state().calibrated;
    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL))
        .marker(Marker::Braille)
        .x_bounds([0.0, CANVAS_WIDTH])
        .y_bounds([0.0, CANVAS_HEIGHT])
        .paint(|ctx| {
            draw_camera_view(ctx, app.poses());
            ctx.layer();
            if calibrated {
                draw_targets(ctx, app.game.targets());
            } else {
                draw_outline(ctx);
            }
        });
    f.render_widget(canvas, area);
}
