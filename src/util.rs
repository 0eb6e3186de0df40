/// Logical canvas size in camera pixels; pose coordinates share this space.
pub const CANVAS_WIDTH: f64 = 640.0;
pub const CANVAS_HEIGHT: f64 = 480.0;

pub fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

/// Camera x to screen x. The view is shown mirrored, like a selfie camera.
pub fn mirror_x(x: f64) -> f64 {
    CANVAS_WIDTH - x
}
