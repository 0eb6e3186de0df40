use crate::pose::{Part, Pose};

/// Region the nose must sit in, camera coordinates, bounds exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationWindow {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Default for CalibrationWindow {
    fn default() -> Self {
        Self {
            min_x: 220.0,
            max_x: 420.0,
            min_y: 100.0,
            max_y: 400.0,
        }
    }
}

impl CalibrationWindow {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x > self.min_x && x < self.max_x && y > self.min_y && y < self.max_y
    }

    /// True when the player stands inside the outline: nose and both shoulders
    /// are confidently detected and the nose is inside the window.
    ///
    /// Only the first pose counts. No pose means no calibration.
    pub fn is_calibrated(&self, poses: &[Pose]) -> bool {
        let Some(pose) = poses.first() else {
            return false;
        };

        match (
            pose.confident(Part::Nose),
            pose.confident(Part::LeftShoulder),
            pose.confident(Part::RightShoulder),
        ) {
            (Some(nose), Some(_), Some(_)) => self.contains(nose.position.x, nose.position.y),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Keypoint;

    fn upper_body(nose: (f64, f64), scores: (f64, f64, f64)) -> Pose {
        Pose::new(vec![
            Keypoint::new(Part::Nose, nose.0, nose.1, scores.0),
            Keypoint::new(Part::LeftShoulder, nose.0 + 40.0, nose.1 + 60.0, scores.1),
            Keypoint::new(Part::RightShoulder, nose.0 - 40.0, nose.1 + 60.0, scores.2),
        ])
    }

    #[test]
    fn centred_confident_pose_calibrates() {
        let window = CalibrationWindow::default();
        assert!(window.is_calibrated(&[upper_body((320.0, 200.0), (0.9, 0.9, 0.9))]));
    }

    #[test]
    fn no_pose_never_calibrates() {
        assert!(!CalibrationWindow::default().is_calibrated(&[]));
    }

    #[test]
    fn each_keypoint_must_clear_threshold() {
        let window = CalibrationWindow::default();
        for scores in [(0.5, 0.9, 0.9), (0.9, 0.5, 0.9), (0.9, 0.9, 0.2)] {
            assert!(!window.is_calibrated(&[upper_body((320.0, 200.0), scores)]));
        }
    }

    #[test]
    fn missing_shoulder_fails() {
        let pose = Pose::new(vec![
            Keypoint::new(Part::Nose, 320.0, 200.0, 0.9),
            Keypoint::new(Part::LeftShoulder, 360.0, 260.0, 0.9),
        ]);
        assert!(!CalibrationWindow::default().is_calibrated(&[pose]));
    }

    #[test]
    fn window_bounds_are_exclusive() {
        let window = CalibrationWindow::default();
        let strong = (0.9, 0.9, 0.9);
        assert!(!window.is_calibrated(&[upper_body((220.0, 200.0), strong)]));
        assert!(!window.is_calibrated(&[upper_body((420.0, 200.0), strong)]));
        assert!(!window.is_calibrated(&[upper_body((320.0, 100.0), strong)]));
        assert!(!window.is_calibrated(&[upper_body((320.0, 400.0), strong)]));
        assert!(window.is_calibrated(&[upper_body((220.5, 100.5), strong)]));
        assert!(window.is_calibrated(&[upper_body((419.5, 399.5), strong)]));
    }

    #[test]
    fn only_first_pose_is_considered() {
        let window = CalibrationWindow::default();
        let outside = upper_body((50.0, 50.0), (0.9, 0.9, 0.9));
        let inside = upper_body((320.0, 200.0), (0.9, 0.9, 0.9));
        assert!(!window.is_calibrated(&[outside, inside]));
    }
}
