use serde::{Deserialize, Serialize};

/// Keypoints below this confidence are treated as not detected.
pub const MIN_KEYPOINT_SCORE: f64 = 0.5;

/// Body parts reported by the estimator, named the way PoseNet names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Part {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    /// Anything this game does not know about (other estimators emit extra parts)
    #[serde(other)]
    Other,
}

/// Skeleton edges drawn as the camera view
pub const EDGES: [(Part, Part); 12] = [
    (Part::LeftShoulder, Part::RightShoulder),
    (Part::LeftShoulder, Part::LeftElbow),
    (Part::LeftElbow, Part::LeftWrist),
    (Part::RightShoulder, Part::RightElbow),
    (Part::RightElbow, Part::RightWrist),
    (Part::LeftShoulder, Part::LeftHip),
    (Part::RightShoulder, Part::RightHip),
    (Part::LeftHip, Part::RightHip),
    (Part::LeftHip, Part::LeftKnee),
    (Part::RightHip, Part::RightKnee),
    (Part::LeftKnee, Part::LeftAnkle),
    (Part::RightKnee, Part::RightAnkle),
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A named, scored point in camera pixel space (not mirrored)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub part: Part,
    pub score: f64,
    pub position: Position,
}

impl Keypoint {
    pub fn new(part: Part, x: f64, y: f64, score: f64) -> Self {
        Self {
            part,
            score,
            position: Position { x, y },
        }
    }

    pub fn is_confident(&self) -> bool {
        self.score > MIN_KEYPOINT_SCORE
    }
}

/// One detected skeleton
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    #[serde(default)]
    pub score: f64,
    pub keypoints: Vec<Keypoint>,
}

impl Pose {
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        let score = if keypoints.is_empty() {
            0.0
        } else {
            keypoints.iter().map(|k| k.score).sum::<f64>() / keypoints.len() as f64
        };
        Self { score, keypoints }
    }

    /// First keypoint for `part`, if the estimator reported one
    pub fn keypoint(&self, part: Part) -> Option<&Keypoint> {
        self.keypoints.iter().find(|k| k.part == part)
    }

    /// Like [`Pose::keypoint`] but only when the score clears the threshold
    pub fn confident(&self, part: Part) -> Option<&Keypoint> {
        self.keypoint(part).filter(|k| k.is_confident())
    }
}

/// Parse one feed line: a JSON array of poses.
pub fn parse_snapshot(line: &str) -> serde_json::Result<Vec<Pose>> {
    serde_json::from_str(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_posenet_shaped_line() {
        let line = r#"[{"score":0.8,"keypoints":[
            {"part":"nose","score":0.97,"position":{"x":321.5,"y":180.0}},
            {"part":"leftWrist","score":0.4,"position":{"x":10.0,"y":20.0}}
        ]}]"#;
        let poses = parse_snapshot(line).unwrap();

        assert_eq!(poses.len(), 1);
        let nose = poses[0].keypoint(Part::Nose).unwrap();
        assert_eq!(nose.position, Position { x: 321.5, y: 180.0 });
        assert!(poses[0].confident(Part::LeftWrist).is_none());
        assert!(poses[0].keypoint(Part::LeftWrist).is_some());
    }

    #[test]
    fn unknown_parts_are_kept_as_other() {
        let line = r#"[{"keypoints":[{"part":"leftPinky","score":0.9,"position":{"x":1.0,"y":2.0}}]}]"#;
        let poses = parse_snapshot(line).unwrap();
        assert_eq!(poses[0].keypoints[0].part, Part::Other);
        assert_eq!(poses[0].score, 0.0);
    }

    #[test]
    fn empty_snapshot_is_valid() {
        assert!(parse_snapshot("[]").unwrap().is_empty());
    }

    #[test]
    fn malformed_line_is_an_error() {
        assert!(parse_snapshot("{not json").is_err());
        assert!(parse_snapshot(r#"{"keypoints":[]}"#).is_err());
    }

    #[test]
    fn confidence_threshold_is_exclusive() {
        assert!(!Keypoint::new(Part::Nose, 0.0, 0.0, 0.5).is_confident());
        assert!(Keypoint::new(Part::Nose, 0.0, 0.0, 0.51).is_confident());
    }

    #[test]
    fn part_display_matches_wire_name() {
        assert_eq!(Part::LeftWrist.to_string(), "leftWrist");
        assert_eq!(Part::Nose.to_string(), "nose");
    }

    #[test]
    fn pose_score_is_mean_of_keypoints() {
        let pose = Pose::new(vec![
            Keypoint::new(Part::Nose, 0.0, 0.0, 1.0),
            Keypoint::new(Part::LeftWrist, 0.0, 0.0, 0.5),
        ]);
        assert_eq!(pose.score, 0.75);
        assert_eq!(Pose::new(vec![]).score, 0.0);
    }
}
