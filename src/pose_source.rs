use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use crossterm::event::{KeyCode, KeyEvent};
use log::{debug, error, info, warn};

use crate::pose::{parse_snapshot, Keypoint, Part, Pose};
use crate::util::{mirror_x, CANVAS_HEIGHT, CANVAS_WIDTH};

/// How long a freshly started estimator gets to either print a snapshot or
/// die. One that is still silent afterwards is assumed to be warming up.
pub const STARTUP_WINDOW: Duration = Duration::from_secs(3);

/// Lines of estimator stderr kept for the failure report
const STDERR_TAIL: usize = 5;

/// Where poses come from. `latest` is best effort: it may repeat a stale
/// snapshot and is empty until the estimator has produced anything.
pub trait PoseSource {
    fn latest(&mut self) -> Vec<Pose>;

    /// Optional key handling for sources driven from the keyboard.
    /// Returns true if the key was consumed.
    fn on_key(&mut self, _key: KeyEvent) -> bool {
        false
    }

    /// Keys this source listens to, for the footer
    fn legend(&self) -> Option<&'static str> {
        None
    }
}

/// Progress reported by the feed reader thread
#[derive(Debug, Clone, Copy, PartialEq)]
enum FeedSignal {
    FirstSnapshot,
    Ended,
}

/// Live feed: JSON lines read on a background thread, newest snapshot wins
pub struct PoseFeed {
    latest: Arc<Mutex<Vec<Pose>>>,
    child: Option<Child>,
}

impl PoseFeed {
    /// Run an estimator through the shell and read its stdout. Fails when the
    /// estimator exits before producing its first snapshot.
    pub fn spawn(cmd: &str) -> Result<Self> {
        Self::spawn_with_startup(cmd, STARTUP_WINDOW)
    }

    pub fn spawn_with_startup(cmd: &str, startup: Duration) -> Result<Self> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("unable to start pose estimator `{cmd}`"))?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            bail!("pose estimator `{cmd}` has no output pipes");
        };
        info!("pose estimator started: {cmd}");

        let (tail, stderr_reader) = forward_stderr(stderr);
        let (latest, signals) = start_reader(BufReader::new(stdout));

        match signals.recv_timeout(startup) {
            Ok(FeedSignal::FirstSnapshot) => debug!("pose estimator produced its first snapshot"),
            Err(RecvTimeoutError::Timeout) => {
                warn!("pose estimator silent after {startup:?}, waiting for it in game")
            }
            Ok(FeedSignal::Ended) | Err(RecvTimeoutError::Disconnected) => {
                let status = wait_briefly(&mut child);
                wait_for_thread(&stderr_reader, Duration::from_millis(500));
                let tail = tail.lock().map(|lines| lines.join("\n")).unwrap_or_default();
                bail!(
                    "pose estimator `{cmd}` stopped before producing a pose ({status}){}{tail}",
                    if tail.is_empty() { "" } else { ": " }
                );
            }
        }

        Ok(Self {
            latest,
            child: Some(child),
        })
    }

    pub fn from_reader<R: BufRead + Send + 'static>(reader: R) -> Self {
        let (latest, _) = start_reader(reader);
        Self {
            latest,
            child: None,
        }
    }
}

fn start_reader<R: BufRead + Send + 'static>(
    reader: R,
) -> (Arc<Mutex<Vec<Pose>>>, Receiver<FeedSignal>) {
    let latest = Arc::new(Mutex::new(Vec::new()));
    let shared = Arc::clone(&latest);
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        read_feed(reader, &shared, &tx);
        let _ = tx.send(FeedSignal::Ended);
    });

    (latest, rx)
}

fn read_feed<R: BufRead>(reader: R, shared: &Mutex<Vec<Pose>>, signals: &Sender<FeedSignal>) {
    let mut seen_snapshot = false;
    for (lineno, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("pose feed read failed: {e}");
                return;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_snapshot(&line) {
            Ok(poses) => {
                match shared.lock() {
                    Ok(mut slot) => *slot = poses,
                    Err(_) => return,
                }
                if !seen_snapshot {
                    seen_snapshot = true;
                    let _ = signals.send(FeedSignal::FirstSnapshot);
                }
            }
            Err(e) => warn!("skipping malformed pose line {}: {e}", lineno + 1),
        }
    }
    warn!("pose feed ended, holding last snapshot");
}

/// Logs estimator stderr and keeps its last few lines
fn forward_stderr<R: Read + Send + 'static>(
    stderr: R,
) -> (Arc<Mutex<Vec<String>>>, JoinHandle<()>) {
    let tail = Arc::new(Mutex::new(Vec::new()));
    let shared = Arc::clone(&tail);

    let handle = thread::spawn(move || {
        for line in BufReader::new(stderr).lines() {
            let Ok(line) = line else { break };
            warn!("pose estimator: {line}");
            if let Ok(mut lines) = shared.lock() {
                if lines.len() == STDERR_TAIL {
                    lines.remove(0);
                }
                lines.push(line);
            }
        }
    });

    (tail, handle)
}

/// Exit status of a child whose stdout just closed, killing it if it lingers
fn wait_briefly(child: &mut Child) -> String {
    let deadline = Instant::now() + Duration::from_millis(500);
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return status.to_string(),
            Ok(None) if Instant::now() < deadline => thread::sleep(Duration::from_millis(10)),
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                return "closed its output".to_string();
            }
            Err(e) => return format!("status unknown: {e}"),
        }
    }
}

fn wait_for_thread(handle: &JoinHandle<()>, limit: Duration) {
    let deadline = Instant::now() + limit;
    while !handle.is_finished() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
}

impl PoseSource for PoseFeed {
    fn latest(&mut self) -> Vec<Pose> {
        self.latest
            .lock()
            .map(|poses| poses.clone())
            .unwrap_or_default()
    }
}

impl Drop for PoseFeed {
    fn drop(&mut self) {
        if let Some(child) = self.child.as_mut() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Recorded feed played back one snapshot per frame. Holds the final
/// snapshot once exhausted.
#[derive(Debug, Clone, Default)]
pub struct ReplayPoseSource {
    snapshots: Vec<Vec<Pose>>,
    cursor: usize,
}

impl ReplayPoseSource {
    pub fn new(snapshots: Vec<Vec<Pose>>) -> Self {
        Self {
            snapshots,
            cursor: 0,
        }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("unable to read pose recording {}", path.display()))?;
        let source = Self::parse(&text)
            .with_context(|| format!("bad pose recording {}", path.display()))?;
        info!(
            "loaded {} pose snapshots from {}",
            source.len(),
            path.display()
        );
        Ok(source)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let snapshots = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                parse_snapshot(line).with_context(|| format!("line {}", idx + 1))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(snapshots))
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl PoseSource for ReplayPoseSource {
    fn latest(&mut self) -> Vec<Pose> {
        let Some(last) = self.snapshots.len().checked_sub(1) else {
            return vec![];
        };
        let idx = self.cursor.min(last);
        self.cursor = (self.cursor + 1).min(self.snapshots.len());
        self.snapshots[idx].clone()
    }
}

const PUPPET_STEP: f64 = 12.0;
const PUPPET_LEGEND: &str = "(space) step in/out / (wasd) left wrist / (arrows) right wrist";
const PUPPET_NOSE_Y: f64 = 200.0;
/// Camera-space nose x when standing inside the outline vs off to the side
const PUPPET_CENTRED_X: f64 = 320.0;
const PUPPET_ASIDE_X: f64 = 120.0;

/// Keyboard-driven stand-in for a camera. The body starts beside the outline;
/// Space steps in or out. WASD moves the left wrist and the arrow keys move
/// the right wrist, in screen space.
#[derive(Debug, Clone)]
pub struct Puppet {
    centred: bool,
    left_wrist: (f64, f64),
    right_wrist: (f64, f64),
}

impl Default for Puppet {
    fn default() -> Self {
        Self {
            centred: false,
            left_wrist: (200.0, 330.0),
            right_wrist: (440.0, 330.0),
        }
    }
}

impl Puppet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_centred(&self) -> bool {
        self.centred
    }

    /// Screen-space wrist positions (left, right)
    pub fn wrists(&self) -> ((f64, f64), (f64, f64)) {
        (self.left_wrist, self.right_wrist)
    }

    pub fn pose(&self) -> Pose {
        let nose_x = if self.centred {
            PUPPET_CENTRED_X
        } else {
            PUPPET_ASIDE_X
        };
        let left_shoulder = (nose_x + 40.0, PUPPET_NOSE_Y + 60.0);
        let right_shoulder = (nose_x - 40.0, PUPPET_NOSE_Y + 60.0);
        let left_wrist = (mirror_x(self.left_wrist.0), self.left_wrist.1);
        let right_wrist = (mirror_x(self.right_wrist.0), self.right_wrist.1);
        let midpoint = |a: (f64, f64), b: (f64, f64)| ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0);
        let left_elbow = midpoint(left_shoulder, left_wrist);
        let right_elbow = midpoint(right_shoulder, right_wrist);

        Pose::new(vec![
            Keypoint::new(Part::Nose, nose_x, PUPPET_NOSE_Y, 0.99),
            Keypoint::new(Part::LeftShoulder, left_shoulder.0, left_shoulder.1, 0.99),
            Keypoint::new(Part::RightShoulder, right_shoulder.0, right_shoulder.1, 0.99),
            Keypoint::new(Part::LeftElbow, left_elbow.0, left_elbow.1, 0.9),
            Keypoint::new(Part::RightElbow, right_elbow.0, right_elbow.1, 0.9),
            Keypoint::new(Part::LeftWrist, left_wrist.0, left_wrist.1, 0.95),
            Keypoint::new(Part::RightWrist, right_wrist.0, right_wrist.1, 0.95),
            Keypoint::new(Part::LeftHip, nose_x + 30.0, PUPPET_NOSE_Y + 180.0, 0.8),
            Keypoint::new(Part::RightHip, nose_x - 30.0, PUPPET_NOSE_Y + 180.0, 0.8),
        ])
    }
}

fn nudge(point: &mut (f64, f64), dx: f64, dy: f64) {
    point.0 = (point.0 + dx).clamp(0.0, CANVAS_WIDTH);
    point.1 = (point.1 + dy).clamp(0.0, CANVAS_HEIGHT);
}

impl PoseSource for Puppet {
    fn latest(&mut self) -> Vec<Pose> {
        vec![self.pose()]
    }

    fn on_key(&mut self, key: KeyEvent) -> bool {
        let step = PUPPET_STEP;
        match key.code {
            KeyCode::Char(' ') => self.centred = !self.centred,
            KeyCode::Char('w') => nudge(&mut self.left_wrist, 0.0, -step),
            KeyCode::Char('s') => nudge(&mut self.left_wrist, 0.0, step),
            KeyCode::Char('a') => nudge(&mut self.left_wrist, -step, 0.0),
            KeyCode::Char('d') => nudge(&mut self.left_wrist, step, 0.0),
            KeyCode::Up => nudge(&mut self.right_wrist, 0.0, -step),
            KeyCode::Down => nudge(&mut self.right_wrist, 0.0, step),
            KeyCode::Left => nudge(&mut self.right_wrist, -step, 0.0),
            KeyCode::Right => nudge(&mut self.right_wrist, step, 0.0),
            _ => return false,
        }
        true
    }

    fn legend(&self) -> Option<&'static str> {
        Some(PUPPET_LEGEND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CalibrationWindow;
    use crate::hit_test::wrist_point;
    use crossterm::event::KeyModifiers;
    use std::io::Cursor;
    use std::time::{Duration, Instant};

    const NOSE_LINE: &str =
        r#"[{"keypoints":[{"part":"nose","score":0.9,"position":{"x":300.0,"y":150.0}}]}]"#;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn wait_for<F: FnMut() -> bool>(mut cond: F) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn feed_keeps_newest_snapshot_and_skips_garbage() {
        let input = format!("[]\nnot json\n\n{NOSE_LINE}\n");
        let mut feed = PoseFeed::from_reader(Cursor::new(input));

        assert!(wait_for(|| feed.latest().len() == 1));
        let poses = feed.latest();
        assert!(poses[0].keypoint(Part::Nose).is_some());
    }

    #[test]
    fn feed_is_empty_before_any_line() {
        let mut feed = PoseFeed::from_reader(Cursor::new(String::new()));
        assert!(feed.latest().is_empty());
    }

    #[test]
    fn spawned_command_feeds_poses() {
        let cmd = format!("echo '{NOSE_LINE}'");
        let mut feed = PoseFeed::spawn(&cmd).unwrap();
        assert!(wait_for(|| !feed.latest().is_empty()));
    }

    #[test]
    fn missing_estimator_fails_to_start() {
        let err = PoseFeed::spawn("no_such_pose_estimator_wristtap --camera 0")
            .err()
            .expect("a missing estimator must not start");
        let msg = format!("{err:#}");
        assert!(msg.contains("stopped before producing a pose"), "{msg}");
        assert!(msg.contains("not found"), "{msg}");
    }

    #[test]
    fn estimator_dying_on_camera_error_reports_stderr() {
        let err = PoseFeed::spawn("echo 'camera 0 busy' >&2; exit 3")
            .err()
            .expect("an estimator that exits early must not start");
        let msg = format!("{err:#}");
        assert!(msg.contains("camera 0 busy"), "{msg}");
        assert!(msg.contains('3'), "{msg}");
    }

    #[test]
    fn estimator_exiting_silently_is_an_error() {
        assert!(PoseFeed::spawn("exit 0").is_err());
    }

    #[test]
    fn slow_estimator_is_given_the_benefit_of_the_doubt() {
        let mut feed = PoseFeed::spawn_with_startup("sleep 5", Duration::from_millis(50)).unwrap();
        assert!(feed.latest().is_empty());
    }

    #[test]
    fn only_the_puppet_advertises_keys() {
        assert!(Puppet::new().legend().is_some());
        assert!(ReplayPoseSource::default().legend().is_none());
        assert!(PoseFeed::from_reader(Cursor::new(String::new()))
            .legend()
            .is_none());
    }

    #[test]
    fn replay_advances_and_holds_last() {
        let text = format!("[]\n\n{NOSE_LINE}\n");
        let mut replay = ReplayPoseSource::parse(&text).unwrap();
        assert_eq!(replay.len(), 2);

        assert!(replay.latest().is_empty());
        assert_eq!(replay.latest().len(), 1);
        assert_eq!(replay.latest().len(), 1);
    }

    #[test]
    fn empty_replay_yields_nothing() {
        let mut replay = ReplayPoseSource::default();
        assert!(replay.is_empty());
        assert!(replay.latest().is_empty());
    }

    #[test]
    fn replay_reports_bad_line_number() {
        let err = ReplayPoseSource::parse("[]\n{oops\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn missing_recording_is_an_error() {
        let err = ReplayPoseSource::open("/definitely/not/here.jsonl").unwrap_err();
        assert!(format!("{err:#}").contains("unable to read pose recording"));
    }

    #[test]
    fn puppet_calibrates_only_when_centred() {
        let window = CalibrationWindow::default();
        let mut puppet = Puppet::new();
        assert!(!window.is_calibrated(&puppet.latest()));

        assert!(puppet.on_key(key(KeyCode::Char(' '))));
        assert!(puppet.is_centred());
        assert!(window.is_calibrated(&puppet.latest()));
    }

    #[test]
    fn puppet_wrists_move_in_screen_space() {
        let mut puppet = Puppet::new();
        let ((lx, ly), (rx, ry)) = puppet.wrists();

        puppet.on_key(key(KeyCode::Char('d')));
        puppet.on_key(key(KeyCode::Up));

        let pose = puppet.pose();
        assert_eq!(
            wrist_point(&pose, Part::LeftWrist),
            Some((lx + PUPPET_STEP, ly))
        );
        assert_eq!(
            wrist_point(&pose, Part::RightWrist),
            Some((rx, ry - PUPPET_STEP))
        );
    }

    #[test]
    fn puppet_stays_on_canvas() {
        let mut puppet = Puppet::new();
        for _ in 0..100 {
            puppet.on_key(key(KeyCode::Char('a')));
            puppet.on_key(key(KeyCode::Down));
        }
        let ((lx, _), (_, ry)) = puppet.wrists();
        assert_eq!(lx, 0.0);
        assert_eq!(ry, CANVAS_HEIGHT);
    }

    #[test]
    fn puppet_ignores_other_keys() {
        let mut puppet = Puppet::new();
        assert!(!puppet.on_key(key(KeyCode::Char('r'))));
        assert!(!puppet.on_key(key(KeyCode::Enter)));
    }
}
